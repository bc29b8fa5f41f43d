//! Static message shown when the font for the text activity cannot be loaded.

use crate::resources::font::FontLoadFailure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub title: String,
    pub attempted: Vec<String>,
    pub instructions: Vec<String>,
}

impl ErrorPanel {
    pub fn for_font_failure(failure: &FontLoadFailure) -> Self {
        Self {
            title: "Font could not be loaded".to_string(),
            attempted: failure
                .attempts
                .iter()
                .map(|a| format!("{} ({})", a.url, a.reason))
                .collect(),
            instructions: vec![
                "Download helvetiker_regular.typeface.json from the three.js repository \
                 (examples/fonts)."
                    .to_string(),
                "Place it at assets/fonts/helvetiker_regular.typeface.json and reload."
                    .to_string(),
                "When serving the page, make sure the file is reachable from the same origin."
                    .to_string(),
            ],
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.title.clone(), "Tried:".to_string()];
        lines.extend(self.attempted.iter().map(|a| format!("  - {a}")));
        lines.push("To fix:".to_string());
        lines.extend(
            self.instructions
                .iter()
                .enumerate()
                .map(|(i, s)| format!("  {}. {}", i + 1, s)),
        );
        lines
    }

    /// Draws the message as a window in the middle of the screen. The web
    /// build shows the DOM message of `show_dom` instead.
    pub fn ui(&self, gui: &egui::Context) {
        egui::Window::new(self.title.as_str())
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .collapsible(false)
            .resizable(false)
            .show(gui, |ui| {
                ui.label("Tried:");
                for attempt in &self.attempted {
                    ui.label(format!("  - {attempt}"));
                }
                ui.separator();
                ui.label("To fix:");
                for (i, step) in self.instructions.iter().enumerate() {
                    ui.label(format!("{}. {}", i + 1, step));
                }
            });
    }

    /// Appends the message to the page as a fixed element.
    #[cfg(target_arch = "wasm32")]
    pub fn show_dom(&self) -> Result<(), wasm_bindgen::JsValue> {
        use wasm_bindgen::JsValue;

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let panel = document.create_element("div")?;
        panel.set_id("font-error");
        panel.set_attribute(
            "style",
            "position:fixed;top:50%;left:50%;transform:translate(-50%,-50%);\
             max-width:560px;padding:16px 20px;background:#2b1111;color:#fdd;\
             border:1px solid #a33;border-radius:6px;font:14px sans-serif;\
             white-space:pre-wrap;z-index:20",
        )?;
        panel.set_text_content(Some(&self.lines().join("\n")));
        document
            .body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&panel)?;
        Ok(())
    }
}
