//! Debug panel bound to an activity's parameter object, drawn with egui.
//!
//! Controls read and write fields of the parameter object `P` through plain
//! accessor functions. Every change reports whether the affected GPU resource
//! has to be replaced ([`Effect::Rebuild`]) or only needs its live values
//! uploaded ([`Effect::Write`]).
//!
//! The panel is a floating egui window with sliders, combo boxes, checkboxes
//! and colour pickers. It can also be driven from the keyboard: `Tab`/`ArrowDown`
//! select the next control, `ArrowUp` the previous one, `ArrowLeft`/`ArrowRight`
//! adjust the selected control, `H` hides and shows the panel.

mod overlay;

pub use overlay::{GuiFrame, Overlay};

use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Replace the resource (new geometry, material, texture or sampler).
    Rebuild,
    /// Upload new values into the live resource.
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Changed {
    pub name: &'static str,
    pub effect: Effect,
}

pub enum ControlKind<P> {
    Slider {
        min: f32,
        max: f32,
        step: f32,
        get: fn(&P) -> f32,
        set: fn(&mut P, f32),
    },
    Choice {
        options: Vec<&'static str>,
        disabled: Vec<bool>,
        get: fn(&P) -> usize,
        set: fn(&mut P, usize),
    },
    Toggle {
        get: fn(&P) -> bool,
        set: fn(&mut P, bool),
    },
    /// sRGB colour, adjusted by stepping its hue.
    Color {
        get: fn(&P) -> [f32; 3],
        set: fn(&mut P, [f32; 3]),
    },
}

pub struct Control<P> {
    pub name: &'static str,
    pub effect: Effect,
    pub kind: ControlKind<P>,
}

impl<P> Control<P> {
    fn adjust(&self, params: &mut P, direction: i32) -> bool {
        let direction = direction.signum();
        match &self.kind {
            ControlKind::Slider {
                min,
                max,
                step,
                get,
                set,
            } => {
                let old = get(params);
                let steps = ((old - min) / step).round() + direction as f32;
                let new = (min + steps * step).clamp(*min, *max);
                set(params, new);
                new != old
            }
            ControlKind::Choice {
                options,
                disabled,
                get,
                set,
            } => {
                let len = options.len() as i32;
                let old = get(params);
                let mut index = old as i32;
                for _ in 0..len {
                    index = (index + direction).rem_euclid(len);
                    if !disabled[index as usize] {
                        break;
                    }
                }
                let index = index as usize;
                if disabled[index] {
                    return false;
                }
                set(params, index);
                index != old
            }
            ControlKind::Toggle { get, set } => {
                let value = get(params);
                set(params, !value);
                true
            }
            ControlKind::Color { get, set } => {
                let [h, s, v] = rgb_to_hsv(get(params));
                let s = if s < 0.05 { 1.0 } else { s };
                let v = if v < 0.05 { 1.0 } else { v };
                let h = (h + direction as f32 / 12.0).rem_euclid(1.0);
                set(params, hsv_to_rgb([h, s, v]));
                true
            }
        }
    }

    /// Draws the widget for this control. Returns true when the user changed the value.
    fn ui(&self, ui: &mut egui::Ui, params: &mut P) -> bool {
        match &self.kind {
            ControlKind::Slider {
                min,
                max,
                step,
                get,
                set,
            } => {
                let mut value = get(params);
                let slider = egui::Slider::new(&mut value, *min..=*max)
                    .step_by(f64::from(*step))
                    .text(self.name);
                let changed = ui.add(slider).changed();
                if changed {
                    set(params, value);
                }
                changed
            }
            ControlKind::Choice {
                options,
                disabled,
                get,
                set,
            } => {
                let old = get(params);
                let mut index = old;
                egui::ComboBox::from_label(self.name)
                    .selected_text(options.get(old).copied().unwrap_or("?"))
                    .show_ui(ui, |ui| {
                        for (i, option) in options.iter().enumerate() {
                            ui.add_enabled_ui(!disabled[i], |ui| {
                                ui.selectable_value(&mut index, i, *option);
                            });
                        }
                    });
                if index != old {
                    set(params, index);
                }
                index != old
            }
            ControlKind::Toggle { get, set } => {
                let mut value = get(params);
                let changed = ui.checkbox(&mut value, self.name).changed();
                if changed {
                    set(params, value);
                }
                changed
            }
            ControlKind::Color { get, set } => {
                let mut srgb = to_srgb8(get(params));
                let changed = ui
                    .horizontal(|ui| {
                        let changed = ui.color_edit_button_srgb(&mut srgb).changed();
                        ui.label(self.name);
                        changed
                    })
                    .inner;
                if changed {
                    set(params, from_srgb8(srgb));
                }
                changed
            }
        }
    }

    fn describe(&self, params: &P) -> String {
        let value = match &self.kind {
            ControlKind::Slider { get, step, .. } => {
                let decimals = if *step >= 1.0 { 0 } else { (-step.log10()).ceil() as usize };
                format!("{:.*}", decimals, get(params))
            }
            ControlKind::Choice { options, get, .. } => {
                options.get(get(params)).copied().unwrap_or("?").to_string()
            }
            ControlKind::Toggle { get, .. } => get(params).to_string(),
            ControlKind::Color { get, .. } => hex(get(params)),
        };
        format!("{}: {}", self.name, value)
    }
}

pub struct DebugPanel<P> {
    pub title: String,
    pub visible: bool,
    controls: Vec<Control<P>>,
    selected: usize,
}

impl<P> DebugPanel<P> {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            visible: true,
            controls: Vec::new(),
            selected: 0,
        }
    }

    pub fn slider(
        mut self,
        name: &'static str,
        range: (f32, f32),
        step: f32,
        effect: Effect,
        get: fn(&P) -> f32,
        set: fn(&mut P, f32),
    ) -> Self {
        self.controls.push(Control {
            name,
            effect,
            kind: ControlKind::Slider {
                min: range.0,
                max: range.1,
                step: step.max(f32::EPSILON),
                get,
                set,
            },
        });
        self
    }

    pub fn choice(
        mut self,
        name: &'static str,
        options: &[&'static str],
        effect: Effect,
        get: fn(&P) -> usize,
        set: fn(&mut P, usize),
    ) -> Self {
        self.controls.push(Control {
            name,
            effect,
            kind: ControlKind::Choice {
                options: options.to_vec(),
                disabled: vec![false; options.len()],
                get,
                set,
            },
        });
        self
    }

    pub fn toggle(
        mut self,
        name: &'static str,
        effect: Effect,
        get: fn(&P) -> bool,
        set: fn(&mut P, bool),
    ) -> Self {
        self.controls.push(Control {
            name,
            effect,
            kind: ControlKind::Toggle { get, set },
        });
        self
    }

    pub fn color(
        mut self,
        name: &'static str,
        effect: Effect,
        get: fn(&P) -> [f32; 3],
        set: fn(&mut P, [f32; 3]),
    ) -> Self {
        self.controls.push(Control {
            name,
            effect,
            kind: ControlKind::Color { get, set },
        });
        self
    }

    pub fn controls(&self) -> &[Control<P>] {
        &self.controls
    }

    pub fn selected(&self) -> Option<&Control<P>> {
        self.controls.get(self.selected)
    }

    pub fn select(&mut self, name: &str) -> bool {
        match self.controls.iter().position(|c| c.name == name) {
            Some(i) => {
                self.selected = i;
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        if !self.controls.is_empty() {
            self.selected = (self.selected + 1) % self.controls.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.controls.is_empty() {
            self.selected = (self.selected + self.controls.len() - 1) % self.controls.len();
        }
    }

    /// Greys out one option of a choice; adjusting skips it.
    pub fn set_option_enabled(&mut self, name: &str, option: &str, enabled: bool) {
        for control in self.controls.iter_mut().filter(|c| c.name == name) {
            if let ControlKind::Choice {
                options, disabled, ..
            } = &mut control.kind
            {
                if let Some(i) = options.iter().position(|o| *o == option) {
                    disabled[i] = !enabled;
                }
            }
        }
    }

    pub fn is_option_enabled(&self, name: &str, option: &str) -> bool {
        self.controls
            .iter()
            .filter(|c| c.name == name)
            .find_map(|c| match &c.kind {
                ControlKind::Choice {
                    options, disabled, ..
                } => options.iter().position(|o| *o == option).map(|i| !disabled[i]),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Steps the selected control up (`direction > 0`) or down.
    pub fn adjust(&mut self, params: &mut P, direction: i32) -> Option<Changed> {
        let control = self.controls.get(self.selected)?;
        if control.adjust(params, direction) {
            Some(Changed {
                name: control.name,
                effect: control.effect,
            })
        } else {
            None
        }
    }

    pub fn handle_key(&mut self, params: &mut P, key: KeyCode) -> Option<Changed> {
        if key == KeyCode::KeyH {
            self.visible = !self.visible;
            return None;
        }
        if !self.visible {
            return None;
        }
        match key {
            KeyCode::Tab | KeyCode::ArrowDown => {
                self.select_next();
                None
            }
            KeyCode::ArrowUp => {
                self.select_prev();
                None
            }
            KeyCode::ArrowRight => self.adjust(params, 1),
            KeyCode::ArrowLeft => self.adjust(params, -1),
            _ => None,
        }
    }

    pub fn handle_window_events(&mut self, params: &mut P, event: &WindowEvent) -> Option<Changed> {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => self.handle_key(params, *key),
            _ => None,
        }
    }

    /// The keyboard selection, e.g. `fov: 75`.
    pub fn selection(&self, params: &P) -> Option<String> {
        self.selected().map(|control| control.describe(params))
    }

    /// Draws the panel into `gui` and applies what the user changed to `params`.
    ///
    /// Every changed control is reported once, in panel order.
    pub fn show(&mut self, gui: &egui::Context, params: &mut P) -> Vec<Changed> {
        let mut changes = Vec::new();
        if !self.visible {
            return changes;
        }
        let selection = self.selection(params);
        egui::Window::new(self.title.as_str())
            .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
            .resizable(false)
            .default_width(280.0)
            .show(gui, |ui| {
                for control in &self.controls {
                    if control.ui(ui, params) {
                        log::debug!("{}", control.describe(params));
                        changes.push(Changed {
                            name: control.name,
                            effect: control.effect,
                        });
                    }
                }
                if let Some(selection) = &selection {
                    ui.separator();
                    ui.weak(format!("keys: {selection}"));
                }
            });
        changes
    }
}

pub fn hex(rgb: [f32; 3]) -> String {
    let [r, g, b] = to_srgb8(rgb);
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn to_srgb8(rgb: [f32; 3]) -> [u8; 3] {
    rgb.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn from_srgb8(srgb: [u8; 3]) -> [f32; 3] {
    srgb.map(|v| f32::from(v) / 255.0)
}

pub fn rgb_to_hsv([r, g, b]: [f32; 3]) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;
    let h = if d <= f32::EPSILON {
        0.0
    } else if max == r {
        ((g - b) / d).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };
    let s = if max <= f32::EPSILON { 0.0 } else { d / max };
    [h, s, max]
}

pub fn hsv_to_rgb([h, s, v]: [f32; 3]) -> [f32; 3] {
    let h6 = h.rem_euclid(1.0) * 6.0;
    let c = v * s;
    let x = c * (1.0 - (h6.rem_euclid(2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h6 as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}
