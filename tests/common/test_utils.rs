use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin};

use flow_activities::resources::AssetSource;

/// Minimal typeface with a filled "H", an "i" and a blank space.
pub const TINY_FONT: &str = r#"{
    "glyphs": {
        "H": { "ha": 900, "x_min": 0, "x_max": 800,
               "o": "m 0 0 l 200 0 l 200 400 l 600 400 l 600 0 l 800 0 l 800 1000 l 600 1000 l 600 600 l 200 600 l 200 1000 l 0 1000 z" },
        "i": { "ha": 300, "x_min": 0, "x_max": 200,
               "o": "m 0 0 l 200 0 l 200 700 l 0 700 z" },
        " ": { "ha": 400 }
    },
    "familyName": "Tiny",
    "resolution": 1000,
    "boundingBox": { "xMin": 0, "xMax": 900, "yMin": -200, "yMax": 1000 },
    "underlineThickness": 50
}"#;

/// Serves canned responses and records the order of requests.
#[derive(Default)]
pub struct FakeAssets {
    responses: HashMap<String, Result<Vec<u8>, String>>,
    pub requested: RefCell<Vec<String>>,
}

impl FakeAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), Ok(body.as_bytes().to_vec()));
        self
    }

    pub fn fail(mut self, url: &str, reason: &str) -> Self {
        self.responses
            .insert(url.to_string(), Err(reason.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl AssetSource for FakeAssets {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + 'a>> {
        self.requested.borrow_mut().push(url.to_string());
        let response = match self.responses.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(reason)) => Err(anyhow::anyhow!("{reason}")),
            None => Err(anyhow::anyhow!("404 Not Found")),
        };
        Box::pin(async move { response })
    }
}
