//! flow-activities
//!
//! Interactive 3D-graphics lessons (animation, cameras, geometries, textures,
//! materials and 3D text) rendered with WGPU, running natively and in the
//! browser. One activity runs at a time, selected with the `activity` URL
//! query parameter on the web or the `FLOW_ACTIVITY` environment variable and
//! command line natively.
//!
//! Modules
//! - `activities`: the lessons, each a flow with its own parameter object
//! - `camera`: camera, projection, orbit controls and uniforms
//! - `config`: activity selection and asset locations
//! - `context`: window, device, queue, pipelines, camera and light of the running activity
//! - `data_structures`: meshes, procedural geometry, 3D text, textures and materials
//! - `error_panel`: on-screen message when the font cannot be loaded
//! - `flow`: the event loop and the flow abstraction activities implement
//! - `gui`: egui debug panel bound to an activity's parameters, and the egui overlay
//! - `pipelines`: the mesh shader and its pipeline variants
//! - `resources`: asset loading, fonts and procedural textures
//! - `render`: render composition batched by pipeline
//!

pub mod activities;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error_panel;
pub mod flow;
pub mod gui;
pub mod pipelines;
pub mod render;
pub mod resources;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point, reads the activity from the page URL.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let config = config::Config::from_env();
    activities::run(config).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
