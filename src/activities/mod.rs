//! The tutorial activities. Exactly one runs per page load (or process).
//!
//! Every activity is a [`GraphicsFlow`](crate::flow::GraphicsFlow) whose
//! state is its flat parameter object, the same object its debug panel edits.

pub mod animation;
pub mod camera;
pub mod geometries;
pub mod materials;
pub mod text;
pub mod textures;

use cgmath::Point3;

use crate::{
    config::{ActivityId, Config},
    context::Context,
    flow, resources,
};

/// Starts the activity selected by `config` and blocks natively until its window closes.
pub fn run(config: Config) -> anyhow::Result<()> {
    crate::config::init_logging();
    resources::set_asset_root(&config.asset_root);
    log::info!("Starting activity {}", config.activity);
    match config.activity {
        ActivityId::Animation => flow::run(vec![animation::constructor()]),
        ActivityId::Camera => flow::run(vec![camera::constructor()]),
        ActivityId::Geometries => flow::run(vec![geometries::constructor()]),
        ActivityId::Textures => flow::run(vec![textures::constructor()]),
        ActivityId::Materials => flow::run(vec![materials::constructor()]),
        ActivityId::Text => flow::run(vec![text::constructor(&config)]),
    }
}

/// Puts the camera at `position` looking at the origin.
pub(crate) fn look_at_origin(ctx: &mut Context, position: [f32; 3], orbit: bool) {
    ctx.camera.camera.position = Point3::from(position);
    ctx.camera.camera.target = Point3::new(0.0, 0.0, 0.0);
    ctx.camera.controls.enabled = orbit;
    ctx.write_camera();
}

pub(crate) fn clear_colour(rgb: u32) -> wgpu::Color {
    let [r, g, b] = crate::data_structures::material::srgb_to_linear(
        crate::data_structures::material::rgb_from_hex(rgb),
    );
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}
