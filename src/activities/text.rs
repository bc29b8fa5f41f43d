//! Activity 11: bevelled 3D text surrounded by donuts.
//!
//! The font is fetched through the prioritized location list of the
//! configuration. When every location fails the scene stays empty and the
//! error panel explains how to provide the font.

use cgmath::{Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use rand::{Rng, SeedableRng, rngs::StdRng};
use winit::event::WindowEvent;

use crate::{
    config::{ActivityId, Config},
    context::{Context, InitContext},
    data_structures::{
        geometry::torus,
        instance::Instance,
        material::{Material, MaterialKind, MaterialParams},
        node::MeshNode,
        text::{TextParams, text_geometry},
        texture::{SamplerSettings, Texture},
    },
    error_panel::ErrorPanel,
    flow::{FlowConstructor, GraphicsFlow, Out},
    gui::{Changed, DebugPanel, Effect},
    render::Render,
    resources::{
        HttpAssets,
        font::{FontLoadFailure, FontLoader, LoadedFont, Typeface},
        procedural,
    },
};

pub const TEXT: &str = "Hello Rust";
pub const DONUT_COUNT: usize = 100;
const DONUT_SEED: u64 = 0xd0e;

#[derive(Debug)]
pub struct FontLoaded(pub Result<LoadedFont, FontLoadFailure>);

#[derive(Debug, Clone, PartialEq)]
pub struct TextActivityParams {
    pub size: f32,
    pub depth: f32,
    pub curve_segments: f32,
    pub bevel_enabled: bool,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_segments: f32,
    /// 0 matcap, 1 normal
    pub material: usize,
}

impl Default for TextActivityParams {
    fn default() -> Self {
        let text = TextParams::default();
        Self {
            size: text.size,
            depth: text.depth,
            curve_segments: text.curve_segments as f32,
            bevel_enabled: text.bevel_enabled,
            bevel_thickness: text.bevel_thickness,
            bevel_size: text.bevel_size,
            bevel_segments: text.bevel_segments as f32,
            material: 0,
        }
    }
}

impl TextActivityParams {
    pub fn text(&self) -> TextParams {
        TextParams {
            size: self.size,
            depth: self.depth,
            curve_segments: self.curve_segments as u32,
            bevel_enabled: self.bevel_enabled,
            bevel_thickness: self.bevel_thickness,
            bevel_size: self.bevel_size,
            bevel_segments: self.bevel_segments as u32,
            ..Default::default()
        }
    }

    pub fn material(&self) -> MaterialParams {
        let kind = if self.material == 0 {
            MaterialKind::Matcap
        } else {
            MaterialKind::Normal
        };
        MaterialParams::with_kind(kind)
    }
}

pub fn panel() -> DebugPanel<TextActivityParams> {
    DebugPanel::<TextActivityParams>::new(&ActivityId::Text.to_string())
        .slider("size", (0.1, 2.0), 0.05, Effect::Rebuild, |p| p.size, |p, v| p.size = v)
        .slider("depth", (0.0, 1.0), 0.05, Effect::Rebuild, |p| p.depth, |p, v| p.depth = v)
        .slider(
            "curve segments",
            (1.0, 12.0),
            1.0,
            Effect::Rebuild,
            |p| p.curve_segments,
            |p, v| p.curve_segments = v,
        )
        .toggle(
            "bevel",
            Effect::Rebuild,
            |p| p.bevel_enabled,
            |p, v| p.bevel_enabled = v,
        )
        .slider(
            "bevel thickness",
            (0.0, 0.1),
            0.005,
            Effect::Rebuild,
            |p| p.bevel_thickness,
            |p, v| p.bevel_thickness = v,
        )
        .slider(
            "bevel size",
            (0.0, 0.1),
            0.005,
            Effect::Rebuild,
            |p| p.bevel_size,
            |p, v| p.bevel_size = v,
        )
        .slider(
            "bevel segments",
            (0.0, 10.0),
            1.0,
            Effect::Rebuild,
            |p| p.bevel_segments,
            |p, v| p.bevel_segments = v,
        )
        .choice(
            "material",
            &["matcap", "normal"],
            Effect::Write,
            |p| p.material,
            |p, v| p.material = v,
        )
}

/// Donuts scattered in a 10x10x10 cube around the text, same for the same seed.
pub fn donut_instances(count: usize, seed: u64) -> Vec<Instance> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let position = Vector3::new(
                (rng.r#gen::<f32>() - 0.5) * 10.0,
                (rng.r#gen::<f32>() - 0.5) * 10.0,
                (rng.r#gen::<f32>() - 0.5) * 10.0,
            );
            let rotation = Quaternion::from_angle_x(Rad(rng.gen_range(0.0..std::f32::consts::PI)))
                * Quaternion::from_angle_y(Rad(rng.gen_range(0.0..std::f32::consts::PI)));
            Instance {
                position,
                rotation,
                ..Default::default()
            }
            .with_uniform_scale(rng.gen_range(0.2..1.0))
        })
        .collect()
}

pub struct Text {
    loader: FontLoader,
    typeface: Option<Typeface>,
    text: Option<MeshNode>,
    donuts: Option<MeshNode>,
    material: Material,
    panel: DebugPanel<TextActivityParams>,
    /// Shown once every font location failed.
    error: Option<ErrorPanel>,
}

impl Text {
    pub fn new(ctx: InitContext, loader: FontLoader) -> Self {
        let params = TextActivityParams::default();
        let matcap = procedural::matcap_ball(128, [230, 230, 255, 255], [30, 30, 60, 255]);
        let aux = Texture::from_rgba(
            &ctx.device,
            &ctx.queue,
            &matcap,
            "matcap",
            SamplerSettings::default(),
            true,
        );
        let material = Material::new(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            "text",
            params.material(),
            None,
            Some(aux),
        );
        Self {
            loader,
            typeface: None,
            text: None,
            donuts: None,
            material,
            panel: panel(),
            error: None,
        }
    }

    fn apply(&mut self, ctx: &Context, params: &TextActivityParams, changed: Changed) {
        match changed.effect {
            Effect::Rebuild => self.rebuild_text(ctx, params),
            Effect::Write => {
                self.material.params = params.material();
                self.material.write(&ctx.queue);
            }
        }
    }

    fn rebuild_text(&mut self, ctx: &Context, params: &TextActivityParams) {
        let Some(typeface) = &self.typeface else {
            return;
        };
        let mut data = text_geometry(typeface, TEXT, &params.text());
        data.center();
        log::info!("Text mesh with {} triangles", data.triangle_count());
        match &mut self.text {
            Some(node) => node.set_geometry(&ctx.device, &data),
            None => self.text = Some(MeshNode::single(&ctx.device, "text", &data, Instance::new())),
        }
    }
}

pub fn constructor(config: &Config) -> FlowConstructor<TextActivityParams, FontLoaded> {
    let loader = FontLoader::new(config.font_urls.clone());
    let constructor: FlowConstructor<TextActivityParams, FontLoaded> = Box::new(move |ctx| {
        Box::pin(async move { Box::new(Text::new(ctx, loader)) as Box<dyn GraphicsFlow<_, _>> })
    });
    constructor
}

impl GraphicsFlow<TextActivityParams, FontLoaded> for Text {
    fn on_init(
        &mut self,
        ctx: &mut Context,
        state: &mut TextActivityParams,
    ) -> Out<TextActivityParams, FontLoaded> {
        super::look_at_origin(ctx, [1.0, 1.0, 4.0], true);
        ctx.clear_colour = super::clear_colour(0x0b0b12);
        let loader = self.loader.clone();
        Out::event(async move { FontLoaded(loader.load(&HttpAssets).await) })
    }

    fn on_update(
        &mut self,
        _: &Context,
        _: &mut TextActivityParams,
        _: Duration,
    ) -> Out<TextActivityParams, FontLoaded> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut TextActivityParams,
        event: &WindowEvent,
    ) -> Out<TextActivityParams, FontLoaded> {
        if let Some(changed) = self.panel.handle_window_events(state, event) {
            self.apply(ctx, state, changed);
        }
        Out::Empty
    }

    fn on_gui(
        &mut self,
        ctx: &Context,
        state: &mut TextActivityParams,
        gui: &egui::Context,
    ) -> Out<TextActivityParams, FontLoaded> {
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(error) = &self.error {
            error.ui(gui);
        }
        for changed in self.panel.show(gui, state) {
            self.apply(ctx, state, changed);
        }
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        state: &mut TextActivityParams,
        event: FontLoaded,
    ) -> Option<FontLoaded> {
        match event.0 {
            Ok(font) => {
                log::info!("Using font {} from {}", font.typeface.family_name, font.url);
                self.typeface = Some(font.typeface);
                self.rebuild_text(ctx, state);
                self.donuts = Some(MeshNode::new(
                    &ctx.device,
                    "donuts",
                    &torus(0.3, 0.2, 20, 45),
                    donut_instances(DONUT_COUNT, DONUT_SEED),
                ));
            }
            Err(failure) => {
                log::error!("{}", failure);
                let error = ErrorPanel::for_font_failure(&failure);
                for line in error.lines() {
                    log::error!("{}", line);
                }
                #[cfg(target_arch = "wasm32")]
                if let Err(e) = error.show_dom() {
                    log::error!("Cannot show the error panel: {:?}", e);
                }
                self.error = Some(error);
            }
        }
        None
    }

    fn on_render(&self) -> Render<'_> {
        let drawables: Vec<_> = [&self.text, &self.donuts]
            .into_iter()
            .flatten()
            .map(|node| node.drawable(&self.material))
            .collect();
        drawables.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::font::tests::box_font;

    #[test]
    fn donuts_should_be_deterministic_and_inside_the_cube() {
        let a = donut_instances(DONUT_COUNT, 7);
        let b = donut_instances(DONUT_COUNT, 7);
        assert_eq!(a.len(), DONUT_COUNT);
        assert_eq!(a, b);
        for donut in &a {
            for c in [donut.position.x, donut.position.y, donut.position.z] {
                assert!((-5.0..=5.0).contains(&c));
            }
            assert!(donut.scale.x >= 0.2 && donut.scale.x < 1.0);
        }
        assert_ne!(a, donut_instances(DONUT_COUNT, 8));
    }

    #[test]
    fn text_controls_should_rebuild_and_material_should_write() {
        let mut panel = panel();
        let mut params = TextActivityParams::default();
        for name in ["size", "depth", "curve segments", "bevel", "bevel size"] {
            assert!(panel.select(name));
            let changed = panel.adjust(&mut params, 1);
            assert_eq!(changed.map(|c| c.effect), Some(Effect::Rebuild), "{name}");
        }
        assert!(!params.bevel_enabled);
        assert!(panel.select("material"));
        assert_eq!(panel.adjust(&mut params, 1).map(|c| c.effect), Some(Effect::Write));
        assert_eq!(params.material().kind, MaterialKind::Normal);
    }

    #[test]
    fn params_should_drive_the_text_geometry() {
        let font = box_font();
        let params = TextActivityParams {
            bevel_enabled: false,
            ..Default::default()
        };
        let mut data = text_geometry(&font, "io", &params.text());
        assert!(data.triangle_count() > 0);
        data.center();
        let (min, max) = data.bounding_box().unwrap();
        for axis in 0..3 {
            assert!((min[axis] + max[axis]).abs() < 1e-4);
        }
        assert!((max[2] - min[2] - params.depth).abs() < 1e-4);
    }
}
