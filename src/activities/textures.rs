//! Activity 9: image and procedural textures, uv transforms and sampling.

use cgmath::{Deg, Quaternion, Rad, Rotation3, Vector2};
use image::RgbaImage;
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    config::ActivityId,
    context::{Context, InitContext},
    data_structures::{
        geometry::box_geometry,
        instance::Instance,
        material::{Material, MaterialParams},
        node::MeshNode,
        texture::{Filter, SamplerSettings, Texture, TextureTransform, Wrap},
    },
    flow::{FlowConstructor, GraphicsFlow, Out},
    gui::{Changed, DebugPanel, Effect},
    render::Render,
    resources::{self, procedural},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureChoice {
    Door,
    Checkerboard,
    Minecraft,
    Gradient,
}

impl TextureChoice {
    pub const ALL: [TextureChoice; 4] = [
        TextureChoice::Door,
        TextureChoice::Checkerboard,
        TextureChoice::Minecraft,
        TextureChoice::Gradient,
    ];
    pub const NAMES: [&'static str; 4] = ["door", "checkerboard", "minecraft", "gradient"];

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn name(&self) -> &'static str {
        Self::NAMES[self.index()]
    }

    /// Image below the asset root, `None` for purely procedural textures.
    pub fn path(&self) -> Option<&'static str> {
        match self {
            TextureChoice::Door => Some("textures/door/color.jpg"),
            TextureChoice::Checkerboard => Some("textures/checkerboard-1024x1024.png"),
            TextureChoice::Minecraft => Some("textures/minecraft.png"),
            TextureChoice::Gradient => None,
        }
    }

    pub fn has_fallback(&self) -> bool {
        *self != TextureChoice::Minecraft
    }

    /// Drawn image used while the file is loading or when it is missing.
    /// The minecraft texture has none: without the file the option is disabled.
    pub fn procedural(&self) -> Option<RgbaImage> {
        match self {
            TextureChoice::Door => Some(procedural::checkerboard(
                256,
                4,
                [124, 82, 52, 255],
                [92, 58, 36, 255],
            )),
            TextureChoice::Checkerboard => Some(procedural::checkerboard(
                1024,
                8,
                procedural::WHITE,
                procedural::BLACK,
            )),
            TextureChoice::Minecraft => None,
            TextureChoice::Gradient => Some(procedural::gradient(
                256,
                256,
                [255, 136, 0, 255],
                [48, 0, 96, 255],
            )),
        }
    }
}

#[derive(Debug)]
pub struct TextureLoaded {
    pub choice: TextureChoice,
    pub image: anyhow::Result<RgbaImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureParams {
    /// Index into [`TextureChoice::ALL`].
    pub texture: usize,
    pub repeat_x: f32,
    pub repeat_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    /// Degrees around the texture centre.
    pub rotation: f32,
    /// Index into [`Wrap::ALL`].
    pub wrap: usize,
    /// Index into [`Filter::ALL`].
    pub mag_filter: usize,
    pub min_filter: usize,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            texture: TextureChoice::Door.index(),
            repeat_x: 1.0,
            repeat_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
            wrap: 0,
            mag_filter: 1,
            min_filter: 1,
        }
    }
}

impl TextureParams {
    pub fn choice(&self) -> TextureChoice {
        TextureChoice::from_index(self.texture)
    }

    pub fn transform(&self) -> TextureTransform {
        TextureTransform {
            repeat: Vector2::new(self.repeat_x, self.repeat_y),
            offset: Vector2::new(self.offset_x, self.offset_y),
            rotation: Rad::from(Deg(self.rotation)).0,
            center: Vector2::new(0.5, 0.5),
        }
    }

    pub fn sampler(&self) -> SamplerSettings {
        let filter = |i: usize| Filter::ALL[i.min(Filter::ALL.len() - 1)];
        SamplerSettings {
            wrap: Wrap::ALL[self.wrap.min(Wrap::ALL.len() - 1)],
            mag_filter: filter(self.mag_filter),
            min_filter: filter(self.min_filter),
        }
    }

    pub fn material(&self) -> MaterialParams {
        MaterialParams {
            uv: self.transform(),
            ..Default::default()
        }
    }
}

pub fn panel() -> DebugPanel<TextureParams> {
    let mut panel = DebugPanel::<TextureParams>::new(&ActivityId::Textures.to_string())
        .choice(
            "texture",
            &TextureChoice::NAMES,
            Effect::Rebuild,
            |p| p.texture,
            |p, v| p.texture = v,
        )
        .slider("repeat x", (0.1, 10.0), 0.1, Effect::Write, |p| p.repeat_x, |p, v| p.repeat_x = v)
        .slider("repeat y", (0.1, 10.0), 0.1, Effect::Write, |p| p.repeat_y, |p, v| p.repeat_y = v)
        .slider("offset x", (-1.0, 1.0), 0.05, Effect::Write, |p| p.offset_x, |p, v| p.offset_x = v)
        .slider("offset y", (-1.0, 1.0), 0.05, Effect::Write, |p| p.offset_y, |p, v| p.offset_y = v)
        .slider(
            "rotation",
            (-180.0, 180.0),
            15.0,
            Effect::Write,
            |p| p.rotation,
            |p, v| p.rotation = v,
        )
        .choice("wrap", &Wrap::NAMES, Effect::Rebuild, |p| p.wrap, |p, v| p.wrap = v)
        .choice(
            "mag filter",
            &Filter::NAMES,
            Effect::Rebuild,
            |p| p.mag_filter,
            |p, v| p.mag_filter = v,
        )
        .choice(
            "min filter",
            &Filter::NAMES,
            Effect::Rebuild,
            |p| p.min_filter,
            |p, v| p.min_filter = v,
        );
    // enabled once the image arrived
    panel.set_option_enabled("texture", TextureChoice::Minecraft.name(), false);
    panel
}

pub struct Textures {
    cube: MeshNode,
    material: Material,
    panel: DebugPanel<TextureParams>,
    images: Vec<Option<RgbaImage>>,
    angle: f32,
}

impl Textures {
    pub fn new(ctx: InitContext) -> Self {
        let params = TextureParams::default();
        let images: Vec<_> = TextureChoice::ALL.iter().map(|c| c.procedural()).collect();
        let cube = MeshNode::single(
            &ctx.device,
            "cube",
            &box_geometry(1.0, 1.0, 1.0, 1, 1, 1),
            Instance::new(),
        );
        let map = images[params.texture].as_ref().map(|img| {
            Texture::from_rgba(&ctx.device, &ctx.queue, img, "map", params.sampler(), true)
        });
        let material = Material::new(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            "cube",
            params.material(),
            map,
            None,
        );
        Self {
            cube,
            material,
            panel: panel(),
            images,
            angle: 0.0,
        }
    }

    /// Uploads the image of the selected choice, the old texture is dropped.
    fn apply_texture(&mut self, ctx: &Context, params: &TextureParams) {
        let choice = params.choice();
        let map = self.images[choice.index()].as_ref().map(|img| {
            Texture::from_rgba(&ctx.device, &ctx.queue, img, choice.name(), params.sampler(), true)
        });
        if map.is_none() {
            log::warn!("No image for texture {}", choice.name());
        }
        self.material
            .set_map(&ctx.device, &ctx.queue, &ctx.material_layout, map);
    }
}

impl Textures {
    fn apply(&mut self, ctx: &Context, params: &mut TextureParams, changed: Changed) {
        match (changed.effect, changed.name) {
            (Effect::Rebuild, "texture") => {
                if params.choice() == TextureChoice::Minecraft {
                    // pixel art wants hard texel edges
                    params.mag_filter = 0;
                }
                self.apply_texture(ctx, params);
            }
            (Effect::Rebuild, _) => {
                self.material
                    .set_map_sampler(&ctx.device, &ctx.material_layout, params.sampler());
            }
            (Effect::Write, _) => {
                self.material.params.uv = params.transform();
                self.material.write(&ctx.queue);
            }
        }
    }
}

pub fn constructor() -> FlowConstructor<TextureParams, TextureLoaded> {
    let constructor: FlowConstructor<TextureParams, TextureLoaded> = Box::new(|ctx| {
        Box::pin(async move { Box::new(Textures::new(ctx)) as Box<dyn GraphicsFlow<_, _>> })
    });
    constructor
}

impl GraphicsFlow<TextureParams, TextureLoaded> for Textures {
    fn on_init(
        &mut self,
        ctx: &mut Context,
        state: &mut TextureParams,
    ) -> Out<TextureParams, TextureLoaded> {
        super::look_at_origin(ctx, [1.0, 1.0, 2.0], true);
        ctx.clear_colour = super::clear_colour(0x1a1a1a);

        let loads = TextureChoice::ALL
            .iter()
            .filter_map(|choice| choice.path().map(|path| (*choice, path)))
            .map(|(choice, path)| {
                Box::new(async move {
                    TextureLoaded {
                        choice,
                        image: resources::load_image(path).await,
                    }
                }) as Box<dyn Future<Output = TextureLoaded>>
            })
            .collect();
        Out::FutEvent(loads)
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        _: &mut TextureParams,
        dt: Duration,
    ) -> Out<TextureParams, TextureLoaded> {
        self.angle = (self.angle + 0.3 * dt.as_secs_f32()) % std::f32::consts::TAU;
        self.cube.instances[0].rotation = Quaternion::from_angle_y(Rad(self.angle));
        self.cube.write_to_buffer(&ctx.device, &ctx.queue);
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut TextureParams,
        event: &WindowEvent,
    ) -> Out<TextureParams, TextureLoaded> {
        if let Some(changed) = self.panel.handle_window_events(state, event) {
            self.apply(ctx, state, changed);
        }
        Out::Empty
    }

    fn on_gui(
        &mut self,
        ctx: &Context,
        state: &mut TextureParams,
        gui: &egui::Context,
    ) -> Out<TextureParams, TextureLoaded> {
        for changed in self.panel.show(gui, state) {
            self.apply(ctx, state, changed);
        }
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        state: &mut TextureParams,
        event: TextureLoaded,
    ) -> Option<TextureLoaded> {
        let TextureLoaded { choice, image } = event;
        match image {
            Ok(image) => {
                log::info!("Loaded texture {}", choice.name());
                self.images[choice.index()] = Some(image);
                self.panel.set_option_enabled("texture", choice.name(), true);
                if state.choice() == choice {
                    self.apply_texture(ctx, state);
                }
            }
            Err(e) if choice.has_fallback() => {
                log::warn!(
                    "Texture {} not available, keeping the procedural one: {:#}",
                    choice.name(),
                    e
                );
            }
            Err(e) => {
                log::warn!("Texture {} not available, option disabled: {:#}", choice.name(), e);
            }
        }
        None
    }

    fn on_render(&self) -> Render<'_> {
        self.cube.drawable(&self.material).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    #[test]
    fn minecraft_should_be_disabled_until_loaded() {
        let mut panel = panel();
        let mut params = TextureParams::default();
        assert!(!panel.is_option_enabled("texture", "minecraft"));
        panel.handle_key(&mut params, KeyCode::ArrowRight);
        panel.handle_key(&mut params, KeyCode::ArrowRight);
        assert_eq!(params.choice(), TextureChoice::Gradient);

        panel.set_option_enabled("texture", "minecraft", true);
        panel.handle_key(&mut params, KeyCode::ArrowLeft);
        assert_eq!(params.choice(), TextureChoice::Minecraft);
    }

    #[test]
    fn every_choice_except_minecraft_should_have_a_fallback() {
        for choice in TextureChoice::ALL {
            let image = choice.procedural();
            assert_eq!(image.is_some(), choice.has_fallback());
            assert_eq!(choice.path().is_none(), choice == TextureChoice::Gradient);
        }
    }

    #[test]
    fn uv_controls_should_write_and_sampling_controls_should_rebuild() {
        let mut panel = panel();
        let mut params = TextureParams::default();
        for name in ["repeat x", "repeat y", "offset x", "offset y", "rotation"] {
            assert!(panel.select(name));
            let changed = panel.adjust(&mut params, 1);
            assert_eq!(changed.map(|c| c.effect), Some(Effect::Write), "{name}");
        }
        for name in ["wrap", "mag filter", "min filter"] {
            assert!(panel.select(name));
            let changed = panel.adjust(&mut params, 1);
            assert_eq!(changed.map(|c| c.effect), Some(Effect::Rebuild), "{name}");
        }
        let transform = params.transform();
        assert!((transform.repeat.x - 1.1).abs() < 1e-5);
        assert!((transform.offset.y - 0.05).abs() < 1e-5);
        assert!((transform.rotation - 15f32.to_radians()).abs() < 1e-5);
        assert_eq!(
            params.sampler(),
            SamplerSettings {
                wrap: Wrap::Clamp,
                mag_filter: Filter::Nearest,
                min_filter: Filter::Nearest,
            }
        );
    }
}
