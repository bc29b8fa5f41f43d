//! Activity 10: one material shared by a sphere, a plane and a torus.
//!
//! Switching the material type replaces the material; colour, metalness,
//! roughness and friends are written into the live uniform.

use cgmath::{Quaternion, Rad, Rotation3, Vector3};
use image::RgbaImage;
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    config::ActivityId,
    context::{Context, InitContext},
    data_structures::{
        geometry::{plane, sphere, torus},
        instance::Instance,
        material::{Material, MaterialKind, MaterialParams, rgb_from_hex, srgb_to_linear},
        node::MeshNode,
        texture::{Filter, SamplerSettings, Texture, Wrap},
    },
    flow::{FlowConstructor, GraphicsFlow, Out},
    gui::{Changed, DebugPanel, Effect},
    pipelines::light::LightUniform,
    render::Render,
    resources::{self, procedural},
};

pub const MATCAP_COUNT: usize = 8;
const MATCAP_NAMES: [&str; MATCAP_COUNT] = ["1", "2", "3", "4", "5", "6", "7", "8"];

pub fn matcap_path(index: usize) -> String {
    format!("textures/matcaps/{}.png", index + 1)
}

#[derive(Debug)]
pub struct MatcapLoaded {
    pub index: usize,
    pub image: anyhow::Result<RgbaImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialsParams {
    /// Index into [`MaterialKind::ALL`].
    pub material_type: usize,
    /// sRGB
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub shininess: f32,
    pub wireframe: bool,
    pub flat_shading: bool,
    pub matcap_index: usize,
    pub toon_steps: f32,
}

impl Default for MaterialsParams {
    fn default() -> Self {
        Self {
            material_type: MaterialKind::Standard.index(),
            color: rgb_from_hex(0xffffff),
            metalness: 0.45,
            roughness: 0.65,
            shininess: 100.0,
            wireframe: false,
            flat_shading: false,
            matcap_index: 0,
            toon_steps: 3.0,
        }
    }
}

impl MaterialsParams {
    pub fn kind(&self) -> MaterialKind {
        MaterialKind::from_index(self.material_type)
    }

    pub fn material(&self) -> MaterialParams {
        MaterialParams {
            kind: self.kind(),
            color: srgb_to_linear(self.color),
            metalness: self.metalness,
            roughness: self.roughness,
            shininess: self.shininess,
            wireframe: self.wireframe,
            double_sided: true,
            flat_shading: self.flat_shading,
            ..Default::default()
        }
    }
}

pub fn panel() -> DebugPanel<MaterialsParams> {
    let mut panel = DebugPanel::<MaterialsParams>::new(&ActivityId::Materials.to_string())
        .choice(
            "material type",
            &MaterialKind::NAMES,
            Effect::Rebuild,
            |p| p.material_type,
            |p, v| p.material_type = v,
        )
        .color("color", Effect::Write, |p| p.color, |p, v| p.color = v)
        .slider(
            "metalness",
            (0.0, 1.0),
            0.05,
            Effect::Write,
            |p| p.metalness,
            |p, v| p.metalness = v,
        )
        .slider(
            "roughness",
            (0.0, 1.0),
            0.05,
            Effect::Write,
            |p| p.roughness,
            |p, v| p.roughness = v,
        )
        .slider(
            "shininess",
            (1.0, 200.0),
            5.0,
            Effect::Write,
            |p| p.shininess,
            |p, v| p.shininess = v,
        )
        .toggle("wireframe", Effect::Write, |p| p.wireframe, |p, v| p.wireframe = v)
        .toggle(
            "flat shading",
            Effect::Write,
            |p| p.flat_shading,
            |p, v| p.flat_shading = v,
        )
        .choice(
            "matcap",
            &MATCAP_NAMES,
            Effect::Rebuild,
            |p| p.matcap_index,
            |p, v| p.matcap_index = v,
        )
        .slider(
            "toon steps",
            (2.0, 8.0),
            1.0,
            Effect::Rebuild,
            |p| p.toon_steps,
            |p, v| p.toon_steps = v,
        );
    for name in MATCAP_NAMES {
        panel.set_option_enabled("matcap", name, false);
    }
    panel
}

/// Second texture slot for `params`: the matcap image (or a drawn ball while
/// none is available) or the toon ramp.
pub fn aux_image(params: &MaterialsParams, matcaps: &[Option<RgbaImage>]) -> Option<RgbaImage> {
    match params.kind() {
        MaterialKind::Matcap => Some(
            matcaps
                .get(params.matcap_index)
                .and_then(Option::clone)
                .unwrap_or_else(|| procedural::matcap_ball(128, procedural::WHITE, [40, 40, 56, 255])),
        ),
        MaterialKind::Toon => Some(procedural::toon_gradient(params.toon_steps as u32)),
        _ => None,
    }
}

pub struct Materials {
    sphere: MeshNode,
    plane: MeshNode,
    torus: MeshNode,
    material: Material,
    panel: DebugPanel<MaterialsParams>,
    matcaps: Vec<Option<RgbaImage>>,
}

impl Materials {
    pub fn new(ctx: InitContext) -> Self {
        let params = MaterialsParams::default();
        let at = |x: f32| Instance::from(Vector3::new(x, 0.0, 0.0));
        let matcaps = vec![None; MATCAP_COUNT];
        let material = mk_material(&ctx.device, &ctx.queue, &ctx.material_layout, &params, &matcaps);
        Self {
            sphere: MeshNode::single(&ctx.device, "sphere", &sphere(0.5, 64, 64), at(-1.5)),
            plane: MeshNode::single(&ctx.device, "plane", &plane(1.0, 1.0, 100, 100), at(0.0)),
            torus: MeshNode::single(&ctx.device, "torus", &torus(0.3, 0.2, 64, 128), at(1.5)),
            material,
            panel: panel(),
            matcaps,
        }
    }

    fn rebuild(&mut self, ctx: &Context, params: &MaterialsParams) {
        log::info!("Material {}", params.kind().name());
        self.material = mk_material(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            params,
            &self.matcaps,
        );
    }

    /// Swaps the matcap image or toon ramp, the material itself stays.
    fn refresh_aux(&mut self, ctx: &Context, params: &MaterialsParams) {
        let aux = mk_aux(&ctx.device, &ctx.queue, params, &self.matcaps);
        self.material
            .set_aux(&ctx.device, &ctx.queue, &ctx.material_layout, aux);
    }

    fn apply(&mut self, ctx: &Context, params: &MaterialsParams, changed: Changed) {
        match changed.effect {
            Effect::Rebuild if changed.name == "material type" => self.rebuild(ctx, params),
            Effect::Rebuild => self.refresh_aux(ctx, params),
            Effect::Write => {
                self.material.params = params.material();
                self.material.write(&ctx.queue);
            }
        }
    }
}

fn mk_aux(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    params: &MaterialsParams,
    matcaps: &[Option<RgbaImage>],
) -> Option<Texture> {
    aux_image(params, matcaps).map(|img| {
        let settings = if params.kind() == MaterialKind::Toon {
            SamplerSettings {
                wrap: Wrap::Clamp,
                mag_filter: Filter::Nearest,
                min_filter: Filter::Nearest,
            }
        } else {
            SamplerSettings::default()
        };
        Texture::from_rgba(device, queue, &img, "aux", settings, params.kind() == MaterialKind::Matcap)
    })
}

fn mk_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    params: &MaterialsParams,
    matcaps: &[Option<RgbaImage>],
) -> Material {
    let aux = mk_aux(device, queue, params, matcaps);
    Material::new(device, queue, layout, "shared", params.material(), None, aux)
}

pub fn constructor() -> FlowConstructor<MaterialsParams, MatcapLoaded> {
    let constructor: FlowConstructor<MaterialsParams, MatcapLoaded> = Box::new(|ctx| {
        Box::pin(async move { Box::new(Materials::new(ctx)) as Box<dyn GraphicsFlow<_, _>> })
    });
    constructor
}

impl GraphicsFlow<MaterialsParams, MatcapLoaded> for Materials {
    fn on_init(
        &mut self,
        ctx: &mut Context,
        state: &mut MaterialsParams,
    ) -> Out<MaterialsParams, MatcapLoaded> {
        super::look_at_origin(ctx, [1.0, 1.0, 2.0], true);
        ctx.clear_colour = super::clear_colour(0x000000);
        ctx.light.uniform = LightUniform::new([2.0, 3.0, 4.0], 1.0, 0.5);
        ctx.light.write(&ctx.queue);

        Out::FutEvent(
            (0..MATCAP_COUNT)
                .map(|index| {
                    Box::new(async move {
                        let path = matcap_path(index);
                        MatcapLoaded {
                            index,
                            image: resources::load_image(&path).await,
                        }
                    }) as Box<dyn Future<Output = MatcapLoaded>>
                })
                .collect(),
        )
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        _: &mut MaterialsParams,
        _: Duration,
    ) -> Out<MaterialsParams, MatcapLoaded> {
        let t = ctx.clock.elapsed().as_secs_f32();
        let rotation = Quaternion::from_angle_y(Rad(0.1 * t)) * Quaternion::from_angle_x(Rad(0.15 * t));
        for node in [&mut self.sphere, &mut self.plane, &mut self.torus] {
            node.instances[0].rotation = rotation;
            node.write_to_buffer(&ctx.device, &ctx.queue);
        }
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut MaterialsParams,
        event: &WindowEvent,
    ) -> Out<MaterialsParams, MatcapLoaded> {
        if let Some(changed) = self.panel.handle_window_events(state, event) {
            self.apply(ctx, state, changed);
        }
        Out::Empty
    }

    fn on_gui(
        &mut self,
        ctx: &Context,
        state: &mut MaterialsParams,
        gui: &egui::Context,
    ) -> Out<MaterialsParams, MatcapLoaded> {
        for changed in self.panel.show(gui, state) {
            self.apply(ctx, state, changed);
        }
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        state: &mut MaterialsParams,
        event: MatcapLoaded,
    ) -> Option<MatcapLoaded> {
        match event.image {
            Ok(image) => {
                let first = self.matcaps.iter().all(Option::is_none);
                self.matcaps[event.index] = Some(image);
                self.panel
                    .set_option_enabled("matcap", MATCAP_NAMES[event.index], true);
                if first {
                    state.matcap_index = event.index;
                }
                if state.kind() == MaterialKind::Matcap && state.matcap_index == event.index {
                    self.refresh_aux(ctx, state);
                }
            }
            Err(e) => log::warn!(
                "Matcap {} not available, option disabled: {:#}",
                matcap_path(event.index),
                e
            ),
        }
        None
    }

    fn on_render(&self) -> Render<'_> {
        vec![
            self.sphere.drawable(&self.material),
            self.plane.drawable(&self.material),
            self.torus.drawable(&self.material),
        ]
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    #[test]
    fn every_material_type_should_produce_that_kind() {
        let mut panel = panel();
        let mut params = MaterialsParams {
            material_type: 0,
            ..Default::default()
        };
        for kind in MaterialKind::ALL.iter().skip(1) {
            let changed = panel.handle_key(&mut params, KeyCode::ArrowRight);
            assert_eq!(changed.map(|c| c.effect), Some(Effect::Rebuild));
            assert_eq!(params.material().kind, *kind);
            assert_eq!(aux_image(&params, &[]).is_some(), kind.uses_aux_texture());
        }
    }

    #[test]
    fn numeric_controls_should_write() {
        let mut panel = panel();
        let mut params = MaterialsParams::default();
        for name in ["color", "metalness", "roughness", "shininess", "wireframe", "flat shading"] {
            assert!(panel.select(name));
            let changed = panel.adjust(&mut params, -1);
            assert_eq!(changed.map(|c| c.effect), Some(Effect::Write), "{name}");
        }
        let material = params.material();
        assert!((material.metalness - 0.4).abs() < 1e-5);
        assert!((material.roughness - 0.6).abs() < 1e-5);
        assert_eq!(material.shininess, 96.0);
        assert!(material.wireframe && material.flat_shading);
    }

    #[test]
    fn matcaps_should_stay_disabled_until_loaded() {
        let mut panel = panel();
        let mut params = MaterialsParams::default();
        panel.select("matcap");
        assert_eq!(panel.adjust(&mut params, 1), None);
        panel.set_option_enabled("matcap", "3", true);
        panel.set_option_enabled("matcap", "1", true);
        panel.adjust(&mut params, 1);
        assert_eq!(params.matcap_index, 2);
    }

    #[test]
    fn matcap_should_fall_back_to_a_drawn_ball() {
        let params = MaterialsParams {
            material_type: MaterialKind::Matcap.index(),
            matcap_index: 4,
            ..Default::default()
        };
        let ball = aux_image(&params, &vec![None; MATCAP_COUNT]);
        assert_eq!(ball.map(|img| img.dimensions()), Some((128, 128)));

        let mut loaded = vec![None; MATCAP_COUNT];
        loaded[4] = Some(RgbaImage::new(2, 2));
        let image = aux_image(&params, &loaded);
        assert_eq!(image.map(|img| img.dimensions()), Some((2, 2)));
    }

    #[test]
    fn toon_ramp_should_follow_the_steps() {
        let params = MaterialsParams {
            material_type: MaterialKind::Toon.index(),
            toon_steps: 5.0,
            ..Default::default()
        };
        assert_eq!(aux_image(&params, &[]).map(|img| img.width()), Some(5));
    }
}
