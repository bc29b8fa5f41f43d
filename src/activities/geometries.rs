//! Activity 8: built-in and custom geometries.
//!
//! Changing the shape or its subdivisions throws the old mesh away and builds
//! a new one; colour and wireframe only touch the material uniform.

use cgmath::{Quaternion, Rad, Rotation3};
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    config::ActivityId,
    context::{Context, InitContext},
    data_structures::{
        geometry::{GeometryKind, MeshData},
        instance::Instance,
        material::{Material, MaterialParams, rgb_from_hex, srgb_to_linear},
        node::MeshNode,
    },
    flow::{FlowConstructor, GraphicsFlow, Out},
    gui::{Changed, DebugPanel, Effect},
    render::Render,
};

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryParams {
    /// Index into [`GeometryKind::ALL`].
    pub kind: usize,
    pub width_segments: f32,
    pub height_segments: f32,
    /// sRGB
    pub color: [f32; 3],
    pub wireframe: bool,
    pub rotate: bool,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            kind: GeometryKind::Box.index(),
            width_segments: 2.0,
            height_segments: 2.0,
            color: rgb_from_hex(0x00ff88),
            wireframe: true,
            rotate: true,
        }
    }
}

impl GeometryParams {
    pub fn kind(&self) -> GeometryKind {
        GeometryKind::from_index(self.kind)
    }

    pub fn geometry(&self) -> MeshData {
        self.kind()
            .build(self.width_segments as u32, self.height_segments as u32)
    }

    pub fn material(&self) -> MaterialParams {
        MaterialParams {
            color: srgb_to_linear(self.color),
            wireframe: self.wireframe,
            double_sided: true,
            ..Default::default()
        }
    }
}

pub fn panel() -> DebugPanel<GeometryParams> {
    DebugPanel::<GeometryParams>::new(&ActivityId::Geometries.to_string())
        .choice(
            "geometry",
            &GeometryKind::NAMES,
            Effect::Rebuild,
            |p| p.kind,
            |p, v| p.kind = v,
        )
        .slider(
            "width segments",
            (1.0, 32.0),
            1.0,
            Effect::Rebuild,
            |p| p.width_segments,
            |p, v| p.width_segments = v,
        )
        .slider(
            "height segments",
            (1.0, 32.0),
            1.0,
            Effect::Rebuild,
            |p| p.height_segments,
            |p, v| p.height_segments = v,
        )
        .color("color", Effect::Write, |p| p.color, |p, v| p.color = v)
        .toggle("wireframe", Effect::Write, |p| p.wireframe, |p, v| p.wireframe = v)
        .toggle("rotate", Effect::Write, |p| p.rotate, |p, v| p.rotate = v)
}

pub struct Geometries {
    node: MeshNode,
    material: Material,
    panel: DebugPanel<GeometryParams>,
    angle: f32,
}

impl Geometries {
    pub fn new(ctx: InitContext) -> Self {
        let params = GeometryParams::default();
        let node = MeshNode::single(&ctx.device, "geometry", &params.geometry(), Instance::new());
        let material = Material::new(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            "geometry",
            params.material(),
            None,
            None,
        );
        Self {
            node,
            material,
            panel: panel(),
            angle: 0.0,
        }
    }

    fn rebuild(&mut self, ctx: &Context, params: &GeometryParams) {
        let data = params.geometry();
        log::info!(
            "{} with {} vertices and {} triangles",
            params.kind().name(),
            data.vertices.len(),
            data.triangle_count()
        );
        self.node.set_geometry(&ctx.device, &data);
    }

    fn apply(&mut self, ctx: &Context, params: &GeometryParams, changed: Changed) {
        match changed.effect {
            Effect::Rebuild => self.rebuild(ctx, params),
            Effect::Write => {
                self.material.params = params.material();
                self.material.write(&ctx.queue);
            }
        }
    }
}

pub fn constructor() -> FlowConstructor<GeometryParams, ()> {
    let constructor: FlowConstructor<GeometryParams, ()> = Box::new(|ctx| {
        Box::pin(async move { Box::new(Geometries::new(ctx)) as Box<dyn GraphicsFlow<_, _>> })
    });
    constructor
}

impl GraphicsFlow<GeometryParams, ()> for Geometries {
    fn on_init(&mut self, ctx: &mut Context, state: &mut GeometryParams) -> Out<GeometryParams, ()> {
        super::look_at_origin(ctx, [0.0, 0.5, 3.0], true);
        ctx.clear_colour = super::clear_colour(0x111111);
        self.material.params = state.material();
        self.material.write(&ctx.queue);
        Out::Empty
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut GeometryParams,
        dt: Duration,
    ) -> Out<GeometryParams, ()> {
        if state.rotate {
            self.angle = (self.angle + 0.5 * dt.as_secs_f32()) % std::f32::consts::TAU;
            self.node.instances[0].rotation =
                Quaternion::from_angle_y(Rad(self.angle)) * Quaternion::from_angle_x(Rad(0.3));
            self.node.write_to_buffer(&ctx.device, &ctx.queue);
        }
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut GeometryParams,
        event: &WindowEvent,
    ) -> Out<GeometryParams, ()> {
        if let Some(changed) = self.panel.handle_window_events(state, event) {
            self.apply(ctx, state, changed);
        }
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut GeometryParams, _: ()) -> Option<()> {
        None
    }

    fn on_gui(
        &mut self,
        ctx: &Context,
        state: &mut GeometryParams,
        gui: &egui::Context,
    ) -> Out<GeometryParams, ()> {
        for changed in self.panel.show(gui, state) {
            self.apply(ctx, state, changed);
        }
        Out::Empty
    }

    fn on_render(&self) -> Render<'_> {
        self.node.drawable(&self.material).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    #[test]
    fn every_geometry_choice_should_build_its_kind() {
        let mut panel = panel();
        let mut params = GeometryParams::default();
        let mut seen = vec![params.kind()];
        for _ in 1..GeometryKind::ALL.len() {
            let changed = panel.handle_key(&mut params, KeyCode::ArrowRight);
            assert_eq!(changed.map(|c| c.effect), Some(Effect::Rebuild));
            let data = params.geometry();
            assert!(data.triangle_count() > 0, "{:?}", params.kind());
            seen.push(params.kind());
        }
        assert_eq!(seen, GeometryKind::ALL.to_vec());
    }

    #[test]
    fn segments_should_rebuild_and_colour_should_write() {
        let mut panel = panel();
        let mut params = GeometryParams::default();
        panel.select("width segments");
        let before = params.geometry().vertices.len();
        assert_eq!(
            panel.adjust(&mut params, 1).map(|c| c.effect),
            Some(Effect::Rebuild)
        );
        assert!(params.geometry().vertices.len() > before);
        panel.select("color");
        assert_eq!(
            panel.adjust(&mut params, 1).map(|c| c.effect),
            Some(Effect::Write)
        );
    }

    #[test]
    fn untouched_panel_should_not_rebuild_the_initial_mesh() {
        let gui = egui::Context::default();
        let mut panel = panel();
        let mut params = GeometryParams::default();
        for _ in 0..3 {
            let mut changes = Vec::new();
            let _ = gui.run(egui::RawInput::default(), |gui| {
                changes.extend(panel.show(gui, &mut params));
            });
            assert!(changes.is_empty());
        }
        assert_eq!(params, GeometryParams::default());
    }
}
