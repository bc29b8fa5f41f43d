//! Activity 6: a cube animated from the frame clock.

use cgmath::{Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    config::ActivityId,
    context::{Context, InitContext},
    data_structures::{
        geometry::box_geometry,
        instance::Instance,
        material::{Material, MaterialParams, rgb_from_hex, srgb_to_linear},
        node::MeshNode,
    },
    flow::{FlowConstructor, GraphicsFlow, Out},
    gui::{DebugPanel, Effect},
    render::Render,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationParams {
    /// Rotation speed around the y axis, in radians per second.
    pub speed: f32,
    /// Radius of the circle the cube travels on.
    pub radius: f32,
    /// sRGB
    pub color: [f32; 3],
    pub wireframe: bool,
    pub spin: bool,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            radius: 0.5,
            color: rgb_from_hex(0xff0000),
            wireframe: false,
            spin: true,
        }
    }
}

impl AnimationParams {
    pub fn material(&self) -> MaterialParams {
        MaterialParams {
            color: srgb_to_linear(self.color),
            wireframe: self.wireframe,
            ..Default::default()
        }
    }
}

pub fn panel() -> DebugPanel<AnimationParams> {
    DebugPanel::<AnimationParams>::new(&ActivityId::Animation.to_string())
        .slider("speed", (0.0, 5.0), 0.1, Effect::Write, |p| p.speed, |p, v| p.speed = v)
        .slider("radius", (0.0, 2.0), 0.1, Effect::Write, |p| p.radius, |p, v| p.radius = v)
        .color("color", Effect::Write, |p| p.color, |p, v| p.color = v)
        .toggle("wireframe", Effect::Write, |p| p.wireframe, |p, v| p.wireframe = v)
        .toggle("spin", Effect::Write, |p| p.spin, |p, v| p.spin = v)
}

/// Where the cube is `elapsed` seconds in, spinning by `angle`.
pub fn pose(params: &AnimationParams, elapsed: f32, angle: f32) -> Instance {
    Instance {
        position: Vector3::new(
            elapsed.cos() * params.radius,
            elapsed.sin() * params.radius,
            0.0,
        ),
        rotation: Quaternion::from_angle_y(Rad(angle)),
        ..Default::default()
    }
}

pub struct Animation {
    cube: MeshNode,
    material: Material,
    panel: DebugPanel<AnimationParams>,
    angle: f32,
}

impl Animation {
    pub fn new(ctx: InitContext) -> Self {
        let params = AnimationParams::default();
        let cube = MeshNode::single(
            &ctx.device,
            "cube",
            &box_geometry(1.0, 1.0, 1.0, 1, 1, 1),
            Instance::new(),
        );
        let material = Material::new(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            "cube",
            params.material(),
            None,
            None,
        );
        Self {
            cube,
            material,
            panel: panel(),
            angle: 0.0,
        }
    }
}

impl Animation {
    /// Every control only changes the material's live values.
    fn apply(&mut self, ctx: &Context, state: &AnimationParams) {
        self.material.params = state.material();
        self.material.write(&ctx.queue);
    }
}

pub fn constructor() -> FlowConstructor<AnimationParams, ()> {
    let constructor: FlowConstructor<AnimationParams, ()> = Box::new(|ctx| {
        Box::pin(async move { Box::new(Animation::new(ctx)) as Box<dyn GraphicsFlow<_, _>> })
    });
    constructor
}

impl GraphicsFlow<AnimationParams, ()> for Animation {
    fn on_init(&mut self, ctx: &mut Context, state: &mut AnimationParams) -> Out<AnimationParams, ()> {
        super::look_at_origin(ctx, [0.0, 0.0, 3.0], false);
        ctx.clear_colour = super::clear_colour(0x101018);
        self.material.params = state.material();
        self.material.write(&ctx.queue);
        Out::Empty
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut AnimationParams,
        dt: Duration,
    ) -> Out<AnimationParams, ()> {
        if state.spin {
            self.angle = (self.angle + state.speed * dt.as_secs_f32()) % std::f32::consts::TAU;
        }
        let elapsed = ctx.clock.elapsed().as_secs_f32();
        self.cube.instances[0] = pose(state, elapsed, self.angle);
        self.cube.write_to_buffer(&ctx.device, &ctx.queue);
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut AnimationParams,
        event: &WindowEvent,
    ) -> Out<AnimationParams, ()> {
        if self.panel.handle_window_events(state, event).is_some() {
            self.apply(ctx, state);
        }
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut AnimationParams, _: ()) -> Option<()> {
        None
    }

    fn on_gui(
        &mut self,
        ctx: &Context,
        state: &mut AnimationParams,
        gui: &egui::Context,
    ) -> Out<AnimationParams, ()> {
        if !self.panel.show(gui, state).is_empty() {
            self.apply(ctx, state);
        }
        Out::Empty
    }

    fn on_render(&self) -> Render<'_> {
        self.cube.drawable(&self.material).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::Changed;
    use winit::keyboard::KeyCode;

    #[test]
    fn every_control_should_only_write() {
        let mut panel = panel();
        let mut params = AnimationParams::default();
        for _ in 0..panel.controls().len() {
            let changed = panel.handle_key(&mut params, KeyCode::ArrowRight);
            assert!(matches!(
                changed,
                Some(Changed {
                    effect: Effect::Write,
                    ..
                })
            ));
            panel.handle_key(&mut params, KeyCode::Tab);
        }
        assert!((params.speed - 1.1).abs() < 1e-5);
        assert!(params.wireframe);
        assert!(!params.spin);
    }

    #[test]
    fn pose_should_circle_with_the_radius() {
        let params = AnimationParams {
            radius: 2.0,
            ..Default::default()
        };
        let start = pose(&params, 0.0, 0.0);
        assert_eq!(start.position, Vector3::new(2.0, 0.0, 0.0));
        let quarter = pose(&params, std::f32::consts::FRAC_PI_2, 0.0);
        assert!(quarter.position.x.abs() < 1e-5);
        assert!((quarter.position.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn material_should_follow_the_params() {
        let params = AnimationParams {
            wireframe: true,
            ..Default::default()
        };
        let material = params.material();
        assert!(material.wireframe);
        assert_eq!(material.color, [1.0, 0.0, 0.0]);
    }
}
