//! Activity 7: orbiting camera, fullscreen toggle and field of view.

use cgmath::Deg;
use instant::{Duration, Instant};
use winit::{
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window},
};

use crate::{
    config::ActivityId,
    context::{Context, InitContext},
    data_structures::{
        geometry::box_geometry,
        instance::Instance,
        material::{Material, MaterialKind, MaterialParams},
        node::MeshNode,
    },
    flow::{FlowConstructor, GraphicsFlow, Out},
    gui::{DebugPanel, Effect},
    render::Render,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CameraParams {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub damping: bool,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov: 75.0,
            damping: true,
        }
    }
}

impl CameraParams {
    pub fn damping_factor(&self) -> f32 {
        if self.damping { 0.05 } else { 0.0 }
    }
}

pub fn panel() -> DebugPanel<CameraParams> {
    DebugPanel::<CameraParams>::new(&ActivityId::Camera.to_string())
        .slider("fov", (20.0, 120.0), 5.0, Effect::Write, |p| p.fov, |p, v| p.fov = v)
        .toggle("damping", Effect::Write, |p| p.damping, |p, v| p.damping = v)
}

/// Two presses of the left button within [`DoubleClick::WINDOW`].
#[derive(Debug, Default, Clone)]
pub struct DoubleClick {
    last: Option<Instant>,
}

impl DoubleClick {
    pub const WINDOW: Duration = Duration::from_millis(300);

    pub fn press(&mut self, now: Instant) -> bool {
        match self.last.take() {
            Some(last) if now.saturating_duration_since(last) <= Self::WINDOW => true,
            _ => {
                self.last = Some(now);
                false
            }
        }
    }
}

fn toggle_fullscreen(window: &Window) {
    if window.fullscreen().is_some() {
        window.set_fullscreen(None);
    } else {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    }
}

pub struct CameraActivity {
    cube: MeshNode,
    material: Material,
    panel: DebugPanel<CameraParams>,
    clicks: DoubleClick,
}

impl CameraActivity {
    pub fn new(ctx: InitContext) -> Self {
        let cube = MeshNode::single(
            &ctx.device,
            "cube",
            &box_geometry(1.0, 1.0, 1.0, 5, 5, 5),
            Instance::new(),
        );
        let material = Material::new(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            "cube",
            MaterialParams::with_kind(MaterialKind::Normal),
            None,
            None,
        );
        Self {
            cube,
            material,
            panel: panel(),
            clicks: DoubleClick::default(),
        }
    }
}

pub fn constructor() -> FlowConstructor<CameraParams, ()> {
    let constructor: FlowConstructor<CameraParams, ()> = Box::new(|ctx| {
        Box::pin(async move { Box::new(CameraActivity::new(ctx)) as Box<dyn GraphicsFlow<_, _>> })
    });
    constructor
}

fn apply(ctx: &mut Context, params: &CameraParams) {
    ctx.projection.fovy = Deg(params.fov).into();
    ctx.camera.controls.damping = params.damping_factor();
    ctx.write_camera();
}

impl GraphicsFlow<CameraParams, ()> for CameraActivity {
    fn on_init(&mut self, ctx: &mut Context, state: &mut CameraParams) -> Out<CameraParams, ()> {
        super::look_at_origin(ctx, [0.0, 0.0, 3.0], true);
        ctx.clear_colour = super::clear_colour(0x000000);
        apply(ctx, state);
        Out::Empty
    }

    fn on_update(&mut self, _: &Context, _: &mut CameraParams, _: Duration) -> Out<CameraParams, ()> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut CameraParams,
        event: &WindowEvent,
    ) -> Out<CameraParams, ()> {
        match event {
            WindowEvent::Resized(size) => {
                log::info!(
                    "Resized to {}x{}, aspect {:.3}",
                    size.width,
                    size.height,
                    ctx.projection.aspect
                );
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if self.clicks.press(Instant::now()) {
                    toggle_fullscreen(ctx.window());
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::KeyF),
                        repeat: false,
                        ..
                    },
                ..
            } => toggle_fullscreen(ctx.window()),
            _ => {}
        }
        if self.panel.handle_window_events(state, event).is_some() {
            return Out::configure(|ctx, state: &mut CameraParams| apply(ctx, state));
        }
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut CameraParams, _: ()) -> Option<()> {
        None
    }

    fn on_gui(&mut self, _: &Context, state: &mut CameraParams, gui: &egui::Context) -> Out<CameraParams, ()> {
        if self.panel.show(gui, state).is_empty() {
            return Out::Empty;
        }
        Out::configure(|ctx, state: &mut CameraParams| apply(ctx, state))
    }

    fn on_render(&self) -> Render<'_> {
        self.cube.drawable(&self.material).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_click_should_need_two_quick_presses() {
        let mut clicks = DoubleClick::default();
        let start = Instant::now();
        assert!(!clicks.press(start));
        assert!(clicks.press(start + Duration::from_millis(200)));
        // a third press starts over
        assert!(!clicks.press(start + Duration::from_millis(250)));
        assert!(!clicks.press(start + Duration::from_millis(900)));
    }

    #[test]
    fn fov_should_step_within_bounds() {
        let mut panel = panel();
        let mut params = CameraParams::default();
        for _ in 0..20 {
            panel.adjust(&mut params, 1);
        }
        assert_eq!(params.fov, 120.0);
        for _ in 0..40 {
            panel.adjust(&mut params, -1);
        }
        assert_eq!(params.fov, 20.0);
    }

    #[test]
    fn damping_toggle_should_switch_the_factor() {
        let mut params = CameraParams::default();
        assert_eq!(params.damping_factor(), 0.05);
        params.damping = false;
        assert_eq!(params.damping_factor(), 0.0);
    }
}
