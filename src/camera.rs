//! Camera, projection and orbit controls.
//!
//! The camera looks from `position` at `target`. [`OrbitControls`] moves it
//! on a sphere around the target (left drag rotates, the wheel zooms) and
//! keeps some velocity after the mouse is released when damping is enabled.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).magnitude()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Recomputes the aspect ratio; zero sized surfaces (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    /// `[znear, zfar, 0, 0]`, used by the depth material.
    pub near_far: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view: Matrix4::identity().into(),
            view_proj: Matrix4::identity().into(),
            near_far: [0.1, 100.0, 0.0, 0.0],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        let view = camera.calc_matrix();
        self.view = view.into();
        self.view_proj = (projection.calc_matrix() * view).into();
        self.near_far = [projection.znear, projection.zfar, 0.0, 0.0];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controls: OrbitControls,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    /// Uniform buffer and bind group (group 1) for `camera` seen through `projection`.
    pub fn new(device: &wgpu::Device, camera: Camera, projection: &Projection) -> Self {
        use wgpu::util::DeviceExt;

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            camera,
            controls: OrbitControls::new(0.05),
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub enabled: bool,
    /// Share of the velocity lost per 60th of a second, `0` disables damping.
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl OrbitControls {
    const MIN_POLAR: f32 = 0.01;

    pub fn new(damping: f32) -> Self {
        Self {
            enabled: false,
            damping: damping.clamp(0.0, 1.0),
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance: 0.5,
            max_distance: 100.0,
            dragging: false,
            cursor: None,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
        }
    }

    /// Returns true if the event was used to steer the camera.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        if !self.enabled {
            return false;
        }
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                match previous {
                    Some(previous) if self.dragging => {
                        self.rotate(
                            (position.x - previous.x) as f32,
                            (position.y - previous.y) as f32,
                        );
                        true
                    }
                    _ => false,
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.dragging = false;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.zoom(lines);
                true
            }
            _ => false,
        }
    }

    /// Queues a rotation by a mouse movement of `dx`, `dy` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw_velocity -= dx * self.rotate_speed;
        self.pitch_velocity -= dy * self.rotate_speed;
    }

    /// Positive `lines` move the camera closer.
    pub fn zoom(&mut self, lines: f32) {
        self.zoom_velocity -= lines * self.zoom_speed;
    }

    /// Applies the queued movement to `camera`.
    pub fn update(&mut self, camera: &mut Camera, dt: instant::Duration) {
        if self.yaw_velocity == 0.0 && self.pitch_velocity == 0.0 && self.zoom_velocity == 0.0 {
            return;
        }
        let offset = camera.position - camera.target;
        let radius = offset.magnitude();
        if radius <= f32::EPSILON {
            return;
        }
        // spherical coordinates, polar angle measured from +y
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        azimuth += self.yaw_velocity;
        polar = (polar + self.pitch_velocity)
            .clamp(Self::MIN_POLAR, std::f32::consts::PI - Self::MIN_POLAR);
        let radius =
            (radius * (1.0 + self.zoom_velocity)).clamp(self.min_distance, self.max_distance);

        camera.position = camera.target
            + Vector3::new(
                radius * polar.sin() * azimuth.sin(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
            );

        if self.damping > 0.0 {
            let keep = (1.0 - self.damping).powf(dt.as_secs_f32() * 60.0);
            self.yaw_velocity *= keep;
            self.pitch_velocity *= keep;
            self.zoom_velocity *= keep;
            if self.yaw_velocity.abs() < 1e-5 {
                self.yaw_velocity = 0.0;
            }
            if self.pitch_velocity.abs() < 1e-5 {
                self.pitch_velocity = 0.0;
            }
            if self.zoom_velocity.abs() < 1e-5 {
                self.zoom_velocity = 0.0;
            }
        } else {
            self.yaw_velocity = 0.0;
            self.pitch_velocity = 0.0;
            self.zoom_velocity = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Deg;
    use instant::Duration;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn resize_should_update_aspect() {
        let mut projection = Projection::new(800, 600, Deg(75.0), 0.1, 100.0);
        assert!((projection.aspect - 800.0 / 600.0).abs() < 1e-6);
        projection.resize(1920, 1080);
        assert!((projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        projection.resize(0, 1080);
        assert!((projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_should_track_camera_and_projection() {
        let camera = Camera::new((0.0, 0.0, 3.0), (0.0, 0.0, 0.0));
        let projection = Projection::new(4, 3, Deg(75.0), 0.5, 50.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);
        assert_eq!(uniform.view_position, [0.0, 0.0, 3.0, 1.0]);
        assert_eq!(uniform.near_far, [0.5, 50.0, 0.0, 0.0]);
        // the target ends up in the middle of clip space
        let vp: Matrix4<f32> = uniform.view_proj.into();
        let clip = vp * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-5 && (clip.y / clip.w).abs() < 1e-5);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn rotation_should_keep_the_distance() {
        let mut camera = Camera::new((0.0, 0.0, 3.0), (0.0, 0.0, 0.0));
        let mut controls = OrbitControls::new(0.0);
        controls.rotate(100.0, 20.0);
        controls.update(&mut camera, FRAME);
        assert!((camera.distance() - 3.0).abs() < 1e-4);
        assert!(camera.position.x.abs() > 0.1);
        // without damping the movement stops at once
        let before = camera.position;
        controls.update(&mut camera, FRAME);
        assert_eq!(before, camera.position);
    }

    #[test]
    fn zoom_should_respect_limits() {
        let mut camera = Camera::new((0.0, 0.0, 3.0), (0.0, 0.0, 0.0));
        let mut controls = OrbitControls::new(0.0);
        controls.zoom(100.0);
        controls.update(&mut camera, FRAME);
        assert!((camera.distance() - controls.min_distance).abs() < 1e-4);
    }

    #[test]
    fn damping_should_glide_then_settle() {
        let mut camera = Camera::new((0.0, 0.0, 3.0), (0.0, 0.0, 0.0));
        let mut controls = OrbitControls::new(0.1);
        controls.rotate(50.0, 0.0);
        controls.update(&mut camera, FRAME);
        let first = camera.position;
        controls.update(&mut camera, FRAME);
        assert_ne!(first, camera.position);
        for _ in 0..500 {
            controls.update(&mut camera, FRAME);
        }
        let settled = camera.position;
        controls.update(&mut camera, FRAME);
        assert_eq!(settled, camera.position);
    }

    #[test]
    fn disabled_controls_should_ignore_input() {
        let mut controls = OrbitControls::new(0.05);
        let event = WindowEvent::MouseWheel {
            device_id: unsafe { winit::event::DeviceId::dummy() },
            delta: MouseScrollDelta::LineDelta(0.0, 1.0),
            phase: winit::event::TouchPhase::Moved,
        };
        assert!(!controls.handle_window_events(&event));
        controls.enabled = true;
        assert!(controls.handle_window_events(&event));
    }
}
