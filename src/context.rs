//! The GPU and window context shared by the engine and the running activity.

use std::sync::Arc;

use anyhow::Context as _;
use instant::{Duration, Instant};
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, Projection},
    data_structures::{material::material_bind_group_layout, texture},
    gui::Overlay,
    pipelines::{
        Pipelines,
        light::{LightResources, LightUniform},
    },
};

/// Time since the activity started and since the previous frame.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
    last: Instant,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Advances to now and returns the frame delta.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now - self.last;
        self.last = now;
        dt
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub material_layout: wgpu::BindGroupLayout,
    pub clear_colour: wgpu::Color,
    pub clock: Clock,
    pub(crate) overlay: Overlay,
}

/// What a flow needs to build its GPU resources before the first frame.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub material_layout: wgpu::BindGroupLayout,
    pub size: (u32, u32),
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            material_layout: ctx.material_layout.clone(),
            size: (ctx.config.width, ctx.config.height),
        }
    }
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("Setting up wgpu for a {}x{} window", size.width, size.height);
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("cannot open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are computed in linear space, so prefer an sRGB surface
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no texture format")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let projection = Projection::new(config.width, config.height, cgmath::Deg(75.0), 0.1, 100.0);
        let camera = CameraResources::new(&device, Camera::new((0.0, 0.0, 3.0), (0.0, 0.0, 0.0)), &projection);

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth",
        );

        let light = LightResources::new(LightUniform::default(), &device);
        let material_layout = material_bind_group_layout(&device);
        let pipelines = Pipelines::new(
            &device,
            config.format,
            &material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );

        let overlay = Overlay::new(&window, &device, config.format);

        Ok(Self {
            overlay,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            material_layout,
            window,
            depth_texture,
            clear_colour: wgpu::Color::BLACK,
            clock: Clock::new(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Uploads the camera after it or the projection changed.
    pub fn write_camera(&mut self) {
        self.camera
            .uniform
            .update_view_proj(&self.camera.camera, &self.projection);
        self.queue
            .write_buffer(&self.camera.buffer, 0, bytemuck::bytes_of(&self.camera.uniform));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_should_measure_monotonic_time() {
        let mut clock = Clock::new();
        let first = clock.elapsed();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let dt = clock.tick();
        assert!(dt >= Duration::from_millis(2));
        assert!(clock.elapsed() >= dt);
        assert!(clock.elapsed() >= first);
    }
}
