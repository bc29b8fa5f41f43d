//! The event loop and the flow abstraction the activities are written against.
//!
//! A flow is one running activity. It builds its scene from an [`InitContext`],
//! reacts to window events and debug panel input, animates itself once per
//! frame and hands back what should be drawn. Everything around that (window,
//! GPU context, async asset loads, resize) lives here.
//!
//! Per frame:
//! 1. window events go to egui first; what it leaves goes to the orbit
//!    controls, then to the flows
//! 2. on `RedrawRequested` the frame clock ticks and the camera is updated
//! 3. `on_update` runs with the frame delta
//! 4. `on_gui` builds the debug panels
//! 5. `on_render` results are grouped by pipeline and drawn into one pass,
//!    the panels are drawn over it in a second one

use std::{ops::Range, pin::Pin, sync::Arc};

use instant::Duration;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    camera::Projection,
    context::{Context, InitContext},
    data_structures::{model::DrawModel, texture::Texture},
    pipelines::PipelineKind,
    render::{Batches, Drawable, Render},
};

/// What a lifecycle hook asks the loop to do next.
///
/// `FutEvent` futures are driven to completion (blocking natively, spawned on
/// the page's executor on the web) and each result comes back through
/// [`GraphicsFlow::on_custom_events`]. `Configure` runs once against the
/// context and the activity state, e.g. to change the projection.
pub enum Out<S, E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    Configure(Box<dyn FnOnce(&mut Context, &mut S)>),
    Empty,
}

impl<S, E> Default for Out<S, E> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<S, E> Out<S, E> {
    pub fn configure(f: impl FnOnce(&mut Context, &mut S) + 'static) -> Self {
        Self::Configure(Box::new(f))
    }

    /// A single asynchronous load.
    pub fn event(fut: impl Future<Output = E> + 'static) -> Self {
        Self::FutEvent(vec![Box::new(fut)])
    }
}

/// An activity. `S` is its parameter object, `E` the result type of its loads.
///
/// `on_init` runs once after the surface is configured, before the first
/// frame. The other hooks run on the event loop thread and never overlap.
pub trait GraphicsFlow<S, E> {
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<S, E>;

    /// `dt` is the time since the previous frame; `ctx.clock` has the time since start.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out<S, E>;

    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<S, E>;

    /// Returns the event when this flow did not consume it.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E>;

    /// Builds this frame's widgets. Runs after `on_update`.
    fn on_gui(&mut self, ctx: &Context, state: &mut S, gui: &egui::Context) -> Out<S, E>;

    fn on_render(&self) -> Render<'_>;
}

/// Builds a flow once the GPU is ready.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// The GPU context together with the activity state it renders.
pub(crate) struct Stage<S> {
    pub(crate) ctx: Context,
    state: S,
    surface_ready: bool,
}

impl<S: Default> Stage<S> {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        Ok(Self {
            ctx: Context::new(window).await?,
            state: S::default(),
            surface_ready: false,
        })
    }
}

/// Takes a new output size into the surface configuration and the projection.
/// Zero sizes (minimised windows) are ignored and return false.
pub(crate) fn fit_to_size(
    config: &mut wgpu::SurfaceConfiguration,
    projection: &mut Projection,
    width: u32,
    height: u32,
) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    config.width = width;
    config.height = height;
    projection.resize(width, height);
    true
}

impl<S> Stage<S> {
    fn resize(&mut self, width: u32, height: u32) {
        let ctx = &mut self.ctx;
        if !fit_to_size(&mut ctx.config, &mut ctx.projection, width, height) {
            return;
        }
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.depth_texture = Texture::create_depth_texture(&ctx.device, [width, height], "depth");
        ctx.write_camera();
        self.surface_ready = true;
    }

    fn resize_to_window(&mut self) {
        let size = self.ctx.window.inner_size();
        self.resize(size.width, size.height);
    }

    fn acquire(&mut self) -> Option<wgpu::SurfaceTexture> {
        match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(frame) | wgpu::CurrentSurfaceTexture::Suboptimal(frame) => {
                Some(frame)
            }
            wgpu::CurrentSurfaceTexture::Outdated | wgpu::CurrentSurfaceTexture::Lost => {
                self.resize_to_window();
                None
            }
            wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => None,
            wgpu::CurrentSurfaceTexture::Validation => {
                log::error!("Unable to render: surface texture failed validation");
                None
            }
        }
    }

    fn render<E>(&mut self, flows: &[Box<dyn GraphicsFlow<S, E>>], gui: Option<egui::FullOutput>) {
        self.ctx.window.request_redraw();
        let ctx = &mut self.ctx;
        let gui = gui.map(|output| {
            let size = [ctx.config.width, ctx.config.height];
            ctx.overlay.prepare(&ctx.device, &ctx.queue, &ctx.window, output, size)
        });
        let frame = if self.surface_ready { self.acquire() } else { None };
        let Some(frame) = frame else {
            if let Some(gui) = gui {
                self.ctx.overlay.discard(gui);
            }
            return;
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame"),
            });

        let mut batches = Batches::default();
        for flow in flows {
            flow.on_render().set_pipelines(&mut batches);
        }
        {
            let mut pass = begin_pass(&mut encoder, &view, &self.ctx);
            for (kind, drawables) in batches.by_pipeline() {
                if drawables.is_empty() {
                    continue;
                }
                pass.set_pipeline(self.ctx.pipelines.get(kind));
                for drawable in &drawables {
                    draw(&mut pass, &self.ctx, kind, drawable);
                }
            }
        }

        let ctx = &mut self.ctx;
        let mut commands = match gui {
            Some(gui) => ctx.overlay.draw(&ctx.device, &ctx.queue, &mut encoder, &view, gui),
            None => Vec::new(),
        };
        commands.push(encoder.finish());
        ctx.queue.submit(commands);
        frame.present();
    }
}

fn begin_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    view: &'a wgpu::TextureView,
    ctx: &'a Context,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("scene"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(ctx.clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &ctx.depth_texture.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    })
}

fn draw(pass: &mut wgpu::RenderPass<'_>, ctx: &Context, kind: PipelineKind, drawable: &Drawable<'_>) {
    if drawable.amount == 0 || drawable.mesh.num_elements == 0 {
        log::debug!("Nothing to draw for {}", drawable.mesh.name);
        return;
    }
    let instances: Range<u32> = 0..drawable.amount as u32;
    pass.set_vertex_buffer(1, drawable.instance.slice(..));
    pass.draw_mesh_instanced(
        drawable.mesh,
        kind == PipelineKind::Wireframe,
        instances,
        drawable.material.bind_group(),
        &ctx.camera.bind_group,
        &ctx.light.bind_group,
    );
}

pub(crate) enum FlowEvent<S: 'static, E: 'static> {
    /// The async GPU setup and the flow constructors finished (web only).
    Ready {
        stage: Stage<S>,
        flows: Vec<Box<dyn GraphicsFlow<S, E>>>,
    },
    /// A resolved [`Out::FutEvent`] future.
    Custom(E),
}

pub struct App<S: 'static, E: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent<S, E>>,
    stage: Option<Stage<S>>,
    flows: Vec<Box<dyn GraphicsFlow<S, E>>>,
    /// Taken on the first `resumed`.
    pending: Option<Vec<FlowConstructor<S, E>>>,
}

impl<S: 'static, E: 'static> App<S, E> {
    fn new(event_loop: &EventLoop<FlowEvent<S, E>>, constructors: Vec<FlowConstructor<S, E>>) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            stage: None,
            flows: Vec::new(),
            pending: Some(constructors),
        })
    }

    /// Calls `hook` on every flow and carries out what it returned.
    fn dispatch(&mut self, mut hook: impl FnMut(&mut dyn GraphicsFlow<S, E>, &Context, &mut S) -> Out<S, E>) {
        let Some(stage) = &mut self.stage else {
            return;
        };
        for flow in self.flows.iter_mut() {
            let out = hook(flow.as_mut(), &stage.ctx, &mut stage.state);
            follow(
                #[cfg(not(target_arch = "wasm32"))]
                &self.runtime,
                &self.proxy,
                out,
                &mut stage.ctx,
                &mut stage.state,
            );
        }
    }

    /// Runs one egui frame over every flow's `on_gui`.
    fn run_gui(&mut self) -> Option<egui::FullOutput> {
        let stage = self.stage.as_mut()?;
        let input = stage.ctx.overlay.take_input(&stage.ctx.window);
        let gui = stage.ctx.overlay.ctx.clone();
        Some(gui.run(input, |gui| {
            self.dispatch(|flow, ctx, state| flow.on_gui(ctx, state, gui));
        }))
    }

    fn start(&mut self, mut stage: Stage<S>, flows: Vec<Box<dyn GraphicsFlow<S, E>>>) {
        stage.resize_to_window();
        self.flows = flows;
        for flow in self.flows.iter_mut() {
            let out = flow.on_init(&mut stage.ctx, &mut stage.state);
            follow(
                #[cfg(not(target_arch = "wasm32"))]
                &self.runtime,
                &self.proxy,
                out,
                &mut stage.ctx,
                &mut stage.state,
            );
        }
        stage.ctx.write_camera();
        stage.ctx.light.write(&stage.ctx.queue);
        stage.ctx.window.request_redraw();
        self.stage = Some(stage);
    }
}

/// Carries out what a hook returned.
fn follow<S, E>(
    #[cfg(not(target_arch = "wasm32"))] runtime: &tokio::runtime::Runtime,
    proxy: &EventLoopProxy<FlowEvent<S, E>>,
    out: Out<S, E>,
    ctx: &mut Context,
    state: &mut S,
) {
    match out {
        Out::FutEvent(futures) => {
            let all = futures::future::join_all(futures.into_iter().map(Pin::from));
            #[cfg(not(target_arch = "wasm32"))]
            {
                send_all(proxy, runtime.block_on(all));
            }
            #[cfg(target_arch = "wasm32")]
            {
                let proxy = proxy.clone();
                wasm_bindgen_futures::spawn_local(async move { send_all(&proxy, all.await) });
            }
        }
        Out::Configure(f) => f(ctx, state),
        Out::Empty => {}
    }
}

fn send_all<S, E>(proxy: &EventLoopProxy<FlowEvent<S, E>>, events: Vec<E>) {
    for event in events {
        if proxy.send_event(FlowEvent::Custom(event)).is_err() {
            log::error!("Event loop closed before a load result could be delivered");
            return;
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn canvas() -> Option<wgpu::web_sys::HtmlCanvasElement> {
    use wasm_bindgen::JsCast;

    wgpu::web_sys::window()?
        .document()?
        .get_element_by_id("canvas")?
        .dyn_into()
        .ok()
}

impl<S: 'static + Default, E: 'static> ApplicationHandler<FlowEvent<S, E>> for App<S, E> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructors) = self.pending.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut attributes = Window::default_attributes().with_title("flow-activities");
        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            attributes = match canvas() {
                Some(canvas) => attributes.with_canvas(Some(canvas)),
                None => {
                    log::warn!("No <canvas id=\"canvas\"> on the page, appending one");
                    attributes.with_append(true)
                }
            };
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let setup = async move {
            let stage = Stage::<S>::new(window).await?;
            let init = InitContext::from(&stage.ctx);
            let flows = futures::future::join_all(
                constructors.into_iter().map(|constructor| constructor(init.clone())),
            )
            .await;
            anyhow::Ok((stage, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.runtime.block_on(setup) {
                Ok((stage, flows)) => self.start(stage, flows),
                Err(e) => {
                    log::error!("Setup failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match setup.await {
                    Ok((stage, flows)) => {
                        if proxy.send_event(FlowEvent::Ready { stage, flows }).is_err() {
                            log::error!("Event loop closed during setup");
                        }
                    }
                    Err(e) => log::error!("Setup failed: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _: &ActiveEventLoop, event: FlowEvent<S, E>) {
        match event {
            FlowEvent::Ready { stage, flows } => self.start(stage, flows),
            FlowEvent::Custom(event) => {
                let Some(stage) = &mut self.stage else {
                    return;
                };
                let unused = self.flows.iter_mut().try_fold(event, |event, flow| {
                    flow.on_custom_events(&stage.ctx, &mut stage.state, event)
                });
                if unused.is_some() {
                    log::warn!("A load result was not consumed by any flow");
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        let Some(stage) = &mut self.stage else {
            return;
        };
        let ctx = &mut stage.ctx;
        let consumed = ctx.overlay.on_window_event(&ctx.window, &event);
        // a drag that ends over a panel still has to end
        let released = matches!(
            event,
            WindowEvent::MouseInput {
                state: ElementState::Released,
                ..
            }
        );
        if !consumed || released {
            ctx.camera.controls.handle_window_events(&event);
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => stage.resize(size.width, size.height),
            _ => {}
        }

        if !consumed {
            self.dispatch(|flow, ctx, state| flow.on_window_events(ctx, state, &event));
        }

        if !matches!(event, WindowEvent::RedrawRequested) {
            return;
        }
        let Some(stage) = &mut self.stage else {
            return;
        };
        let dt = stage.ctx.clock.tick();
        let ctx = &mut stage.ctx;
        ctx.camera.controls.update(&mut ctx.camera.camera, dt);
        ctx.write_camera();

        self.dispatch(|flow, ctx, state| flow.on_update(ctx, state, dt));
        let gui = self.run_gui();

        let Some(stage) = &mut self.stage else {
            return;
        };
        stage.render(&self.flows, gui);
    }
}

/// Opens the window and runs `constructors` until it is closed.
pub fn run<S: 'static + Default, E: 'static>(constructors: Vec<FlowConstructor<S, E>>) -> anyhow::Result<()> {
    let event_loop = EventLoop::<FlowEvent<S, E>>::with_user_event().build()?;
    let mut app = App::new(&event_loop, constructors)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: u32, height: u32) -> wgpu::SurfaceConfiguration {
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        }
    }

    #[test]
    fn resize_should_keep_surface_and_aspect_in_step() {
        let mut config = config(1, 1);
        let mut projection = Projection::new(1, 1, cgmath::Deg(75.0), 0.1, 100.0);

        assert!(fit_to_size(&mut config, &mut projection, 800, 600));
        assert_eq!((config.width, config.height), (800, 600));
        assert!((projection.aspect - 800.0 / 600.0).abs() < 1e-6);

        assert!(fit_to_size(&mut config, &mut projection, 1024, 256));
        assert_eq!((config.width, config.height), (1024, 256));
        assert!((projection.aspect - 4.0).abs() < 1e-6);

        // minimised
        assert!(!fit_to_size(&mut config, &mut projection, 0, 600));
        assert_eq!((config.width, config.height), (1024, 256));
        assert!((projection.aspect - 4.0).abs() < 1e-6);
    }
}
