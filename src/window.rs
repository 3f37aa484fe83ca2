//! Windowed host: a winit event loop driving an [`Engine<GpuRenderer>`].

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::{Config, Viewport};
use crate::engine::Engine;
use crate::error::{EngineError, RunError};
use crate::gpu::GpuRenderer;
use crate::time::FrameClock;

/// Open a window and run the field until it is closed.
pub fn run(config: Config) -> Result<(), RunError> {
    config.validate().map_err(EngineError::from)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    config: Config,
    window: Option<Arc<Window>>,
    engine: Option<Engine<GpuRenderer>>,
    clock: FrameClock,
    /// First fatal error; reported once the loop exits.
    error: Option<RunError>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            engine: None,
            clock: FrameClock::new(),
            error: None,
        }
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<(), RunError> {
        let viewport = self.config.viewport;
        let window_attrs = Window::default_attributes()
            .with_title("driftfield")
            .with_inner_size(LogicalSize::new(viewport.width, viewport.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        // The window decides the real size and pixel ratio.
        let scale = window.scale_factor();
        let logical = window.inner_size().to_logical::<u32>(scale);
        let config = self
            .config
            .clone()
            .with_viewport(viewport_from(logical.width, logical.height, scale, &viewport));

        let renderer = pollster::block_on(GpuRenderer::new(window.clone(), &config))?;
        let engine = Engine::mount(&config, renderer)?;

        self.clock = FrameClock::new();
        self.window = Some(window.clone());
        self.engine = Some(engine);
        window.request_redraw();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{}", error);
        if let Some(engine) = &mut self.engine {
            engine.stop();
        }
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }

    fn redraw(&mut self) -> Result<(), EngineError> {
        let Some(engine) = &mut self.engine else {
            return Ok(());
        };
        let elapsed = self.clock.tick();
        engine.frame(elapsed)?;

        if self.clock.fps_updated() {
            log::debug!(
                "{:.1} fps, {} edges",
                self.clock.fps(),
                engine.scene().graph().len()
            );
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.mount(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());

        if let Some(engine) = &mut self.engine {
            if engine.host().input_attached() && engine.handle_pointer_event(&event, scale) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(engine) = &mut self.engine {
                    engine.stop();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(engine) = &mut self.engine {
                    let logical = physical_size.to_logical::<u32>(scale);
                    engine.resize(&viewport_from(
                        logical.width,
                        logical.height,
                        scale,
                        &self.config.viewport,
                    ));
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e.into());
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release GPU resources before the window goes away.
        self.engine = None;
    }
}

/// Viewport for a logical size. Zero sizes (minimized windows) keep the
/// previous dimensions.
fn viewport_from(width: u32, height: u32, scale: f64, fallback: &Viewport) -> Viewport {
    if width == 0 || height == 0 {
        return Viewport::new(fallback.width, fallback.height, scale as f32);
    }
    Viewport::new(width, height, scale as f32)
}
