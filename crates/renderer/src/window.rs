use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::program::ShaderProgram;
use crate::runtime::{time_source_for, BoxedTimeSource};
use crate::types::RendererConfig;

const WINDOW_TITLE: &str = "glquad";

/// Per-window render state captured by the event loop closure.
///
/// `gpu` is declared before `window` so the surface is dropped while the
/// window it was created from is still alive.
pub(crate) struct WindowState {
    gpu: GpuState,
    clock: BoxedTimeSource,
    frames: u64,
    window: Arc<Window>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Presented,
    Skipped,
    Fatal,
}

impl WindowState {
    pub(crate) fn new(
        window: Arc<Window>,
        config: &RendererConfig,
        program: ShaderProgram,
    ) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(
            window.as_ref(),
            size,
            program,
            config.power,
            config.gpu_errors,
        )?;
        Ok(Self {
            gpu,
            clock: time_source_for(config.fixed_time),
            frames: 0,
            window,
        })
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// Renders one display tick.
    pub(crate) fn tick(&mut self) -> TickOutcome {
        let timestamp = self.clock.sample();
        match self.gpu.render(timestamp) {
            Ok(()) => {
                self.frames = self.frames.saturating_add(1);
                tracing::trace!(
                    frame = self.frames,
                    seconds = timestamp.seconds(),
                    "presented frame"
                );
                TickOutcome::Presented
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated; reconfiguring");
                self.gpu.reconfigure();
                TickOutcome::Skipped
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("surface out of memory; closing window");
                TickOutcome::Fatal
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout; retrying next frame");
                TickOutcome::Skipped
            }
            Err(other) => {
                tracing::warn!("surface error: {other:?}; retrying next frame");
                TickOutcome::Skipped
            }
        }
    }
}

/// Opens the window and redraws the quad once per display refresh until the
/// window is closed.
///
/// The render state lives inside the event loop closure; winit never
/// re-enters the closure, so ticks cannot overlap.
pub(crate) fn run(config: &RendererConfig, program: ShaderProgram) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, config, program)?;
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            tracing::info!(frames = state.frames, "window closed");
                            elwt.exit();
                        }
                        WindowEvent::Resized(new_size) => {
                            state.resize(new_size);
                        }
                        WindowEvent::RedrawRequested => {
                            if state.tick() == TickOutcome::Fatal {
                                elwt.exit();
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    // FIFO presentation blocks in the next acquire, pacing
                    // these requests to the display refresh.
                    state.window().request_redraw();
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
