//! GPU side of the quad renderer.
//!
//! - `context` owns the wgpu instance/device/surface and keeps the swapchain
//!   in FIFO mode so frames follow the display refresh.
//! - `pipeline` turns a linked [`ShaderProgram`](crate::ShaderProgram) into a
//!   render pipeline, vertex/index buffers and uniform bind groups.
//! - `uniforms` writes the animated `p` offset each frame.
//! - `state` glues everything together for the window driver.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub use pipeline::PipelineError;
pub(crate) use state::GpuState;
