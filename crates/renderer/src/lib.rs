//! Renderer crate for glquad.
//!
//! Builds a shader program from a bundled `.vsh`/`.fsh` pair and draws a
//! coloured quad with it once per display refresh, sliding the quad around a
//! circle through the `p` uniform. The overall flow is:
//!
//! ```text
//!   CLI / glquad
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ ShaderProgramBuilder ──▶ ShaderProgram
//!                                                   │
//!                      winit event loop ◀── WindowState (GpuState + clock)
//!                             │
//!                             └─▶ tick() ─▶ write p ─▶ draw quad ─▶ present
//! ```
//!
//! The program build is pure (naga parse, validate, link) and runs before any
//! window exists, so a broken shader aborts start-up without touching the GPU.

mod compile;
mod diagnostics;
mod geometry;
mod gpu;
mod program;
mod resources;
mod runtime;
mod types;
mod window;

use anyhow::{Context, Result};

pub use compile::{CompileError, ShaderSource};
pub use geometry::{
    UnsupportedVertexInput, Vertex, VertexLayoutPlan, QUAD_INDICES, QUAD_VERTICES,
};
pub use gpu::PipelineError;
pub use program::{
    BuildError, BuildOptions, LinkError, ProgramBindings, ShaderProgram, ShaderProgramBuilder,
    UniformBlock, UniformSlot, VertexInput, COLOR_ATTRIBUTE, FRAG_COLOR_NAME, FRAG_COLOR_SLOT,
    OFFSET_UNIFORM, POSITION_ATTRIBUTE,
};
pub use resources::{ResourceBundle, ResourceError};
pub use runtime::{
    offset_for, time_source_for, BoxedTimeSource, FixedTimeSource, FrameTimestamp,
    SystemTimeSource, TimeSource, OFFSET_AMPLITUDE,
};
pub use types::{
    GpuErrorPolicy, GpuPowerPreference, RendererConfig, StageKind, VariableBinding,
    FRAGMENT_EXTENSION, VERTEX_EXTENSION,
};

/// Entry point tying resource lookup, the program build and the window
/// together.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Resolves the configured shader pair and builds it.
    pub fn build_program(&self) -> Result<ShaderProgram> {
        let bundle = ResourceBundle::new(&self.config.resource_dir);
        let (vertex, fragment) = bundle
            .shader_pair(&self.config.shader_name)
            .context("failed to locate shader resources")?;
        let builder = ShaderProgramBuilder::new(BuildOptions {
            log_diagnostics: self.config.shader_diagnostics,
        });
        let program = builder
            .build(&vertex, &fragment)
            .context("shader program setup failed")?;

        let bindings = program.bindings();
        tracing::info!(
            program = %program.label(),
            position = bindings.position.raw(),
            color = bindings.color.raw(),
            p = bindings.offset.raw(),
            "shader program built"
        );
        Ok(program)
    }

    /// Builds the program, opens the window and renders until it closes.
    ///
    /// A failed build abandons rendering setup entirely.
    pub fn run(&mut self) -> Result<()> {
        let program = self.build_program()?;
        window::run(&self.config, program)
    }
}
