use std::fmt;
use std::path::PathBuf;

use wgpu::naga::ShaderStage;

/// Resource suffix for vertex stage sources.
pub const VERTEX_EXTENSION: &str = "vsh";
/// Resource suffix for fragment stage sources.
pub const FRAGMENT_EXTENSION: &str = "fsh";

/// The two programmable stages a program is linked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    /// Resource suffix used when looking a stage up by base name.
    pub fn extension(self) -> &'static str {
        match self {
            StageKind::Vertex => VERTEX_EXTENSION,
            StageKind::Fragment => FRAGMENT_EXTENSION,
        }
    }

    pub(crate) fn naga_stage(self) -> ShaderStage {
        match self {
            StageKind::Vertex => ShaderStage::Vertex,
            StageKind::Fragment => ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Resolved location of a named shader variable.
///
/// A negative location means the linked program has no active variable with
/// that name. Missing bindings are not errors: renderers check
/// [`VariableBinding::location`] and skip whatever depends on the variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableBinding(i32);

impl VariableBinding {
    pub const NOT_FOUND: Self = Self(-1);

    pub fn at(location: u32) -> Self {
        Self(i32::try_from(location).unwrap_or(i32::MAX))
    }

    /// Raw location, `-1` when unresolved.
    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn is_found(self) -> bool {
        self.0 >= 0
    }

    pub fn location(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
}

impl Default for VariableBinding {
    fn default() -> Self {
        Self::NOT_FOUND
    }
}

/// Adapter power preference requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// What to do with GPU API errors nobody captured in an error scope.
///
/// These errors point at a logic bug in the renderer rather than a runtime
/// condition, so debug builds treat them as assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuErrorPolicy {
    /// Log and panic.
    Fatal,
    /// Log and keep rendering.
    Log,
}

impl Default for GpuErrorPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            GpuErrorPolicy::Fatal
        } else {
            GpuErrorPolicy::Log
        }
    }
}

impl fmt::Display for GpuErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuErrorPolicy::Fatal => f.write_str("fatal"),
            GpuErrorPolicy::Log => f.write_str("log"),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags: where the shader resources live, which
/// base name to load, how large the window is, and how GPU failures are
/// reported.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Directory holding `<name>.vsh` / `<name>.fsh`.
    pub resource_dir: PathBuf,
    /// Base name of the shader pair.
    pub shader_name: String,
    /// Adapter power preference.
    pub power: GpuPowerPreference,
    /// Handling of uncaptured GPU errors.
    pub gpu_errors: GpuErrorPolicy,
    /// Log compile and link diagnostics.
    pub shader_diagnostics: bool,
    /// Freeze the animation clock at this many seconds.
    pub fixed_time: Option<f32>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            resource_dir: PathBuf::from("shaders"),
            shader_name: "Shader".to_string(),
            power: GpuPowerPreference::default(),
            gpu_errors: GpuErrorPolicy::default(),
            shader_diagnostics: cfg!(debug_assertions),
            fixed_time: None,
        }
    }
}
