use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use wgpu::naga::Module;

use crate::types::StageKind;

/// Raw text for one stage plus a label naming where it came from.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub origin: String,
    pub text: String,
}

impl ShaderSource {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }

    /// Reads a stage source from disk, labelling it with the path.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// A stage that failed to parse or validate.
#[derive(Debug, Error)]
#[error("{stage} shader compilation failed for {file}")]
pub struct CompileError {
    pub stage: StageKind,
    pub file: String,
    /// Compiler diagnostic rendered against the source.
    pub log: String,
}

/// Counts compiled stages that have not been released yet.
///
/// Every [`CompiledStage`] registers itself on creation and deregisters when
/// dropped, so a builder can prove that no stage outlives a build.
#[derive(Debug, Clone, Default)]
pub(crate) struct StageLedger {
    live: Arc<AtomicUsize>,
}

impl StageLedger {
    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        self.live.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A parsed and validated stage, alive only between compilation and linking.
pub(crate) struct CompiledStage {
    kind: StageKind,
    origin: String,
    module: Module,
    info: ModuleInfo,
    ledger: StageLedger,
}

impl CompiledStage {
    pub(crate) fn kind(&self) -> StageKind {
        self.kind
    }

    pub(crate) fn origin(&self) -> &str {
        &self.origin
    }

    pub(crate) fn module(&self) -> &Module {
        &self.module
    }

    pub(crate) fn info(&self) -> &ModuleInfo {
        &self.info
    }
}

impl Drop for CompiledStage {
    fn drop(&mut self) {
        self.ledger.release();
        tracing::trace!(stage = %self.kind, file = %self.origin, "released compiled stage");
    }
}

/// Compiles one GLSL stage through naga's frontend and validator.
///
/// Parsing stands in for the driver's compile step and validation for its
/// compile-status query. The diagnostic is always captured in the returned
/// error; it is only written to the log when `log_diagnostics` is set.
pub(crate) fn compile_stage(
    kind: StageKind,
    source: &ShaderSource,
    ledger: &StageLedger,
    log_diagnostics: bool,
) -> Result<CompiledStage, CompileError> {
    let mut frontend = Frontend::default();
    let module = frontend
        .parse(&Options::from(kind.naga_stage()), &source.text)
        .map_err(|errors| {
            let log = errors.emit_to_string(&source.text);
            stage_failure(kind, source, log, log_diagnostics)
        })?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    let info = validator
        .validate(&module)
        .map_err(|error| {
            let log = error.emit_to_string(&source.text);
            stage_failure(kind, source, log, log_diagnostics)
        })?;

    ledger.acquire();
    tracing::debug!(stage = %kind, file = %source.origin, "compiled shader stage");
    Ok(CompiledStage {
        kind,
        origin: source.origin.clone(),
        module,
        info,
        ledger: ledger.clone(),
    })
}

fn stage_failure(
    kind: StageKind,
    source: &ShaderSource,
    log: String,
    log_diagnostics: bool,
) -> CompileError {
    if log_diagnostics {
        tracing::error!(stage = %kind, file = %source.origin, "shader compilation failed:\n{log}");
    } else {
        tracing::error!(stage = %kind, file = %source.origin, "shader compilation failed");
    }
    CompileError {
        stage: kind,
        file: source.origin.clone(),
        log,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r"#version 450
layout(location = 0) in vec4 position;

void main() {
    gl_Position = position;
}
";

    #[test]
    fn valid_stage_registers_with_ledger_until_dropped() {
        let ledger = StageLedger::default();
        let stage = compile_stage(
            StageKind::Vertex,
            &ShaderSource::new("inline.vsh", VERTEX),
            &ledger,
            false,
        )
        .expect("vertex stage compiles");
        assert_eq!(stage.kind(), StageKind::Vertex);
        assert_eq!(stage.origin(), "inline.vsh");
        assert_eq!(ledger.live(), 1);
        drop(stage);
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn syntax_error_names_stage_and_file() {
        let ledger = StageLedger::default();
        let source = ShaderSource::new("broken.fsh", "#version 450\nvoid main( {\n");
        let err = compile_stage(StageKind::Fragment, &source, &ledger, true)
            .err()
            .expect("broken source fails");
        assert_eq!(err.stage, StageKind::Fragment);
        assert_eq!(err.file, "broken.fsh");
        assert!(!err.log.is_empty());
        assert_eq!(ledger.live(), 0);
        assert!(err.to_string().contains("broken.fsh"));
    }
}
