//! Shader program build-and-introspect sequence.
//!
//! ```text
//!   .vsh ─▶ compile_stage ─┐
//!                          ├─▶ link ─▶ release stages ─▶ resolve bindings ─▶ ShaderProgram
//!   .fsh ─▶ compile_stage ─┘
//! ```
//!
//! Stages are naga modules parsed from GLSL and validated. Linking checks the
//! vertex/fragment interface the way a GL driver would, pins the `fragColor`
//! output to slot 0, and snapshots the reflection data the renderer needs.
//! Compiled stages never outlive a build: they are released right after the
//! link step whether it succeeded or not.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use wgpu::naga::valid::{FunctionInfo, GlobalUse};
use wgpu::naga::{AddressSpace, Binding, Handle, Module, ShaderStage, TypeInner};

use crate::compile::{compile_stage, CompileError, CompiledStage, ShaderSource, StageLedger};
use crate::types::{StageKind, VariableBinding};

/// Name of the fragment colour output.
pub const FRAG_COLOR_NAME: &str = "fragColor";
/// Colour slot the fragment output is bound to.
pub const FRAG_COLOR_SLOT: u32 = 0;
/// Vertex attribute carrying the quad corner position.
pub const POSITION_ATTRIBUTE: &str = "position";
/// Vertex attribute carrying the per-corner colour.
pub const COLOR_ATTRIBUTE: &str = "color";
/// Uniform holding the animated offset.
pub const OFFSET_UNIFORM: &str = "p";

const ENTRY_POINT: &str = "main";

/// Knobs for a build. Diagnostics are a runtime flag rather than a debug-only
/// code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Write compiler and linker diagnostics to the log.
    pub log_diagnostics: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            log_diagnostics: cfg!(debug_assertions),
        }
    }
}

/// Why two individually valid stages could not be combined.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("{stage} shader has no `main` entry point")]
    MissingEntryPoint { stage: StageKind },
    #[error("fragment input `{name}` at location {location} is not written by the vertex shader")]
    MissingVarying { name: String, location: u32 },
    #[error("varying `{name}` at location {location} has different types in the vertex and fragment shaders")]
    VaryingTypeMismatch { name: String, location: u32 },
    #[error("uniform `{name}` is declared with different types in the vertex and fragment shaders")]
    UniformTypeMismatch { name: String },
    #[error("fragment shader does not write colour slot {slot}")]
    MissingColorOutput { slot: u32 },
    #[error("`fragColor` is bound to slot {found}, expected slot {expected}")]
    FragColorSlot { found: u32, expected: u32 },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read shader source {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("shader compilation failed: {}", describe_failures(.0))]
    CompilationFailed(Vec<CompileError>),
    /// Linking failed. The builder has already destroyed the partially linked
    /// program; there is nothing for the caller to clean up.
    #[error("failed to link shader program")]
    LinkFailed(#[from] LinkError),
}

fn describe_failures(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(|err| format!("{} ({})", err.file, err.stage))
        .collect::<Vec<_>>()
        .join(", ")
}

/// An active or inactive vertex shader input.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexInput {
    pub name: Option<String>,
    pub location: u32,
    /// Whether the vertex entry point ever reads the input.
    pub active: bool,
    pub(crate) ty: TypeInner,
}

/// A uniform buffer the linked program reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    /// Size of the block in bytes.
    pub size: u32,
}

/// Where a uniform variable lives inside its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub group: u32,
    pub binding: u32,
    /// Byte offset of the variable inside the block.
    pub offset: u32,
    /// Size of the variable in bytes.
    pub size: u32,
}

#[derive(Debug, Clone)]
struct UniformVariable {
    name: String,
    slot: UniformSlot,
}

/// The three locations the quad renderer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramBindings {
    /// Uniform `p`.
    pub offset: VariableBinding,
    /// Attribute `position`.
    pub position: VariableBinding,
    /// Attribute `color`.
    pub color: VariableBinding,
}

/// A linked, introspected program.
///
/// Immutable once built; hand it to the renderer by value.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    label: String,
    vertex: Module,
    fragment: Module,
    vertex_inputs: Vec<VertexInput>,
    uniform_blocks: Vec<UniformBlock>,
    uniforms: Vec<UniformVariable>,
    bindings: ProgramBindings,
}

impl ShaderProgram {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bindings(&self) -> ProgramBindings {
        self.bindings
    }

    pub fn vertex_module(&self) -> &Module {
        &self.vertex
    }

    pub fn fragment_module(&self) -> &Module {
        &self.fragment
    }

    /// Every located vertex input, active or not, ordered by location.
    pub fn vertex_inputs(&self) -> &[VertexInput] {
        &self.vertex_inputs
    }

    /// Uniform buffers read by either stage.
    pub fn uniform_blocks(&self) -> &[UniformBlock] {
        &self.uniform_blocks
    }

    /// Location of an active vertex attribute, `-1` when absent or unused.
    pub fn attribute_location(&self, name: &str) -> VariableBinding {
        self.vertex_inputs
            .iter()
            .find(|input| input.active && input.name.as_deref() == Some(name))
            .map(|input| VariableBinding::at(input.location))
            .unwrap_or(VariableBinding::NOT_FOUND)
    }

    /// Location of an active uniform, `-1` when absent or unused.
    ///
    /// The location of a uniform is the binding index of the buffer it lives
    /// in; see [`ShaderProgram::uniform_slot`] for the full address.
    pub fn uniform_location(&self, name: &str) -> VariableBinding {
        self.uniform_slot(name)
            .map(|slot| VariableBinding::at(slot.binding))
            .unwrap_or(VariableBinding::NOT_FOUND)
    }

    pub fn uniform_slot(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms
            .iter()
            .find(|uniform| uniform.name == name)
            .map(|uniform| uniform.slot)
    }

    /// Address of the animated offset uniform, if the program uses it.
    pub fn offset_slot(&self) -> Option<UniformSlot> {
        if self.bindings.offset.is_found() {
            self.uniform_slot(OFFSET_UNIFORM)
        } else {
            None
        }
    }

    fn from_linked(label: String, linked: LinkedProgram) -> Self {
        let mut program = Self {
            label,
            vertex: linked.vertex,
            fragment: linked.fragment,
            vertex_inputs: linked.vertex_inputs,
            uniform_blocks: linked.uniform_blocks,
            uniforms: linked.uniforms,
            bindings: ProgramBindings {
                offset: VariableBinding::NOT_FOUND,
                position: VariableBinding::NOT_FOUND,
                color: VariableBinding::NOT_FOUND,
            },
        };

        let offset = program.uniform_location(OFFSET_UNIFORM);
        warn_if_missing(OFFSET_UNIFORM, "uniform", offset);
        let color = program.attribute_location(COLOR_ATTRIBUTE);
        warn_if_missing(COLOR_ATTRIBUTE, "attribute", color);
        let position = program.attribute_location(POSITION_ATTRIBUTE);
        warn_if_missing(POSITION_ATTRIBUTE, "attribute", position);

        program.bindings = ProgramBindings {
            offset,
            position,
            color,
        };
        program
    }
}

fn warn_if_missing(name: &str, kind: &str, binding: VariableBinding) {
    if !binding.is_found() {
        tracing::warn!(variable = name, kind, "shader did not contain variable '{name}'");
    }
}

/// Builds [`ShaderProgram`]s from vertex/fragment source pairs.
#[derive(Debug, Default)]
pub struct ShaderProgramBuilder {
    options: BuildOptions,
    ledger: StageLedger,
}

impl ShaderProgramBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            ledger: StageLedger::default(),
        }
    }

    /// Compiled stages created by this builder that are still alive.
    ///
    /// Always zero between builds.
    pub fn live_stage_count(&self) -> usize {
        self.ledger.live()
    }

    /// Reads both stage sources from disk and builds them.
    pub fn build(
        &self,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> Result<ShaderProgram, BuildError> {
        let vertex = read_source(vertex_path)?;
        let fragment = read_source(fragment_path)?;
        self.build_sources(&vertex, &fragment)
    }

    /// Compiles, links and introspects an in-memory source pair.
    pub fn build_sources(
        &self,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
    ) -> Result<ShaderProgram, BuildError> {
        let log = self.options.log_diagnostics;
        let vertex_stage = compile_stage(StageKind::Vertex, vertex, &self.ledger, log);
        let fragment_stage = compile_stage(StageKind::Fragment, fragment, &self.ledger, log);

        let (vertex_stage, fragment_stage) = match (vertex_stage, fragment_stage) {
            (Ok(vertex_stage), Ok(fragment_stage)) => (vertex_stage, fragment_stage),
            (vertex_stage, fragment_stage) => {
                let errors: Vec<CompileError> = [vertex_stage.err(), fragment_stage.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                return Err(BuildError::CompilationFailed(errors));
            }
        };

        let linked = link(&vertex_stage, &fragment_stage);
        drop(vertex_stage);
        drop(fragment_stage);

        let linked = linked.map_err(|err| {
            let (vertex, fragment) = (&vertex.origin, &fragment.origin);
            if log {
                tracing::error!(%vertex, %fragment, "shader program linking failed: {err}");
            } else {
                tracing::error!(%vertex, %fragment, "failed to link shader program");
            }
            BuildError::LinkFailed(err)
        })?;

        let label = format!("{} + {}", vertex.origin, fragment.origin);
        tracing::debug!(program = %label, "linked shader program");
        Ok(ShaderProgram::from_linked(label, linked))
    }
}

fn read_source(path: &Path) -> Result<ShaderSource, BuildError> {
    ShaderSource::read(path).map_err(|source| {
        tracing::error!(path = %path.display(), "failed to read shader file: {source}");
        BuildError::Read {
            path: path.to_path_buf(),
            source,
        }
    })
}

struct LinkedProgram {
    vertex: Module,
    fragment: Module,
    vertex_inputs: Vec<VertexInput>,
    uniform_blocks: Vec<UniformBlock>,
    uniforms: Vec<UniformVariable>,
}

#[derive(Debug, Clone)]
struct Varying {
    name: Option<String>,
    location: u32,
    ty: TypeInner,
}

impl Varying {
    fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("<location {}>", self.location))
    }
}

/// Combines two compiled stages and snapshots their reflection data.
fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<LinkedProgram, LinkError> {
    debug_assert_eq!(vertex.kind(), StageKind::Vertex);
    debug_assert_eq!(fragment.kind(), StageKind::Fragment);

    let vertex_entry = entry_point_index(vertex.module(), StageKind::Vertex)?;
    let fragment_entry = entry_point_index(fragment.module(), StageKind::Fragment)?;

    let vertex_outputs = entry_outputs(vertex.module(), vertex_entry);
    let fragment_inputs = entry_inputs(fragment.module(), fragment_entry);
    for input in &fragment_inputs {
        let Some(output) = vertex_outputs
            .iter()
            .find(|output| output.location == input.location)
        else {
            return Err(LinkError::MissingVarying {
                name: input.display_name(),
                location: input.location,
            });
        };
        if output.ty != input.ty {
            return Err(LinkError::VaryingTypeMismatch {
                name: input.display_name(),
                location: input.location,
            });
        }
    }

    check_shared_uniforms(vertex.module(), fragment.module())?;

    let fragment_outputs = entry_outputs(fragment.module(), fragment_entry);
    match fragment_outputs
        .iter()
        .find(|output| output.name.as_deref() == Some(FRAG_COLOR_NAME))
    {
        Some(color) if color.location != FRAG_COLOR_SLOT => {
            return Err(LinkError::FragColorSlot {
                found: color.location,
                expected: FRAG_COLOR_SLOT,
            });
        }
        Some(_) => {}
        None => {
            if !fragment_outputs
                .iter()
                .any(|output| output.location == FRAG_COLOR_SLOT)
            {
                return Err(LinkError::MissingColorOutput {
                    slot: FRAG_COLOR_SLOT,
                });
            }
        }
    }

    let vertex_info = vertex.info().get_entry_point(vertex_entry);
    let fragment_info = fragment.info().get_entry_point(fragment_entry);

    let vertex_inputs = reflect_vertex_inputs(vertex.module(), vertex_entry, vertex_info);

    let mut uniform_blocks = Vec::new();
    let mut uniforms = Vec::new();
    reflect_uniforms(vertex.module(), vertex_info, &mut uniform_blocks, &mut uniforms);
    reflect_uniforms(fragment.module(), fragment_info, &mut uniform_blocks, &mut uniforms);

    Ok(LinkedProgram {
        vertex: vertex.module().clone(),
        fragment: fragment.module().clone(),
        vertex_inputs,
        uniform_blocks,
        uniforms,
    })
}

/// Uniforms declared in both stages under one name must agree on their type.
fn check_shared_uniforms(vertex: &Module, fragment: &Module) -> Result<(), LinkError> {
    let fragment_uniforms = declared_uniforms(fragment);
    for (name, vertex_ty) in declared_uniforms(vertex) {
        let conflicting = fragment_uniforms
            .iter()
            .filter(|(other, _)| *other == name)
            .any(|(_, fragment_ty)| !same_type(vertex, vertex_ty, fragment, *fragment_ty));
        if conflicting {
            return Err(LinkError::UniformTypeMismatch {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Named uniform blocks and their named members.
fn declared_uniforms(module: &Module) -> Vec<(&str, Handle<wgpu::naga::Type>)> {
    let mut declared = Vec::new();
    for (_, global) in module.global_variables.iter() {
        if global.space != AddressSpace::Uniform {
            continue;
        }
        if let Some(name) = global.name.as_deref() {
            declared.push((name, global.ty));
        }
        if let TypeInner::Struct { members, .. } = &module.types[global.ty].inner {
            for member in members {
                if let Some(name) = member.name.as_deref() {
                    declared.push((name, member.ty));
                }
            }
        }
    }
    declared
}

/// Structural type equality across two modules; handles are module-local.
fn same_type(
    a: &Module,
    a_ty: Handle<wgpu::naga::Type>,
    b: &Module,
    b_ty: Handle<wgpu::naga::Type>,
) -> bool {
    match (&a.types[a_ty].inner, &b.types[b_ty].inner) {
        (
            TypeInner::Struct {
                members: a_members,
                span: a_span,
            },
            TypeInner::Struct {
                members: b_members,
                span: b_span,
            },
        ) => {
            a_span == b_span
                && a_members.len() == b_members.len()
                && a_members.iter().zip(b_members).all(|(x, y)| {
                    x.name == y.name && x.offset == y.offset && same_type(a, x.ty, b, y.ty)
                })
        }
        (
            TypeInner::Array {
                base: a_base,
                size: a_size,
                stride: a_stride,
            },
            TypeInner::Array {
                base: b_base,
                size: b_size,
                stride: b_stride,
            },
        ) => a_size == b_size && a_stride == b_stride && same_type(a, *a_base, b, *b_base),
        (a_inner, b_inner) => a_inner == b_inner,
    }
}

fn entry_point_index(module: &Module, stage: StageKind) -> Result<usize, LinkError> {
    let naga_stage: ShaderStage = stage.naga_stage();
    module
        .entry_points
        .iter()
        .position(|entry| entry.stage == naga_stage && entry.name == ENTRY_POINT)
        .ok_or(LinkError::MissingEntryPoint { stage })
}

fn entry_inputs(module: &Module, entry: usize) -> Vec<Varying> {
    let function = &module.entry_points[entry].function;
    let mut varyings = Vec::new();
    for argument in &function.arguments {
        collect_varyings(
            module,
            argument.ty,
            argument.binding.as_ref(),
            argument.name.as_ref(),
            &mut varyings,
        );
    }
    varyings
}

fn entry_outputs(module: &Module, entry: usize) -> Vec<Varying> {
    let mut varyings = Vec::new();
    if let Some(result) = &module.entry_points[entry].function.result {
        collect_varyings(module, result.ty, result.binding.as_ref(), None, &mut varyings);
    }
    varyings
}

/// Flattens an entry point argument or result into located varyings.
/// Builtins are skipped; struct members carry their own bindings.
fn collect_varyings(
    module: &Module,
    ty: Handle<wgpu::naga::Type>,
    binding: Option<&Binding>,
    name: Option<&String>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(Varying {
            name: name.cloned(),
            location: *location,
            ty: module.types[ty].inner.clone(),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_varyings(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        member.name.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

/// Reflects the vertex entry point's located inputs.
///
/// The GLSL frontend copies each input into a private global of the same
/// name before calling `main`, so an input is active when that global is read.
fn reflect_vertex_inputs(module: &Module, entry: usize, info: &FunctionInfo) -> Vec<VertexInput> {
    let mut inputs: Vec<VertexInput> = entry_inputs(module, entry)
        .into_iter()
        .map(|varying| {
            let active = varying
                .name
                .as_deref()
                .map(|name| private_global_is_read(module, info, name))
                .unwrap_or(true);
            VertexInput {
                name: varying.name,
                location: varying.location,
                active,
                ty: varying.ty,
            }
        })
        .collect();
    inputs.sort_by_key(|input| input.location);
    inputs
}

fn private_global_is_read(module: &Module, info: &FunctionInfo, name: &str) -> bool {
    let mut matching = module
        .global_variables
        .iter()
        .filter(|(_, global)| {
            global.space == AddressSpace::Private && global.name.as_deref() == Some(name)
        })
        .peekable();
    if matching.peek().is_none() {
        // No shadow global: the input is consumed directly by the entry point.
        return true;
    }
    matching.any(|(handle, _)| info[handle].contains(GlobalUse::READ))
}

fn reflect_uniforms(
    module: &Module,
    info: &FunctionInfo,
    blocks: &mut Vec<UniformBlock>,
    uniforms: &mut Vec<UniformVariable>,
) {
    let ctx = module.to_ctx();
    for (handle, global) in module.global_variables.iter() {
        if global.space != AddressSpace::Uniform {
            continue;
        }
        let Some(resource) = global.binding.as_ref() else {
            continue;
        };
        if !info[handle].contains(GlobalUse::READ) {
            continue;
        }

        let inner = &module.types[global.ty].inner;
        let size = inner.size(ctx);
        match blocks
            .iter_mut()
            .find(|block| block.group == resource.group && block.binding == resource.binding)
        {
            Some(block) => block.size = block.size.max(size),
            None => blocks.push(UniformBlock {
                group: resource.group,
                binding: resource.binding,
                size,
            }),
        }

        let mut record = |name: &str, offset: u32, size: u32| {
            if uniforms.iter().any(|uniform| uniform.name == name) {
                return;
            }
            uniforms.push(UniformVariable {
                name: name.to_string(),
                slot: UniformSlot {
                    group: resource.group,
                    binding: resource.binding,
                    offset,
                    size,
                },
            });
        };

        if let Some(name) = global.name.as_deref() {
            record(name, 0, size);
        }
        if let TypeInner::Struct { members, .. } = inner {
            for member in members {
                if let Some(name) = member.name.as_deref() {
                    record(name, member.offset, module.types[member.ty].inner.size(ctx));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r"#version 450
layout(location = 0) in vec4 position;
layout(location = 1) in vec4 color;
layout(location = 0) out vec4 v_color;

layout(set = 0, binding = 0) uniform Offset {
    vec2 p;
};

void main() {
    v_color = color;
    gl_Position = position + vec4(p, 0.0, 0.0);
}
";

    const FRAGMENT: &str = r"#version 450
layout(location = 0) in vec4 v_color;
layout(location = 0) out vec4 fragColor;

void main() {
    fragColor = v_color;
}
";

    const POSITION_ONLY_VERTEX: &str = r"#version 450
layout(location = 0) in vec4 position;

void main() {
    gl_Position = position;
}
";

    const SOLID_FRAGMENT: &str = r"#version 450
layout(location = 0) out vec4 fragColor;

void main() {
    fragColor = vec4(1.0, 0.5, 0.0, 1.0);
}
";

    fn builder() -> ShaderProgramBuilder {
        ShaderProgramBuilder::new(BuildOptions {
            log_diagnostics: true,
        })
    }

    fn build(vertex: &str, fragment: &str) -> (ShaderProgramBuilder, Result<ShaderProgram, BuildError>) {
        let builder = builder();
        let result = builder.build_sources(
            &ShaderSource::new("test.vsh", vertex),
            &ShaderSource::new("test.fsh", fragment),
        );
        (builder, result)
    }

    #[test]
    fn full_program_resolves_all_bindings() {
        let (builder, result) = build(VERTEX, FRAGMENT);
        let program = result.expect("program links");
        let bindings = program.bindings();
        assert_eq!(bindings.position, VariableBinding::at(0));
        assert_eq!(bindings.color, VariableBinding::at(1));
        assert_eq!(bindings.offset, VariableBinding::at(0));

        let slot = program.offset_slot().expect("p is active");
        assert_eq!((slot.group, slot.binding, slot.offset, slot.size), (0, 0, 0, 8));
        assert_eq!(program.uniform_blocks().len(), 1);
        assert_eq!(builder.live_stage_count(), 0);
    }

    #[test]
    fn position_only_shader_leaves_color_and_offset_unresolved() {
        let (builder, result) = build(POSITION_ONLY_VERTEX, SOLID_FRAGMENT);
        let program = result.expect("program links");
        let bindings = program.bindings();
        assert!(bindings.position.is_found());
        assert_eq!(bindings.color.raw(), -1);
        assert_eq!(bindings.offset.raw(), -1);
        assert!(program.offset_slot().is_none());
        assert!(program.uniform_blocks().is_empty());
        assert_eq!(builder.live_stage_count(), 0);
    }

    #[test]
    fn declared_but_unused_variables_resolve_to_not_found() {
        let vertex = r"#version 450
layout(location = 0) in vec4 position;
layout(location = 1) in vec4 color;

layout(set = 0, binding = 0) uniform Offset {
    vec2 p;
};

void main() {
    gl_Position = position;
}
";
        let (_, result) = build(vertex, SOLID_FRAGMENT);
        let program = result.expect("program links");
        assert!(program.bindings().position.is_found());
        assert_eq!(program.bindings().color, VariableBinding::NOT_FOUND);
        assert_eq!(program.bindings().offset, VariableBinding::NOT_FOUND);

        let declared = program
            .vertex_inputs()
            .iter()
            .find(|input| input.name.as_deref() == Some(COLOR_ATTRIBUTE))
            .expect("declared input is reflected");
        assert!(!declared.active);
        assert_eq!(declared.location, 1);
    }

    #[test]
    fn syntax_error_in_vertex_stage_fails_compilation() {
        let (builder, result) = build("#version 450\nvoid main() { gl_Position = ; }\n", FRAGMENT);
        match result {
            Err(BuildError::CompilationFailed(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].stage, StageKind::Vertex);
                assert_eq!(errors[0].file, "test.vsh");
            }
            other => panic!("expected compilation failure, got {other:?}"),
        }
        assert_eq!(builder.live_stage_count(), 0);
    }

    #[test]
    fn syntax_errors_in_both_stages_are_all_reported() {
        let (builder, result) = build("#version 450\nvoid main( {}\n", "#version 450\nvoid main( {}\n");
        match result {
            Err(BuildError::CompilationFailed(errors)) => {
                let stages: Vec<_> = errors.iter().map(|err| err.stage).collect();
                assert_eq!(stages, vec![StageKind::Vertex, StageKind::Fragment]);
            }
            other => panic!("expected compilation failure, got {other:?}"),
        }
        assert_eq!(builder.live_stage_count(), 0);
    }

    #[test]
    fn unmatched_varying_fails_link() {
        let (builder, result) = build(POSITION_ONLY_VERTEX, FRAGMENT);
        match result {
            Err(BuildError::LinkFailed(LinkError::MissingVarying { location, .. })) => {
                assert_eq!(location, 0);
            }
            other => panic!("expected link failure, got {other:?}"),
        }
        assert_eq!(builder.live_stage_count(), 0);
    }

    #[test]
    fn mismatched_varying_types_fail_link() {
        let fragment = r"#version 450
layout(location = 0) in vec2 v_color;
layout(location = 0) out vec4 fragColor;

void main() {
    fragColor = vec4(v_color, 0.0, 1.0);
}
";
        let (builder, result) = build(VERTEX, fragment);
        assert!(matches!(
            result,
            Err(BuildError::LinkFailed(LinkError::VaryingTypeMismatch { location: 0, .. }))
        ));
        assert_eq!(builder.live_stage_count(), 0);
    }

    #[test]
    fn conflicting_uniform_types_across_stages_fail_link() {
        let vertex = r"#version 450
layout(location = 0) in vec4 position;

layout(set = 0, binding = 0) uniform V {
    vec2 p;
};

void main() {
    gl_Position = position + vec4(p, 0.0, 0.0);
}
";
        let fragment = r"#version 450
layout(location = 0) out vec4 fragColor;

layout(set = 0, binding = 1) uniform F {
    vec4 p;
};

void main() {
    fragColor = p;
}
";
        let (builder, result) = build(vertex, fragment);
        match result {
            Err(BuildError::LinkFailed(LinkError::UniformTypeMismatch { name })) => {
                assert_eq!(name, OFFSET_UNIFORM);
            }
            other => panic!("expected uniform type mismatch, got {other:?}"),
        }
        assert_eq!(builder.live_stage_count(), 0);
    }

    #[test]
    fn matching_uniform_declared_in_both_stages_links() {
        let fragment = r"#version 450
layout(location = 0) in vec4 v_color;
layout(location = 0) out vec4 fragColor;

layout(set = 0, binding = 0) uniform Offset {
    vec2 p;
};

void main() {
    fragColor = v_color + vec4(p, 0.0, 0.0);
}
";
        let (_, result) = build(VERTEX, fragment);
        let program = result.expect("identical declarations link");
        assert_eq!(program.bindings().offset, VariableBinding::at(0));
        assert_eq!(program.uniform_blocks().len(), 1);
    }

    #[test]
    fn frag_color_outside_slot_zero_fails_link() {
        let fragment = r"#version 450
layout(location = 1) out vec4 fragColor;

void main() {
    fragColor = vec4(1.0);
}
";
        let (_, result) = build(POSITION_ONLY_VERTEX, fragment);
        assert!(matches!(
            result,
            Err(BuildError::LinkFailed(LinkError::FragColorSlot { found: 1, expected: 0 }))
        ));
    }

    #[test]
    fn missing_file_reports_read_error() {
        let builder = builder();
        let err = builder
            .build(Path::new("/nonexistent/Shader.vsh"), Path::new("/nonexistent/Shader.fsh"))
            .expect_err("missing sources");
        assert!(matches!(err, BuildError::Read { .. }));
        assert_eq!(builder.live_stage_count(), 0);
    }

    #[test]
    fn lookups_for_unknown_names_are_not_found() {
        let (_, result) = build(VERTEX, FRAGMENT);
        let program = result.expect("program links");
        assert_eq!(program.attribute_location("normal"), VariableBinding::NOT_FOUND);
        assert_eq!(program.uniform_location("q"), VariableBinding::NOT_FOUND);
    }
}
