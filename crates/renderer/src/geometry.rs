use bytemuck::{Pod, Zeroable};
use thiserror::Error;
use wgpu::naga::{ScalarKind, TypeInner, VectorSize};

use crate::program::{ShaderProgram, VertexInput, COLOR_ATTRIBUTE, POSITION_ATTRIBUTE};

/// One quad corner: clip-space position followed by RGBA colour.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

pub const VERTEX_STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;
pub const POSITION_OFFSET: u64 = 0;
pub const COLOR_OFFSET: u64 = 16;

pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex {
        position: [-0.5, -0.5, 0.0, 1.0],
        color: [1.0, 0.0, 0.0, 1.0],
    },
    Vertex {
        position: [-0.5, 0.5, 0.0, 1.0],
        color: [0.0, 1.0, 0.0, 1.0],
    },
    Vertex {
        position: [0.5, 0.5, 0.0, 1.0],
        color: [0.0, 0.0, 1.0, 1.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0, 1.0],
        color: [1.0, 1.0, 1.0, 1.0],
    },
];

/// The quad as a triangle fan around vertex 0, expanded into a list.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Value fed to inputs the quad buffer does not provide, matching the
/// `(0, 0, 0, 1)` a disabled attribute array reads as.
pub const DEFAULT_ATTRIBUTE: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
pub const DEFAULT_ATTRIBUTE_STRIDE: u64 = std::mem::size_of::<[f32; 4]>() as u64;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("vertex input `{name}` at location {location} has a type vertex buffers cannot feed")]
pub struct UnsupportedVertexInput {
    pub name: String,
    pub location: u32,
}

/// Vertex attributes split between the quad buffer and the per-instance
/// default buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayoutPlan {
    pub quad: Vec<wgpu::VertexAttribute>,
    pub defaults: Vec<wgpu::VertexAttribute>,
}

impl VertexLayoutPlan {
    /// Wires resolved `position`/`color` inputs to the quad buffer; every
    /// other declared input reads the constant default.
    pub fn for_program(program: &ShaderProgram) -> Result<Self, UnsupportedVertexInput> {
        let mut quad = Vec::new();
        let mut defaults = Vec::new();

        for input in program.vertex_inputs() {
            let format = vertex_format(input)?;
            let quad_offset = if input.active {
                match input.name.as_deref() {
                    Some(POSITION_ATTRIBUTE) => Some(POSITION_OFFSET),
                    Some(COLOR_ATTRIBUTE) => Some(COLOR_OFFSET),
                    _ => None,
                }
            } else {
                None
            };

            match quad_offset {
                Some(offset) if is_float(format) => quad.push(wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset,
                    shader_location: input.location,
                }),
                Some(_) => return Err(unsupported(input)),
                None => defaults.push(wgpu::VertexAttribute {
                    format,
                    offset: 0,
                    shader_location: input.location,
                }),
            }
        }

        Ok(Self { quad, defaults })
    }

    pub fn buffer_layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        let mut layouts = vec![wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.quad,
        }];
        if !self.defaults.is_empty() {
            layouts.push(wgpu::VertexBufferLayout {
                array_stride: DEFAULT_ATTRIBUTE_STRIDE,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &self.defaults,
            });
        }
        layouts
    }
}

fn unsupported(input: &VertexInput) -> UnsupportedVertexInput {
    UnsupportedVertexInput {
        name: input
            .name
            .clone()
            .unwrap_or_else(|| format!("<location {}>", input.location)),
        location: input.location,
    }
}

fn is_float(format: wgpu::VertexFormat) -> bool {
    matches!(
        format,
        wgpu::VertexFormat::Float32
            | wgpu::VertexFormat::Float32x2
            | wgpu::VertexFormat::Float32x3
            | wgpu::VertexFormat::Float32x4
    )
}

fn vertex_format(input: &VertexInput) -> Result<wgpu::VertexFormat, UnsupportedVertexInput> {
    use wgpu::VertexFormat as F;

    let (kind, width, components) = match &input.ty {
        TypeInner::Scalar(scalar) => (scalar.kind, scalar.width, 1),
        TypeInner::Vector { size, scalar } => {
            let components = match size {
                VectorSize::Bi => 2,
                VectorSize::Tri => 3,
                VectorSize::Quad => 4,
            };
            (scalar.kind, scalar.width, components)
        }
        _ => return Err(unsupported(input)),
    };
    if width != 4 {
        return Err(unsupported(input));
    }

    let format = match (kind, components) {
        (ScalarKind::Float, 1) => F::Float32,
        (ScalarKind::Float, 2) => F::Float32x2,
        (ScalarKind::Float, 3) => F::Float32x3,
        (ScalarKind::Float, _) => F::Float32x4,
        (ScalarKind::Sint, 1) => F::Sint32,
        (ScalarKind::Sint, 2) => F::Sint32x2,
        (ScalarKind::Sint, 3) => F::Sint32x3,
        (ScalarKind::Sint, _) => F::Sint32x4,
        (ScalarKind::Uint, 1) => F::Uint32,
        (ScalarKind::Uint, 2) => F::Uint32x2,
        (ScalarKind::Uint, 3) => F::Uint32x3,
        (ScalarKind::Uint, _) => F::Uint32x4,
        _ => return Err(unsupported(input)),
    };
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::ShaderSource;
    use crate::program::{BuildOptions, ShaderProgramBuilder};

    const FRAGMENT: &str = r"#version 450
layout(location = 0) out vec4 fragColor;

void main() {
    fragColor = vec4(1.0);
}
";

    fn program(vertex: &str) -> ShaderProgram {
        ShaderProgramBuilder::new(BuildOptions::default())
            .build_sources(
                &ShaderSource::new("layout.vsh", vertex),
                &ShaderSource::new("layout.fsh", FRAGMENT),
            )
            .expect("program links")
    }

    #[test]
    fn vertex_matches_buffer_stride() {
        assert_eq!(VERTEX_STRIDE, 32);
        assert_eq!(bytemuck::cast_slice::<Vertex, u8>(&QUAD_VERTICES).len(), 128);
    }

    #[test]
    fn fan_indices_cover_every_corner_once_per_triangle() {
        assert_eq!(QUAD_INDICES[..3], [0u16, 1, 2]);
        assert_eq!(QUAD_INDICES[3..], [0u16, 2, 3]);
        assert!(QUAD_INDICES
            .iter()
            .all(|&index| usize::from(index) < QUAD_VERTICES.len()));
    }

    #[test]
    fn resolved_attributes_read_from_quad_buffer() {
        let program = program(
            r"#version 450
layout(location = 0) in vec4 position;
layout(location = 3) in vec4 color;
layout(location = 0) out vec4 v_color;

void main() {
    v_color = color;
    gl_Position = position;
}
",
        );
        let plan = VertexLayoutPlan::for_program(&program).unwrap();
        let quad: Vec<_> = plan
            .quad
            .iter()
            .map(|attr| (attr.shader_location, attr.offset))
            .collect();
        assert_eq!(quad, vec![(0, POSITION_OFFSET), (3, COLOR_OFFSET)]);
        assert!(plan.defaults.is_empty());
        assert_eq!(plan.buffer_layouts().len(), 1);
    }

    #[test]
    fn missing_color_binding_is_skipped() {
        let program = program(
            r"#version 450
layout(location = 0) in vec4 position;

void main() {
    gl_Position = position;
}
",
        );
        let plan = VertexLayoutPlan::for_program(&program).unwrap();
        assert_eq!(plan.quad.len(), 1);
        assert_eq!(plan.quad[0].shader_location, 0);
        assert!(plan.quad.iter().all(|attr| attr.offset != COLOR_OFFSET));
    }

    #[test]
    fn unknown_inputs_read_the_default_attribute() {
        let program = program(
            r"#version 450
layout(location = 0) in vec4 position;
layout(location = 2) in vec2 uv;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = uv;
    gl_Position = position;
}
",
        );
        let plan = VertexLayoutPlan::for_program(&program).unwrap();
        assert_eq!(plan.defaults.len(), 1);
        assert_eq!(plan.defaults[0].shader_location, 2);
        assert_eq!(plan.defaults[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(plan.buffer_layouts().len(), 2);
    }
}
