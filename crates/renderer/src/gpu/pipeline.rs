use std::borrow::Cow;

use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::diagnostics::capture_validation;
use crate::geometry::{
    UnsupportedVertexInput, VertexLayoutPlan, DEFAULT_ATTRIBUTE, QUAD_INDICES, QUAD_VERTICES,
};
use crate::program::ShaderProgram;

use super::uniforms::{uniform_buffer_size, OffsetTarget};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    UnsupportedInput(#[from] UnsupportedVertexInput),
    #[error("GPU rejected the {what}: {message}")]
    Validation { what: &'static str, message: String },
}

/// Everything needed to draw the quad with one linked program.
pub(crate) struct QuadPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub default_buffer: Option<wgpu::Buffer>,
    pub bind_groups: Vec<(u32, wgpu::BindGroup)>,
    pub offset: Option<OffsetTarget>,
}

impl QuadPipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        program: &ShaderProgram,
    ) -> Result<Self, PipelineError> {
        let layout_plan = VertexLayoutPlan::for_program(program)?;

        let (pipeline, error) = capture_validation(device, || {
            let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("quad vertex"),
                source: wgpu::ShaderSource::Naga(Cow::Owned(program.vertex_module().clone())),
            });
            let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("quad fragment"),
                source: wgpu::ShaderSource::Naga(Cow::Owned(program.fragment_module().clone())),
            });
            let buffers = layout_plan.buffer_layouts();

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("quad pipeline"),
                layout: None,
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some("main"),
                    buffers: &buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            })
        });
        if let Some(error) = error {
            return Err(PipelineError::Validation {
                what: "render pipeline",
                message: error.to_string(),
            });
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let default_buffer = (!layout_plan.defaults.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("default vertex attribute"),
                contents: bytemuck::cast_slice(&DEFAULT_ATTRIBUTE),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let uniform_buffers: Vec<_> = program
            .uniform_blocks()
            .iter()
            .map(|block| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("uniform block"),
                    size: uniform_buffer_size(block.size),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (*block, buffer)
            })
            .collect();

        let mut groups: Vec<u32> = uniform_buffers.iter().map(|(block, _)| block.group).collect();
        groups.sort_unstable();
        groups.dedup();

        let (bind_groups, error) = capture_validation(device, || {
            groups
                .iter()
                .map(|&group| {
                    let layout = pipeline.get_bind_group_layout(group);
                    let entries: Vec<wgpu::BindGroupEntry<'_>> = uniform_buffers
                        .iter()
                        .filter(|(block, _)| block.group == group)
                        .map(|(block, buffer)| wgpu::BindGroupEntry {
                            binding: block.binding,
                            resource: buffer.as_entire_binding(),
                        })
                        .collect();
                    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("uniform bind group"),
                        layout: &layout,
                        entries: &entries,
                    });
                    (group, bind_group)
                })
                .collect::<Vec<_>>()
        });
        if let Some(error) = error {
            return Err(PipelineError::Validation {
                what: "uniform bind group",
                message: error.to_string(),
            });
        }

        let offset = program.offset_slot().and_then(|slot| {
            uniform_buffers
                .iter()
                .find(|(block, _)| block.group == slot.group && block.binding == slot.binding)
                .map(|(_, buffer)| OffsetTarget::new(buffer.clone(), slot))
        });
        if offset.is_none() {
            tracing::debug!("program has no offset uniform; quad will stay still");
        }

        Ok(Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            default_buffer,
            bind_groups,
            offset,
        })
    }

    pub fn index_count(&self) -> u32 {
        QUAD_INDICES.len() as u32
    }
}
