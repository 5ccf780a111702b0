use anyhow::{Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::program::ShaderProgram;
use crate::runtime::FrameTimestamp;
use crate::types::{GpuErrorPolicy, GpuPowerPreference};

use super::context::GpuContext;
use super::pipeline::QuadPipeline;

const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Owns the GPU context and the quad pipeline built from one program.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: QuadPipeline,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        program: ShaderProgram,
        power: GpuPowerPreference,
        error_policy: GpuErrorPolicy,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size, power, error_policy)?;
        let label = program.label().to_string();
        let pipeline = QuadPipeline::new(&context.device, context.surface_format, &program)
            .with_context(|| format!("failed to create pipeline for {label}"))?;
        tracing::info!(program = %label, "quad pipeline ready");
        Ok(Self { context, pipeline })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Draws one frame for `timestamp` and presents it.
    pub(crate) fn render(&mut self, timestamp: FrameTimestamp) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(offset) = &self.pipeline.offset {
            offset.write(&self.context.queue, timestamp);
        }

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quad encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let pipeline = &self.pipeline;
            render_pass.set_pipeline(&pipeline.pipeline);
            for (group, bind_group) in &pipeline.bind_groups {
                render_pass.set_bind_group(*group, bind_group, &[]);
            }
            render_pass.set_vertex_buffer(0, pipeline.vertex_buffer.slice(..));
            if let Some(defaults) = &pipeline.default_buffer {
                render_pass.set_vertex_buffer(1, defaults.slice(..));
            }
            render_pass.set_index_buffer(pipeline.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..pipeline.index_count(), 0, 0..1);
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
