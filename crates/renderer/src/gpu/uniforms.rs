use bytemuck::{Pod, Zeroable};

use crate::program::UniformSlot;
use crate::runtime::{offset_for, FrameTimestamp};

/// Host-side mirror of the `vec2 p` uniform.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct OffsetUniform {
    pub value: [f32; 2],
}

impl OffsetUniform {
    pub fn at(timestamp: FrameTimestamp) -> Self {
        Self {
            value: offset_for(timestamp.seconds()),
        }
    }
}

/// Where `p` lives on the GPU: a uniform buffer plus the variable's offset.
pub(crate) struct OffsetTarget {
    buffer: wgpu::Buffer,
    offset: wgpu::BufferAddress,
}

impl OffsetTarget {
    pub fn new(buffer: wgpu::Buffer, slot: UniformSlot) -> Self {
        Self {
            buffer,
            offset: wgpu::BufferAddress::from(slot.offset),
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, timestamp: FrameTimestamp) {
        let uniform = OffsetUniform::at(timestamp);
        queue.write_buffer(&self.buffer, self.offset, bytemuck::bytes_of(&uniform));
    }
}

/// Uniform buffers must be at least 16 bytes and sized in 16 byte steps.
pub(crate) fn uniform_buffer_size(block_size: u32) -> wgpu::BufferAddress {
    let size = wgpu::BufferAddress::from(block_size.max(16));
    size.div_ceil(16) * 16
}
