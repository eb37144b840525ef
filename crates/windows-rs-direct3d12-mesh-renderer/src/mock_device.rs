//! A recording stand-in for the GPU, used by the unit tests.
//!
//! GPU work "completes" only when the CPU waits on the fence, so any attempt
//! to reuse an allocator before waiting shows up as an error.

use std::cell::Cell;

use eyre::eyre;

use crate::error::RendererError;
use crate::error::Result;
use crate::gpu::CommandList;
use crate::gpu::ConstantBufferId;
use crate::gpu::CpuDescriptor;
use crate::gpu::DescriptorHeapLayout;
use crate::gpu::Fence;
use crate::gpu::GpuDevice;
use crate::gpu::PipelineId;
use crate::gpu::VertexBufferView;
use crate::gpu::FRAME_COUNT;
use crate::pipeline::PipelineDesc;

#[derive(Debug, Default)]
pub struct MockFence {
    signaled: Cell<u64>,
    completed: Cell<u64>,
    pub fail_waits: Cell<bool>,
}

impl Fence for MockFence {
    fn completed_value(&self) -> u64 {
        self.completed.get()
    }

    fn wait_for(&self, value: u64) -> Result<()> {
        if self.fail_waits.get() {
            return Err(RendererError::FenceWait {
                value,
                message: "injected failure".into(),
            }
            .into());
        }
        if value > self.signaled.get() {
            // A real wait would never return.
            return Err(eyre!("waiting for {value}, which was never signaled"));
        }
        self.completed.set(self.completed.get().max(value));
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockDevice {
    pub fence: MockFence,
    pub current_buffer: usize,
    pub render_target_views: Vec<(usize, CpuDescriptor)>,
    pub vertex_buffers: Vec<Vec<u8>>,
    pub constant_buffers: Vec<Vec<u8>>,
    pub pipelines: Vec<PipelineDesc>,
    pub recorded: Vec<(usize, CommandList)>,
    pub presents: Vec<u32>,
    pub signals: Vec<u64>,
    pub fail_pipeline: bool,
    pub fail_execute: bool,
    pub fail_signal: bool,
    /// Fence value each allocator's last submission will reach.
    allocator_fences: [u64; FRAME_COUNT],
    unsignaled_submissions: Vec<usize>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            fence: MockFence::default(),
            current_buffer: 0,
            render_target_views: Vec::new(),
            vertex_buffers: Vec::new(),
            constant_buffers: Vec::new(),
            pipelines: Vec::new(),
            recorded: Vec::new(),
            presents: Vec::new(),
            signals: Vec::new(),
            fail_pipeline: false,
            fail_execute: false,
            fail_signal: false,
            allocator_fences: [0; FRAME_COUNT],
            unsignaled_submissions: Vec::new(),
        }
    }
}

impl GpuDevice for MockDevice {
    type Fence = MockFence;

    fn buffer_count(&self) -> usize {
        FRAME_COUNT
    }

    fn current_buffer_index(&self) -> usize {
        self.current_buffer
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        self.presents.push(sync_interval);
        self.current_buffer = (self.current_buffer + 1) % FRAME_COUNT;
        Ok(())
    }

    fn rtv_heap(&self) -> DescriptorHeapLayout {
        DescriptorHeapLayout {
            start: CpuDescriptor(0x1000),
            increment: 32,
            capacity: FRAME_COUNT as u32,
        }
    }

    fn create_render_target_view(
        &mut self,
        buffer_index: usize,
        descriptor: CpuDescriptor,
    ) -> Result<()> {
        self.render_target_views.push((buffer_index, descriptor));
        Ok(())
    }

    fn create_vertex_buffer(&mut self, bytes: &[u8], stride: u32) -> Result<VertexBufferView> {
        self.vertex_buffers.push(bytes.to_vec());
        Ok(VertexBufferView {
            location: 0x10_0000 * self.vertex_buffers.len() as u64,
            size_in_bytes: u32::try_from(bytes.len())?,
            stride,
        })
    }

    fn create_constant_buffer(&mut self, size: u64) -> Result<ConstantBufferId> {
        self.constant_buffers.push(vec![0; size as usize]);
        Ok(ConstantBufferId(self.constant_buffers.len() as u32 - 1))
    }

    fn write_constant_buffer(&mut self, buffer: ConstantBufferId, bytes: &[u8]) -> Result<()> {
        let target = self
            .constant_buffers
            .get_mut(buffer.0 as usize)
            .ok_or_else(|| eyre!("unknown constant buffer {buffer:?}"))?;
        target[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineId> {
        if self.fail_pipeline {
            return Err(RendererError::ShaderCompilation {
                entry_point: desc.vertex_entry_point.into(),
                message: "shaders.hlsl(1,1): injected failure".into(),
            }
            .into());
        }
        self.pipelines.push(desc.clone());
        Ok(PipelineId(self.pipelines.len() as u32 - 1))
    }

    fn record(&mut self, frame_index: usize, commands: &CommandList) -> Result<()> {
        let pending = self.allocator_fences[frame_index];
        if pending > self.fence.completed_value() {
            return Err(eyre!(
                "allocator {frame_index} reset while fence value {pending} is still pending"
            ));
        }
        self.recorded.push((frame_index, commands.clone()));
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        if self.fail_execute {
            return Err(RendererError::CommandSubmission("injected failure".into()).into());
        }
        let (frame_index, _) = self
            .recorded
            .last()
            .ok_or_else(|| eyre!("execute without a recorded command list"))?;
        self.unsignaled_submissions.push(*frame_index);
        // Until a signal covers it, the submission blocks its allocator forever.
        self.allocator_fences[*frame_index] = u64::MAX;
        Ok(())
    }

    fn signal(&mut self, value: u64) -> Result<()> {
        if self.fail_signal {
            return Err(RendererError::FenceSignal {
                value,
                message: "injected failure".into(),
            }
            .into());
        }
        assert!(value > self.fence.signaled.get(), "fence values must increase");
        self.fence.signaled.set(value);
        self.signals.push(value);
        for frame_index in self.unsignaled_submissions.drain(..) {
            self.allocator_fences[frame_index] = value;
        }
        Ok(())
    }

    fn fence(&self) -> &MockFence {
        &self.fence
    }
}
