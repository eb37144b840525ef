use tracing::trace;

use crate::error::Result;
use crate::frame_resources::FrameResourceSet;
use crate::geometry::MeshBuffer;
use crate::gpu::Command;
use crate::gpu::CommandList;
use crate::gpu::Fence;
use crate::gpu::GpuDevice;
use crate::gpu::PipelineId;
use crate::gpu::ResourceState;
use crate::gpu::ScissorRect;
use crate::gpu::Viewport;
use crate::pipeline::TRANSFORM_BINDING;

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Where the sequencer is within one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Recording,
    Submitted,
    Presented,
    Waiting,
}

impl FramePhase {
    fn next(self) -> Self {
        match self {
            Self::Idle => Self::Recording,
            Self::Recording => Self::Submitted,
            Self::Submitted => Self::Presented,
            Self::Presented => Self::Waiting,
            Self::Waiting => Self::Idle,
        }
    }
}

/// Records, submits and presents frames, and keeps the CPU from running
/// ahead of the GPU.
///
/// After every present the sequencer waits until the GPU has finished all
/// submitted work, so a frame's allocator, render target and the transform
/// constant buffer are never touched while the GPU may still use them. This
/// fully serializes CPU and GPU.
#[derive(Debug)]
pub struct FrameSequencer {
    phase: FramePhase,
    fence_value: u64,
    last_signaled: u64,
    frame_index: usize,
    vsync_interval: u32,
    viewport: Viewport,
    scissor_rect: ScissorRect,
}

impl FrameSequencer {
    pub fn new<D: GpuDevice>(device: &D, width: u32, height: u32, vsync_interval: u32) -> Self {
        Self {
            phase: FramePhase::Idle,
            // The fence is created at 0, so the first signal must be above it.
            fence_value: 1,
            last_signaled: 0,
            frame_index: device.current_buffer_index(),
            vsync_interval,
            viewport: Viewport::covering(width, height),
            scissor_rect: ScissorRect::covering(width, height),
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// The value the next signal will use.
    pub fn fence_value(&self) -> u64 {
        self.fence_value
    }

    pub fn last_signaled(&self) -> u64 {
        self.last_signaled
    }

    fn advance(&mut self, to: FramePhase) {
        debug_assert_eq!(
            self.phase.next(),
            to,
            "invalid frame transition {:?} -> {:?}",
            self.phase,
            to
        );
        self.phase = to;
    }

    /// The command list for the current buffer: transition it to a render
    /// target, clear, draw the mesh once, transition it back for present.
    pub fn build_command_list(
        &self,
        pipeline: PipelineId,
        frames: &FrameResourceSet,
        mesh: &MeshBuffer,
    ) -> CommandList {
        let target = frames.view_for(self.frame_index);
        let mut list = CommandList::new(pipeline);

        list.push(Command::SetRootSignature);
        list.push(Command::SetViewport(self.viewport));
        list.push(Command::SetScissorRect(self.scissor_rect));
        list.push(Command::SetDescriptorTable {
            root_parameter: TRANSFORM_BINDING.root_parameter,
        });
        list.push(Command::Barrier {
            buffer_index: target.buffer_index,
            before: ResourceState::Present,
            after: ResourceState::RenderTarget,
        });
        list.push(Command::SetRenderTarget(target.descriptor));
        list.push(Command::ClearRenderTarget {
            target: target.descriptor,
            color: CLEAR_COLOR,
        });
        list.push(Command::SetTriangleList);
        list.push(Command::SetVertexBuffer(mesh.view()));
        list.push(Command::Draw {
            vertex_count: mesh.vertex_count(),
            instance_count: 1,
        });
        list.push(Command::Barrier {
            buffer_index: target.buffer_index,
            before: ResourceState::RenderTarget,
            after: ResourceState::Present,
        });
        list
    }

    /// Runs one full frame: record, submit, present, then wait for the GPU.
    /// Any failure leaves the sequencer idle.
    pub fn render_frame<D: GpuDevice>(
        &mut self,
        device: &mut D,
        pipeline: PipelineId,
        frames: &FrameResourceSet,
        mesh: &MeshBuffer,
    ) -> Result<()> {
        let result = self.run_frame(device, pipeline, frames, mesh);
        self.reset_on_error(result)
    }

    /// Signals the fence behind all submitted work, blocks until the GPU gets
    /// there, then picks up the buffer index the swap chain moved to.
    ///
    /// Also used after initialization and before shutdown, where the
    /// sequencer is idle.
    pub fn wait_for_previous_frame<D: GpuDevice>(&mut self, device: &mut D) -> Result<()> {
        let result = self.signal_and_wait(device);
        self.reset_on_error(result)
    }

    fn reset_on_error(&mut self, result: Result<()>) -> Result<()> {
        if result.is_err() {
            self.phase = FramePhase::Idle;
        }
        result
    }

    fn run_frame<D: GpuDevice>(
        &mut self,
        device: &mut D,
        pipeline: PipelineId,
        frames: &FrameResourceSet,
        mesh: &MeshBuffer,
    ) -> Result<()> {
        self.advance(FramePhase::Recording);
        let list = self.build_command_list(pipeline, frames, mesh);
        device.record(self.frame_index, &list)?;

        device.execute()?;
        self.advance(FramePhase::Submitted);

        device.present(self.vsync_interval)?;
        self.advance(FramePhase::Presented);

        self.signal_and_wait(device)
    }

    fn signal_and_wait<D: GpuDevice>(&mut self, device: &mut D) -> Result<()> {
        let resume_idle = self.phase == FramePhase::Idle;
        if !resume_idle {
            self.advance(FramePhase::Waiting);
        }

        let fence_value = self.fence_value;
        device.signal(fence_value)?;
        self.last_signaled = fence_value;
        self.fence_value += 1;

        if device.fence().completed_value() < fence_value {
            trace!("Waiting for fence value {fence_value}");
            device.fence().wait_for(fence_value)?;
        }
        debug_assert!(device.fence().completed_value() >= fence_value);

        self.frame_index = device.current_buffer_index();
        debug_assert!(self.frame_index < device.buffer_count());

        if !resume_idle {
            self.advance(FramePhase::Idle);
        }
        Ok(())
    }
}
