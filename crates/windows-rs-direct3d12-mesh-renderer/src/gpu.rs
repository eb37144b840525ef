//! The seam between the frame logic and the graphics API.
//!
//! Everything above this module (frame resources, geometry, the frame
//! sequencer, the renderer) talks to a [`GpuDevice`]; the Direct3D 12
//! implementation lives in [`crate::d3d12`].

use crate::error::Result;
use crate::pipeline::PipelineDesc;

/// Number of swap chain buffers, and of everything kept per buffer.
pub const FRAME_COUNT: usize = 2;

/// The two states a swap chain buffer moves between each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Present,
    RenderTarget,
}

/// CPU address of a descriptor inside a descriptor heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuDescriptor(pub usize);

/// Where a descriptor heap starts, how far apart its slots are and how many
/// slots it has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorHeapLayout {
    pub start: CpuDescriptor,
    pub increment: u32,
    pub capacity: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBufferView {
    pub location: u64,
    pub size_in_bytes: u32,
    pub stride: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantBufferId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScissorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScissorRect {
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        }
    }
}

/// One recorded GPU operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetRootSignature,
    SetViewport(Viewport),
    SetScissorRect(ScissorRect),
    /// Binds the shader-visible descriptor heap and points the given root
    /// parameter at its first slot.
    SetDescriptorTable { root_parameter: u32 },
    Barrier {
        buffer_index: usize,
        before: ResourceState,
        after: ResourceState,
    },
    SetRenderTarget(CpuDescriptor),
    ClearRenderTarget {
        target: CpuDescriptor,
        color: [f32; 4],
    },
    SetTriangleList,
    SetVertexBuffer(VertexBufferView),
    Draw {
        vertex_count: u32,
        instance_count: u32,
    },
}

/// A closed list of commands, recorded against one pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandList {
    pipeline: PipelineId,
    commands: Vec<Command>,
}

impl CommandList {
    pub fn new(pipeline: PipelineId) -> Self {
        Self {
            pipeline,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn pipeline(&self) -> PipelineId {
        self.pipeline
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draw_calls(&self) -> impl Iterator<Item = &Command> {
        self.commands
            .iter()
            .filter(|command| matches!(command, Command::Draw { .. }))
    }

    pub fn barriers(&self) -> impl Iterator<Item = &Command> {
        self.commands
            .iter()
            .filter(|command| matches!(command, Command::Barrier { .. }))
    }
}

/// A GPU-to-CPU progress counter.
pub trait Fence {
    /// The highest value the GPU has reached.
    fn completed_value(&self) -> u64;

    /// Blocks the calling thread until `completed_value() >= value`. There is
    /// no timeout and no way to cancel the wait.
    fn wait_for(&self, value: u64) -> Result<()>;
}

/// A device with one direct queue and a double-buffered presentation surface.
pub trait GpuDevice {
    type Fence: Fence;

    fn buffer_count(&self) -> usize;

    /// The back buffer the presentation engine will hand out next. Only
    /// meaningful after creation or after a present.
    fn current_buffer_index(&self) -> usize;

    fn present(&mut self, sync_interval: u32) -> Result<()>;

    /// Layout of the render target view heap, one slot per buffer.
    fn rtv_heap(&self) -> DescriptorHeapLayout;

    fn create_render_target_view(
        &mut self,
        buffer_index: usize,
        descriptor: CpuDescriptor,
    ) -> Result<()>;

    /// Creates a CPU-writable, GPU-readable buffer holding exactly `bytes`.
    fn create_vertex_buffer(&mut self, bytes: &[u8], stride: u32) -> Result<VertexBufferView>;

    /// Creates a persistently mapped constant buffer of `size` bytes and a
    /// view for it in the shader-visible descriptor heap.
    fn create_constant_buffer(&mut self, size: u64) -> Result<ConstantBufferId>;

    fn write_constant_buffer(&mut self, buffer: ConstantBufferId, bytes: &[u8]) -> Result<()>;

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineId>;

    /// Resets the allocator bound to `frame_index` and the command list, then
    /// encodes and closes `commands`. The caller guarantees the GPU is done
    /// with that allocator.
    fn record(&mut self, frame_index: usize, commands: &CommandList) -> Result<()>;

    /// Submits the most recently recorded list to the queue.
    fn execute(&mut self) -> Result<()>;

    /// Asks the queue to set the fence to `value` once prior work completes.
    fn signal(&mut self, value: u64) -> Result<()>;

    fn fence(&self) -> &Self::Fence;
}
