use eyre::eyre;
use tracing::debug;

use crate::error::Result;
use crate::gpu::CpuDescriptor;
use crate::gpu::DescriptorHeapLayout;
use crate::gpu::GpuDevice;
use crate::gpu::FRAME_COUNT;

/// Hands out consecutive slots of a descriptor heap.
#[derive(Clone, Debug)]
pub struct DescriptorAllocator {
    layout: DescriptorHeapLayout,
    next: u32,
}

impl DescriptorAllocator {
    pub fn new(layout: DescriptorHeapLayout) -> Self {
        Self { layout, next: 0 }
    }

    pub fn allocate(&mut self) -> Result<CpuDescriptor> {
        if self.next >= self.layout.capacity {
            return Err(eyre!(
                "descriptor heap exhausted after {} descriptors",
                self.layout.capacity
            ));
        }
        let descriptor = CpuDescriptor(
            self.layout.start.0 + (self.next as usize) * (self.layout.increment as usize),
        );
        self.next += 1;
        Ok(descriptor)
    }

    pub fn allocated(&self) -> u32 {
        self.next
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTargetView {
    pub buffer_index: usize,
    pub descriptor: CpuDescriptor,
}

/// One render target view per swap chain buffer.
#[derive(Debug)]
pub struct FrameResourceSet {
    views: [RenderTargetView; FRAME_COUNT],
}

impl FrameResourceSet {
    pub fn acquire_render_targets<D: GpuDevice>(device: &mut D) -> Result<Self> {
        debug_assert_eq!(device.buffer_count(), FRAME_COUNT);

        let mut allocator = DescriptorAllocator::new(device.rtv_heap());
        let views = array_init::try_array_init(|buffer_index| -> Result<RenderTargetView> {
            let descriptor = allocator.allocate()?;
            device.create_render_target_view(buffer_index, descriptor)?;
            Ok(RenderTargetView {
                buffer_index,
                descriptor,
            })
        })?;

        debug!("Created {} render target views", allocator.allocated());
        Ok(Self { views })
    }

    /// Panics if `index` is not a valid buffer index.
    pub fn view_for(&self, index: usize) -> RenderTargetView {
        self.views[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_device::MockDevice;

    fn layout(capacity: u32) -> DescriptorHeapLayout {
        DescriptorHeapLayout {
            start: CpuDescriptor(0x1000),
            increment: 32,
            capacity,
        }
    }

    #[test]
    fn allocates_consecutive_slots() {
        let mut allocator = DescriptorAllocator::new(layout(3));
        assert_eq!(allocator.allocate().unwrap(), CpuDescriptor(0x1000));
        assert_eq!(allocator.allocate().unwrap(), CpuDescriptor(0x1020));
        assert_eq!(allocator.allocate().unwrap(), CpuDescriptor(0x1040));
        assert_eq!(allocator.allocated(), 3);
    }

    #[test]
    fn refuses_to_overrun_the_heap() {
        let mut allocator = DescriptorAllocator::new(layout(1));
        allocator.allocate().unwrap();
        assert!(allocator.allocate().is_err());
    }

    #[test]
    fn one_view_per_buffer() {
        let mut device = MockDevice::new();
        let frames = FrameResourceSet::acquire_render_targets(&mut device).unwrap();

        assert_eq!(device.render_target_views.len(), FRAME_COUNT);
        for index in 0..FRAME_COUNT {
            let view = frames.view_for(index);
            assert_eq!(view.buffer_index, index);
            assert_eq!(device.render_target_views[index], (index, view.descriptor));
        }
        assert_ne!(frames.view_for(0).descriptor, frames.view_for(1).descriptor);
    }

    #[test]
    #[should_panic]
    fn view_for_out_of_range_panics() {
        let mut device = MockDevice::new();
        let frames = FrameResourceSet::acquire_render_targets(&mut device).unwrap();
        frames.view_for(FRAME_COUNT);
    }
}
