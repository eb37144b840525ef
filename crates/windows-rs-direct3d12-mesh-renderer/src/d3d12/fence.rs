use tracing::trace;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::System::Threading::*;

use super::describe;
use crate::error::RendererError;
use crate::error::Result;
use crate::gpu::Fence;

/// An `ID3D12Fence` plus the event the CPU sleeps on.
pub struct D3d12Fence {
    fence: ID3D12Fence,
    event: HANDLE,
}

impl D3d12Fence {
    pub fn create(device: &ID3D12Device) -> Result<Self> {
        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) }
            .map_err(|e| RendererError::ResourceAllocation {
                what: "fence",
                message: describe(e),
            })?;
        let event = unsafe { CreateEventA(None, false, false, None) }.map_err(|e| {
            RendererError::ResourceAllocation {
                what: "fence event",
                message: describe(e),
            }
        })?;
        Ok(Self { fence, event })
    }

    pub fn raw(&self) -> &ID3D12Fence {
        &self.fence
    }
}

impl Fence for D3d12Fence {
    fn completed_value(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }

    fn wait_for(&self, value: u64) -> Result<()> {
        let wait_error = |message: String| RendererError::FenceWait { value, message };

        unsafe { self.fence.SetEventOnCompletion(value, self.event) }
            .map_err(|e| wait_error(describe(e)))?;
        trace!("Sleeping until the fence reaches {value}");
        let result = unsafe { WaitForSingleObjectEx(self.event, INFINITE, false) };
        if result != WAIT_OBJECT_0 {
            return Err(wait_error(format!("wait returned {result:?}")).into());
        }
        Ok(())
    }
}

impl Drop for D3d12Fence {
    fn drop(&mut self) {
        if !self.event.is_invalid() {
            unsafe { CloseHandle(self.event) }.ok();
        }
    }
}
