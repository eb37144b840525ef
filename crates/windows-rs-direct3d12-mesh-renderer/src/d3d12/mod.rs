//! Direct3D 12 implementation of [`crate::gpu::GpuDevice`].

pub mod adapter_utils;
pub mod compile_shader;
pub mod create_device;
pub mod create_pipeline_state;
pub mod create_root_signature;
pub mod debug_messages;
pub mod device;
pub mod fence;
pub mod transition_barrier;
pub mod upload_buffer;

pub use device::D3d12Device;
pub use fence::D3d12Fence;

use crate::error::WrappedWindowsError;

/// Renders a windows-rs error the way it appears in our reports.
pub(crate) fn describe(error: windows::core::Error) -> String {
    WrappedWindowsError::from(error).to_string()
}

/// Reads an `ID3DBlob` holding compiler or serializer output as text.
pub(crate) fn blob_text(blob: &windows::Win32::Graphics::Direct3D::ID3DBlob) -> String {
    let bytes = unsafe {
        std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
    };
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\0', '\n', '\r'])
        .to_string()
}
