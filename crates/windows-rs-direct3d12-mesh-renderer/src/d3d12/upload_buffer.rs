use windows::core::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::describe;
use crate::error::RendererError;

/// A committed buffer on the upload heap: CPU-writable, GPU-readable.
pub fn create_upload_buffer(
    device: &ID3D12Device,
    size: u64,
    what: &'static str,
) -> crate::error::Result<ID3D12Resource> {
    let heap_props = D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE_UPLOAD,
        ..Default::default()
    };
    let resource_desc = D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
        Alignment: 0,
        Width: size,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: DXGI_FORMAT_UNKNOWN,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        Flags: D3D12_RESOURCE_FLAG_NONE,
    };

    let allocation_error = |message: String| RendererError::ResourceAllocation { what, message };

    let mut buffer: Option<ID3D12Resource> = None;
    unsafe {
        device.CreateCommittedResource(
            &heap_props,
            D3D12_HEAP_FLAG_NONE,
            &resource_desc,
            D3D12_RESOURCE_STATE_GENERIC_READ,
            None,
            &mut buffer,
        )
    }
    .map_err(|e| allocation_error(describe(e)))?;
    let buffer = buffer.ok_or_else(|| allocation_error("no resource returned".into()))?;

    let name = HSTRING::from(what);
    unsafe { buffer.SetName(&name) }.ok();
    Ok(buffer)
}

/// Maps the whole buffer for writing. Upload heap buffers may stay mapped
/// for their whole lifetime.
pub fn map_for_write(buffer: &ID3D12Resource) -> crate::error::Result<*mut u8> {
    let mut data = std::ptr::null_mut();
    // Nothing is read back on the CPU.
    let read_range = D3D12_RANGE { Begin: 0, End: 0 };
    unsafe { buffer.Map(0, Some(&read_range), Some(&mut data)) }.map_err(|e| {
        RendererError::ResourceAllocation {
            what: "buffer mapping",
            message: describe(e),
        }
    })?;
    Ok(data as *mut u8)
}

/// Copies `bytes` into a fresh upload buffer and unmaps it again.
pub fn upload_bytes(
    device: &ID3D12Device,
    bytes: &[u8],
    what: &'static str,
) -> crate::error::Result<ID3D12Resource> {
    let buffer = create_upload_buffer(device, bytes.len() as u64, what)?;
    let data = map_for_write(&buffer)?;
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), data, bytes.len());
        buffer.Unmap(0, None);
    }
    Ok(buffer)
}
