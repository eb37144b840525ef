use tracing::info;
use tracing::warn;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::*;

use super::adapter_utils::get_hardware_adapter;
use super::describe;
use crate::error::RendererError;
use crate::error::Result;

/// The factory and device, plus the DXGI info queue when the debug layer
/// could be enabled.
pub struct CreatedDevice {
    pub dxgi_factory: IDXGIFactory4,
    pub device: ID3D12Device,
    pub info_queue: Option<IDXGIInfoQueue>,
}

pub fn create_device(use_warp_device: bool) -> Result<CreatedDevice> {
    let mut factory_flags = DXGI_CREATE_FACTORY_FLAGS(0);
    let mut info_queue = None;

    if cfg!(debug_assertions) {
        unsafe {
            let mut debug: Option<ID3D12Debug> = None;
            if let Some(debug) = D3D12GetDebugInterface(&mut debug).ok().and(debug) {
                debug.EnableDebugLayer();
                factory_flags |= DXGI_CREATE_FACTORY_DEBUG;
                info!("D3D12 debug layer enabled");

                match DXGIGetDebugInterface1::<IDXGIInfoQueue>(0) {
                    Ok(queue) => info_queue = Some(queue),
                    Err(e) => warn!("DXGI info queue unavailable: {}", describe(e)),
                }
            } else {
                warn!("D3D12 debug layer unavailable");
            }
        }
    }

    let device_error = |e| RendererError::DeviceCreation(describe(e));

    let dxgi_factory: IDXGIFactory4 =
        unsafe { CreateDXGIFactory2(factory_flags) }.map_err(device_error)?;

    let adapter: IDXGIAdapter1 = if use_warp_device {
        info!("Using WARP adapter");
        unsafe { dxgi_factory.EnumWarpAdapter() }.map_err(device_error)?
    } else {
        get_hardware_adapter(&dxgi_factory).map_err(device_error)?
    };

    let mut device: Option<ID3D12Device> = None;
    unsafe { D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_11_0, &mut device) }
        .map_err(device_error)?;
    let device = device.ok_or_else(|| {
        RendererError::DeviceCreation("D3D12CreateDevice returned no device".into())
    })?;

    Ok(CreatedDevice {
        dxgi_factory,
        device,
        info_queue,
    })
}
