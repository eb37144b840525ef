//! The Win32 window and message loop around the renderer.

pub mod create_window;
pub mod message_pump;
pub mod window_class;

use tracing::info;
use windows::Win32::Foundation::*;
use windows::Win32::System::LibraryLoader::*;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::config::RendererConfig;
use crate::d3d12::debug_messages::log_dxgi_debug_messages;
use crate::d3d12::D3d12Device;
use crate::error::Result;
use crate::error::WindowsResultExt;
use crate::renderer::Renderer;
use crate::renderer::RendererHooks;
use crate::shell::run_event_loop;
use crate::shell::WindowRegistry;
use crate::vertex::Vertex;
use create_window::create_window;
use message_pump::window_id;
use message_pump::Win32MessagePump;
use window_class::create_window_class_struct;
use window_class::register_window_class;

fn get_handle_to_file_used_to_create_the_calling_process() -> Result<HMODULE> {
    let mut out = Default::default();
    unsafe { GetModuleHandleExW(Default::default(), None, &mut out) }.into_report()?;
    Ok(out)
}

/// Opens the window, renders `vertices` until the window is closed and
/// returns the process exit code.
pub fn run(config: &RendererConfig, vertices: &[Vertex]) -> Result<i32> {
    let instance = get_handle_to_file_used_to_create_the_calling_process()?;
    let window_class = create_window_class_struct(instance)?;
    register_window_class(&window_class)?;

    let hwnd = create_window(instance, &config.title(), config.width, config.height)?;

    let device = D3d12Device::create(hwnd, config)?;
    let info_queue = device.info_queue().cloned();
    let renderer = match Renderer::initialize(device, config, vertices) {
        Ok(renderer) => renderer,
        Err(e) => {
            log_dxgi_debug_messages(info_queue.as_ref());
            return Err(e);
        }
    };
    info!("Showing \"{}\"", renderer.title());
    unsafe { _ = ShowWindow(hwnd, SW_SHOW) };

    let mut registry = WindowRegistry::new();
    registry.insert(window_id(hwnd), renderer);

    let result = run_event_loop(&mut Win32MessagePump, &mut registry);
    if result.is_err() {
        log_dxgi_debug_messages(info_queue.as_ref());
    }
    result
}
