use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::error::WindowsResultExt;

pub const WINDOW_CLASS: PCWSTR = w!("D3D12MeshRendererWindow");

pub fn create_window_class_struct(instance: HMODULE) -> crate::error::Result<WNDCLASSEXW> {
    Ok(WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wndproc),
        hInstance: instance.into(),
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.into_report()?,
        lpszClassName: WINDOW_CLASS,
        ..Default::default()
    })
}

pub fn register_window_class(class: &WNDCLASSEXW) -> crate::error::Result<u16> {
    let atom = unsafe { RegisterClassExW(class) };
    if atom == 0 {
        return Err(Error::from_win32()).into_report();
    }
    Ok(atom)
}

/// Input and paint messages are read straight off the queue by the pump,
/// so the only thing left to do here is end the loop when the window goes.
extern "system" fn wndproc(window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match message {
        WM_DESTROY => {
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(window, message, wparam, lparam) },
    }
}
