use eyre::WrapErr;
use widestring::U16CString;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::UI::WindowsAndMessaging::*;

use super::window_class::WINDOW_CLASS;
use crate::error::WindowsResultExt;

/// Creates an overlapped window whose client area is `width` x `height`.
pub fn create_window(
    instance: HMODULE,
    title: &str,
    width: u32,
    height: u32,
) -> crate::error::Result<HWND> {
    let mut window_rect = RECT {
        left: 0,
        top: 0,
        right: width as i32,
        bottom: height as i32,
    };
    unsafe { AdjustWindowRect(&mut window_rect, WS_OVERLAPPEDWINDOW, false) }.into_report()?;

    let title = U16CString::from_str(title).wrap_err("Window title contains a NUL")?;

    unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            WINDOW_CLASS,
            PCWSTR(title.as_ptr()),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            window_rect.right - window_rect.left,
            window_rect.bottom - window_rect.top,
            None,
            None,
            Some(instance.into()),
            None,
        )
    }
    .into_report()
    .wrap_err("Failed to create the window")
}
