use windows::Win32::Foundation::*;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::shell::MessagePump;
use crate::shell::PumpMessage;
use crate::shell::WindowEvent;
use crate::shell::WindowId;

pub fn window_id(hwnd: HWND) -> WindowId {
    WindowId(hwnd.0 as isize)
}

/// Non-blocking pump over the thread's message queue.
#[derive(Debug, Default)]
pub struct Win32MessagePump;

impl MessagePump for Win32MessagePump {
    fn next_message(&mut self) -> PumpMessage {
        let mut message = MSG::default();
        if !unsafe { PeekMessageW(&mut message, None, 0, 0, PM_REMOVE) }.as_bool() {
            return PumpMessage::Idle;
        }
        unsafe {
            _ = TranslateMessage(&message);
            DispatchMessageW(&message);
        }

        let window = window_id(message.hwnd);
        match message.message {
            WM_QUIT => PumpMessage::Quit(message.wParam.0 as i32),
            WM_KEYDOWN => PumpMessage::Event(window, WindowEvent::KeyDown(message.wParam.0 as u8)),
            WM_KEYUP => PumpMessage::Event(window, WindowEvent::KeyUp(message.wParam.0 as u8)),
            WM_PAINT => PumpMessage::Event(window, WindowEvent::Repaint),
            _ => PumpMessage::Dispatched,
        }
    }
}
