use tracing::error;
use tracing::info;
use tracing::warn;
use windows::Win32::Graphics::Dxgi::*;

fn severity_name(severity: DXGI_INFO_QUEUE_MESSAGE_SEVERITY) -> &'static str {
    match severity {
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_CORRUPTION => "CORRUPTION",
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_ERROR => "ERROR",
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_WARNING => "WARNING",
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_INFO => "INFO",
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_MESSAGE => "MESSAGE",
        _ => "UNKNOWN",
    }
}

/// Logs and clears everything the debug layer stored. Only available when
/// the debug layer was enabled at device creation.
pub fn log_dxgi_debug_messages(info_queue: Option<&IDXGIInfoQueue>) {
    let Some(queue) = info_queue else {
        info!("DXGI info queue not available, no debug messages to show");
        return;
    };

    let count = unsafe { queue.GetNumStoredMessages(DXGI_DEBUG_ALL) };
    warn!("{count} DXGI debug messages stored");

    for i in 0..count {
        let mut message_size: usize = 0;
        if unsafe { queue.GetMessage(DXGI_DEBUG_ALL, i, None, &mut message_size) }.is_err() {
            warn!("Could not size DXGI message {i}");
            continue;
        }

        // u64 storage keeps the message struct suitably aligned.
        let mut storage = vec![0u64; message_size.div_ceil(8)];
        let message = storage.as_mut_ptr() as *mut DXGI_INFO_QUEUE_MESSAGE;
        if unsafe { queue.GetMessage(DXGI_DEBUG_ALL, i, Some(message), &mut message_size) }
            .is_err()
        {
            warn!("Could not read DXGI message {i}");
            continue;
        }

        let (severity, id, description) = unsafe {
            let message = &*message;
            let bytes = std::slice::from_raw_parts(
                message.pDescription as *const u8,
                message.DescriptionByteLength,
            );
            (
                message.Severity,
                message.ID,
                String::from_utf8_lossy(bytes)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string(),
            )
        };
        error!("DXGI [{} ID:{id}]: {description}", severity_name(severity));
    }

    unsafe { queue.ClearStoredMessages(DXGI_DEBUG_ALL) };
}
