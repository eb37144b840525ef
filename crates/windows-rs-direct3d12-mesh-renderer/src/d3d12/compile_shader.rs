use std::ffi::CString;
use std::path::Path;

use tracing::error;
use windows::core::*;
use windows::Win32::Graphics::Direct3D::Fxc::*;
use windows::Win32::Graphics::Direct3D::*;

use super::blob_text;
use super::describe;
use crate::error::RendererError;

/// Compiles one entry point of an HLSL file. On failure the compiler's own
/// output (file, line and message) becomes the error message.
pub fn compile_shader(
    hlsl_path: &Path,
    entry_point: &str,
    target: &str,
) -> crate::error::Result<ID3DBlob> {
    let compile_error = |message: String| RendererError::ShaderCompilation {
        entry_point: entry_point.to_string(),
        message,
    };

    let flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    };
    let path = HSTRING::from(
        hlsl_path
            .to_str()
            .ok_or_else(|| compile_error(format!("{hlsl_path:?} is not valid UTF-8")))?,
    );
    let entry = CString::new(entry_point).map_err(|e| compile_error(e.to_string()))?;
    let target_name = CString::new(target).map_err(|e| compile_error(e.to_string()))?;

    let mut shader_blob = None;
    let mut error_blob = None;
    let result = unsafe {
        D3DCompileFromFile(
            &path,
            None,
            None,
            PCSTR(entry.as_ptr() as *const u8),
            PCSTR(target_name.as_ptr() as *const u8),
            flags,
            0,
            &mut shader_blob,
            Some(&mut error_blob),
        )
    };

    if let Err(e) = result {
        let message = match error_blob {
            Some(blob) => blob_text(&blob),
            None => describe(e),
        };
        error!("Shader compile error ({entry_point} {target}): {message}");
        return Err(compile_error(message).into());
    }

    shader_blob.ok_or_else(|| compile_error("the compiler produced no bytecode".into()).into())
}
