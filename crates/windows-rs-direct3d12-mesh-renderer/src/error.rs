use std::path::PathBuf;

pub type Result<T, E = eyre::Report> = core::result::Result<T, E>;

/// Every failure the renderer can hit. None of them are recoverable: they are
/// propagated up to `main`, which reports them and exits.
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("failed to create the Direct3D 12 device: {0}")]
    DeviceCreation(String),
    #[error("failed to create the presentation surface: {0}")]
    SurfaceCreation(String),
    #[error("shader compilation failed for {entry_point}: {message}")]
    ShaderCompilation { entry_point: String, message: String },
    #[error("root signature rejected: {0}")]
    RootSignature(String),
    #[error("failed to allocate {what}: {message}")]
    ResourceAllocation { what: &'static str, message: String },
    #[error("failed to submit commands to the GPU: {0}")]
    CommandSubmission(String),
    #[error("the GPU device was removed (reason: {reason})")]
    DeviceRemoved { reason: String },
    #[error("failed to signal fence value {value}: {message}")]
    FenceSignal { value: u64, message: String },
    #[error("failed to wait for fence value {value}: {message}")]
    FenceWait { value: u64, message: String },
    #[error("could not load scene {path:?}: {message}")]
    SceneLoad { path: PathBuf, message: String },
    #[error("the mesh has no vertices, there is nothing to draw")]
    EmptyMesh,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RendererError {
    /// Errors caused by the input scene rather than the GPU environment.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::SceneLoad { .. } | Self::EmptyMesh)
    }

    /// Errors raised by the fence protocol.
    pub fn is_synchronization_error(&self) -> bool {
        matches!(self, Self::FenceSignal { .. } | Self::FenceWait { .. })
    }
}

/// `windows::core::Error` carries an HRESULT and a message; wrapping it keeps
/// the message readable when it ends up inside an `eyre::Report`.
#[cfg(windows)]
pub struct WrappedWindowsError {
    inner: windows::core::Error,
}

#[cfg(windows)]
impl WrappedWindowsError {
    pub fn code(&self) -> windows::core::HRESULT {
        self.inner.code()
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for WrappedWindowsError {
    fn from(error: windows::core::Error) -> Self {
        Self { inner: error }
    }
}

#[cfg(windows)]
impl std::error::Error for WrappedWindowsError {}

#[cfg(windows)]
impl std::fmt::Display for WrappedWindowsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.inner.message(), self.inner.code())
    }
}

#[cfg(windows)]
impl std::fmt::Debug for WrappedWindowsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// Lifts a windows-rs result into an `eyre` result.
#[cfg(windows)]
pub trait WindowsResultExt<T> {
    fn into_report(self) -> Result<T>;
}

#[cfg(windows)]
impl<T> WindowsResultExt<T> for windows::core::Result<T> {
    fn into_report(self) -> Result<T> {
        self.map_err(|error| eyre::Report::new(WrappedWindowsError::from(error)))
    }
}
