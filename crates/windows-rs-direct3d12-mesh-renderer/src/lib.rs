pub mod assets;
pub mod camera;
pub mod config;
pub mod error;
pub mod frame_resources;
pub mod frame_sequencer;
pub mod geometry;
pub mod gpu;
pub mod mesh;
pub mod pipeline;
pub mod renderer;
pub mod shell;
pub mod transforms;
pub mod vertex;

#[cfg(windows)]
pub mod d3d12;
#[cfg(windows)]
pub mod win32;

#[cfg(test)]
pub(crate) mod mock_device;
