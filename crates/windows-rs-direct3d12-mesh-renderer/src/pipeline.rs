use std::path::PathBuf;

use crate::vertex::InputElement;
use crate::vertex::INPUT_LAYOUT;

pub const SHADER_FILE: &str = "shaders.hlsl";
pub const VERTEX_ENTRY_POINT: &str = "VSMain";
pub const PIXEL_ENTRY_POINT: &str = "PSMain";
pub const VERTEX_TARGET: &str = "vs_5_0";
pub const PIXEL_TARGET: &str = "ps_5_0";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FillMode {
    #[default]
    Solid,
    Wireframe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// The single binding the shaders see: a descriptor table holding one
/// constant buffer view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantBufferBinding {
    pub root_parameter: u32,
    pub shader_register: u32,
    pub visibility: ShaderStage,
}

pub const TRANSFORM_BINDING: ConstantBufferBinding = ConstantBufferBinding {
    root_parameter: 0,
    shader_register: 0,
    visibility: ShaderStage::Vertex,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RootSignatureVersion {
    V1_0,
    V1_1,
}

impl RootSignatureVersion {
    /// Picks 1.1 when the device reports it, otherwise 1.0.
    pub fn negotiate(highest_supported: Option<RootSignatureVersion>) -> Self {
        match highest_supported {
            Some(version) if version >= Self::V1_1 => Self::V1_1,
            _ => Self::V1_0,
        }
    }
}

/// Everything needed to build the one pipeline state object.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineDesc {
    pub shader_path: PathBuf,
    pub vertex_entry_point: &'static str,
    pub pixel_entry_point: &'static str,
    pub input_layout: &'static [InputElement],
    pub binding: ConstantBufferBinding,
    pub fill_mode: FillMode,
}

impl PipelineDesc {
    /// Triangle list, no culling, no depth test, one RGBA8 target.
    pub fn new(shader_path: PathBuf, fill_mode: FillMode) -> Self {
        Self {
            shader_path,
            vertex_entry_point: VERTEX_ENTRY_POINT,
            pixel_entry_point: PIXEL_ENTRY_POINT,
            input_layout: &INPUT_LAYOUT,
            binding: TRANSFORM_BINDING,
            fill_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::VertexFormat;

    #[test]
    fn prefers_the_newer_root_signature_version() {
        assert_eq!(
            RootSignatureVersion::negotiate(Some(RootSignatureVersion::V1_1)),
            RootSignatureVersion::V1_1
        );
    }

    #[test]
    fn falls_back_to_version_one() {
        assert_eq!(
            RootSignatureVersion::negotiate(Some(RootSignatureVersion::V1_0)),
            RootSignatureVersion::V1_0
        );
        assert_eq!(RootSignatureVersion::negotiate(None), RootSignatureVersion::V1_0);
    }

    #[test]
    fn describes_position_then_color() {
        let desc = PipelineDesc::new(PathBuf::from(SHADER_FILE), FillMode::Wireframe);
        assert_eq!(desc.input_layout.len(), 2);
        assert_eq!(desc.input_layout[0].semantic, "POSITION");
        assert_eq!(desc.input_layout[0].format, VertexFormat::Float32x3);
        assert_eq!(desc.input_layout[1].semantic, "COLOR");
        assert_eq!(desc.input_layout[1].format, VertexFormat::Float32x4);
        assert_eq!(desc.binding.visibility, ShaderStage::Vertex);
        assert_eq!(desc.fill_mode, FillMode::Wireframe);
    }
}
