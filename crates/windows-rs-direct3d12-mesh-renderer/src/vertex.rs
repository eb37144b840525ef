use bytemuck::Pod;
use bytemuck::Zeroable;

/// One vertex of the flattened mesh, laid out exactly as the input layout
/// in [`INPUT_LAYOUT`] describes it.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3], // x, y, z
    pub color: [f32; 4],    // r, g, b, a
}

impl Vertex {
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;

    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    Float32x3,
    Float32x4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputElement {
    pub semantic: &'static str,
    pub format: VertexFormat,
    pub offset: u32,
}

pub const INPUT_LAYOUT: [InputElement; 2] = [
    InputElement {
        semantic: "POSITION",
        format: VertexFormat::Float32x3,
        offset: std::mem::offset_of!(Vertex, position) as u32,
    },
    InputElement {
        semantic: "COLOR",
        format: VertexFormat::Float32x4,
        offset: std::mem::offset_of!(Vertex, color) as u32,
    },
];
