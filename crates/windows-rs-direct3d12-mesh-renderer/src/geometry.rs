use bevy_math::Mat4;
use tracing::debug;
use tracing::error;

use crate::error::RendererError;
use crate::error::Result;
use crate::gpu::ConstantBufferId;
use crate::gpu::GpuDevice;
use crate::gpu::VertexBufferView;
use crate::transforms::align_up;
use crate::transforms::CONSTANT_BUFFER_ALIGNMENT;
use crate::vertex::Vertex;

/// The uploaded mesh. Read-only from the GPU side once created.
#[derive(Clone, Copy, Debug)]
pub struct MeshBuffer {
    view: VertexBufferView,
    vertex_count: u32,
}

impl MeshBuffer {
    pub fn upload<D: GpuDevice>(device: &mut D, vertices: &[Vertex]) -> Result<Self> {
        if vertices.is_empty() {
            error!("Refusing to upload an empty mesh");
            return Err(RendererError::EmptyMesh.into());
        }

        let (vertex_count, size_in_bytes) = vertex_buffer_size(vertices.len())?;
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let view = device.create_vertex_buffer(bytes, Vertex::STRIDE)?;
        debug_assert_eq!(view.size_in_bytes, size_in_bytes);

        debug!(
            "Uploaded {} vertices ({} bytes)",
            vertices.len(),
            view.size_in_bytes
        );
        Ok(Self {
            view,
            vertex_count,
        })
    }

    pub fn view(&self) -> VertexBufferView {
        self.view
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Vertex count and byte size of a mesh, both as 32-bit view fields.
fn vertex_buffer_size(vertex_count: usize) -> Result<(u32, u32)> {
    let too_large = || RendererError::ResourceAllocation {
        what: "vertex buffer",
        message: format!("{vertex_count} vertices do not fit a vertex buffer view"),
    };
    let count = u32::try_from(vertex_count).map_err(|_| too_large())?;
    let size = count.checked_mul(Vertex::STRIDE).ok_or_else(too_large)?;
    Ok((count, size))
}

/// The per-frame transform, as seen by the vertex stage at `b0`.
#[derive(Clone, Copy, Debug)]
pub struct TransformBuffer {
    buffer: ConstantBufferId,
    size: u64,
}

impl TransformBuffer {
    pub fn create<D: GpuDevice>(device: &mut D) -> Result<Self> {
        let size = align_up(
            std::mem::size_of::<Mat4>() as u64,
            CONSTANT_BUFFER_ALIGNMENT,
        );
        let buffer = device.create_constant_buffer(size)?;
        Ok(Self { buffer, size })
    }

    /// Overwrites the mapped matrix. Only call this while no submitted frame
    /// is still reading it, which the frame sequencer's wait after every
    /// present guarantees.
    pub fn write<D: GpuDevice>(&self, device: &mut D, mwp: &Mat4) -> Result<()> {
        let columns = mwp.to_cols_array();
        device.write_constant_buffer(self.buffer, bytemuck::cast_slice(&columns))
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// GPU-visible storage for the mesh and the transform.
#[derive(Clone, Copy, Debug)]
pub struct GeometryResources {
    pub mesh: MeshBuffer,
    pub transform: TransformBuffer,
}

impl GeometryResources {
    /// Uploads the mesh, then creates the constant buffer. An empty mesh fails
    /// before anything is allocated.
    pub fn create<D: GpuDevice>(device: &mut D, vertices: &[Vertex]) -> Result<Self> {
        let mesh = MeshBuffer::upload(device, vertices)?;
        let transform = TransformBuffer::create(device)?;
        Ok(Self { mesh, transform })
    }

    pub fn write_transform<D: GpuDevice>(&self, device: &mut D, mwp: &Mat4) -> Result<()> {
        self.transform.write(device, mwp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_device::MockDevice;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    fn two_triangles() -> Vec<Vertex> {
        vec![
            Vertex::new([0.0, 0.0, 0.0], RED),
            Vertex::new([1.0, 0.0, 0.0], RED),
            Vertex::new([1.0, 1.0, 0.0], RED),
            Vertex::new([0.0, 0.0, 0.0], RED),
            Vertex::new([1.0, 1.0, 0.0], RED),
            Vertex::new([0.0, 1.0, 0.0], RED),
        ]
    }

    #[test]
    fn vertex_buffer_is_sized_exactly() {
        let mut device = MockDevice::new();
        let mesh = MeshBuffer::upload(&mut device, &two_triangles()).unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.view().size_in_bytes, 6 * Vertex::STRIDE);
        assert_eq!(mesh.view().stride, Vertex::STRIDE);
        assert_eq!(device.vertex_buffers.len(), 1);
        assert_eq!(device.vertex_buffers[0].len(), 6 * Vertex::STRIDE as usize);
    }

    #[test]
    fn empty_mesh_allocates_nothing() {
        let mut device = MockDevice::new();
        let error = GeometryResources::create(&mut device, &[]).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<RendererError>(),
            Some(RendererError::EmptyMesh)
        ));
        assert!(device.vertex_buffers.is_empty());
        assert!(device.constant_buffers.is_empty());
    }

    #[test]
    fn oversized_meshes_are_rejected() {
        assert_eq!(vertex_buffer_size(6).unwrap(), (6, 6 * Vertex::STRIDE));

        let limit = (u32::MAX / Vertex::STRIDE) as usize;
        assert_eq!(
            vertex_buffer_size(limit).unwrap(),
            (limit as u32, limit as u32 * Vertex::STRIDE)
        );
        for count in [limit + 1, u32::MAX as usize + 1] {
            let error = vertex_buffer_size(count).unwrap_err();
            assert!(matches!(
                error.downcast_ref::<RendererError>(),
                Some(RendererError::ResourceAllocation { .. })
            ));
        }
    }

    #[test]
    fn constant_buffer_is_256_aligned() {
        let mut device = MockDevice::new();
        let geometry = GeometryResources::create(&mut device, &two_triangles()).unwrap();

        assert_eq!(geometry.transform.size(), 256);
        assert_eq!(device.constant_buffers[0].len(), 256);
    }

    #[test]
    fn write_transform_stores_column_major_floats() {
        let mut device = MockDevice::new();
        let geometry = GeometryResources::create(&mut device, &two_triangles()).unwrap();
        let matrix = Mat4::from_cols_array(&std::array::from_fn(|i| i as f32));

        geometry.write_transform(&mut device, &matrix).unwrap();

        let columns = matrix.to_cols_array();
        let expected: &[u8] = bytemuck::cast_slice(&columns);
        assert_eq!(&device.constant_buffers[0][..64], expected);
    }
}
