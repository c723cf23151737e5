use crate::{
    graph::{pointer::PointerList, reader::Reader, writer::Writer, BinaryObject},
    Result, Sink,
};

/// Texture binding of a mesh: a sampler name and the texture index it binds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureUnit {
    /// Sampler name, e.g. `"diffuse"`
    pub name: String,
    /// Index into the material's texture set
    pub id: u32,
}

impl BinaryObject for TextureUnit {
    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(TextureUnit {
            name: reader.read_string_offset()?,
            id: reader.read()?,
        })
    }

    fn write<S: Sink>(&self, writer: &mut Writer<'_, S>) -> Result<()> {
        writer.write_string_offset(&self.name)?;
        writer.write(self.id)
    }
}

/// A skinned mesh with its index, vertex and light-index buffers.
///
/// Vertex data is kept as raw bytes; its layout is described by the material's vertex
/// declaration, which is outside of this body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LightIndexMesh {
    /// Name of the material the mesh is drawn with
    pub material_name: String,
    /// Triangle strip indices
    pub faces: Vec<u16>,
    /// Number of vertices in `vertices`
    pub vertex_count: u32,
    /// Stride of one vertex in bytes
    pub vertex_size: u32,
    /// `vertex_count * vertex_size` bytes of vertex data
    pub vertices: Vec<u8>,
    /// Skeleton bones referenced by the vertex blend indices
    pub bone_indices: Vec<u8>,
    /// Texture bindings, possibly shared with other meshes
    pub texture_units: PointerList<TextureUnit>,
    /// Light indices used by the light-field shader
    pub light_indices: Vec<u32>,
}

impl LightIndexMesh {
    fn vertex_bytes(&self) -> Result<usize> {
        let count = self.vertex_count as usize;
        count
            .checked_mul(self.vertex_size as usize)
            .ok_or_else(|| {
                malformed_error!(
                    "Vertex buffer of {} x {} bytes overflows",
                    self.vertex_count,
                    self.vertex_size
                )
            })
    }
}

impl BinaryObject for LightIndexMesh {
    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let material_name = reader.read_string_offset()?;

        let face_count = reader.read_count()?;
        let faces = reader.read_array_offset::<u16>(face_count)?;

        let mut mesh = LightIndexMesh {
            material_name,
            faces,
            vertex_count: reader.read()?,
            vertex_size: reader.read()?,
            ..LightIndexMesh::default()
        };
        mesh.vertices = reader.read_bytes_offset(mesh.vertex_bytes()?)?;

        let bone_count = reader.read_count()?;
        mesh.bone_indices = reader.read_bytes_offset(bone_count)?;

        mesh.texture_units = reader.read_pointer_list()?;

        let light_count = reader.read_count()?;
        mesh.light_indices = reader.read_array_offset::<u32>(light_count)?;

        Ok(mesh)
    }

    fn write<S: Sink>(&self, writer: &mut Writer<'_, S>) -> Result<()> {
        let vertex_bytes = self.vertex_bytes()?;
        if self.vertices.len() != vertex_bytes {
            return Err(malformed_error!(
                "Vertex buffer holds {} bytes, {} vertices of {} bytes need {}",
                self.vertices.len(),
                self.vertex_count,
                self.vertex_size,
                vertex_bytes
            ));
        }

        writer.write_string_offset(&self.material_name)?;

        writer.write_count(self.faces.len())?;
        writer.write_array_offset(&self.faces)?;

        writer.write(self.vertex_count)?;
        writer.write(self.vertex_size)?;
        writer.write_bytes_offset(&self.vertices)?;

        writer.write_count(self.bone_indices.len())?;
        writer.write_bytes_offset(&self.bone_indices)?;

        writer.write_pointer_list(&self.texture_units)?;

        writer.write_count(self.light_indices.len())?;
        writer.write_array_offset(&self.light_indices)
    }
}
