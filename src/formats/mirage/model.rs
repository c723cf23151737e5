use crate::{
    formats::mirage::LightIndexMeshGroup,
    graph::{pointer::PointerList, reader::Reader, writer::Writer, BinaryObject},
    Result, Sink,
};

/// Root of a Mirage model: a name and its mesh groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Model {
    /// Model name
    pub name: String,
    /// Mesh groups in draw order
    pub groups: PointerList<LightIndexMeshGroup>,
}

impl BinaryObject for Model {
    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Model {
            name: reader.read_string_offset()?,
            groups: reader.read_pointer_list()?,
        })
    }

    fn write<S: Sink>(&self, writer: &mut Writer<'_, S>) -> Result<()> {
        writer.write_string_offset(&self.name)?;
        writer.write_pointer_list(&self.groups)
    }
}
