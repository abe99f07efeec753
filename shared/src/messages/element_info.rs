use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::types::ObjectId;

/// Reference to one synchronized element of one behaviour of one entity.
/// Prefixes every sync-field, sync-list and function-call body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ElementInfo {
    pub object_id: ObjectId,
    pub behaviour_index: u8,
    pub element_id: u16,
}

impl ElementInfo {
    pub fn new(object_id: ObjectId, behaviour_index: u8, element_id: u16) -> Self {
        Self {
            object_id,
            behaviour_index,
            element_id,
        }
    }
}

impl Serde for ElementInfo {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_packed_u32(self.object_id);
        writer.write_u8(self.behaviour_index);
        writer.write_packed_u16(self.element_id);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            object_id: reader.read_packed_u32()?,
            behaviour_index: reader.read_u8()?,
            element_id: reader.read_packed_u16()?,
        })
    }
}
