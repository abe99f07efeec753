use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::types::{DestroyReason, ObjectId};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DestroyObjectMessage {
    pub object_id: ObjectId,
    pub reason: DestroyReason,
}

impl Serde for DestroyObjectMessage {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_packed_u32(self.object_id);
        self.reason.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            object_id: reader.read_packed_u32()?,
            reason: DestroyReason::de(reader)?,
        })
    }
}
