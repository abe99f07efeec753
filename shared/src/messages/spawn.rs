use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{
    math::{Rotation, Vec3},
    types::{AssetHash, ObjectId},
};

/// Tells a client to attach to an entity pre-placed in the loaded scene,
/// identified by the stable id baked into the scene content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnSceneObjectMessage {
    pub object_id: ObjectId,
    pub position: Vec3,
    pub rotation: Rotation,
}

impl Serde for SpawnSceneObjectMessage {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_packed_u32(self.object_id);
        self.position.ser(writer);
        self.rotation.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            object_id: reader.read_packed_u32()?,
            position: Vec3::de(reader)?,
            rotation: Rotation::de(reader)?,
        })
    }
}

/// Tells a client to instantiate a dynamic entity from a registered asset
/// hash. `is_owner` is computed by the server per receiving connection and
/// applied exactly once, at spawn time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnObjectMessage {
    pub hash_asset_id: AssetHash,
    pub object_id: ObjectId,
    pub is_owner: bool,
    pub position: Vec3,
    pub rotation: Rotation,
}

impl Serde for SpawnObjectMessage {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.hash_asset_id);
        writer.write_packed_u32(self.object_id);
        writer.write_bool(self.is_owner);
        self.position.ser(writer);
        self.rotation.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            hash_asset_id: reader.read_u32()?,
            object_id: reader.read_packed_u32()?,
            is_owner: reader.read_bool()?,
            position: Vec3::de(reader)?,
            rotation: Rotation::de(reader)?,
        })
    }
}
