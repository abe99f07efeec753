use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

/// Announces which scene the server is running. An empty name means the
/// server has no online scene yet; a client receiving its currently active
/// scene skips loading and just re-sends Ready.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SceneChangeMessage {
    pub scene_name: String,
}

impl Serde for SceneChangeMessage {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_string(&self.scene_name);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            scene_name: reader.read_string()?,
        })
    }
}
