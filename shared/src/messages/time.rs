use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

/// Clock beacon, sent sequenced: late arrivals are dropped by the
/// transport, so the client only ever applies the newest sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServerTimeMessage {
    pub server_time: f32,
}

impl Serde for ServerTimeMessage {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_f32(self.server_time);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            server_time: reader.read_f32()?,
        })
    }
}
