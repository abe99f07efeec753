use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerErrorMessage {
    pub should_disconnect: bool,
    pub message: String,
}

impl Serde for ServerErrorMessage {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_bool(self.should_disconnect);
        writer.write_string(&self.message);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            should_disconnect: reader.read_bool()?,
            message: reader.read_string()?,
        })
    }
}
