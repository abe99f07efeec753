use crate::{byte_reader::ByteReader, byte_writer::ByteWriter, error::SerdeErr};

/// Implemented by everything that crosses the wire. Field order in `ser`
/// and `de` is the wire order; the two must stay mirror images of each
/// other.
pub trait Serde: Sized {
    fn ser(&self, writer: &mut ByteWriter);

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}

impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_bool(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_bool()
    }
}

impl Serde for u8 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u8(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_u8()
    }
}

impl Serde for u16 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u16(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_u16()
    }
}

impl Serde for u32 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u32(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_u32()
    }
}

impl Serde for u64 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u64(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_u64()
    }
}

impl Serde for f32 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_f32(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_f32()
    }
}

impl Serde for f64 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_f64(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_f64()
    }
}

impl Serde for String {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_string(self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_string()
    }
}
