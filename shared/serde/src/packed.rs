//! Packed unsigned integers, the sqlite4 varint scheme
//! (<https://sqlite.org/src4/doc/trunk/www/varint.wiki>): 1-9 bytes per
//! value, branching on the first byte. Identifiers on the wire go through
//! this; the layout is fixed for compatibility with deployed peers and must
//! not change.
//!
//! Signed and narrower variants are the same algorithm after widening to 64
//! bits (sign-extending, for the signed ones).

use crate::{byte_reader::ByteReader, byte_writer::ByteWriter, error::SerdeErr};

impl ByteWriter {
    pub fn write_packed_u64(&mut self, value: u64) {
        if value <= 240 {
            self.write_u8(value as u8);
            return;
        }
        if value <= 2287 {
            self.write_u8(((value - 240) / 256 + 241) as u8);
            self.write_u8(((value - 240) % 256) as u8);
            return;
        }
        if value <= 67823 {
            self.write_u8(249);
            self.write_u8(((value - 2288) / 256) as u8);
            self.write_u8(((value - 2288) % 256) as u8);
            return;
        }
        // Marker 250..=255 is followed by the low 3..=8 bytes of the value.
        let mut count = 3;
        while count < 8 && value >= 1u64 << (8 * count) {
            count += 1;
        }
        self.write_u8(247 + count as u8);
        self.write_bytes(&value.to_le_bytes()[..count]);
    }

    pub fn write_packed_u32(&mut self, value: u32) {
        self.write_packed_u64(u64::from(value));
    }

    pub fn write_packed_u16(&mut self, value: u16) {
        self.write_packed_u64(u64::from(value));
    }

    pub fn write_packed_i64(&mut self, value: i64) {
        self.write_packed_u64(value as u64);
    }

    pub fn write_packed_i32(&mut self, value: i32) {
        self.write_packed_i64(i64::from(value));
    }
}

impl ByteReader<'_> {
    pub fn read_packed_u64(&mut self) -> Result<u64, SerdeErr> {
        let first = u64::from(self.read_u8()?);
        match first {
            0..=240 => Ok(first),
            241..=248 => {
                let second = u64::from(self.read_u8()?);
                Ok(240 + 256 * (first - 241) + second)
            }
            249 => {
                let high = u64::from(self.read_u8()?);
                let low = u64::from(self.read_u8()?);
                Ok(2288 + 256 * high + low)
            }
            marker => {
                let count = (marker - 247) as usize;
                let mut bytes = [0u8; 8];
                bytes[..count].copy_from_slice(self.read_bytes(count)?);
                Ok(u64::from_le_bytes(bytes))
            }
        }
    }

    pub fn read_packed_u32(&mut self) -> Result<u32, SerdeErr> {
        u32::try_from(self.read_packed_u64()?).map_err(|_| SerdeErr)
    }

    pub fn read_packed_u16(&mut self) -> Result<u16, SerdeErr> {
        u16::try_from(self.read_packed_u64()?).map_err(|_| SerdeErr)
    }

    pub fn read_packed_i64(&mut self) -> Result<i64, SerdeErr> {
        Ok(self.read_packed_u64()? as i64)
    }

    pub fn read_packed_i32(&mut self) -> Result<i32, SerdeErr> {
        i32::try_from(self.read_packed_i64()?).map_err(|_| SerdeErr)
    }
}

// Tests
