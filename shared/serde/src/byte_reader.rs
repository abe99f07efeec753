use crate::error::SerdeErr;

/// Positioned reader over a received message body. Every read is bounds
/// checked; running off the end of the buffer yields [`SerdeErr`] rather
/// than a panic, so a truncated message can be dropped in isolation.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn read_u8(&mut self) -> Result<u8, SerdeErr> {
        let byte = *self.buffer.get(self.cursor).ok_or(SerdeErr)?;
        self.cursor += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'b [u8], SerdeErr> {
        if self.remaining() < len {
            return Err(SerdeErr);
        }
        let bytes = &self.buffer[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(bytes)
    }

    /// Hands back everything that has not been read yet, consuming it.
    /// Used for opaque pass-through payloads (RPC argument bytes).
    pub fn take_remaining(&mut self) -> &'b [u8] {
        let bytes = &self.buffer[self.cursor..];
        self.cursor = self.buffer.len();
        bytes
    }

    pub fn read_bool(&mut self) -> Result<bool, SerdeErr> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, SerdeErr> {
        let bytes: [u8; 2] = self.read_bytes(2)?.try_into().map_err(|_| SerdeErr)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, SerdeErr> {
        let bytes: [u8; 4] = self.read_bytes(4)?.try_into().map_err(|_| SerdeErr)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64, SerdeErr> {
        let bytes: [u8; 8] = self.read_bytes(8)?.try_into().map_err(|_| SerdeErr)?;
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn read_f32(&mut self) -> Result<f32, SerdeErr> {
        let bytes: [u8; 4] = self.read_bytes(4)?.try_into().map_err(|_| SerdeErr)?;
        Ok(f32::from_le_bytes(bytes))
    }

    pub fn read_f64(&mut self) -> Result<f64, SerdeErr> {
        let bytes: [u8; 8] = self.read_bytes(8)?.try_into().map_err(|_| SerdeErr)?;
        Ok(f64::from_le_bytes(bytes))
    }

    pub fn read_string(&mut self) -> Result<String, SerdeErr> {
        let len = self.read_packed_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr)
    }
}
