use super::ProtocolError;

/// Cursor over a received message. All integers are big-endian.
pub struct InputStream<'a> {
    bytes: &'a [u8],
    index: usize,
}

impl<'a> InputStream<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, index: 0 }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.index
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let slice = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < len {
            return Err(ProtocolError::Truncated { needed: len, remaining: self.remaining() });
        }
        let slice = &self.bytes[self.index..self.index + len];
        self.index += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(u8::from_be_bytes(self.take()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        Ok(u16::from_be_bytes(self.take()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(i32::from_be_bytes(self.take()?))
    }

    /// u32 length prefix then that many UTF-8 bytes.
    pub fn read_string(&mut self, max_len: usize) -> Result<String, ProtocolError> {
        let len = self.read_u32()? as usize;
        if len > max_len {
            return Err(ProtocolError::TooLong { len, max: max_len });
        }
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::BadUtf8)
    }

    /// u32 length prefix then `len` items produced by `read`.
    pub fn read_array<T>(
        &mut self,
        max_len: usize,
        mut read: impl FnMut(&mut Self, usize) -> Result<T, ProtocolError>,
    ) -> Result<Vec<T>, ProtocolError> {
        let len = self.read_u32()? as usize;
        if len > max_len {
            return Err(ProtocolError::TooLong { len, max: max_len });
        }
        // every item takes at least one byte, so the input bounds the allocation
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for i in 0..len {
            items.push(read(self, i)?);
        }
        Ok(items)
    }
}

#[derive(Default)]
pub struct OutputStream {
    bytes: Vec<u8>,
}

impl OutputStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), ProtocolError> {
        self.write_len(value.len())?;
        self.bytes.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_array<T>(
        &mut self,
        items: &[T],
        mut write: impl FnMut(&mut Self, &T) -> Result<(), ProtocolError>,
    ) -> Result<(), ProtocolError> {
        self.write_len(items.len())?;
        for item in items {
            write(self, item)?;
        }
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> Result<(), ProtocolError> {
        let len = u32::try_from(len).map_err(|_| ProtocolError::TooLong { len, max: u32::MAX as usize })?;
        self.write_u32(len);
        Ok(())
    }
}
