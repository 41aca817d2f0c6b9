use super::error::ThinkGearError;

/// Forward-only cursor over a validated payload.
///
/// Every read is bounds-checked; running off the end yields
/// `ThinkGearError::Truncated` tagged with the code being decoded.
pub struct PayloadReader<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.payload.len()
    }

    pub fn remaining(&self) -> usize {
        self.payload.len().saturating_sub(self.pos)
    }

    /// Next code byte, or `None` at end of payload.
    pub fn next_code(&mut self) -> Option<u8> {
        let code = self.payload.get(self.pos).copied()?;
        self.pos += 1;
        Some(code)
    }

    pub fn require(&self, code: u8, needed: usize) -> Result<(), ThinkGearError> {
        if self.remaining() < needed {
            return Err(ThinkGearError::Truncated {
                code,
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self, code: u8) -> Result<u8, ThinkGearError> {
        self.require(code, 1)?;
        let value = self.payload[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_slice(&mut self, code: u8, len: usize) -> Result<&'a [u8], ThinkGearError> {
        self.require(code, len)?;
        let slice = &self.payload[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Skip the per-record length byte carried by multi-byte codes.
    pub fn skip_length(&mut self, code: u8) -> Result<(), ThinkGearError> {
        self.read_u8(code).map(|_| ())
    }

    pub fn read_i16_be(&mut self, code: u8) -> Result<i16, ThinkGearError> {
        let bytes = self.read_slice(code, 2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u24_be(&mut self, code: u8) -> Result<u32, ThinkGearError> {
        let bytes = self.read_slice(code, 3)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }
}
