//! Binary reader for ROOT's big-endian serialization format.

use crate::error::{Result, RootError};

/// `kByteCountMask`: set on the leading u32 of a streamed object when a byte
/// count follows.
pub const BYTE_COUNT_MASK: u32 = 0x4000_0000;

/// `TObject::kIsReferenced`: a 2-byte process id follows the TObject header.
const TOBJECT_IS_REFERENCED: u32 = 1 << 4;

/// A cursor-based reader over a byte slice, using ROOT's big-endian conventions.
pub struct RBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RBuffer<'a> {
    /// Create a new reader over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Remaining bytes from current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Set read position absolutely.
    ///
    /// Positions past the end are accepted; the next read reports the underflow.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read a sub-slice of `n` bytes, advancing the cursor.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian i16.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian i32.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian u64.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian f32.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian f64.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    /// Read a 32-bit seek pointer, or a 64-bit one when `large` is set.
    pub fn read_seek(&mut self, large: bool) -> Result<u64> {
        if large { self.read_u64() } else { Ok(self.read_u32()? as u64) }
    }

    /// Read a ROOT-encoded string.
    ///
    /// Format: length byte (if < 255), or 255 + u32 length, then UTF-8 bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let first = self.read_u8()?;
        let len = if first == 255 { self.read_u32()? as usize } else { first as usize };
        if len == 0 {
            return Ok(String::new());
        }
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a ROOT streamer version header.
    ///
    /// Returns `(version, end_pos)` where `end_pos` is the absolute buffer
    /// position where this streamed object ends (`None` if no byte-count header).
    ///
    /// The byte count spans from right after the leading u32 to the end of
    /// the object (it includes the version u16).
    pub fn read_version(&mut self) -> Result<(u16, Option<usize>)> {
        let start = self.pos;
        let raw = self.read_u32()?;
        if raw & BYTE_COUNT_MASK != 0 {
            let byte_count = (raw & !BYTE_COUNT_MASK) as usize;
            let version = self.read_u16()?;
            Ok((version, Some(start + 4 + byte_count)))
        } else {
            // No byte count: the first two bytes were the version.
            self.pos = start + 2;
            Ok(((raw >> 16) as u16, None))
        }
    }

    /// Skip a streamed object using its byte count.
    ///
    /// Objects written without a byte count are version-only and nothing
    /// more is skipped; every ROOT release since v4 writes byte counts for
    /// the attribute classes this is used on.
    pub fn skip_object(&mut self) -> Result<()> {
        let (_ver, end) = self.read_version()?;
        if let Some(end) = end {
            self.seek_to_end(end)?;
        }
        Ok(())
    }

    /// Jump to the end position of a streamed object, checking bounds.
    pub fn seek_to_end(&mut self, end: usize) -> Result<()> {
        if end > self.data.len() {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need: end.saturating_sub(self.pos),
                have: self.remaining(),
            });
        }
        self.pos = end;
        Ok(())
    }

    /// Read a `TObject` header: fUniqueID (u32) + fBits (u32).
    pub fn read_tobject(&mut self) -> Result<(u32, u32)> {
        let _ver = self.read_u16()?;
        let unique_id = self.read_u32()?;
        let bits = self.read_u32()?;
        if bits & TOBJECT_IS_REFERENCED != 0 {
            self.skip(2)?;
        }
        Ok((unique_id, bits))
    }

    /// Read a `TNamed`: TObject + fName + fTitle.
    pub fn read_tnamed(&mut self) -> Result<(String, String)> {
        let (_ver, end) = self.read_version()?;
        self.read_tobject()?;
        let name = self.read_string()?;
        let title = self.read_string()?;
        if let Some(end) = end {
            self.seek_to_end(end)?;
        }
        Ok((name, title))
    }

    /// Read a `TArrayD`: i32 length followed by that many f64 values.
    pub fn read_tarray_f64(&mut self) -> Result<Vec<f64>> {
        let n = self.read_array_len()?;
        self.read_array_f64(n)
    }

    /// Read a `TArrayF` widened to f64.
    pub fn read_tarray_f32(&mut self) -> Result<Vec<f64>> {
        let n = self.read_array_len()?;
        self.ensure(n.saturating_mul(4))?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_f32()? as f64);
        }
        Ok(out)
    }

    /// Read `n` big-endian f64 values into a Vec.
    pub fn read_array_f64(&mut self, n: usize) -> Result<Vec<f64>> {
        self.ensure(n.saturating_mul(8))?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_f64()?);
        }
        Ok(out)
    }

    // ── internal ────────────────────────────────────────────────

    fn read_array_len(&mut self) -> Result<usize> {
        let n = self.read_i32()?;
        usize::try_from(n)
            .map_err(|_| RootError::Deserialization(format!("negative array length {n}")))
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.pos.checked_add(n).is_none_or(|end| end > self.data.len()) {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }
}
