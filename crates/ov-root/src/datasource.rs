//! Bytes behind a [`RootFile`](crate::RootFile): a read-only map of a file on
//! disk, or a caller-supplied buffer.

use std::fs;
use std::ops::Deref;
use std::path::Path;

use crate::error::{Result, RootError};

pub enum DataSource {
    Owned(Vec<u8>),
    Mmap(memmap2::Mmap),
}

impl DataSource {
    /// Map `path` read-only.
    pub fn map_file(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        // SAFETY: the map is read-only; concurrent modification of the file by
        // another process is outside what this reader supports.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Ok(Self::Mmap(mmap))
    }
}

impl Deref for DataSource {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            DataSource::Owned(v) => v,
            DataSource::Mmap(m) => m,
        }
    }
}

/// `data[offset..offset + len]`, or `BufferUnderflow` when it does not fit.
pub(crate) fn region(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset.checked_add(len).and_then(|end| data.get(offset..end)).ok_or(RootError::BufferUnderflow {
        offset,
        need: len,
        have: data.len().saturating_sub(offset),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_bounds() {
        let data = [1u8, 2, 3, 4];
        assert_eq!(region(&data, 1, 2).unwrap(), &[2, 3]);
        assert_eq!(region(&data, 4, 0).unwrap(), &[] as &[u8]);
        assert!(matches!(
            region(&data, 3, 2),
            Err(RootError::BufferUnderflow { offset: 3, need: 2, have: 1 })
        ));
        assert!(region(&data, usize::MAX, 2).is_err());
    }
}
