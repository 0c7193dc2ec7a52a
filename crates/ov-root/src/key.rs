//! TKey parsing: the record header ROOT uses to locate stored objects.

use crate::error::Result;
use crate::rbuffer::RBuffer;

/// Key versions above this value carry 64-bit seek pointers.
const LARGE_KEY_VERSION: u16 = 1000;

/// A parsed TKey record.
#[derive(Debug, Clone)]
pub struct Key {
    /// Total number of bytes in compressed object + key header.
    pub n_bytes: u32,
    /// Uncompressed object length.
    pub obj_len: u32,
    /// Length of the key header itself.
    pub key_len: u16,
    /// Cycle number (ROOT versioning within a directory).
    pub cycle: u16,
    /// Absolute position of this key in the file.
    pub seek_key: u64,
    /// Class name of the stored object.
    pub class_name: String,
    /// Object name.
    pub name: String,
    /// Object title.
    pub title: String,
}

/// Public info about a key (for `list_keys()`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Object name.
    pub name: String,
    /// Object class name (e.g. "TH1D", "TDirectoryFile").
    pub class_name: String,
    /// Object title.
    pub title: String,
    /// Cycle number.
    pub cycle: u16,
}

impl KeyInfo {
    /// Create from an internal Key.
    pub fn from_key(key: &Key) -> Self {
        Self {
            name: key.name.clone(),
            class_name: key.class_name.clone(),
            title: key.title.clone(),
            cycle: key.cycle,
        }
    }

    /// Whether this key points at a subdirectory.
    pub fn is_directory(&self) -> bool {
        is_directory_class(&self.class_name)
    }

    /// Whether this key holds a 1D histogram this crate can decode.
    pub fn is_histogram(&self) -> bool {
        matches!(self.class_name.as_str(), "TH1D" | "TH1F")
    }
}

/// Directory-like class names.
pub(crate) fn is_directory_class(class_name: &str) -> bool {
    matches!(class_name, "TDirectoryFile" | "TDirectory")
}

impl Key {
    /// Read a TKey from the buffer at the current position.
    pub fn read(r: &mut RBuffer, is_large: bool) -> Result<Self> {
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        let _datime = r.read_u32()?;
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;

        let large = version > LARGE_KEY_VERSION || is_large;
        let seek_key = r.read_seek(large)?;
        let _seek_pdir = r.read_seek(large)?;

        let class_name = r.read_string()?;
        let name = r.read_string()?;
        let title = r.read_string()?;

        Ok(Key { n_bytes, obj_len, key_len, cycle, seek_key, class_name, name, title })
    }

    /// Whether the payload behind this key is stored compressed.
    pub fn is_compressed(&self) -> bool {
        self.obj_len as usize != (self.n_bytes as usize).saturating_sub(self.key_len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_bytes(version: u16, obj_len: u32, n_bytes: u32) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&n_bytes.to_be_bytes());
        b.extend_from_slice(&version.to_be_bytes());
        b.extend_from_slice(&obj_len.to_be_bytes());
        b.extend_from_slice(&0u32.to_be_bytes());
        b.extend_from_slice(&40u16.to_be_bytes());
        b.extend_from_slice(&2u16.to_be_bytes());
        if version > LARGE_KEY_VERSION {
            b.extend_from_slice(&512u64.to_be_bytes());
            b.extend_from_slice(&100u64.to_be_bytes());
        } else {
            b.extend_from_slice(&512u32.to_be_bytes());
            b.extend_from_slice(&100u32.to_be_bytes());
        }
        for s in ["TH1D", "h", "title"] {
            b.push(s.len() as u8);
            b.extend_from_slice(s.as_bytes());
        }
        b
    }

    #[test]
    fn reads_small_key() {
        let bytes = key_bytes(4, 200, 240);
        let key = Key::read(&mut RBuffer::new(&bytes), false).unwrap();
        assert_eq!(key.seek_key, 512);
        assert_eq!(key.cycle, 2);
        assert_eq!(key.class_name, "TH1D");
        assert_eq!(key.title, "title");
        assert!(!key.is_compressed());
    }

    #[test]
    fn reads_large_key() {
        let bytes = key_bytes(1004, 500, 240);
        let key = Key::read(&mut RBuffer::new(&bytes), false).unwrap();
        assert_eq!(key.seek_key, 512);
        assert_eq!(key.name, "h");
        assert!(key.is_compressed());
    }

    #[test]
    fn key_info_classifies_classes() {
        let bytes = key_bytes(4, 200, 240);
        let info = KeyInfo::from_key(&Key::read(&mut RBuffer::new(&bytes), false).unwrap());
        assert!(info.is_histogram());
        assert!(!info.is_directory());
    }
}
