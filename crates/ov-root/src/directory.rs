//! TDirectory parsing and key-list navigation.

use crate::error::Result;
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// Directory versions above this value carry 64-bit seek pointers.
const LARGE_DIR_VERSION: u16 = 1000;

/// Location of a directory's key list, as recorded in its TDirectory streamer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyListLocation {
    /// Absolute offset of the key list record.
    pub seek_keys: u64,
    /// Size of the key list record.
    pub nbytes_keys: u32,
}

impl KeyListLocation {
    /// Parse a TDirectory streamer at the reader's position.
    ///
    /// Layout: version u16, ctime u32, mtime u32, nbytes_keys u32,
    /// nbytes_name u32, then seek_dir / seek_parent / seek_keys as 32-bit
    /// pointers, or 64-bit ones when the version exceeds 1000.
    pub fn read(r: &mut RBuffer) -> Result<Self> {
        let version = r.read_u16()?;
        let _ctime = r.read_u32()?;
        let _mtime = r.read_u32()?;
        let nbytes_keys = r.read_u32()?;
        let _nbytes_name = r.read_u32()?;

        let large = version > LARGE_DIR_VERSION;
        let _seek_dir = r.read_seek(large)?;
        let _seek_parent = r.read_seek(large)?;
        let seek_keys = r.read_seek(large)?;

        Ok(Self { seek_keys, nbytes_keys })
    }
}

/// A parsed TDirectory: an ordered list of TKeys.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Read the key list from the file at `seek_keys`.
    ///
    /// The key list starts with a TKey header for the list itself, then
    /// a u32 `nkeys`, followed by `nkeys` TKey records.
    pub fn read_key_list(file_data: &[u8], seek_keys: usize, is_large: bool) -> Result<Self> {
        let mut r = RBuffer::new(file_data);
        r.set_pos(seek_keys);

        let _list_key = Key::read(&mut r, is_large)?;
        let nkeys = r.read_u32()? as usize;

        // Each key header is at least 26 bytes; cap the allocation accordingly.
        let mut keys = Vec::with_capacity(nkeys.min(r.remaining() / 26));
        for _ in 0..nkeys {
            keys.push(Key::read(&mut r, is_large)?);
        }

        Ok(Directory { keys })
    }

    /// Read a directory from the decompressed payload of a TDirectoryFile key.
    pub fn read_from_payload(payload: &[u8], is_large: bool, file_data: &[u8]) -> Result<Self> {
        let location = KeyListLocation::read(&mut RBuffer::new(payload))?;
        if location.seek_keys == 0 {
            return Ok(Directory::default());
        }
        Self::read_key_list(file_data, location.seek_keys as usize, is_large)
    }

    /// Access the list of keys.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Find a key by name (returns the highest cycle).
    pub fn find_key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().filter(|k| k.name == name).max_by_key(|k| k.cycle)
    }
}
