//! TFile header parsing and top-level ROOT file interface.

use std::path::{Path, PathBuf};

use crate::datasource::{DataSource, region};
use crate::decompress::decompress;
use crate::directory::{Directory, KeyListLocation};
use crate::error::{Result, RootError};
use crate::histogram::{Histogram, HistogramWithFlows};
use crate::key::{Key, KeyInfo, is_directory_class};
use crate::objects;
use crate::rbuffer::RBuffer;

const ROOT_MAGIC: &[u8; 4] = b"root";

/// Smallest file that can hold a complete header.
const MIN_FILE_LEN: usize = 64;

/// File format versions at or above this use 64-bit seek pointers.
const LARGE_FILE_VERSION: u32 = 1_000_000;

/// Parsed ROOT file header.
#[derive(Debug, Clone, Copy)]
struct FileHeader {
    /// Whether the file uses large (64-bit) seek pointers.
    is_large: bool,
    /// Location of the top-level directory's key list.
    keys: KeyListLocation,
}

/// A ROOT file opened for reading histograms.
pub struct RootFile {
    /// Raw file bytes (owned or memory-mapped).
    data: DataSource,
    /// Parsed header.
    header: FileHeader,
    /// Path for diagnostics.
    path: PathBuf,
}

impl std::fmt::Debug for RootFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootFile")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .field("is_large", &self.header.is_large)
            .finish()
    }
}

impl RootFile {
    /// Open and parse a ROOT file from disk using memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = DataSource::map_file(&path)?;
        Self::from_datasource(data, path)
    }

    /// Parse a ROOT file from a byte vector.
    pub fn from_bytes(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        Self::from_datasource(DataSource::Owned(data), path)
    }

    fn from_datasource(data: DataSource, path: PathBuf) -> Result<Self> {
        if data.len() < MIN_FILE_LEN || &data[0..4] != ROOT_MAGIC {
            return Err(RootError::BadMagic);
        }
        let header = Self::parse_header(&data)?;
        Ok(Self { data, header, path })
    }

    /// Parse the file-level header and the embedded top TDirectory.
    ///
    /// ROOT file header layout (small file, version < 1000000):
    /// ```text
    /// offset  size  field
    ///    0      4   magic "root"
    ///    4      4   fVersion
    ///    8      4   fBEGIN
    ///   12      4   fEND          (8 bytes in large files)
    ///   16      4   fSeekFree     (8 bytes in large files)
    ///   20      4   fNbytesFree
    ///   24      4   nfree
    ///   28      4   fNbytesName
    ///   32      1   fUnits
    ///   33      4   fCompress
    ///   37      4   fSeekInfo     (8 bytes in large files)
    ///   41      4   fNbytesInfo
    ///   45     18   fUUID
    /// ```
    ///
    /// The TDirectory streamer is located at `fBEGIN + fNbytesName`.
    fn parse_header(data: &[u8]) -> Result<FileHeader> {
        let mut r = RBuffer::new(data);
        r.skip(4)?;

        let version = r.read_u32()?;
        let is_large = version >= LARGE_FILE_VERSION;

        let begin = r.read_u32()? as usize;
        let _end = r.read_seek(is_large)?;
        let _seek_free = r.read_seek(is_large)?;
        let _nbytes_free = r.read_u32()?;
        let _nfree = r.read_u32()?;
        let nbytes_name = r.read_u32()? as usize;

        let dir_offset = begin + nbytes_name;
        if dir_offset >= data.len() {
            return Err(RootError::Deserialization("TDirectory offset past end of file".into()));
        }
        r.set_pos(dir_offset);
        let keys = KeyListLocation::read(&mut r)?;

        Ok(FileHeader { is_large, keys })
    }

    /// Path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all keys in the top-level directory.
    pub fn list_keys(&self) -> Result<Vec<KeyInfo>> {
        let dir = self.read_top_directory()?;
        Ok(dir.keys().iter().map(KeyInfo::from_key).collect())
    }

    /// List keys of a (possibly nested) subdirectory, e.g. `"SR/electrons"`.
    ///
    /// An empty path lists the top-level directory.
    pub fn list_keys_in(&self, dir_path: &str) -> Result<Vec<KeyInfo>> {
        let parts = split_path(dir_path);
        let dir = self.walk_directories(&parts, dir_path)?;
        Ok(dir.keys().iter().map(KeyInfo::from_key).collect())
    }

    /// Get a histogram by its full path (e.g. `"subdir/hist_name"`).
    pub fn get_histogram(&self, path: &str) -> Result<Histogram> {
        Ok(self.get_histogram_with_flows(path)?.histogram)
    }

    /// Get a histogram by its full path, preserving under/overflow bins.
    pub fn get_histogram_with_flows(&self, path: &str) -> Result<HistogramWithFlows> {
        let parts = split_path(path);
        let Some((&name, dirs)) = parts.split_last() else {
            return Err(RootError::KeyNotFound(path.to_string()));
        };

        let dir = self.walk_directories(dirs, path)?;
        let key = dir.find_key(name).ok_or_else(|| RootError::KeyNotFound(path.to_string()))?;
        let payload = self.read_key_payload(key)?;
        objects::read_histogram_with_flows(&payload, &key.class_name)
    }

    fn read_top_directory(&self) -> Result<Directory> {
        Directory::read_key_list(
            &self.data,
            self.header.keys.seek_keys as usize,
            self.header.is_large,
        )
    }

    /// Descend from the top directory through `parts`, each of which must be a directory key.
    fn walk_directories(&self, parts: &[&str], full_path: &str) -> Result<Directory> {
        let mut current = self.read_top_directory()?;
        for &part in parts {
            let key = current.find_key(part).ok_or_else(|| {
                RootError::KeyNotFound(format!("{part} (in path {full_path})"))
            })?;

            if !is_directory_class(&key.class_name) {
                return Err(RootError::Deserialization(format!(
                    "'{}' is not a directory (class: {})",
                    part, key.class_name
                )));
            }

            let payload = self.read_key_payload(key)?;
            current = Directory::read_from_payload(&payload, self.header.is_large, &self.data)?;
        }
        Ok(current)
    }

    /// Read and decompress the payload of a TKey.
    fn read_key_payload(&self, key: &Key) -> Result<Vec<u8>> {
        read_key_payload_from(&self.data, key)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Read the object bytes behind `key`, decompressing when needed.
pub(crate) fn read_key_payload_from(data: &[u8], key: &Key) -> Result<Vec<u8>> {
    let seek = usize::try_from(key.seek_key)
        .map_err(|_| RootError::Deserialization(format!("seek offset too large: {}", key.seek_key)))?;
    let n_bytes = key.n_bytes as usize;
    let key_len = key.key_len as usize;

    let record = region(data, seek, n_bytes)?;
    if key_len > n_bytes {
        return Err(RootError::Deserialization(format!(
            "key '{}' header length {} exceeds record length {}",
            key.name, key_len, n_bytes
        )));
    }

    let object = &record[key_len..];
    if key.is_compressed() {
        decompress(object, key.obj_len as usize)
    } else {
        Ok(object.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{HistSpec, RootFileBuilder};

    fn sample_file() -> RootFile {
        let bytes = RootFileBuilder::new()
            .histogram(HistSpec::uniform("truth", "", 0.0, 4.0, vec![1.0, 2.0, 3.0, 4.0]))
            .directory("sel", |d| {
                d.histogram(HistSpec::uniform("method", "", 0.0, 4.0, vec![0.5; 4]))
            })
            .build();
        RootFile::from_bytes(bytes, PathBuf::from("sample.root")).unwrap()
    }

    #[test]
    fn reject_non_root_file() {
        let result = RootFile::from_bytes(vec![0u8; 100], PathBuf::from("test.root"));
        assert!(matches!(result, Err(RootError::BadMagic)));
    }

    #[test]
    fn reject_too_small() {
        let result = RootFile::from_bytes(b"root".to_vec(), PathBuf::from("test.root"));
        assert!(matches!(result, Err(RootError::BadMagic)));
    }

    #[test]
    fn lists_top_level_and_nested_keys() {
        let f = sample_file();
        let top: Vec<_> = f.list_keys().unwrap().into_iter().map(|k| k.name).collect();
        assert_eq!(top, vec!["truth", "sel"]);

        let nested = f.list_keys_in("sel").unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].class_name, "TH1D");
        assert_eq!(f.list_keys_in("").unwrap().len(), 2);
    }

    #[test]
    fn resolves_nested_paths() {
        let f = sample_file();
        assert_eq!(f.get_histogram("/sel//method").unwrap().bin_content, vec![0.5; 4]);
    }

    #[test]
    fn missing_and_non_directory_paths() {
        let f = sample_file();
        assert!(matches!(f.get_histogram("nope"), Err(RootError::KeyNotFound(_))));
        assert!(matches!(f.get_histogram(""), Err(RootError::KeyNotFound(_))));
        assert!(matches!(f.get_histogram("sel/nope"), Err(RootError::KeyNotFound(_))));
        assert!(matches!(
            f.get_histogram("truth/method"),
            Err(RootError::Deserialization(_))
        ));
        assert!(matches!(f.get_histogram("sel"), Err(RootError::UnsupportedClass(_))));
    }

    #[test]
    fn truncated_file_reports_underflow() {
        let mut bytes = RootFileBuilder::new()
            .histogram(HistSpec::uniform("h", "", 0.0, 1.0, vec![1.0]))
            .build();
        // Drop the key list at the tail.
        bytes.truncate(bytes.len() - 10);
        let f = RootFile::from_bytes(bytes, PathBuf::from("t.root")).unwrap();
        assert!(matches!(f.list_keys(), Err(RootError::BufferUnderflow { .. })));
    }
}
