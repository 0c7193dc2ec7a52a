//! ROOT compression block decompression (ZL = zlib, L4 = LZ4, ZS = ZSTD, XZ = LZMA).
//!
//! ROOT writes compressed data as one or more 9-byte-header blocks:
//! ```text
//! bytes 0-1:  algorithm tag ("ZL", "XZ", "L4", "ZS")
//! byte  2:    method (ignored)
//! bytes 3-5:  compressed size   (3-byte little-endian)
//! bytes 6-8:  uncompressed size (3-byte little-endian)
//! ```
//! The compressed payload immediately follows the 9-byte header.

use std::io::Read;

use crate::error::{Result, RootError};

/// Size of the per-block header.
pub const BLOCK_HEADER_LEN: usize = 9;

/// Upper bound on a single decompressed object.
const MAX_OBJECT_LEN: usize = 1 << 30;

/// Decompress ROOT-compressed data into `expected_len` bytes.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    if expected_len > MAX_OBJECT_LEN {
        return Err(RootError::Decompression(format!(
            "object claims {expected_len} uncompressed bytes (limit {MAX_OBJECT_LEN})"
        )));
    }

    let mut out = Vec::with_capacity(expected_len);
    let mut offset = 0;

    while out.len() < expected_len && offset + BLOCK_HEADER_LEN <= src.len() {
        let tag = &src[offset..offset + 2];
        let c_size = read_le24(&src[offset + 3..offset + 6]);
        let u_size = read_le24(&src[offset + 6..offset + 9]);
        offset += BLOCK_HEADER_LEN;

        let end = offset + c_size;
        if end > src.len() {
            return Err(RootError::Decompression(format!(
                "compressed block claims {} bytes but only {} remain",
                c_size,
                src.len() - offset
            )));
        }
        if out.len() + u_size > expected_len {
            return Err(RootError::Decompression(format!(
                "block of {} bytes overruns expected object length {}",
                u_size, expected_len
            )));
        }

        let compressed = &src[offset..end];
        let block = match tag {
            b"ZL" => decompress_zlib(compressed, u_size)?,
            b"L4" => decompress_lz4(compressed, u_size)?,
            b"ZS" => decompress_zstd(compressed, u_size)?,
            b"XZ" => decompress_xz(compressed, u_size)?,
            _ => {
                return Err(RootError::Decompression(format!(
                    "unsupported compression algorithm: {:?}",
                    String::from_utf8_lossy(tag)
                )));
            }
        };

        if block.len() != u_size {
            return Err(RootError::Decompression(format!(
                "expected {} uncompressed bytes, got {}",
                u_size,
                block.len()
            )));
        }

        out.extend_from_slice(&block);
        offset = end;
    }

    if out.len() != expected_len {
        return Err(RootError::Decompression(format!(
            "total decompressed length {} != expected {}",
            out.len(),
            expected_len
        )));
    }

    Ok(out)
}

fn decompress_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    read_capped(flate2::read::ZlibDecoder::new(data), expected, "zlib")
}

fn decompress_lz4(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    // ROOT prefixes LZ4 payloads with an 8-byte xxhash64 checksum (not verified).
    let Some(lz4_data) = data.get(8..) else {
        return Err(RootError::Decompression("LZ4 block too small for checksum header".into()));
    };
    lz4_flex::decompress(lz4_data, expected)
        .map_err(|e| RootError::Decompression(format!("lz4: {e}")))
}

fn decompress_zstd(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut source = data;
    let decoder = ruzstd::decoding::StreamingDecoder::new(&mut source)
        .map_err(|e| RootError::Decompression(format!("zstd: {e}")))?;
    read_capped(decoder, expected, "zstd")
}

fn decompress_xz(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut input = std::io::BufReader::new(data);
    let mut out = CappedWriter { buf: Vec::with_capacity(expected), limit: expected };
    lzma_rs::xz_decompress(&mut input, &mut out)
        .map_err(|e| RootError::Decompression(format!("xz: {e}")))?;
    Ok(out.buf)
}

/// Read at most `expected + 1` bytes so an oversized stream is caught
/// without inflating it in full.
fn read_capped(reader: impl Read, expected: usize, algo: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    reader
        .take(expected as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| RootError::Decompression(format!("{algo}: {e}")))?;
    if out.len() > expected {
        return Err(RootError::Decompression(format!(
            "{algo}: stream exceeds declared {expected} uncompressed bytes"
        )));
    }
    Ok(out)
}

/// Sink that refuses to grow past `limit` bytes.
struct CappedWriter {
    buf: Vec<u8>,
    limit: usize,
}

impl std::io::Write for CappedWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        if self.buf.len() + data.len() > self.limit {
            return Err(std::io::Error::other(format!(
                "stream exceeds declared {} uncompressed bytes",
                self.limit
            )));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Read a 3-byte little-endian unsigned integer.
fn read_le24(b: &[u8]) -> usize {
    b[0] as usize | ((b[1] as usize) << 8) | ((b[2] as usize) << 16)
}

/// Build one ROOT compression block header for `tag`.
pub fn block_header(tag: &[u8; 2], method: u8, c_len: usize, u_len: usize) -> [u8; BLOCK_HEADER_LEN] {
    [
        tag[0],
        tag[1],
        method,
        (c_len & 0xFF) as u8,
        ((c_len >> 8) & 0xFF) as u8,
        ((c_len >> 16) & 0xFF) as u8,
        (u_len & 0xFF) as u8,
        ((u_len >> 8) & 0xFF) as u8,
        ((u_len >> 16) & 0xFF) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_root_block(tag: &[u8; 2], method: u8, compressed: &[u8], u_len: usize) -> Vec<u8> {
        let mut block = block_header(tag, method, compressed.len(), u_len).to_vec();
        block.extend_from_slice(compressed);
        block
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn le24_decoding() {
        assert_eq!(read_le24(&[0x10, 0x00, 0x00]), 16);
        assert_eq!(read_le24(&[0xff, 0xff, 0xff]), 0xFF_FFFF);
        assert_eq!(read_le24(&[0x00, 0x01, 0x00]), 256);
    }

    #[test]
    fn zlib_block() {
        let original = b"Tag and probe invariant mass, repeated: AAAAAAAAAAAAAAAA";
        let block = make_root_block(b"ZL", 0x08, &zlib(original), original.len());
        assert_eq!(decompress(&block, original.len()).unwrap(), original);
    }

    #[test]
    fn multi_block_payload() {
        let first = b"first half of the object ".repeat(4);
        let second = b"second half of the object".repeat(3);
        let mut src = make_root_block(b"ZL", 0x08, &zlib(&first), first.len());
        src.extend(make_root_block(b"ZL", 0x08, &zlib(&second), second.len()));

        let out = decompress(&src, first.len() + second.len()).unwrap();
        assert_eq!(&out[..first.len()], &first[..]);
        assert_eq!(&out[first.len()..], &second[..]);
    }

    #[test]
    fn lz4_block_skips_checksum() {
        let original = b"LZ4 payload with a checksum prefix: BBBBBBBBBBBBBBBB";
        let mut payload = vec![0u8; 8];
        payload.extend(lz4_flex::compress(original));
        let block = make_root_block(b"L4", 0x01, &payload, original.len());
        assert_eq!(decompress(&block, original.len()).unwrap(), original);
    }

    #[test]
    fn zstd_block() {
        let original = b"ZSTD payload: CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC";
        let compressed = ruzstd::encoding::compress_to_vec(
            &original[..],
            ruzstd::encoding::CompressionLevel::Fastest,
        );
        let block = make_root_block(b"ZS", 0x04, &compressed, original.len());
        assert_eq!(decompress(&block, original.len()).unwrap(), original);
    }

    #[test]
    fn xz_block() {
        let original = b"XZ payload: DDDDDDDDDDDDDDDDDDDDDDDDDD";
        let mut compressed = Vec::new();
        lzma_rs::xz_compress(&mut std::io::BufReader::new(&original[..]), &mut compressed).unwrap();
        let block = make_root_block(b"XZ", 0x05, &compressed, original.len());
        assert_eq!(decompress(&block, original.len()).unwrap(), original);
    }

    #[test]
    fn zlib_stream_longer_than_declared_is_rejected() {
        let bomb = zlib(&vec![0u8; 1 << 20]);
        let block = make_root_block(b"ZL", 0x08, &bomb, 16);
        let err = decompress(&block, 16).unwrap_err();
        assert!(err.to_string().contains("exceeds declared 16"), "{err}");
    }

    #[test]
    fn xz_stream_longer_than_declared_is_rejected() {
        let data = vec![b'x'; 64 * 1024];
        let mut compressed = Vec::new();
        lzma_rs::xz_compress(&mut std::io::BufReader::new(&data[..]), &mut compressed).unwrap();
        let block = make_root_block(b"XZ", 0x05, &compressed, 32);
        assert!(decompress(&block, 32).is_err());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let block = make_root_block(b"QQ", 0x00, &[1, 2, 3], 3);
        let err = decompress(&block, 3).unwrap_err();
        assert!(err.to_string().contains("unsupported compression algorithm"));
    }

    #[test]
    fn truncated_block_is_rejected() {
        let mut block = make_root_block(b"ZL", 0x08, &zlib(b"hello"), 5);
        block.truncate(block.len() - 2);
        assert!(matches!(decompress(&block, 5), Err(RootError::Decompression(_))));
    }

    #[test]
    fn oversized_claim_is_rejected() {
        assert!(decompress(&[], MAX_OBJECT_LEN + 1).is_err());
    }
}
