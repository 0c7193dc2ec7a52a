//! Minimal ROOT file writer for tests and demos.
//!
//! Produces files containing TH1D/TH1F histograms, optionally nested in
//! `TDirectoryFile`s and zlib-compressed, laid out the way ROOT 6 writes
//! them. Only what the reader in this crate consumes is written faithfully;
//! other fields carry ROOT's default values.

use std::io::Write;
use std::path::Path;

use crate::decompress::block_header;
use crate::rbuffer::BYTE_COUNT_MASK;

/// Offset of the first record (`fBEGIN`).
const BEGIN: u64 = 100;
const SMALL_FILE_VERSION: u32 = 62_804;
const LARGE_FILE_VERSION: u32 = 1_062_804;
const KEY_VERSION: u16 = 4;
const DIR_VERSION: u16 = 5;
/// Added to key/directory versions that use 64-bit seek pointers.
const LARGE_OFFSET: u16 = 1000;
/// Fixed-size part of a small TKey header.
const SMALL_KEY_FIXED: usize = 26;
const DATIME: u32 = 0x7A9E_6C00;
/// `kNotDeleted | kMustCleanup` as written by TObject::Streamer.
const TOBJECT_BITS: u32 = 0x0300_0000;

/// Big-endian writer mirroring [`crate::rbuffer::RBuffer`].
#[derive(Default)]
struct WBuffer {
    data: Vec<u8>,
}

impl WBuffer {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn u8(&mut self, v: u8) {
        self.data.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    fn i16(&mut self, v: i16) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    fn f64(&mut self, v: f64) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    fn seek(&mut self, v: u64, large: bool) {
        if large {
            self.data.extend_from_slice(&v.to_be_bytes());
        } else {
            self.u32(v as u32);
        }
    }

    fn bytes(&mut self, b: &[u8]) {
        self.data.extend_from_slice(b);
    }

    fn string(&mut self, s: &str) {
        if s.len() < 255 {
            self.u8(s.len() as u8);
        } else {
            self.u8(255);
            self.u32(s.len() as u32);
        }
        self.bytes(s.as_bytes());
    }

    fn tarray_f64(&mut self, values: &[f64]) {
        self.i32(values.len() as i32);
        for &v in values {
            self.f64(v);
        }
    }

    fn tarray_f32(&mut self, values: &[f64]) {
        self.i32(values.len() as i32);
        for &v in values {
            self.f32(v as f32);
        }
    }

    /// Start a versioned object with a byte count; returns the patch position.
    fn begin_object(&mut self, version: u16) -> usize {
        let at = self.len();
        self.u32(0);
        self.u16(version);
        at
    }

    fn end_object(&mut self, at: usize) {
        let count = (self.len() - at - 4) as u32 | BYTE_COUNT_MASK;
        self.patch_u32(at, count);
    }

    fn patch_u32(&mut self, at: usize, v: u32) {
        self.data[at..at + 4].copy_from_slice(&v.to_be_bytes());
    }

    fn patch_seek(&mut self, at: usize, v: u64, large: bool) {
        if large {
            self.data[at..at + 8].copy_from_slice(&v.to_be_bytes());
        } else {
            self.patch_u32(at, v as u32);
        }
    }

    fn tobject(&mut self) {
        self.u16(1);
        self.u32(0);
        self.u32(TOBJECT_BITS);
    }

    fn tnamed(&mut self, name: &str, title: &str) {
        let at = self.begin_object(1);
        self.tobject();
        self.string(name);
        self.string(title);
        self.end_object(at);
    }
}

#[derive(Debug, Clone)]
enum Binning {
    Uniform { x_min: f64, x_max: f64 },
    Variable(Vec<f64>),
}

/// Description of a histogram to serialize.
#[derive(Debug, Clone)]
pub struct HistSpec {
    name: String,
    title: String,
    x_title: String,
    binning: Binning,
    contents: Vec<f64>,
    underflow: f64,
    overflow: f64,
    sumw2: Vec<f64>,
    entries: Option<f64>,
    single_precision: bool,
    cycle: u16,
}

impl HistSpec {
    /// Uniform binning over `[x_min, x_max]` with one bin per content value.
    pub fn uniform(name: &str, title: &str, x_min: f64, x_max: f64, contents: Vec<f64>) -> Self {
        Self::new(name, title, Binning::Uniform { x_min, x_max }, contents)
    }

    /// Variable binning; `edges.len()` must be `contents.len() + 1`.
    pub fn variable(name: &str, title: &str, edges: Vec<f64>, contents: Vec<f64>) -> Self {
        Self::new(name, title, Binning::Variable(edges), contents)
    }

    fn new(name: &str, title: &str, binning: Binning, contents: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            x_title: String::new(),
            binning,
            contents,
            underflow: 0.0,
            overflow: 0.0,
            sumw2: Vec::new(),
            entries: None,
            single_precision: false,
            cycle: 1,
        }
    }

    /// Set the x-axis title.
    pub fn with_x_title(mut self, x_title: &str) -> Self {
        self.x_title = x_title.to_string();
        self
    }

    /// Set underflow and overflow contents.
    pub fn with_flows(mut self, underflow: f64, overflow: f64) -> Self {
        self.underflow = underflow;
        self.overflow = overflow;
        self
    }

    /// Store `fSumw2` over all cells, flows included (`n_bins + 2` values).
    pub fn with_sumw2(mut self, sumw2: Vec<f64>) -> Self {
        self.sumw2 = sumw2;
        self
    }

    /// Override `fEntries` (defaults to the sum of all cells).
    pub fn with_entries(mut self, entries: f64) -> Self {
        self.entries = Some(entries);
        self
    }

    /// Key cycle number (defaults to 1).
    pub fn with_cycle(mut self, cycle: u16) -> Self {
        self.cycle = cycle;
        self
    }

    /// Write as TH1F (single-precision contents).
    pub fn as_th1f(mut self) -> Self {
        self.single_precision = true;
        self
    }

    /// ROOT class name this spec serializes as.
    pub fn class_name(&self) -> &'static str {
        if self.single_precision { "TH1F" } else { "TH1D" }
    }

    fn n_bins(&self) -> usize {
        self.contents.len()
    }

    fn range(&self) -> (f64, f64) {
        match &self.binning {
            Binning::Uniform { x_min, x_max } => (*x_min, *x_max),
            Binning::Variable(edges) => {
                (edges.first().copied().unwrap_or(0.0), edges.last().copied().unwrap_or(1.0))
            }
        }
    }

    fn cells(&self) -> Vec<f64> {
        let mut cells = Vec::with_capacity(self.n_bins() + 2);
        cells.push(self.underflow);
        cells.extend_from_slice(&self.contents);
        cells.push(self.overflow);
        cells
    }
}

/// Serialize a histogram as the uncompressed object payload of its key.
pub fn th1_payload(spec: &HistSpec) -> Vec<u8> {
    let mut w = WBuffer::default();
    let cells = spec.cells();
    let (x_min, x_max) = spec.range();

    let leaf = w.begin_object(3);
    let th1 = w.begin_object(8);
    w.tnamed(&spec.name, &spec.title);

    let att_line = w.begin_object(2);
    w.i16(602);
    w.i16(1);
    w.i16(1);
    w.end_object(att_line);

    let att_fill = w.begin_object(2);
    w.i16(0);
    w.i16(1001);
    w.end_object(att_fill);

    let att_marker = w.begin_object(2);
    w.i16(1);
    w.i16(1);
    w.f32(1.0);
    w.end_object(att_marker);

    w.i32(cells.len() as i32);
    let edges: &[f64] = match &spec.binning {
        Binning::Uniform { .. } => &[],
        Binning::Variable(edges) => edges,
    };
    write_taxis(&mut w, "xaxis", &spec.x_title, spec.n_bins() as i32, x_min, x_max, edges);
    write_taxis(&mut w, "yaxis", "", 1, 0.0, 1.0, &[]);
    write_taxis(&mut w, "zaxis", "", 1, 0.0, 1.0, &[]);

    w.i16(0);
    w.i16(1000);
    let tsumw: f64 = spec.contents.iter().sum();
    w.f64(spec.entries.unwrap_or_else(|| cells.iter().sum()));
    w.f64(tsumw);
    w.f64(spec.contents.iter().map(|c| c * c).sum());
    w.f64(0.0);
    w.f64(0.0);
    w.f64(-1111.0);
    w.f64(-1111.0);
    w.f64(0.0);
    w.tarray_f64(&[]);
    w.tarray_f64(&spec.sumw2);
    w.string("");

    let functions = w.begin_object(5);
    w.tobject();
    w.string("");
    w.i32(0);
    w.end_object(functions);

    w.i32(0);
    w.u8(0);
    w.i32(0);
    w.i32(2);
    w.end_object(th1);

    if spec.single_precision {
        w.tarray_f32(&cells);
    } else {
        w.tarray_f64(&cells);
    }
    w.end_object(leaf);
    w.data
}

fn write_taxis(w: &mut WBuffer, name: &str, title: &str, n_bins: i32, x_min: f64, x_max: f64, edges: &[f64]) {
    let axis = w.begin_object(10);
    w.tnamed(name, title);

    let att_axis = w.begin_object(4);
    w.i32(510);
    w.i16(1);
    w.i16(1);
    w.i16(42);
    w.f32(0.005);
    w.f32(0.035);
    w.f32(0.03);
    w.f32(1.0);
    w.f32(0.035);
    w.i16(1);
    w.i16(42);
    w.end_object(att_axis);

    w.i32(n_bins);
    w.f64(x_min);
    w.f64(x_max);
    w.tarray_f64(edges);
    w.i32(0);
    w.i32(0);
    w.u16(0);
    w.u8(0);
    w.string("");
    // fLabels, fModLabs: null pointers
    w.u32(0);
    w.u32(0);
    w.end_object(axis);
}

enum Entry {
    Histogram(HistSpec),
    Directory(String, RootFileBuilder),
    Raw { class_name: String, name: String, payload: Vec<u8> },
}

/// Builder for an in-memory ROOT file.
///
/// ```
/// use ov_root::RootFile;
/// use ov_root::fixtures::{HistSpec, RootFileBuilder};
///
/// let bytes = RootFileBuilder::new()
///     .histogram(HistSpec::uniform("truth", "", 0.0, 2.0, vec![3.0, 1.0]))
///     .directory("sel", |d| d.histogram(HistSpec::uniform("m", "", 0.0, 2.0, vec![1.0, 1.0])))
///     .compressed(true)
///     .build();
/// let f = RootFile::from_bytes(bytes, "mem.root".into()).unwrap();
/// assert_eq!(f.get_histogram("sel/m").unwrap().integral(), 2.0);
/// ```
#[derive(Default)]
pub struct RootFileBuilder {
    entries: Vec<Entry>,
    compressed: bool,
    large: bool,
}

struct Layout {
    compressed: bool,
    large: bool,
}

impl RootFileBuilder {
    /// Empty file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a histogram to this directory.
    pub fn histogram(mut self, spec: HistSpec) -> Self {
        self.entries.push(Entry::Histogram(spec));
        self
    }

    /// Add a subdirectory populated by `fill`.
    pub fn directory(mut self, name: &str, fill: impl FnOnce(RootFileBuilder) -> RootFileBuilder) -> Self {
        self.entries.push(Entry::Directory(name.to_string(), fill(RootFileBuilder::new())));
        self
    }

    /// Add an arbitrary object stored uncompressed under `class_name`.
    pub fn raw_object(mut self, class_name: &str, name: &str, payload: Vec<u8>) -> Self {
        self.entries.push(Entry::Raw {
            class_name: class_name.to_string(),
            name: name.to_string(),
            payload,
        });
        self
    }

    /// Zlib-compress histogram payloads. Applies to the whole file.
    pub fn compressed(mut self, yes: bool) -> Self {
        self.compressed = yes;
        self
    }

    /// Use the large-file layout with 64-bit seek pointers.
    pub fn large(mut self, yes: bool) -> Self {
        self.large = yes;
        self
    }

    /// Serialize the file.
    pub fn build(&self) -> Vec<u8> {
        let layout = Layout { compressed: self.compressed, large: self.large };
        let large = self.large;
        let mut w = WBuffer::default();

        w.bytes(b"root");
        w.u32(if large { LARGE_FILE_VERSION } else { SMALL_FILE_VERSION });
        w.u32(BEGIN as u32);
        let end_at = w.len();
        w.seek(0, large);
        w.seek(0, large);
        w.u32(0);
        w.u32(0);
        let nbytes_name_at = w.len();
        w.u32(0);
        w.u8(if large { 8 } else { 4 });
        w.u32(if self.compressed { 101 } else { 0 });
        w.seek(0, large);
        w.u32(0);
        w.bytes(&[0u8; 18]);
        w.data.resize(BEGIN as usize, 0);

        // TFile key header followed by its TNamed name/title.
        let header = key_header(&KeyFields {
            n_bytes: 0,
            obj_len: 0,
            cycle: 1,
            seek_key: BEGIN,
            seek_pdir: 0,
            class_name: "TFile",
            name: "fixture.root",
            title: "",
            large,
        });
        w.bytes(&header);
        w.string("fixture.root");
        w.string("");
        let nbytes_name = w.len() as u64 - BEGIN;
        w.patch_u32(nbytes_name_at, nbytes_name as u32);

        let top = write_dir_streamer(&mut w, BEGIN, 0, large);
        let (seek_keys, nbytes_keys) = self.write_contents(&mut w, &layout, BEGIN);
        w.patch_u32(top.nbytes_keys_at, nbytes_keys);
        w.patch_seek(top.seek_keys_at, seek_keys, large);

        let end = w.len() as u64;
        w.patch_seek(end_at, end, large);
        w.data
    }

    /// Serialize and write to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }

    /// Write every entry's record, then this directory's key list.
    ///
    /// Returns `(seek_keys, nbytes_keys)` of the key list.
    fn write_contents(&self, w: &mut WBuffer, layout: &Layout, seek_pdir: u64) -> (u64, u32) {
        let mut headers = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let header = match entry {
                Entry::Histogram(spec) => {
                    let payload = th1_payload(spec);
                    write_record(w, layout, seek_pdir, spec.class_name(), &spec.name, &spec.title, spec.cycle, &payload, layout.compressed)
                }
                Entry::Directory(name, sub) => {
                    let (sub_keys, sub_nbytes) = sub.write_contents(w, layout, 0);
                    let mut streamer = WBuffer::default();
                    let fields = write_dir_streamer(&mut streamer, 0, seek_pdir, layout.large);
                    streamer.patch_u32(fields.nbytes_keys_at, sub_nbytes);
                    streamer.patch_seek(fields.seek_keys_at, sub_keys, layout.large);
                    write_record(w, layout, seek_pdir, "TDirectoryFile", name, name, 1, &streamer.data, false)
                }
                Entry::Raw { class_name, name, payload } => {
                    write_record(w, layout, seek_pdir, class_name, name, "", 1, payload, false)
                }
            };
            headers.push(header);
        }

        let seek_keys = w.len() as u64;
        let mut body = WBuffer::default();
        body.u32(headers.len() as u32);
        for h in &headers {
            body.bytes(h);
        }
        let header = record_header(seek_keys, seek_pdir, "TDirectory", "", "", 1, body.len(), body.len(), layout.large);
        let n_bytes = (header.len() + body.len()) as u32;
        w.bytes(&header);
        w.bytes(&body.data);
        (seek_keys, n_bytes)
    }
}

struct DirStreamerFields {
    nbytes_keys_at: usize,
    seek_keys_at: usize,
}

fn write_dir_streamer(w: &mut WBuffer, seek_dir: u64, seek_parent: u64, large: bool) -> DirStreamerFields {
    w.u16(if large { DIR_VERSION + LARGE_OFFSET } else { DIR_VERSION });
    w.u32(DATIME);
    w.u32(DATIME);
    let nbytes_keys_at = w.len();
    w.u32(0);
    w.u32(0);
    w.seek(seek_dir, large);
    w.seek(seek_parent, large);
    let seek_keys_at = w.len();
    w.seek(0, large);
    DirStreamerFields { nbytes_keys_at, seek_keys_at }
}

/// Append one key record (header + possibly compressed payload); returns the key header.
#[allow(clippy::too_many_arguments)]
fn write_record(
    w: &mut WBuffer,
    layout: &Layout,
    seek_pdir: u64,
    class_name: &str,
    name: &str,
    title: &str,
    cycle: u16,
    payload: &[u8],
    compress: bool,
) -> Vec<u8> {
    let stored = if compress { zlib_block(payload) } else { payload.to_vec() };
    let seek_key = w.len() as u64;
    let header = record_header(seek_key, seek_pdir, class_name, name, title, cycle, payload.len(), stored.len(), layout.large);
    w.bytes(&header);
    w.bytes(&stored);
    header
}

#[allow(clippy::too_many_arguments)]
fn record_header(
    seek_key: u64,
    seek_pdir: u64,
    class_name: &str,
    name: &str,
    title: &str,
    cycle: u16,
    obj_len: usize,
    stored_len: usize,
    large: bool,
) -> Vec<u8> {
    let key_len = key_header_len(class_name, name, title, large);
    key_header(&KeyFields {
        n_bytes: (key_len + stored_len) as u32,
        obj_len: obj_len as u32,
        cycle,
        seek_key,
        seek_pdir,
        class_name,
        name,
        title,
        large,
    })
}

struct KeyFields<'a> {
    n_bytes: u32,
    obj_len: u32,
    cycle: u16,
    seek_key: u64,
    seek_pdir: u64,
    class_name: &'a str,
    name: &'a str,
    title: &'a str,
    large: bool,
}

fn key_header_len(class_name: &str, name: &str, title: &str, large: bool) -> usize {
    SMALL_KEY_FIXED
        + if large { 8 } else { 0 }
        + [class_name, name, title].iter().map(|s| string_len(s)).sum::<usize>()
}

fn key_header(k: &KeyFields) -> Vec<u8> {
    let mut w = WBuffer::default();
    w.u32(k.n_bytes);
    w.u16(if k.large { KEY_VERSION + LARGE_OFFSET } else { KEY_VERSION });
    w.u32(k.obj_len);
    w.u32(DATIME);
    w.u16(key_header_len(k.class_name, k.name, k.title, k.large) as u16);
    w.u16(k.cycle);
    w.seek(k.seek_key, k.large);
    w.seek(k.seek_pdir, k.large);
    w.string(k.class_name);
    w.string(k.name);
    w.string(k.title);
    w.data
}

fn string_len(s: &str) -> usize {
    if s.len() < 255 { 1 + s.len() } else { 5 + s.len() }
}

/// Compress `payload` into a single ROOT "ZL" block.
fn zlib_block(payload: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    // Writes into a Vec cannot fail.
    let compressed = encoder
        .write_all(payload)
        .and_then(|()| encoder.finish())
        .unwrap_or_default();
    let mut out = block_header(b"ZL", 8, compressed.len(), payload.len()).to_vec();
    out.extend_from_slice(&compressed);
    out
}
