//! TH1D and TH1F deserialization.
//!
//! ROOT TH1D/TH1F serialization layout (TH1 class version 8):
//! ```text
//! TH1D (or TH1F)
//!   └─ TH1 (base)
//!        ├─ TNamed (name, title)
//!        ├─ TAttLine, TAttFill, TAttMarker (skipped via byte count)
//!        ├─ fNcells (i32)
//!        ├─ fXaxis, fYaxis, fZaxis (TAxis)
//!        ├─ fBarOffset, fBarWidth (i16)
//!        ├─ fEntries, fTsumw, fTsumw2, fTsumwx, fTsumwx2 (f64)
//!        ├─ fMaximum, fMinimum (v >= 2), fNormFactor (v >= 3)
//!        ├─ fContour, fSumw2 (TArrayD)
//!        ├─ fOption (TString), fFunctions (TList)
//!        ├─ fBufferSize + fBuffer (v >= 4)
//!        └─ fBinStatErrOpt (v >= 7), fStatOverflows (v >= 8)
//!   └─ TArrayD / TArrayF (fNcells bin contents, under/overflow included)
//! ```

use crate::error::{Result, RootError};
use crate::histogram::{Histogram, HistogramWithFlows};
use crate::rbuffer::RBuffer;

/// Element type of the trailing bin-content array.
#[derive(Debug, Clone, Copy)]
pub enum Storage {
    /// `TArrayD` (TH1D).
    F64,
    /// `TArrayF` (TH1F).
    F32,
}

/// Axis info extracted from TAxis.
struct AxisInfo {
    title: String,
    n_bins: i32,
    x_min: f64,
    x_max: f64,
    /// Variable-width bin edges (empty for uniform binning).
    bin_edges: Vec<f64>,
}

/// Fields of the TH1 base class that the histogram keeps.
struct Th1Base {
    name: String,
    title: String,
    n_cells: usize,
    axis: AxisInfo,
    entries: f64,
    sumw2: Vec<f64>,
}

/// Read a TH1D/TH1F from decompressed object bytes.
pub fn read_th1(data: &[u8], storage: Storage) -> Result<HistogramWithFlows> {
    let mut r = RBuffer::new(data);

    let (version, _end) = r.read_version()?;
    if version < 1 {
        return Err(RootError::Deserialization(format!("unsupported TH1 leaf version: {version}")));
    }

    let base = read_th1_base(&mut r)?;

    let contents = match storage {
        Storage::F64 => r.read_tarray_f64()?,
        Storage::F32 => r.read_tarray_f32()?,
    };
    if contents.len() != base.n_cells {
        return Err(RootError::Deserialization(format!(
            "{}: bin array size {} != fNcells {}",
            base.name,
            contents.len(),
            base.n_cells
        )));
    }

    build_histogram(base, &contents)
}

fn read_th1_base(r: &mut RBuffer) -> Result<Th1Base> {
    let (th1_ver, th1_end) = r.read_version()?;

    let (name, title) = r.read_tnamed()?;

    // TAttLine, TAttFill, TAttMarker
    r.skip_object()?;
    r.skip_object()?;
    r.skip_object()?;

    let n_cells = r.read_i32()?;
    let n_cells = usize::try_from(n_cells)
        .map_err(|_| RootError::Deserialization(format!("{name}: negative fNcells {n_cells}")))?;

    let axis = read_taxis(r)?;
    let _y_axis = read_taxis(r)?;
    let _z_axis = read_taxis(r)?;

    let _bar_offset = r.read_i16()?;
    let _bar_width = r.read_i16()?;
    let entries = r.read_f64()?;
    let _tsumw = r.read_f64()?;
    let _tsumw2 = r.read_f64()?;
    let _tsumwx = r.read_f64()?;
    let _tsumwx2 = r.read_f64()?;
    if th1_ver >= 2 {
        let _maximum = r.read_f64()?;
        let _minimum = r.read_f64()?;
    }
    if th1_ver >= 3 {
        let _norm_factor = r.read_f64()?;
    }

    let _contour = r.read_tarray_f64()?;
    let sumw2 = r.read_tarray_f64()?;

    match th1_end {
        Some(end) => r.seek_to_end(end)?,
        None => skip_th1_tail(r, th1_ver)?,
    }

    Ok(Th1Base { name, title, n_cells, axis, entries, sumw2 })
}

/// Walk the TH1 fields after fSumw2 when no byte count is available.
fn skip_th1_tail(r: &mut RBuffer, th1_ver: u16) -> Result<()> {
    let _option = r.read_string()?;
    // fFunctions (TList)
    r.skip_object()?;
    if th1_ver >= 4 {
        let buffer_size = r.read_i32()?;
        // array "speedbump" byte precedes fBuffer
        let _speedbump = r.read_u8()?;
        if buffer_size > 0 {
            r.skip(buffer_size as usize * 8)?;
        }
    }
    if th1_ver >= 7 {
        let _bin_stat_err_opt = r.read_i32()?;
    }
    if th1_ver >= 8 {
        let _stat_overflows = r.read_i32()?;
    }
    Ok(())
}

fn read_taxis(r: &mut RBuffer) -> Result<AxisInfo> {
    let (_ver, axis_end) = r.read_version()?;

    let (_name, title) = r.read_tnamed()?;
    // TAttAxis
    r.skip_object()?;

    let n_bins = r.read_i32()?;
    let x_min = r.read_f64()?;
    let x_max = r.read_f64()?;
    let bin_edges = r.read_tarray_f64()?;

    // fFirst, fLast, fBits2, fTimeDisplay, fTimeFormat, fLabels, fModLabs are
    // not needed; without a byte count ROOT >= 4 never writes this object.
    if let Some(end) = axis_end {
        r.seek_to_end(end)?;
    }

    Ok(AxisInfo { title, n_bins, x_min, x_max, bin_edges })
}

/// Split the raw cell array `[underflow, bin1, ..., binN, overflow]` into a histogram.
fn build_histogram(base: Th1Base, raw: &[f64]) -> Result<HistogramWithFlows> {
    let Th1Base { name, title, n_cells, axis, entries, sumw2 } = base;

    let n_bins = usize::try_from(axis.n_bins)
        .ok()
        .filter(|&n| n >= 1 && n + 2 <= n_cells)
        .ok_or_else(|| {
            RootError::Deserialization(format!(
                "{name}: axis has {} bins but histogram stores {n_cells} cells",
                axis.n_bins
            ))
        })?;

    let bin_edges = if axis.bin_edges.is_empty() {
        uniform_edges(axis.x_min, axis.x_max, n_bins)
    } else if axis.bin_edges.len() == n_bins + 1 {
        axis.bin_edges
    } else {
        return Err(RootError::Deserialization(format!(
            "{name}: {} variable bin edges for {n_bins} bins",
            axis.bin_edges.len()
        )));
    };

    let overflow_idx = n_bins + 1;
    let (sumw2_main, underflow_sumw2, overflow_sumw2) = if sumw2.len() == n_cells {
        (Some(sumw2[1..=n_bins].to_vec()), Some(sumw2[0]), Some(sumw2[overflow_idx]))
    } else if sumw2.is_empty() {
        (None, None, None)
    } else {
        return Err(RootError::Deserialization(format!(
            "{name}: fSumw2 has {} entries, expected {n_cells}",
            sumw2.len()
        )));
    };

    Ok(HistogramWithFlows {
        histogram: Histogram {
            name,
            title,
            x_title: axis.title,
            n_bins,
            x_min: axis.x_min,
            x_max: axis.x_max,
            bin_edges,
            bin_content: raw[1..=n_bins].to_vec(),
            sumw2: sumw2_main,
            entries,
        },
        underflow: raw[0],
        overflow: raw[overflow_idx],
        underflow_sumw2,
        overflow_sumw2,
    })
}

fn uniform_edges(x_min: f64, x_max: f64, n_bins: usize) -> Vec<f64> {
    let width = (x_max - x_min) / n_bins as f64;
    let mut edges: Vec<f64> = (0..=n_bins).map(|i| x_min + i as f64 * width).collect();
    // Pin the last edge so it compares equal to fXmax.
    edges[n_bins] = x_max;
    edges
}
