//! ROOT object deserialization dispatch.

mod th1;

use crate::error::{Result, RootError};
use crate::histogram::HistogramWithFlows;

/// Read a histogram (with under/overflow) from a decompressed object payload.
pub fn read_histogram_with_flows(payload: &[u8], class_name: &str) -> Result<HistogramWithFlows> {
    match class_name {
        "TH1D" => th1::read_th1(payload, th1::Storage::F64),
        "TH1F" => th1::read_th1(payload, th1::Storage::F32),
        _ => Err(RootError::UnsupportedClass(class_name.to_string())),
    }
}
