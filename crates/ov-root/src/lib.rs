//! # ov-root
//!
//! Native ROOT file reader for `overlay`.
//!
//! Reads TH1D/TH1F histograms from `.root` files without requiring ROOT or
//! Python. Supports zlib, LZ4, ZSTD, and XZ compressed object payloads and
//! histograms nested inside `TDirectoryFile`s.
//!
//! ## Example
//!
//! ```no_run
//! use ov_root::{RootFile, kappa};
//!
//! let f = RootFile::open("tagprobe.root").unwrap();
//! for key in f.list_keys().unwrap() {
//!     println!("{} ({})", key.name, key.class_name);
//! }
//! let truth = f.get_histogram("hInvMass_RECOden").unwrap();
//! let method = f.get_histogram("hInvMass_DTnum").unwrap();
//! println!("Kappa is {}", kappa(&truth, &method).unwrap());
//! let ratio = method.normalized().unwrap().divide(&truth.normalized().unwrap()).unwrap();
//! println!("first ratio bin: {}", ratio.bin_content[0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod datasource;
pub mod decompress;
pub mod directory;
pub mod error;
pub mod file;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod histogram;
pub mod key;
pub mod objects;
pub mod rbuffer;

pub use error::{Result, RootError};
pub use file::RootFile;
pub use histogram::{Histogram, HistogramWithFlows, kappa};
pub use key::KeyInfo;
