//! Cavern: find code caves in PE executables.
//!
//! A code cave is a run of identical filler bytes (zeros, `nop`s, or any
//! chosen byte) inside a section of an executable. This crate maps the file,
//! walks its section table with a small bounded PE parser and reports every
//! run longer than a configurable minimum.
//!
//! ```no_run
//! use cavern::caves::{scan_file, ScanConfig};
//! use cavern::io::ReaderLimits;
//! use cavern::report::CollectingReporter;
//!
//! let mut reporter = CollectingReporter::new();
//! let summary = scan_file(
//!     "target.exe",
//!     &ScanConfig::default().with_min_cave_length(128),
//!     &ReaderLimits::default(),
//!     &mut reporter,
//! )?;
//! println!("{} caves", summary.caves);
//! # Ok::<(), cavern::error::CaveError>(())
//! ```

pub mod caves;
pub mod error;
pub mod formats;
pub mod io;
pub mod logging;
pub mod report;

pub use caves::{scan_file, CavePattern, CaveRecord, ScanConfig, ScanSummary};
pub use error::{CaveError, Result};
