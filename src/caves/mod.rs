//! Code cave discovery.
//!
//! A code cave is a run of identical filler bytes inside a section, long
//! enough to hold injected code. The pieces, from the bottom up:
//!
//! - [`address`] turns a section-relative offset into reportable addresses.
//! - [`RunDetector`] tracks one target byte over a byte stream.
//! - [`scan_section`] runs one detector per [`CavePattern`] over a section.
//! - [`scan_image`] / [`scan_image_parallel`] walk every section of a PE image.
//! - [`scan_file`] ties it to the filesystem and a [`Reporter`].

pub mod address;
pub mod config;
pub mod detector;
pub mod pattern;
pub mod record;
pub mod scanner;

pub use config::{ScanConfig, DEFAULT_IMAGE_BASE, DEFAULT_MIN_CAVE_LENGTH};
pub use detector::RunDetector;
pub use pattern::CavePattern;
pub use record::{CaveRecord, ScanSummary, SectionContext, SectionOutcome, SectionScan};
pub use scanner::{all_caves, scan_image, scan_image_parallel, scan_section};

use crate::error::Result;
use crate::formats::pe::PeParser;
use crate::io::{MappedImage, ReaderLimits};
use crate::report::Reporter;
use std::path::Path;
use tracing::{debug, info_span};

const ASLR_WARNING: &str = "ASLR is enabled. Virtual Address might be different once loaded in memory.";

/// Scan the PE file at `path` and hand every result to `reporter`.
///
/// Fails only when the configuration is invalid, the file cannot be read, its
/// headers cannot be parsed, or the reporter fails. Sections whose raw bytes
/// lie outside the file are reported as skipped.
pub fn scan_file<P, R>(
    path: P,
    config: &ScanConfig,
    limits: &ReaderLimits,
    reporter: &mut R,
) -> Result<ScanSummary>
where
    P: AsRef<Path>,
    R: Reporter + ?Sized,
{
    let path = path.as_ref();
    let _span = info_span!("scan_file", path = %path.display()).entered();

    config.validate()?;

    let image = MappedImage::open(path, limits)?;
    let parser = PeParser::new(image.bytes())?;

    debug!(
        machine = %parser.machine(),
        is_64bit = parser.is_64bit(),
        header_image_base = format_args!("0x{:x}", parser.image_base()),
        sections = parser.sections().len(),
        "Parsed PE headers"
    );

    reporter.info(&format!("Looking for code caves in {}", path.display()))?;
    reporter.info(&format!("Image Base: 0x{:08x}", config.image_base))?;
    reporter.info(&format!(
        "Looking for code caves of minimum {} bytes",
        config.min_cave_length
    ))?;

    let mut summary = ScanSummary {
        aslr_enabled: parser.has_aslr(),
        ..ScanSummary::default()
    };
    if summary.aslr_enabled {
        reporter.warning(ASLR_WARNING)?;
    }

    let outcomes = if config.parallel {
        scan_image_parallel(&parser, config)
    } else {
        scan_image(&parser, config)
    };

    for outcome in &outcomes {
        match outcome {
            SectionOutcome::Scanned(scan) => {
                reporter.section(scan)?;
                for record in &scan.caves {
                    reporter.cave(record)?;
                }
                if let Some(empty) = &scan.empty {
                    reporter.empty_section(empty)?;
                }
            }
            SectionOutcome::Unreadable { name, error } => {
                reporter.skipped_section(name, error)?;
            }
        }
        summary.record(outcome);
    }

    reporter.summary(&summary)?;
    Ok(summary)
}
