//! Section scanner: drives one detector per pattern over each section.

use crate::caves::config::ScanConfig;
use crate::caves::detector::RunDetector;
use crate::caves::pattern::CavePattern;
use crate::caves::record::{CaveRecord, SectionContext, SectionOutcome, SectionScan};
use crate::formats::pe::{PeParser, Section};
use rayon::prelude::*;
use tracing::{debug, trace};

/// Scan the raw bytes of one section.
///
/// Every configured pattern gets its own detector; all detectors see each byte
/// in the same iteration and never share state. Records are returned ordered
/// by offset. If a detector for `0x00` is configured, whether spelled `Null`
/// or `Byte(0x00)`, and the section holds nothing but zeros, `empty` is set
/// as well; it does not replace the regular record for the same run.
pub fn scan_section(section: SectionContext, bytes: &[u8], config: &ScanConfig) -> SectionScan {
    let (mut caves, empty) = {
        let mut detectors: Vec<RunDetector<'_>> = config
            .patterns
            .iter()
            .map(|&pattern| {
                RunDetector::new(&section, config.image_base, pattern, config.min_cave_length)
            })
            .collect();

        let mut caves = Vec::new();
        for &byte in bytes {
            for detector in detectors.iter_mut() {
                if let Some(record) = detector.observe(byte) {
                    caves.push(record);
                }
            }
        }
        for detector in detectors.iter_mut() {
            caves.extend(detector.flush());
        }

        let empty = detectors
            .iter()
            .find(|d| d.pattern().target_byte() == CavePattern::NULL_BYTE)
            .filter(|d| d.is_whole_section_match())
            .map(RunDetector::whole_section_record);

        (caves, empty)
    };

    // Stable, so runs closed by the same byte keep pattern order
    caves.sort_by_key(|c| c.offset);

    trace!(
        section = %section.name,
        size = bytes.len(),
        caves = caves.len(),
        "Scanned section"
    );

    SectionScan {
        section,
        size: bytes.len(),
        caves,
        empty,
    }
}

fn scan_pe_section(parser: &PeParser<'_>, section: &Section, config: &ScanConfig) -> SectionOutcome {
    let name = section.header.name();
    match parser.section_data(section) {
        Ok(bytes) => {
            trace!(
                section = %name,
                raw_size = bytes.len(),
                virtual_size = section.header.virtual_size,
                "Scanning section"
            );
            let context = SectionContext::new(name, section.header.virtual_address)
                .with_perms(section.header.perms());
            SectionOutcome::Scanned(scan_section(context, bytes, config))
        }
        Err(error) => {
            debug!(section = %name, %error, "Section data unavailable");
            SectionOutcome::Unreadable { name, error }
        }
    }
}

/// Scan every section of a parsed image, in section table order.
pub fn scan_image(parser: &PeParser<'_>, config: &ScanConfig) -> Vec<SectionOutcome> {
    parser
        .sections()
        .iter()
        .map(|section| scan_pe_section(parser, section, config))
        .collect()
}

/// Same as [`scan_image`], with sections spread over the rayon pool.
///
/// Output order and content are identical to the sequential scan.
pub fn scan_image_parallel(parser: &PeParser<'_>, config: &ScanConfig) -> Vec<SectionOutcome> {
    parser
        .sections()
        .par_iter()
        .map(|section| scan_pe_section(parser, section, config))
        .collect()
}

/// All records of a scan in report order, for callers that do not care about
/// section boundaries.
pub fn all_caves(outcomes: &[SectionOutcome]) -> Vec<&CaveRecord> {
    outcomes
        .iter()
        .filter_map(|o| match o {
            SectionOutcome::Scanned(scan) => Some(scan.caves.iter()),
            SectionOutcome::Unreadable { .. } => None,
        })
        .flatten()
        .collect()
}
