//! Values produced by a scan.

use crate::caves::address;
use crate::caves::pattern::CavePattern;
use crate::formats::pe::{PeError, SectionPerms};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The section a detector is scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContext {
    pub name: String,
    pub virtual_address: u32,
    #[serde(default)]
    pub perms: SectionPerms,
}

impl SectionContext {
    pub fn new(name: impl Into<String>, virtual_address: u32) -> Self {
        Self {
            name: name.into(),
            virtual_address,
            perms: SectionPerms::default(),
        }
    }

    pub fn with_perms(mut self, perms: SectionPerms) -> Self {
        self.perms = perms;
        self
    }
}

/// A run of identical bytes long enough to count as a cave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaveRecord {
    pub section: String,
    pub pattern: CavePattern,
    /// Run length in bytes
    pub length: usize,
    /// Start of the run, relative to the section's first byte
    pub offset: usize,
    pub file_address: u64,
    pub virtual_address: u64,
}

impl CaveRecord {
    pub fn new(
        section: &SectionContext,
        image_base: u32,
        pattern: CavePattern,
        offset: usize,
        length: usize,
    ) -> Self {
        Self {
            section: section.name.clone(),
            pattern,
            length,
            offset,
            file_address: address::file_address(image_base, section.virtual_address, offset),
            virtual_address: address::virtual_address(
                image_base,
                section.virtual_address,
                offset,
            ),
        }
    }

    /// One past the last byte of the run.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

impl fmt::Display for CaveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cave of {} bytes found in {} at (Raw Address: 0x{:08x}, Virtual Address: 0x{:08x})",
            self.length, self.section, self.file_address, self.virtual_address
        )
    }
}

/// Result of scanning one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionScan {
    pub section: SectionContext,
    /// Number of raw bytes scanned
    pub size: usize,
    /// Qualifying runs, ordered by offset
    pub caves: Vec<CaveRecord>,
    /// Present when every byte of the section is zero
    pub empty: Option<CaveRecord>,
}

impl SectionScan {
    pub fn name(&self) -> &str {
        &self.section.name
    }

    pub fn appears_empty(&self) -> bool {
        self.empty.is_some()
    }
}

/// What happened to one section of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    Scanned(SectionScan),
    /// Raw bytes could not be read; no detector state is reported for it
    Unreadable { name: String, error: PeError },
}

/// Totals for a whole image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub sections_scanned: usize,
    pub sections_skipped: usize,
    pub empty_sections: usize,
    pub caves: usize,
    pub cave_bytes: u64,
    pub aslr_enabled: bool,
}

impl ScanSummary {
    pub fn record(&mut self, outcome: &SectionOutcome) {
        match outcome {
            SectionOutcome::Scanned(scan) => {
                self.sections_scanned += 1;
                if scan.appears_empty() {
                    self.empty_sections += 1;
                }
                self.caves += scan.caves.len();
                self.cave_bytes += scan.caves.iter().map(|c| c.length as u64).sum::<u64>();
            }
            SectionOutcome::Unreadable { .. } => self.sections_skipped += 1,
        }
    }
}
