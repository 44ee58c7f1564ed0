//! Run-length cave detector.
//!
//! A [`RunDetector`] watches a byte stream for one target value. It counts
//! the currently open run of matching bytes and, when that run is closed by a
//! different byte or by [`RunDetector::flush`] at end of stream, emits a
//! [`CaveRecord`] if the run is strictly longer than the configured minimum.
//!
//! ```
//! use cavern::caves::{CavePattern, RunDetector, SectionContext};
//!
//! let section = SectionContext::new(".text", 0x1000);
//! let mut detector = RunDetector::new(&section, 0x0040_0000, CavePattern::Null, 3);
//!
//! let mut caves: Vec<_> = [0x55, 0, 0, 0, 0, 0xC3]
//!     .iter()
//!     .filter_map(|&b| detector.observe(b))
//!     .collect();
//! caves.extend(detector.flush());
//!
//! assert_eq!(caves.len(), 1);
//! assert_eq!(caves[0].offset, 1);
//! assert_eq!(caves[0].length, 4);
//! ```

use crate::caves::pattern::CavePattern;
use crate::caves::record::{CaveRecord, SectionContext};

/// Scanning state for one target byte over one section.
///
/// Detectors are section-relative and are discarded after [`flush`](Self::flush);
/// never reuse one across sections.
#[derive(Debug, Clone)]
pub struct RunDetector<'a> {
    section: &'a SectionContext,
    image_base: u32,
    pattern: CavePattern,
    target: u8,
    min_cave_length: usize,
    // Invariant: run_length <= position
    run_length: usize,
    position: usize,
    flushed: bool,
}

impl<'a> RunDetector<'a> {
    pub fn new(
        section: &'a SectionContext,
        image_base: u32,
        pattern: CavePattern,
        min_cave_length: usize,
    ) -> Self {
        Self {
            section,
            image_base,
            pattern,
            target: pattern.target_byte(),
            min_cave_length,
            run_length: 0,
            position: 0,
            flushed: false,
        }
    }

    /// Consume one byte.
    ///
    /// Returns the cave closed by this byte, if any. A matching byte never
    /// closes a run.
    #[inline]
    pub fn observe(&mut self, byte: u8) -> Option<CaveRecord> {
        debug_assert!(!self.flushed, "observe() after flush()");

        let closed = if byte == self.target {
            self.run_length += 1;
            None
        } else {
            let closed = self.close_run();
            self.run_length = 0;
            closed
        };
        self.position += 1;
        closed
    }

    /// Report a run still open at end of stream.
    ///
    /// Call once after the last byte. `run_length` and `position` are left
    /// untouched so [`is_whole_section_match`](Self::is_whole_section_match)
    /// stays meaningful; repeated calls return `None`.
    pub fn flush(&mut self) -> Option<CaveRecord> {
        if self.flushed {
            return None;
        }
        self.flushed = true;
        self.close_run()
    }

    /// True when every byte observed so far equals the target byte.
    ///
    /// Vacuously true before any byte has been observed.
    pub fn is_whole_section_match(&self) -> bool {
        self.run_length == self.position
    }

    /// Record spanning everything observed, used for "section appears empty".
    pub fn whole_section_record(&self) -> CaveRecord {
        CaveRecord::new(self.section, self.image_base, self.pattern, 0, self.position)
    }

    pub fn pattern(&self) -> CavePattern {
        self.pattern
    }

    pub fn run_length(&self) -> usize {
        self.run_length
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// The open run [position - run_length, position) if it qualifies.
    #[inline]
    fn close_run(&self) -> Option<CaveRecord> {
        if self.run_length > self.min_cave_length {
            Some(CaveRecord::new(
                self.section,
                self.image_base,
                self.pattern,
                self.position - self.run_length,
                self.run_length,
            ))
        } else {
            None
        }
    }
}
