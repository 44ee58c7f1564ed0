//! Configuration for a cave scan.

use crate::caves::pattern::CavePattern;
use crate::error::{CaveError, Result};
use serde::{Deserialize, Serialize};

/// Default minimum cave length in bytes.
pub const DEFAULT_MIN_CAVE_LENGTH: usize = 300;
/// Default image base, the classic preferred base of 32-bit executables.
pub const DEFAULT_IMAGE_BASE: u32 = 0x0040_0000;

/// Everything a scan needs besides the bytes themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// A run must be strictly longer than this to be reported.
    pub min_cave_length: usize,
    /// Base added to every reported address.
    pub image_base: u32,
    /// Byte patterns to look for, one detector each.
    pub patterns: Vec<CavePattern>,
    /// Scan sections on the rayon thread pool.
    pub parallel: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_cave_length: DEFAULT_MIN_CAVE_LENGTH,
            image_base: DEFAULT_IMAGE_BASE,
            patterns: vec![CavePattern::Null, CavePattern::Nop],
            parallel: false,
        }
    }
}

impl ScanConfig {
    pub fn with_min_cave_length(mut self, min_cave_length: usize) -> Self {
        self.min_cave_length = min_cave_length;
        self
    }

    pub fn with_image_base(mut self, image_base: u32) -> Self {
        self.image_base = image_base;
        self
    }

    /// Set the patterns, spelling each in its canonical form so `Byte(0x90)`
    /// becomes `Nop`.
    pub fn with_patterns(mut self, patterns: Vec<CavePattern>) -> Self {
        self.patterns = patterns
            .into_iter()
            .map(|p| CavePattern::from_byte(p.target_byte()))
            .collect();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reject configurations that would make the report ambiguous.
    ///
    /// Two patterns watching the same byte count as duplicates however they
    /// are spelled.
    pub fn validate(&self) -> Result<()> {
        if self.patterns.is_empty() {
            return Err(CaveError::InvalidConfig(
                "at least one cave pattern is required".to_string(),
            ));
        }
        for (i, pattern) in self.patterns.iter().enumerate() {
            let target = pattern.target_byte();
            if self.patterns[..i].iter().any(|p| p.target_byte() == target) {
                return Err(CaveError::InvalidConfig(format!(
                    "pattern {} given more than once",
                    pattern
                )));
            }
        }
        Ok(())
    }
}
