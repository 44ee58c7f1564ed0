//! Byte patterns a cave can be made of.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The single byte value a cave consists of.
///
/// `Null` and `Nop` are the two patterns scanned for by default. `Byte` covers
/// any other filler, such as `0xCC` int3 padding between functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CavePattern {
    /// Zero bytes (`0x00`)
    Null,
    /// x86 single-byte no-op (`0x90`)
    Nop,
    /// Any other repeated byte
    Byte(u8),
}

impl CavePattern {
    pub const NULL_BYTE: u8 = 0x00;
    pub const NOP_BYTE: u8 = 0x90;

    /// Canonical pattern for a byte value.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            Self::NULL_BYTE => Self::Null,
            Self::NOP_BYTE => Self::Nop,
            other => Self::Byte(other),
        }
    }

    /// The byte value watched for.
    pub fn target_byte(&self) -> u8 {
        match self {
            Self::Null => Self::NULL_BYTE,
            Self::Nop => Self::NOP_BYTE,
            Self::Byte(b) => *b,
        }
    }

    /// Short label used in reports.
    pub fn label(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Nop => "NOP".to_string(),
            Self::Byte(b) => format!("0x{:02X}", b),
        }
    }
}

impl fmt::Display for CavePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for CavePattern {
    type Err = String;

    /// Accepts `null`, `nop` (any case) or a byte literal such as `0xcc` or `204`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "null" | "zero" => Ok(Self::Null),
            "nop" => Ok(Self::Nop),
            _ => {
                let value = parse_auto_radix(trimmed)
                    .map_err(|_| format!("invalid cave pattern '{}': expected null, nop or a byte value", s))?;
                u8::try_from(value)
                    .map(Self::from_byte)
                    .map_err(|_| format!("invalid cave pattern '{}': {} does not fit in a byte", s, value))
            }
        }
    }
}

impl From<CavePattern> for String {
    fn from(pattern: CavePattern) -> Self {
        pattern.label()
    }
}

impl TryFrom<String> for CavePattern {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parse an unsigned integer given in decimal or with a `0x` prefix.
pub fn parse_auto_radix(s: &str) -> Result<u64, std::num::ParseIntError> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    }
}
