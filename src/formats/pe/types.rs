//! PE header records and the errors raised while reading them.
//!
//! Only what is needed to walk the section table is modelled: the loader
//! fields that locate headers, the image base, the DLL characteristics and
//! the section headers themselves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

pub const DOS_SIGNATURE: u16 = 0x5A4D; // "MZ"
pub const PE_SIGNATURE: [u8; 4] = *b"PE\0\0";
pub const PE32_MAGIC: u16 = 0x10B;
pub const PE32PLUS_MAGIC: u16 = 0x20B;

/// Offset of `e_lfanew` in the DOS header.
pub const DOS_LFANEW_OFFSET: usize = 0x3C;
/// Size of the DOS header, the minimum for any PE file.
pub const DOS_HEADER_SIZE: usize = 64;
/// Size of the COFF file header that follows the PE signature.
pub const COFF_HEADER_SIZE: usize = 20;
/// Size of one entry in the section table.
pub const SECTION_HEADER_SIZE: usize = 40;
/// Hard cap on the section count; the loader refuses anything above this.
pub const MAX_SECTIONS: u16 = 96;

/// Image can be relocated at load time (ASLR).
pub const IMAGE_DLLCHARACTERISTICS_DYNAMIC_BASE: u16 = 0x0040;

pub const IMAGE_SCN_MEM_EXECUTE: u32 = 0x2000_0000;
pub const IMAGE_SCN_MEM_READ: u32 = 0x4000_0000;
pub const IMAGE_SCN_MEM_WRITE: u32 = 0x8000_0000;

/// Why an image could not be walked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeError {
    #[error("Invalid DOS signature")]
    InvalidDosSignature,

    #[error("Invalid PE signature")]
    InvalidPeSignature,

    #[error("Invalid optional header magic: 0x{0:04x}")]
    InvalidMagic(u16),

    #[error("Truncated header: expected {expected} bytes, got {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    #[error("Too many sections: {count} (limit {limit})")]
    TooManySections { count: u16, limit: u16 },

    #[error("Section {name} raw data 0x{start:x}..0x{end:x} lies outside the file ({file_len} bytes)")]
    SectionOutOfBounds {
        name: String,
        start: usize,
        end: usize,
        file_len: usize,
    },
}

pub type Result<T> = std::result::Result<T, PeError>;

/// Target architecture from the COFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    I386,
    Amd64,
    Arm64,
    Other(u16),
}

impl From<u16> for Machine {
    fn from(value: u16) -> Self {
        match value {
            0x014c => Self::I386,
            0x8664 => Self::Amd64,
            0xaa64 => Self::Arm64,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I386 => f.write_str("x86"),
            Self::Amd64 => f.write_str("x86_64"),
            Self::Arm64 => f.write_str("arm64"),
            Self::Other(m) => write!(f, "0x{:04x}", m),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CoffHeader {
    pub machine: Machine,
    pub number_of_sections: u16,
    pub size_of_optional_header: u16,
}

/// The optional header fields we read, with the image base widened to 64 bits.
#[derive(Debug, Clone, Copy)]
pub struct OptionalHeader {
    pub magic: u16,
    pub image_base: u64,
    pub dll_characteristics: u16,
}

impl OptionalHeader {
    pub fn is_64bit(&self) -> bool {
        self.magic == PE32PLUS_MAGIC
    }

    pub fn dynamic_base(&self) -> bool {
        self.dll_characteristics & IMAGE_DLLCHARACTERISTICS_DYNAMIC_BASE != 0
    }
}

/// Everything between the PE signature and the section table.
#[derive(Debug, Clone, Copy)]
pub struct NtHeaders {
    /// File offset of the PE signature
    pub offset: usize,
    pub file_header: CoffHeader,
    pub optional_header: OptionalHeader,
}

impl NtHeaders {
    /// File offset of the first section header.
    pub fn section_table_offset(&self) -> usize {
        self.offset
            + PE_SIGNATURE.len()
            + COFF_HEADER_SIZE
            + self.file_header.size_of_optional_header as usize
    }
}

/// One entry of the section table.
#[derive(Debug, Clone)]
pub struct SectionHeader {
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub characteristics: u32,
}

impl SectionHeader {
    /// Name up to the first NUL, lossily decoded.
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(8);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    pub fn perms(&self) -> SectionPerms {
        let has = |flag: u32| self.characteristics & flag != 0;
        SectionPerms {
            read: has(IMAGE_SCN_MEM_READ),
            write: has(IMAGE_SCN_MEM_WRITE),
            execute: has(IMAGE_SCN_MEM_EXECUTE),
        }
    }

    /// File range claimed by the raw data, which may lie past the end of file.
    pub fn raw_range(&self) -> Range<usize> {
        let start = self.pointer_to_raw_data as usize;
        start..start.saturating_add(self.size_of_raw_data as usize)
    }
}

/// A section header together with its raw file range.
#[derive(Debug, Clone)]
pub struct Section {
    pub header: SectionHeader,
    pub raw: Range<usize>,
}

/// Memory protection of a section once mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SectionPerms {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl fmt::Display for SectionPerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read, 'r'),
            flag(self.write, 'w'),
            flag(self.execute, 'x')
        )
    }
}
