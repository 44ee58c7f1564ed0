//! Minimal, bounds-checked PE reader.
//!
//! Reads the DOS stub, NT headers and section table of PE32 and PE32+ images
//! and hands out section bytes as slices of the input buffer. Every read
//! is checked; malformed input yields a [`PeError`] and never panics.

pub mod headers;
pub mod sections;
pub mod types;
pub mod utils;

use headers::{parse_dos_header, parse_nt_headers};
use sections::parse_section_table;
pub use types::*;

/// A parsed PE image borrowing its bytes.
pub struct PeParser<'data> {
    data: &'data [u8],
    nt_headers: NtHeaders,
    sections: Vec<Section>,
}

impl<'data> PeParser<'data> {
    /// Parse the headers and section table of `data`.
    ///
    /// Section raw ranges are not checked here; see [`section_data`](Self::section_data).
    pub fn new(data: &'data [u8]) -> Result<Self> {
        let pe_offset = parse_dos_header(data)?;
        let nt_headers = parse_nt_headers(data, pe_offset)?;
        let sections = parse_section_table(
            data,
            nt_headers.section_table_offset(),
            nt_headers.file_header.number_of_sections,
        )?;

        Ok(Self {
            data,
            nt_headers,
            sections,
        })
    }

    pub fn machine(&self) -> Machine {
        self.nt_headers.file_header.machine
    }

    pub fn is_64bit(&self) -> bool {
        self.nt_headers.optional_header.is_64bit()
    }

    /// Preferred image base recorded in the optional header.
    pub fn image_base(&self) -> u64 {
        self.nt_headers.optional_header.image_base
    }

    /// True when DllCharacteristics has DYNAMIC_BASE set, i.e. the loader may
    /// relocate the image.
    pub fn has_aslr(&self) -> bool {
        self.nt_headers.optional_header.dynamic_base()
    }

    /// Sections in section table order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.header.name() == name)
    }

    /// Raw bytes of a section, borrowed from the parsed image.
    pub fn section_data(&self, section: &Section) -> Result<&'data [u8]> {
        section.data(self.data)
    }
}
