//! Section table parsing and raw data lookup.

use crate::formats::pe::types::*;
use crate::formats::pe::utils::{check_bounds, u32_at};

/// Read `count` section headers starting at `offset`, in table order.
pub fn parse_section_table(data: &[u8], offset: usize, count: u16) -> Result<Vec<Section>> {
    if count > MAX_SECTIONS {
        return Err(PeError::TooManySections {
            count,
            limit: MAX_SECTIONS,
        });
    }

    (0..count as usize)
        .map(|i| {
            let entry = offset + i * SECTION_HEADER_SIZE;
            check_bounds(entry, SECTION_HEADER_SIZE, data.len())?;

            let mut name = [0u8; 8];
            name.copy_from_slice(&data[entry..entry + 8]);
            let header = SectionHeader {
                name,
                virtual_size: u32_at(data, entry + 8)?,
                virtual_address: u32_at(data, entry + 12)?,
                size_of_raw_data: u32_at(data, entry + 16)?,
                pointer_to_raw_data: u32_at(data, entry + 20)?,
                characteristics: u32_at(data, entry + 36)?,
            };
            Ok(Section {
                raw: header.raw_range(),
                header,
            })
        })
        .collect()
}

impl Section {
    /// Raw bytes of this section as stored in the file.
    ///
    /// Sections without raw data (`.bss` and friends) yield an empty slice
    /// whatever their pointer says. A raw range that runs past the end of
    /// the file is an error.
    pub fn data<'a>(&self, file_data: &'a [u8]) -> Result<&'a [u8]> {
        if self.raw.is_empty() {
            return Ok(&file_data[..0]);
        }
        file_data
            .get(self.raw.clone())
            .ok_or_else(|| PeError::SectionOutOfBounds {
                name: self.header.name(),
                start: self.raw.start,
                end: self.raw.end,
                file_len: file_data.len(),
            })
    }
}
