//! Shared helpers for the integration tests.
//!
//! Real PE samples are not shipped with the crate, so images are synthesized
//! with [`PeBuilder`]: a PE32 header, a section table and file-aligned raw
//! data, nothing else.

#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

pub const IMAGE_SCN_CNT_CODE: u32 = 0x0000_0020;
pub const IMAGE_SCN_CNT_INITIALIZED_DATA: u32 = 0x0000_0040;
pub const IMAGE_SCN_MEM_EXECUTE: u32 = 0x2000_0000;
pub const IMAGE_SCN_MEM_READ: u32 = 0x4000_0000;
pub const IMAGE_SCN_MEM_WRITE: u32 = 0x8000_0000;

pub const TEXT: u32 = IMAGE_SCN_CNT_CODE | IMAGE_SCN_MEM_EXECUTE | IMAGE_SCN_MEM_READ;
pub const DATA: u32 = IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ | IMAGE_SCN_MEM_WRITE;

const E_LFANEW: usize = 0x80;
const OPTIONAL_HEADER_SIZE: usize = 0xE0;
const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: u32 = 0x1000;

struct PlannedSection {
    name: String,
    virtual_address: u32,
    data: Vec<u8>,
    characteristics: u32,
    // Overrides PointerToRawData, for sections pointing past the file
    raw_pointer: Option<u32>,
}

/// Minimal PE32 image writer.
///
/// `SizeOfRawData` is the exact length of each section's bytes, so the
/// scanner sees precisely what the test put there. Sections still start on
/// file-aligned offsets.
#[derive(Default)]
pub struct PeBuilder {
    sections: Vec<PlannedSection>,
    aslr: bool,
}

impl PeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section; virtual addresses are assigned 0x1000, 0x2000, ...
    pub fn section(mut self, name: &str, data: Vec<u8>, characteristics: u32) -> Self {
        let virtual_address = self.next_virtual_address();
        self.sections.push(PlannedSection {
            name: name.to_string(),
            virtual_address,
            data,
            characteristics,
            raw_pointer: None,
        });
        self
    }

    /// Add a section whose raw data lies beyond the end of the file.
    pub fn truncated_section(mut self, name: &str, size: usize) -> Self {
        let virtual_address = self.next_virtual_address();
        self.sections.push(PlannedSection {
            name: name.to_string(),
            virtual_address,
            data: vec![0u8; size],
            characteristics: DATA,
            raw_pointer: Some(0x00F0_0000),
        });
        self
    }

    pub fn aslr(mut self, enabled: bool) -> Self {
        self.aslr = enabled;
        self
    }

    fn next_virtual_address(&self) -> u32 {
        SECTION_ALIGNMENT * (self.sections.len() as u32 + 1)
    }

    pub fn build(&self) -> Vec<u8> {
        let section_table = E_LFANEW + 4 + 20 + OPTIONAL_HEADER_SIZE;
        let headers_end = section_table + self.sections.len() * 40;
        let size_of_headers = align(headers_end, FILE_ALIGNMENT);

        let mut out = vec![0u8; size_of_headers];

        // DOS header
        out[0..2].copy_from_slice(b"MZ");
        put_u32(&mut out, 0x3C, E_LFANEW as u32);

        // NT headers
        out[E_LFANEW..E_LFANEW + 4].copy_from_slice(b"PE\0\0");
        let coff = E_LFANEW + 4;
        put_u16(&mut out, coff, 0x014C);
        put_u16(&mut out, coff + 2, self.sections.len() as u16);
        put_u16(&mut out, coff + 16, OPTIONAL_HEADER_SIZE as u16);
        put_u16(&mut out, coff + 18, 0x0102);

        let opt = coff + 20;
        put_u16(&mut out, opt, 0x010B);
        put_u32(&mut out, opt + 16, 0x1000);
        put_u32(&mut out, opt + 28, 0x0040_0000);
        put_u32(&mut out, opt + 32, SECTION_ALIGNMENT);
        put_u32(&mut out, opt + 36, FILE_ALIGNMENT as u32);
        put_u32(&mut out, opt + 56, self.next_virtual_address());
        put_u32(&mut out, opt + 60, size_of_headers as u32);
        // NX_COMPAT, plus DYNAMIC_BASE when asked for
        let dll_characteristics: u16 = if self.aslr { 0x0140 } else { 0x0100 };
        put_u16(&mut out, opt + 70, dll_characteristics);

        let mut raw_offset = size_of_headers;
        let mut raw_data = Vec::new();
        for (i, section) in self.sections.iter().enumerate() {
            let header = section_table + i * 40;
            let name = section.name.as_bytes();
            let len = name.len().min(8);
            out[header..header + len].copy_from_slice(&name[..len]);

            put_u32(&mut out, header + 8, section.data.len() as u32);
            put_u32(&mut out, header + 12, section.virtual_address);
            put_u32(&mut out, header + 16, section.data.len() as u32);
            put_u32(&mut out, header + 36, section.characteristics);

            match section.raw_pointer {
                Some(pointer) => put_u32(&mut out, header + 20, pointer),
                None if section.data.is_empty() => {}
                None => {
                    put_u32(&mut out, header + 20, raw_offset as u32);
                    let mut padded = section.data.clone();
                    padded.resize(align(section.data.len(), FILE_ALIGNMENT), 0);
                    raw_offset += padded.len();
                    raw_data.extend(padded);
                }
            }
        }

        out.extend(raw_data);
        out
    }

    /// Write the image to a temp file that lives as long as the handle.
    pub fn write(&self) -> NamedTempFile {
        temp_file_with(&self.build())
    }
}

fn align(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// `prologue`, then `len` copies of `filler`, then a `ret`.
pub fn code_with_cave(prologue: &[u8], filler: u8, len: usize) -> Vec<u8> {
    let mut bytes = prologue.to_vec();
    bytes.extend(std::iter::repeat(filler).take(len));
    bytes.push(0xC3);
    bytes
}

/// Write arbitrary bytes to a temp file.
pub fn temp_file_with(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write bytes");
    file.flush().expect("flush bytes");
    file
}
