//! Translation of section-relative offsets into reportable addresses.
//!
//! Both the "raw" and the virtual address are computed as
//! `image_base + section_virtual_address + offset`. The raw address therefore
//! does not account for the gap between file alignment and section alignment.
//! That conflation is long-standing tool output and is kept as is.

/// Sum in 64 bits so the result never wraps for 32-bit inputs.
#[inline]
fn translate(image_base: u32, section_va: u32, offset: usize) -> u64 {
    image_base as u64 + section_va as u64 + offset as u64
}

/// Address reported as "Raw Address".
#[inline]
pub fn file_address(image_base: u32, section_va: u32, offset: usize) -> u64 {
    translate(image_base, section_va, offset)
}

/// Address reported as "Virtual Address".
#[inline]
pub fn virtual_address(image_base: u32, section_va: u32, offset: usize) -> u64 {
    translate(image_base, section_va, offset)
}
