//! DOS, COFF and optional header parsing.

use crate::formats::pe::types::*;
use crate::formats::pe::utils::{check_bounds, u16_at, u32_at, u64_at};

/// Validate the DOS stub and return `e_lfanew`, the offset of the PE signature.
pub fn parse_dos_header(data: &[u8]) -> Result<usize> {
    check_bounds(0, DOS_HEADER_SIZE, data.len())?;

    if u16_at(data, 0)? != DOS_SIGNATURE {
        return Err(PeError::InvalidDosSignature);
    }
    Ok(u32_at(data, DOS_LFANEW_OFFSET)? as usize)
}

pub fn parse_coff_header(data: &[u8], offset: usize) -> Result<CoffHeader> {
    check_bounds(offset, COFF_HEADER_SIZE, data.len())?;

    Ok(CoffHeader {
        machine: Machine::from(u16_at(data, offset)?),
        number_of_sections: u16_at(data, offset + 2)?,
        size_of_optional_header: u16_at(data, offset + 16)?,
    })
}

/// Parse the optional header at `offset`, `size` bytes long per the COFF header.
///
/// PE32 stores a 32-bit image base at +28, PE32+ a 64-bit one at +24. The
/// declared size must cover DllCharacteristics at +70 in both layouts.
pub fn parse_optional_header(data: &[u8], offset: usize, size: u16) -> Result<OptionalHeader> {
    check_bounds(offset, size.max(2) as usize, data.len())?;

    let magic = u16_at(data, offset)?;
    let (min_size, image_base) = match magic {
        PE32_MAGIC => (96u16, u32_at(data, offset + 28)? as u64),
        PE32PLUS_MAGIC => (112u16, u64_at(data, offset + 24)?),
        _ => return Err(PeError::InvalidMagic(magic)),
    };

    if size < min_size {
        return Err(PeError::TruncatedHeader {
            expected: offset + min_size as usize,
            actual: offset + size as usize,
        });
    }

    Ok(OptionalHeader {
        magic,
        image_base,
        dll_characteristics: u16_at(data, offset + 70)?,
    })
}

/// Parse the PE signature, COFF header and optional header at `offset`.
pub fn parse_nt_headers(data: &[u8], offset: usize) -> Result<NtHeaders> {
    check_bounds(offset, PE_SIGNATURE.len(), data.len())?;
    if data[offset..offset + PE_SIGNATURE.len()] != PE_SIGNATURE {
        return Err(PeError::InvalidPeSignature);
    }

    let coff_offset = offset + PE_SIGNATURE.len();
    let file_header = parse_coff_header(data, coff_offset)?;
    let optional_header = parse_optional_header(
        data,
        coff_offset + COFF_HEADER_SIZE,
        file_header.size_of_optional_header,
    )?;

    Ok(NtHeaders {
        offset,
        file_header,
        optional_header,
    })
}
