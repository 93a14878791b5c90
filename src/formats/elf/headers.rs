//! ELF header parsing

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_addr, EndianRead};

/// Parse ELF identification bytes
pub fn parse_ident(data: &[u8]) -> Result<ElfIdent> {
    if data.len() < 16 {
        return Err(ElfError::Truncated {
            offset: 0,
            needed: 16,
        });
    }

    if &data[0..4] != ELF_MAGIC {
        return Err(ElfError::InvalidMagic);
    }

    Ok(ElfIdent {
        class: ElfClass::from_u8(data[4])?,
        data: ElfData::from_u8(data[5])?,
        version: data[6],
        osabi: data[7],
    })
}

/// Parse the ELF file header, validating field sizes against the class.
pub fn parse_header(data: &[u8]) -> Result<ElfHeader> {
    let ident = parse_ident(data)?;
    let class = ident.class;
    let endian = ident.data;

    let header_size = match class {
        ElfClass::Elf32 => 52,
        ElfClass::Elf64 => 64,
    };
    if data.len() < header_size {
        return Err(ElfError::Truncated {
            offset: 0,
            needed: header_size,
        });
    }

    let e_type = data.read_u16(16, endian)?;
    let e_machine = data.read_u16(18, endian)?;

    // Offsets of the trailing fixed-width fields differ by class.
    let (entry_off, tail_off) = match class {
        ElfClass::Elf32 => (24usize, 40usize),
        ElfClass::Elf64 => (24usize, 52usize),
    };

    let e_entry = read_addr(data, entry_off, class, endian)?;
    let word = match class {
        ElfClass::Elf32 => 4,
        ElfClass::Elf64 => 8,
    };
    let e_phoff = read_addr(data, entry_off + word, class, endian)?;
    let e_shoff = read_addr(data, entry_off + 2 * word, class, endian)?;

    let e_ehsize = data.read_u16(tail_off, endian)?;
    let e_phentsize = data.read_u16(tail_off + 2, endian)?;
    let e_phnum = data.read_u16(tail_off + 4, endian)?;
    let e_shentsize = data.read_u16(tail_off + 6, endian)?;
    let e_shnum = data.read_u16(tail_off + 8, endian)?;
    let e_shstrndx = data.read_u16(tail_off + 10, endian)?;

    if e_ehsize as usize != header_size {
        return Err(ElfError::MalformedHeader(format!(
            "Invalid e_ehsize: expected {}, got {}",
            header_size, e_ehsize
        )));
    }

    let expected_phentsize = match class {
        ElfClass::Elf32 => 32,
        ElfClass::Elf64 => 56,
    };
    if e_phnum > 0 && e_phentsize as usize != expected_phentsize {
        return Err(ElfError::MalformedHeader(format!(
            "Invalid e_phentsize: expected {}, got {}",
            expected_phentsize, e_phentsize
        )));
    }

    let expected_shentsize = match class {
        ElfClass::Elf32 => 40,
        ElfClass::Elf64 => 64,
    };
    if e_shnum > 0 && e_shentsize as usize != expected_shentsize {
        return Err(ElfError::MalformedHeader(format!(
            "Invalid e_shentsize: expected {}, got {}",
            expected_shentsize, e_shentsize
        )));
    }

    Ok(ElfHeader {
        ident,
        e_type,
        e_machine,
        e_entry,
        e_phoff,
        e_shoff,
        e_ehsize,
        e_phentsize,
        e_phnum,
        e_shentsize,
        e_shnum,
        e_shstrndx,
    })
}
