//! Program header table parsing
//!
//! Only the LOAD view matters here: the sum of PT_LOAD file sizes is the
//! portion of the file the dynamic loader actually maps, reported alongside
//! the section-level totals.

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_addr, EndianRead};

/// Program header table
pub struct SegmentTable {
    headers: Vec<ProgramHeader>,
}

impl SegmentTable {
    /// Parse program headers located by the file header.
    pub fn parse(data: &[u8], header: &ElfHeader) -> Result<Self> {
        let ph_offset = header.e_phoff as usize;
        let ph_entsize = header.e_phentsize as usize;
        let ph_num = header.e_phnum as usize;

        if ph_num == 0 || ph_offset == 0 {
            return Ok(Self {
                headers: Vec::new(),
            });
        }

        let total_size = ph_num * ph_entsize;
        if ph_offset.checked_add(total_size).is_none() || ph_offset + total_size > data.len() {
            return Err(ElfError::Truncated {
                offset: ph_offset,
                needed: total_size,
            });
        }

        let mut headers = Vec::with_capacity(ph_num);
        for i in 0..ph_num {
            let offset = ph_offset + i * ph_entsize;
            headers.push(parse_program_header(
                data,
                offset,
                header.ident.class,
                header.ident.data,
            )?);
        }

        Ok(Self { headers })
    }

    pub fn count(&self) -> usize {
        self.headers.len()
    }

    /// LOAD segments in file order.
    pub fn load_segments(&self) -> impl Iterator<Item = &ProgramHeader> {
        self.headers.iter().filter(|p| p.p_type == PT_LOAD)
    }

    /// Total file bytes mapped by the loader.
    pub fn mapped_file_size(&self) -> u64 {
        self.load_segments().map(|p| p.p_filesz).sum()
    }
}

fn parse_program_header(
    data: &[u8],
    offset: usize,
    class: ElfClass,
    endian: ElfData,
) -> Result<ProgramHeader> {
    match class {
        ElfClass::Elf32 => Ok(ProgramHeader {
            p_type: data.read_u32(offset, endian)?,
            p_offset: data.read_u32(offset + 4, endian)? as u64,
            p_vaddr: data.read_u32(offset + 8, endian)? as u64,
            p_filesz: data.read_u32(offset + 16, endian)? as u64,
            p_memsz: data.read_u32(offset + 20, endian)? as u64,
            p_flags: data.read_u32(offset + 24, endian)?,
        }),
        ElfClass::Elf64 => Ok(ProgramHeader {
            p_type: data.read_u32(offset, endian)?,
            p_flags: data.read_u32(offset + 4, endian)?,
            p_offset: read_addr(data, offset + 8, class, endian)?,
            p_vaddr: read_addr(data, offset + 16, class, endian)?,
            p_filesz: read_addr(data, offset + 32, class, endian)?,
            p_memsz: read_addr(data, offset + 40, class, endian)?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::elf::headers::parse_header;

    fn elf_with_load_segments() -> Vec<u8> {
        let mut data = vec![0u8; 512];

        data[0..4].copy_from_slice(b"\x7fELF");
        data[4] = 2;
        data[5] = 1;
        data[6] = 1;
        data[16] = 3; // ET_DYN
        data[18] = 62;

        // e_phoff = 0x40, two entries
        data[32] = 0x40;
        data[52] = 64; // e_ehsize
        data[54] = 56; // e_phentsize
        data[56] = 2; // e_phnum
        data[58] = 64; // e_shentsize

        // Segment 0: PT_LOAD, filesz = 0x100
        let p0 = 0x40;
        data[p0] = 1; // PT_LOAD
        data[p0 + 33] = 0x01; // p_filesz = 0x100

        // Segment 1: PT_DYNAMIC (type 2), ignored by totals
        let p1 = 0x40 + 56;
        data[p1] = 2;
        data[p1 + 32] = 0x80; // p_filesz = 0x80

        data
    }

    #[test]
    fn mapped_size_sums_load_segments_only() {
        let data = elf_with_load_segments();
        let header = parse_header(&data).unwrap();
        let segments = SegmentTable::parse(&data, &header).unwrap();

        assert_eq!(segments.count(), 2);
        assert_eq!(segments.load_segments().count(), 1);
        assert_eq!(segments.mapped_file_size(), 0x100);
    }

    #[test]
    fn program_table_past_eof_is_fatal() {
        let mut data = elf_with_load_segments();
        data[56] = 0xff; // e_phnum
        let header = parse_header(&data).unwrap();
        assert!(matches!(
            SegmentTable::parse(&data, &header),
            Err(ElfError::Truncated { .. })
        ));
    }
}
