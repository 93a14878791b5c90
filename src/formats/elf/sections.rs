//! Section table management
//!
//! Sections are kept in file order. Zero-size sections are retained because
//! their addresses still bound neighbouring address ranges; they are simply
//! never counted toward any size total.

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_cstring, EndianRead};
use std::collections::{BTreeMap, HashMap};

/// Section table with name and virtual-address lookup indexes.
pub struct SectionTable<'a> {
    headers: Vec<SectionHeader>,
    kinds: Vec<SectionKind>,
    strings: &'a [u8],
    data: &'a [u8],
    by_name: HashMap<String, usize>,
    // sh_addr -> section index, allocatable nonzero-size sections only
    by_addr: BTreeMap<u64, usize>,
}

impl<'a> SectionTable<'a> {
    /// Parse the section header table located by the file header.
    ///
    /// Fails if the table itself or any section's file extent (NOBITS
    /// excepted) lies past end-of-file.
    pub fn parse(data: &'a [u8], header: &ElfHeader) -> Result<Self> {
        let sh_offset = header.e_shoff as usize;
        let sh_entsize = header.e_shentsize as usize;
        let sh_num = header.e_shnum as usize;

        if sh_num == 0 || sh_offset == 0 {
            return Ok(Self {
                headers: Vec::new(),
                kinds: Vec::new(),
                strings: &[],
                data,
                by_name: HashMap::new(),
                by_addr: BTreeMap::new(),
            });
        }

        let total_size = sh_num * sh_entsize;
        if sh_offset.checked_add(total_size).is_none() || sh_offset + total_size > data.len() {
            return Err(ElfError::Truncated {
                offset: sh_offset,
                needed: total_size,
            });
        }

        let mut headers = Vec::with_capacity(sh_num);
        for i in 0..sh_num {
            let offset = sh_offset + i * sh_entsize;
            headers.push(parse_section_header(
                data,
                offset,
                header.ident.class,
                header.ident.data,
            )?);
        }

        // String table for section names
        let shstrndx = header.e_shstrndx as usize;
        let strings = match headers.get(shstrndx) {
            Some(sh) => {
                let offset = sh.sh_offset as usize;
                let size = sh.sh_size as usize;
                if offset + size <= data.len() {
                    &data[offset..offset + size]
                } else {
                    &[]
                }
            }
            None => &[],
        };

        let mut kinds = Vec::with_capacity(sh_num);
        let mut by_name = HashMap::new();
        let mut by_addr = BTreeMap::new();
        for (i, sh) in headers.iter().enumerate() {
            let name = read_cstring(strings, sh.sh_name as usize).unwrap_or("");

            if sh.sh_type != SHT_NULL && sh.sh_type != SHT_NOBITS && sh.sh_size > 0 {
                let end = sh.sh_offset.checked_add(sh.sh_size);
                if end.is_none() || end.unwrap() > data.len() as u64 {
                    return Err(ElfError::SectionOutOfBounds {
                        name: name.to_string(),
                        offset: sh.sh_offset,
                        size: sh.sh_size,
                    });
                }
            }

            kinds.push(classify_section(sh, name));
            if !name.is_empty() {
                by_name.entry(name.to_string()).or_insert(i);
            }
            if sh.sh_flags & SHF_ALLOC != 0 && sh.sh_size > 0 {
                by_addr.insert(sh.sh_addr, i);
            }
        }

        Ok(Self {
            headers,
            kinds,
            strings,
            data,
            by_name,
            by_addr,
        })
    }

    /// Get section by index
    pub fn by_index(&self, index: usize) -> Option<ElfSection<'a>> {
        self.headers.get(index).map(|header| {
            let name = read_cstring(self.strings, header.sh_name as usize).unwrap_or("");
            let data = if header.sh_type == SHT_NOBITS {
                &[]
            } else {
                let offset = header.sh_offset as usize;
                let size = header.sh_size as usize;
                // Verified at parse time for everything that matters; NULL
                // sections may carry garbage offsets and degrade to empty.
                offset
                    .checked_add(size)
                    .and_then(|end| self.data.get(offset..end))
                    .unwrap_or(&[])
            };
            ElfSection {
                index,
                header: *header,
                kind: self.kinds[index],
                name,
                data,
            }
        })
    }

    /// Get section by name
    pub fn by_name(&self, name: &str) -> Option<ElfSection<'a>> {
        self.by_name.get(name).and_then(|&idx| self.by_index(idx))
    }

    /// Find the allocatable section containing a virtual address.
    pub fn by_addr(&self, addr: u64) -> Option<ElfSection<'a>> {
        let (&start, &idx) = self.by_addr.range(..=addr).next_back()?;
        let header = &self.headers[idx];
        if addr < start + header.sh_size {
            self.by_index(idx)
        } else {
            None
        }
    }

    /// Raw data of a named section, or an empty slice when absent.
    pub fn data_by_name(&self, name: &str) -> &'a [u8] {
        self.by_name(name).map(|s| s.data).unwrap_or(&[])
    }

    /// All sections in file order.
    pub fn sections(&self) -> impl Iterator<Item = ElfSection<'a>> + '_ {
        (0..self.headers.len()).filter_map(move |i| self.by_index(i))
    }

    pub fn count(&self) -> usize {
        self.headers.len()
    }

    pub fn has_debug_info(&self) -> bool {
        self.kinds.contains(&SectionKind::DebugInfo)
    }
}

/// A parsed section with its classification and raw bytes.
pub struct ElfSection<'a> {
    pub index: usize,
    pub header: SectionHeader,
    pub kind: SectionKind,
    pub name: &'a str,
    pub data: &'a [u8],
}

impl<'a> ElfSection<'a> {
    pub fn size(&self) -> u64 {
        self.header.sh_size
    }

    pub fn addr(&self) -> u64 {
        self.header.sh_addr
    }

    /// One past the last virtual address covered by this section.
    pub fn end_addr(&self) -> u64 {
        self.header.sh_addr.saturating_add(self.header.sh_size)
    }

    pub fn is_allocated(&self) -> bool {
        self.header.sh_flags & SHF_ALLOC != 0
    }

    pub fn is_executable(&self) -> bool {
        self.header.sh_flags & SHF_EXECINSTR != 0
    }

    pub fn is_writable(&self) -> bool {
        self.header.sh_flags & SHF_WRITE != 0
    }
}

fn parse_section_header(
    data: &[u8],
    offset: usize,
    class: ElfClass,
    endian: ElfData,
) -> Result<SectionHeader> {
    match class {
        ElfClass::Elf32 => Ok(SectionHeader {
            sh_name: data.read_u32(offset, endian)?,
            sh_type: data.read_u32(offset + 4, endian)?,
            sh_flags: data.read_u32(offset + 8, endian)? as u64,
            sh_addr: data.read_u32(offset + 12, endian)? as u64,
            sh_offset: data.read_u32(offset + 16, endian)? as u64,
            sh_size: data.read_u32(offset + 20, endian)? as u64,
            sh_link: data.read_u32(offset + 24, endian)?,
            sh_entsize: data.read_u32(offset + 36, endian)? as u64,
        }),
        ElfClass::Elf64 => Ok(SectionHeader {
            sh_name: data.read_u32(offset, endian)?,
            sh_type: data.read_u32(offset + 4, endian)?,
            sh_flags: data.read_u64(offset + 8, endian)?,
            sh_addr: data.read_u64(offset + 16, endian)?,
            sh_offset: data.read_u64(offset + 24, endian)?,
            sh_size: data.read_u64(offset + 32, endian)?,
            sh_link: data.read_u32(offset + 40, endian)?,
            sh_entsize: data.read_u64(offset + 56, endian)?,
        }),
    }
}
