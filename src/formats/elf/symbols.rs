//! Symbol table parsing
//!
//! Decodes the raw entries of one `SHT_SYMTAB`/`SHT_DYNSYM` section against
//! the string table its `sh_link` points at. Interpretation of the entries
//! (binding preference, alias collapse) happens a layer up.

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_cstring, EndianRead};

/// One decoded symbol table.
pub struct SymbolTable<'a> {
    entries: Vec<SymbolEntry>,
    strings: &'a [u8],
}

impl<'a> SymbolTable<'a> {
    /// Parse all entries from a symbol table section's bytes.
    ///
    /// A trailing partial entry is treated as truncation.
    pub fn parse(
        symbol_data: &[u8],
        string_data: &'a [u8],
        class: ElfClass,
        endian: ElfData,
    ) -> Result<Self> {
        let entry_size = match class {
            ElfClass::Elf32 => 16,
            ElfClass::Elf64 => 24,
        };

        if symbol_data.len() % entry_size != 0 {
            return Err(ElfError::Truncated {
                offset: symbol_data.len() - symbol_data.len() % entry_size,
                needed: entry_size,
            });
        }

        let mut entries = Vec::with_capacity(symbol_data.len() / entry_size);
        let mut offset = 0;
        while offset + entry_size <= symbol_data.len() {
            entries.push(parse_symbol(&symbol_data[offset..], class, endian)?);
            offset += entry_size;
        }

        Ok(Self {
            entries,
            strings: string_data,
        })
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Iterate entries with their index.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &SymbolEntry)> {
        self.entries.iter().enumerate()
    }

    /// Resolve an entry's name from the linked string table.
    ///
    /// Returns None for the anonymous name slot or a dangling offset.
    pub fn name_of(&self, entry: &SymbolEntry) -> Option<&'a str> {
        if entry.st_name == 0 {
            return None;
        }
        read_cstring(self.strings, entry.st_name as usize).ok()
    }
}

fn parse_symbol(data: &[u8], class: ElfClass, endian: ElfData) -> Result<SymbolEntry> {
    match class {
        ElfClass::Elf32 => Ok(SymbolEntry {
            st_name: data.read_u32(0, endian)?,
            st_value: data.read_u32(4, endian)? as u64,
            st_size: data.read_u32(8, endian)? as u64,
            st_info: *data.get(12).ok_or(ElfError::Truncated {
                offset: 12,
                needed: 1,
            })?,
            st_shndx: data.read_u16(14, endian)?,
        }),
        ElfClass::Elf64 => Ok(SymbolEntry {
            st_name: data.read_u32(0, endian)?,
            st_info: *data.get(4).ok_or(ElfError::Truncated {
                offset: 4,
                needed: 1,
            })?,
            st_shndx: data.read_u16(6, endian)?,
            st_value: data.read_u64(8, endian)?,
            st_size: data.read_u64(16, endian)?,
        }),
    }
}
