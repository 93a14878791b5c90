//! ELF (Executable and Linkable Format) parser
//!
//! A zero-copy ELF parser covering the pieces size attribution needs:
//! the file header, section and program header tables, and symbol tables.

pub mod headers;
pub mod sections;
pub mod segments;
pub mod symbols;
pub mod types;
pub mod utils;

use headers::parse_header;
pub use sections::{ElfSection, SectionTable};
pub use segments::SegmentTable;
pub use symbols::SymbolTable;
pub use types::*;

/// A fully parsed, read-only view over one ELF image.
///
/// Header, section table and program table are parsed eagerly so that any
/// structural fault in the container surfaces before analysis begins.
pub struct ElfImage<'data> {
    data: &'data [u8],
    header: ElfHeader,
    sections: SectionTable<'data>,
    segments: SegmentTable,
}

/// One symbol table section paired with its `sh_link` string table.
pub struct LinkedSymtab<'data> {
    /// Index of the symbol table section itself.
    pub section_index: usize,
    pub table: SymbolTable<'data>,
    /// True when `sh_link` did not name a usable string table; names
    /// degrade to None but entries still carry addresses and sizes.
    pub unresolved_link: bool,
}

impl<'data> ElfImage<'data> {
    /// Parse an ELF image from raw bytes.
    pub fn parse(data: &'data [u8]) -> Result<Self> {
        let header = parse_header(data)?;
        let sections = SectionTable::parse(data, &header)?;
        let segments = SegmentTable::parse(data, &header)?;

        Ok(Self {
            data,
            header,
            sections,
            segments,
        })
    }

    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    pub fn data(&self) -> &'data [u8] {
        self.data
    }

    pub fn sections(&self) -> &SectionTable<'data> {
        &self.sections
    }

    pub fn segments(&self) -> &SegmentTable {
        &self.segments
    }

    pub fn class(&self) -> ElfClass {
        self.header.ident.class
    }

    pub fn endian(&self) -> ElfData {
        self.header.ident.data
    }

    pub fn machine(&self) -> ElfMachine {
        self.header.machine()
    }

    pub fn is_shared_object(&self) -> bool {
        self.header.file_type() == ElfType::SharedObject
    }

    pub fn has_debug_info(&self) -> bool {
        self.sections.has_debug_info()
    }

    /// Every symbol table in the image (`.symtab` and `.dynsym` both count),
    /// each paired with the string table its `sh_link` names.
    pub fn symbol_tables(&self) -> Result<Vec<LinkedSymtab<'data>>> {
        let mut tables = Vec::new();

        for section in self.sections.sections() {
            if section.kind != SectionKind::SymbolTable {
                continue;
            }

            let link = section.header.sh_link as usize;
            let (strings, unresolved_link) = match self.sections.by_index(link) {
                Some(s) if s.kind == SectionKind::StringTable => (s.data, false),
                _ => (&[][..], true),
            };

            let table =
                SymbolTable::parse(section.data, strings, self.class(), self.endian())?;
            tables.push(LinkedSymtab {
                section_index: section.index,
                table,
                unresolved_link,
            });
        }

        Ok(tables)
    }

    /// A named section's bytes, or empty when the section is absent.
    ///
    /// This is the loader interface the DWARF reader works through.
    pub fn section_data(&self, name: &str) -> &'data [u8] {
        self.sections.data_by_name(name)
    }

    /// The section owning a virtual address, if any allocatable one does.
    pub fn section_containing(&self, addr: u64) -> Option<ElfSection<'data>> {
        self.sections.by_addr(addr)
    }
}
