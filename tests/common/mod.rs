//! Shared test support: an in-memory builder for small ELF64 images.
//!
//! Produces little-endian shared objects with caller-defined sections and
//! symbol tables, laid out the way a linker would: file header, optional
//! program header, section contents, then the section header table.
#![allow(dead_code)]

/// Symbol binding/type byte helpers mirroring the ELF encoding.
pub const STB_LOCAL: u8 = 0;
pub const STB_GLOBAL: u8 = 1;
pub const STB_WEAK: u8 = 2;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;

const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHT_NOBITS: u32 = 8;

const SHF_WRITE: u64 = 0x1;
const SHF_ALLOC: u64 = 0x2;
const SHF_EXECINSTR: u64 = 0x4;

struct SectionSpec {
    name: String,
    sh_type: u32,
    sh_flags: u64,
    sh_addr: u64,
    sh_size: u64,
}

struct SymbolSpec {
    name: String,
    value: u64,
    size: u64,
    info: u8,
    /// Section named here is resolved to its index at build time; None
    /// produces an undefined (SHN_UNDEF) symbol.
    section: Option<String>,
}

pub struct ElfBuilder {
    sections: Vec<SectionSpec>,
    symbols: Vec<SymbolSpec>,
    load_filesz: Option<u64>,
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            symbols: Vec::new(),
            load_filesz: None,
        }
    }

    /// Add an executable PROGBITS section.
    pub fn code_section(self, name: &str, addr: u64, size: u64) -> Self {
        self.section(name, SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, addr, size)
    }

    /// Add a writable PROGBITS section.
    pub fn data_section(self, name: &str, addr: u64, size: u64) -> Self {
        self.section(name, SHT_PROGBITS, SHF_ALLOC | SHF_WRITE, addr, size)
    }

    /// Add a read-only PROGBITS section.
    pub fn rodata_section(self, name: &str, addr: u64, size: u64) -> Self {
        self.section(name, SHT_PROGBITS, SHF_ALLOC, addr, size)
    }

    /// Add a NOBITS section (occupies no file bytes).
    pub fn bss_section(self, name: &str, addr: u64, size: u64) -> Self {
        self.section(name, SHT_NOBITS, SHF_ALLOC | SHF_WRITE, addr, size)
    }

    /// Add an extra string table section (e.g. `.dynstr`).
    pub fn strtab_section(self, name: &str, size: u64) -> Self {
        self.section(name, SHT_STRTAB, 0, 0, size)
    }

    fn section(mut self, name: &str, sh_type: u32, sh_flags: u64, sh_addr: u64, sh_size: u64) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            sh_type,
            sh_flags,
            sh_addr,
            sh_size,
        });
        self
    }

    /// Add a symbol owned by a named section.
    pub fn symbol(mut self, name: &str, section: &str, value: u64, size: u64, bind: u8, typ: u8) -> Self {
        self.symbols.push(SymbolSpec {
            name: name.to_string(),
            value,
            size,
            info: (bind << 4) | typ,
            section: Some(section.to_string()),
        });
        self
    }

    /// Add an undefined (imported) symbol.
    pub fn undefined_symbol(mut self, name: &str) -> Self {
        self.symbols.push(SymbolSpec {
            name: name.to_string(),
            value: 0,
            size: 0,
            info: (STB_GLOBAL << 4) | STT_FUNC,
            section: None,
        });
        self
    }

    /// Emit one PT_LOAD program header with the given file size.
    pub fn load_segment(mut self, filesz: u64) -> Self {
        self.load_filesz = Some(filesz);
        self
    }

    /// Serialize the image.
    pub fn build(self) -> Vec<u8> {
        // Resolve symbol section references against final indices:
        // user sections start at index 1 (after the NULL section).
        let section_index = |name: &Option<String>| -> u16 {
            match name {
                None => 0,
                Some(n) => {
                    let pos = self
                        .sections
                        .iter()
                        .position(|s| &s.name == n)
                        .expect("symbol references unknown section");
                    (pos + 1) as u16
                }
            }
        };

        let has_symtab = !self.symbols.is_empty();

        // Build .strtab / .symtab contents up front.
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; 24]; // null entry
        for sym in &self.symbols {
            let name_off = if sym.name.is_empty() {
                0
            } else {
                let off = strtab.len() as u32;
                strtab.extend_from_slice(sym.name.as_bytes());
                strtab.push(0);
                off
            };
            let mut entry = [0u8; 24];
            entry[0..4].copy_from_slice(&name_off.to_le_bytes());
            entry[4] = sym.info;
            entry[6..8].copy_from_slice(&section_index(&sym.section).to_le_bytes());
            entry[8..16].copy_from_slice(&sym.value.to_le_bytes());
            entry[16..24].copy_from_slice(&sym.size.to_le_bytes());
            symtab.extend_from_slice(&entry);
        }

        // Full section list: NULL + user sections (+ .symtab + .strtab) + .shstrtab
        let mut all_names: Vec<String> = vec![String::new()];
        all_names.extend(self.sections.iter().map(|s| s.name.clone()));
        if has_symtab {
            all_names.push(".symtab".to_string());
            all_names.push(".strtab".to_string());
        }
        all_names.push(".shstrtab".to_string());

        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for name in &all_names {
            if name.is_empty() {
                name_offsets.push(0u32);
            } else {
                name_offsets.push(shstrtab.len() as u32);
                shstrtab.extend_from_slice(name.as_bytes());
                shstrtab.push(0);
            }
        }

        let shnum = all_names.len() as u16;
        let shstrndx = shnum - 1;
        let symtab_index = if has_symtab { shnum - 3 } else { 0 };
        let strtab_index = if has_symtab { shnum - 2 } else { 0 };

        let phnum: u16 = if self.load_filesz.is_some() { 1 } else { 0 };
        let phoff: u64 = if phnum > 0 { 64 } else { 0 };
        let mut cursor = 64 + phnum as u64 * 56;

        // Assign file offsets to section contents.
        let align8 = |v: u64| (v + 7) & !7;
        let mut offsets = vec![0u64; all_names.len()];
        let mut blobs: Vec<(usize, Vec<u8>)> = Vec::new();
        for (i, spec) in self.sections.iter().enumerate() {
            let index = i + 1;
            if spec.sh_type == SHT_NOBITS {
                offsets[index] = 0;
                continue;
            }
            cursor = align8(cursor);
            offsets[index] = cursor;
            blobs.push((index, vec![0u8; spec.sh_size as usize]));
            cursor += spec.sh_size;
        }
        if has_symtab {
            cursor = align8(cursor);
            offsets[symtab_index as usize] = cursor;
            blobs.push((symtab_index as usize, symtab.clone()));
            cursor += symtab.len() as u64;

            cursor = align8(cursor);
            offsets[strtab_index as usize] = cursor;
            blobs.push((strtab_index as usize, strtab.clone()));
            cursor += strtab.len() as u64;
        }
        cursor = align8(cursor);
        offsets[shstrndx as usize] = cursor;
        blobs.push((shstrndx as usize, shstrtab.clone()));
        cursor += shstrtab.len() as u64;

        let shoff = align8(cursor);
        let total_len = shoff + shnum as u64 * 64;
        let mut image = vec![0u8; total_len as usize];

        // ELF header
        image[0..4].copy_from_slice(b"\x7fELF");
        image[4] = 2; // ELFCLASS64
        image[5] = 1; // ELFDATA2LSB
        image[6] = 1; // EV_CURRENT
        image[16..18].copy_from_slice(&3u16.to_le_bytes()); // ET_DYN
        image[18..20].copy_from_slice(&62u16.to_le_bytes()); // EM_X86_64
        image[20..24].copy_from_slice(&1u32.to_le_bytes());
        image[32..40].copy_from_slice(&phoff.to_le_bytes());
        image[40..48].copy_from_slice(&shoff.to_le_bytes());
        image[52..54].copy_from_slice(&64u16.to_le_bytes()); // e_ehsize
        image[54..56].copy_from_slice(&56u16.to_le_bytes()); // e_phentsize
        image[56..58].copy_from_slice(&phnum.to_le_bytes());
        image[58..60].copy_from_slice(&64u16.to_le_bytes()); // e_shentsize
        image[60..62].copy_from_slice(&shnum.to_le_bytes());
        image[62..64].copy_from_slice(&shstrndx.to_le_bytes());

        // Program header
        if let Some(filesz) = self.load_filesz {
            let p = 64;
            image[p..p + 4].copy_from_slice(&1u32.to_le_bytes()); // PT_LOAD
            image[p + 4..p + 8].copy_from_slice(&5u32.to_le_bytes()); // R+X
            image[p + 32..p + 40].copy_from_slice(&filesz.to_le_bytes());
            image[p + 40..p + 48].copy_from_slice(&filesz.to_le_bytes());
        }

        // Section contents
        for (index, blob) in &blobs {
            let off = offsets[*index] as usize;
            image[off..off + blob.len()].copy_from_slice(blob);
        }

        // Section header table
        for index in 0..shnum as usize {
            let base = shoff as usize + index * 64;
            let (sh_type, sh_flags, sh_addr, sh_size, sh_link, sh_entsize) = if index == 0 {
                (0u32, 0u64, 0u64, 0u64, 0u32, 0u64)
            } else if index <= self.sections.len() {
                let spec = &self.sections[index - 1];
                (spec.sh_type, spec.sh_flags, spec.sh_addr, spec.sh_size, 0, 0)
            } else if has_symtab && index == symtab_index as usize {
                (SHT_SYMTAB, 0, 0, symtab.len() as u64, strtab_index as u32, 24)
            } else if has_symtab && index == strtab_index as usize {
                (SHT_STRTAB, 0, 0, strtab.len() as u64, 0, 0)
            } else {
                (SHT_STRTAB, 0, 0, shstrtab.len() as u64, 0, 0)
            };

            image[base..base + 4].copy_from_slice(&name_offsets[index].to_le_bytes());
            image[base + 4..base + 8].copy_from_slice(&sh_type.to_le_bytes());
            image[base + 8..base + 16].copy_from_slice(&sh_flags.to_le_bytes());
            image[base + 16..base + 24].copy_from_slice(&sh_addr.to_le_bytes());
            image[base + 24..base + 32].copy_from_slice(&offsets[index].to_le_bytes());
            image[base + 32..base + 40].copy_from_slice(&sh_size.to_le_bytes());
            image[base + 40..base + 44].copy_from_slice(&sh_link.to_le_bytes());
            image[base + 56..base + 64].copy_from_slice(&sh_entsize.to_le_bytes());
        }

        image
    }
}

impl Default for ElfBuilder {
    fn default() -> Self {
        Self::new()
    }
}
