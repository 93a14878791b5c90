//! Typed symbol extraction.
//!
//! Turns raw ELF symbol table entries into [`SymbolRecord`]s: names resolved,
//! binding and kind lifted into enums, section references validated. Both
//! `.symtab` and `.dynsym` are walked and the union collapsed, so a binary
//! stripped down to its dynamic symbols still produces records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{AnalysisWarning, Result, WarningKind};
use crate::formats::elf::{
    ElfImage, SymbolEntry, STB_GLOBAL, STB_WEAK, STT_FILE, STT_FUNC, STT_OBJECT, STT_SECTION,
};

/// Symbol binding, ordered by precedence: Global wins over Weak over Local.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SymbolBinding {
    Local,
    Weak,
    Global,
}

impl SymbolBinding {
    fn from_st_bind(bind: u8) -> Self {
        match bind {
            STB_GLOBAL => SymbolBinding::Global,
            STB_WEAK => SymbolBinding::Weak,
            _ => SymbolBinding::Local,
        }
    }
}

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Object,
    Section,
    Unknown,
}

impl SymbolKind {
    fn from_st_type(st_type: u8) -> Self {
        match st_type {
            STT_FUNC => SymbolKind::Function,
            STT_OBJECT => SymbolKind::Object,
            STT_SECTION => SymbolKind::Section,
            _ => SymbolKind::Unknown,
        }
    }
}

/// One extracted symbol. Read-only downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Raw (possibly mangled) name; empty for anonymous entries.
    pub name: String,
    pub address: u64,
    /// st_size as stored; zero or inaccurate in practice, treated as a hint.
    pub declared_size: u64,
    pub binding: SymbolBinding,
    pub kind: SymbolKind,
    /// Index of the owning section; None for undefined/absolute entries,
    /// which are excluded from size computation but not from reporting.
    pub section_index: Option<usize>,
}

/// Extract the collapsed symbol set of an image.
pub fn extract(elf: &ElfImage) -> Result<(Vec<SymbolRecord>, Vec<AnalysisWarning>)> {
    let mut warnings = Vec::new();
    let section_count = elf.sections().count();

    // (name, address) -> slot in `records`
    let mut by_identity: HashMap<(String, u64), usize> = HashMap::new();
    let mut records: Vec<SymbolRecord> = Vec::new();

    for linked in elf.symbol_tables()? {
        if linked.unresolved_link {
            warnings.push(AnalysisWarning::new(
                WarningKind::UnresolvedSectionRef,
                format!(
                    "symbol table in section {} has no usable string table",
                    linked.section_index
                ),
            ));
        }

        for (index, entry) in linked.table.entries() {
            // Index 0 is the mandatory null entry; STT_FILE entries carry
            // compilation-unit names, not address spans.
            if index == 0 || entry.st_type() == STT_FILE {
                continue;
            }

            let (record, warning) = to_record(entry, linked.table.name_of(entry), section_count);
            if let Some(warning) = warning {
                warnings.push(warning);
            }

            let key = (record.name.clone(), record.address);
            match by_identity.get(&key) {
                Some(&slot) => {
                    // symtab/dynsym overlap: strongest binding wins
                    if record.binding > records[slot].binding {
                        records[slot] = record;
                    }
                }
                None => {
                    by_identity.insert(key, records.len());
                    records.push(record);
                }
            }
        }
    }

    debug!(
        symbols = records.len(),
        warnings = warnings.len(),
        "symbol extraction complete"
    );
    Ok((records, warnings))
}

fn to_record(
    entry: &SymbolEntry,
    name: Option<&str>,
    section_count: usize,
) -> (SymbolRecord, Option<AnalysisWarning>) {
    let mut warning = None;

    let section_index = if entry.has_section_ref() {
        let idx = entry.st_shndx as usize;
        if idx < section_count {
            Some(idx)
        } else {
            warning = Some(AnalysisWarning::new(
                WarningKind::UnresolvedSectionRef,
                format!(
                    "symbol {:?} references nonexistent section {}",
                    name.unwrap_or(""),
                    idx
                ),
            ));
            None
        }
    } else {
        None
    };

    (
        SymbolRecord {
            name: name.unwrap_or("").to_string(),
            address: entry.st_value,
            declared_size: entry.st_size,
            binding: SymbolBinding::from_st_bind(entry.st_bind()),
            kind: SymbolKind::from_st_type(entry.st_type()),
            section_index,
        },
        warning,
    )
}
