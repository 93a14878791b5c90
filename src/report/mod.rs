//! Report aggregation.
//!
//! Pure transformation from resolved symbols to the ranked report consumed
//! by the presentation layer. Grouping, ranking and truncation happen here;
//! nothing is mutated and nothing escapes except the final artifact.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::demangle::demangle_or_original;
use crate::dwarf::UNKNOWN_SOURCE;
use crate::error::{AnalysisWarning, Result, SymsizeError};
use crate::resolve::ResolvedSymbol;

/// Label used for spans with no usable symbol name.
const ANONYMOUS_LABEL: &str = "[anonymous]";

/// Aggregation key selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupBy {
    /// One entry per (demangled) symbol name.
    #[default]
    Symbol,
    /// Roll symbols up into their attributed source file.
    SourceFile,
}

/// One line of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub label: String,
    pub total_size: u64,
    /// How many raw symbols folded into this entry.
    pub count: usize,
}

/// Group, rank and truncate resolved symbols.
///
/// Entries are sorted by size descending with a label-ascending tie-break
/// so equal inputs always produce identical output. A `limit` of None or
/// zero means unlimited.
pub fn aggregate(
    resolved: &[ResolvedSymbol],
    group_by: GroupBy,
    limit: Option<usize>,
) -> Vec<ReportEntry> {
    let mut entries: Vec<ReportEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for symbol in resolved {
        let label = match group_by {
            GroupBy::Symbol => {
                let name = symbol.primary_name();
                if name.is_empty() {
                    ANONYMOUS_LABEL.to_string()
                } else {
                    demangle_or_original(name)
                }
            }
            GroupBy::SourceFile => symbol
                .source_file
                .clone()
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        };

        match index.get(&label) {
            Some(&slot) => {
                entries[slot].total_size += symbol.size;
                entries[slot].count += symbol.folded_count();
            }
            None => {
                index.insert(label.clone(), entries.len());
                entries.push(ReportEntry {
                    label,
                    total_size: symbol.size,
                    count: symbol.folded_count(),
                });
            }
        }
    }

    entries.sort_by(|a, b| {
        b.total_size
            .cmp(&a.total_size)
            .then_with(|| a.label.cmp(&b.label))
    });

    match limit {
        Some(n) if n > 0 => entries.truncate(n),
        _ => {}
    }
    entries
}

/// Terminal artifact of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeReport {
    /// Target architecture, as identified by the container header.
    pub machine: String,
    pub class_bits: u8,
    pub little_endian: bool,
    /// Ranked entries, already grouped and truncated.
    pub entries: Vec<ReportEntry>,
    /// Sum of all resolved symbol sizes.
    pub total_size: u64,
    /// Portion of `total_size` with no source attribution.
    pub unknown_size: u64,
    /// Combined size of string-table sections shipped in the binary
    /// (`.strtab` itself only exists in debug builds and is excluded).
    pub string_table_size: u64,
    /// Size of `.rodata`.
    pub constant_size: u64,
    /// File bytes mapped by the loader (PT_LOAD).
    pub mapped_size: u64,
    /// Raw symbols that survived extraction.
    pub symbol_count: usize,
    pub warnings: Vec<AnalysisWarning>,
}

impl SizeReport {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SymsizeError::InvalidFormat(format!("serialization failed: {}", e)))
    }
}

/// Format a byte count with binary prefixes, `1536` -> `"1.5KiB"`.
pub fn human_size(num: u64) -> String {
    let mut value = num as f64;
    for unit in ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"] {
        if value < 1024.0 {
            return format!("{:.1}{}B", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1}ZiB", value)
}
