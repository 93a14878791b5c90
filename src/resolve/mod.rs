//! Effective-size resolution.
//!
//! Declared symbol sizes in real binaries are routinely absent or wrong, so
//! the authoritative span is the delta between sorted virtual addresses,
//! clipped to the owning section; a positive declared size only ever caps
//! that span. Symbols sharing one address are aliases of the same bytes and
//! resolve to a single record so totals are never inflated.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

use crate::dwarf::DebugIndex;
use crate::error::{AnalysisWarning, WarningKind};
use crate::formats::elf::ElfImage;
use crate::symbols::SymbolRecord;

/// One resolved span: a symbol (or alias group) with its computed size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    /// All names bound to this address, strongest claim first. May be
    /// empty for anonymous entries such as section symbols.
    pub names: Vec<String>,
    pub address: u64,
    /// Computed, authoritative byte span.
    pub size: u64,
    /// Name of the owning section; empty when the symbol has none.
    pub section: String,
    /// Attributed source file; None when no debug range covers the address.
    pub source_file: Option<String>,
}

impl ResolvedSymbol {
    pub fn primary_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }

    /// Raw symbols folded into this record.
    pub fn folded_count(&self) -> usize {
        self.names.len().max(1)
    }
}

/// A section partition queued for independent resolution.
struct Partition<'a> {
    section_name: String,
    start: u64,
    end: u64,
    size: u64,
    members: Vec<&'a SymbolRecord>,
}

/// Resolve every symbol's effective size and attribution.
///
/// Partitions never share address ranges, so they are resolved in
/// parallel and stitched back into one deterministic ordering.
pub fn resolve(
    symbols: &[SymbolRecord],
    elf: &ElfImage,
    debug_index: &DebugIndex,
) -> (Vec<ResolvedSymbol>, Vec<AnalysisWarning>) {
    let sections = elf.sections();

    let mut partitions: Vec<Partition> = Vec::new();
    let mut slot_of_section = vec![usize::MAX; sections.count()];
    for section in sections.sections() {
        if section.kind.is_measurable() && section.size() > 0 {
            slot_of_section[section.index] = partitions.len();
            partitions.push(Partition {
                section_name: section.name.to_string(),
                start: section.addr(),
                end: section.end_addr(),
                size: section.size(),
                members: Vec::new(),
            });
        }
    }

    // Symbols outside any measurable section resolve to size zero but are
    // still reported.
    let mut resolved: Vec<ResolvedSymbol> = Vec::new();
    for symbol in symbols {
        let slot = symbol
            .section_index
            .and_then(|idx| slot_of_section.get(idx).copied())
            .unwrap_or(usize::MAX);
        if slot != usize::MAX {
            partitions[slot].members.push(symbol);
        } else {
            let section = symbol
                .section_index
                .and_then(|idx| sections.by_index(idx))
                .map(|s| s.name.to_string())
                .unwrap_or_default();
            resolved.push(ResolvedSymbol {
                names: named(symbol),
                address: symbol.address,
                size: 0,
                section,
                source_file: debug_index.source_file(symbol.address).map(str::to_string),
            });
        }
    }

    let outcomes: Vec<(Vec<ResolvedSymbol>, Vec<AnalysisWarning>)> = partitions
        .par_iter()
        .map(|partition| resolve_partition(partition, debug_index))
        .collect();

    let mut warnings = Vec::new();
    for (mut part_resolved, mut part_warnings) in outcomes {
        resolved.append(&mut part_resolved);
        warnings.append(&mut part_warnings);
    }

    // Deterministic output order regardless of partition scheduling.
    resolved.sort_by(|a, b| {
        a.address
            .cmp(&b.address)
            .then_with(|| a.section.cmp(&b.section))
            .then_with(|| a.names.cmp(&b.names))
    });

    debug!(
        resolved = resolved.len(),
        partitions = partitions.len(),
        warnings = warnings.len(),
        "size resolution complete"
    );
    (resolved, warnings)
}

fn named(symbol: &SymbolRecord) -> Vec<String> {
    if symbol.name.is_empty() {
        Vec::new()
    } else {
        vec![symbol.name.clone()]
    }
}

fn resolve_partition(
    partition: &Partition<'_>,
    debug_index: &DebugIndex,
) -> (Vec<ResolvedSymbol>, Vec<AnalysisWarning>) {
    let mut warnings = Vec::new();
    let mut members = partition.members.clone();

    // Address ascending; at equal addresses the symbol claiming the larger
    // span wins the slot, then the stronger binding.
    members.sort_by_key(|s| (s.address, Reverse(s.declared_size), Reverse(s.binding)));

    let mut resolved = Vec::new();
    let mut i = 0;
    while i < members.len() {
        let winner = members[i];

        // Alias group: every symbol at this exact address.
        let mut names = Vec::new();
        let mut j = i;
        while j < members.len() && members[j].address == winner.address {
            if !members[j].name.is_empty() {
                names.push(members[j].name.clone());
            }
            j += 1;
        }

        let size = if winner.address < partition.start || winner.address >= partition.end {
            warnings.push(AnalysisWarning::new(
                WarningKind::InconsistentSectionTotal,
                format!(
                    "symbol {:?} at {:#x} lies outside section {} [{:#x}, {:#x})",
                    winner.name, winner.address, partition.section_name, partition.start,
                    partition.end
                ),
            ));
            0
        } else {
            let next_distinct = members
                .get(j)
                .map(|s| s.address)
                .unwrap_or(partition.end)
                .min(partition.end);
            let span = next_distinct.saturating_sub(winner.address);
            if winner.declared_size > 0 {
                winner.declared_size.min(span)
            } else {
                span
            }
        };

        resolved.push(ResolvedSymbol {
            names,
            address: winner.address,
            size,
            section: partition.section_name.clone(),
            source_file: debug_index
                .source_file(winner.address)
                .map(str::to_string),
        });
        i = j;
    }

    // Spans computed from address deltas cannot exceed the section, but a
    // binary lying about addresses or sizes still must not inflate totals.
    let total: u64 = resolved.iter().map(|r| r.size).sum();
    if total > partition.size {
        warnings.push(AnalysisWarning::new(
            WarningKind::InconsistentSectionTotal,
            format!(
                "section {} ({} bytes) claims {} bytes of symbols, scaling down",
                partition.section_name, partition.size, total
            ),
        ));
        for r in &mut resolved {
            r.size = ((r.size as u128 * partition.size as u128) / total as u128) as u64;
        }
    }

    (resolved, warnings)
}
