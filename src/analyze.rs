//! Top-level analysis pipeline.
//!
//! One run is strictly staged: load → parse container → extract symbols and
//! build the debug index → resolve sizes → aggregate. Each stage consumes
//! the completed output of the previous one, and only container-level
//! faults abort; everything else degrades into warnings on the report.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::dwarf::DebugIndex;
use crate::error::Result;
use crate::formats::elf::{ElfImage, SectionKind};
use crate::io::{ImageFile, IoLimits};
use crate::report::{aggregate, GroupBy, SizeReport};
use crate::{resolve, symbols};

/// Knobs recognized by an analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Number of top entries to keep; None or Some(0) keeps everything.
    pub symbol_count: Option<usize>,
    pub group_by: GroupBy,
    pub io_limits: IoLimits,
}

/// Analyze a shared-object file on disk.
pub fn analyze<P: AsRef<Path>>(path: P, options: &AnalysisOptions) -> Result<SizeReport> {
    let image = ImageFile::open(path.as_ref(), options.io_limits)?;
    info!(
        path = %image.path().display(),
        size = image.size(),
        "analyzing binary"
    );
    analyze_bytes(image.data(), options)
}

/// Analyze an already-loaded binary image.
pub fn analyze_bytes(data: &[u8], options: &AnalysisOptions) -> Result<SizeReport> {
    let elf = ElfImage::parse(data)?;
    debug!(
        machine = %elf.machine(),
        bits = elf.class().bits(),
        sections = elf.sections().count(),
        "container parsed"
    );

    let (records, mut warnings) = symbols::extract(&elf)?;

    let debug_index = DebugIndex::build(&elf);
    if debug_index.is_empty() {
        info!("no usable debug info; source attribution degrades to unknown");
    }
    warnings.extend_from_slice(debug_index.warnings());

    let (resolved, resolve_warnings) = resolve::resolve(&records, &elf, &debug_index);
    warnings.extend(resolve_warnings);

    let total_size: u64 = resolved.iter().map(|r| r.size).sum();
    let unknown_size: u64 = resolved
        .iter()
        .filter(|r| r.source_file.is_none())
        .map(|r| r.size)
        .sum();

    // Shipped string tables and read-only constants, counted section-wise.
    // `.strtab` is only present in debug builds and is not shipped size.
    let mut string_table_size = 0u64;
    let mut constant_size = 0u64;
    for section in elf.sections().sections() {
        if section.kind == SectionKind::StringTable && section.name != ".strtab" {
            string_table_size += section.size();
        } else if section.name == ".rodata" {
            constant_size += section.size();
        }
    }

    let entries = aggregate(&resolved, options.group_by, options.symbol_count);

    for warning in &warnings {
        warn!(%warning, "analysis warning");
    }
    info!(
        entries = entries.len(),
        total_size,
        unknown_size,
        warnings = warnings.len(),
        "analysis complete"
    );

    Ok(SizeReport {
        machine: elf.machine().to_string(),
        class_bits: elf.class().bits(),
        little_endian: elf.endian().is_little_endian(),
        entries,
        total_size,
        unknown_size,
        string_table_size,
        constant_size,
        mapped_size: elf.segments().mapped_file_size(),
        symbol_count: records.len(),
        warnings,
    })
}
