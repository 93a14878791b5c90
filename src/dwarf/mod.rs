//! DWARF line-table indexing for source attribution.
//!
//! Walks every compilation unit's line-number program and flattens the rows
//! into sorted address ranges tagged with the originating source file. The
//! index degrades to empty when the binary carries no debug sections, and a
//! malformed unit is skipped with a warning rather than failing the build.

use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{AnalysisWarning, WarningKind};
use crate::formats::elf::ElfImage;

type Slice<'a> = gimli::EndianSlice<'a, gimli::RunTimeEndian>;

/// Attribution sentinel for addresses no debug range covers.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// One contiguous address span produced by a single source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRange {
    pub start: u64,
    /// Exclusive end address.
    pub end: u64,
    pub file: String,
    /// First line of the span, when the line program recorded one.
    pub line: Option<u64>,
}

/// Address → source-file index built from DWARF line programs.
pub struct DebugIndex {
    by_start: BTreeMap<u64, DebugRange>,
    warnings: Vec<AnalysisWarning>,
}

impl DebugIndex {
    /// Build the index from an image's debug sections.
    ///
    /// Absent debug info yields an empty index, never an error.
    pub fn build(elf: &ElfImage) -> Self {
        let mut warnings = Vec::new();
        let ranges = if elf.has_debug_info() {
            collect_line_ranges(elf, &mut warnings)
        } else {
            Vec::new()
        };

        debug!(
            ranges = ranges.len(),
            warnings = warnings.len(),
            "debug index built"
        );
        Self::assemble(ranges, warnings)
    }

    /// Build an index from explicit ranges.
    pub fn from_ranges(ranges: Vec<DebugRange>) -> Self {
        Self::assemble(ranges, Vec::new())
    }

    fn assemble(mut ranges: Vec<DebugRange>, warnings: Vec<AnalysisWarning>) -> Self {
        ranges.retain(|r| r.end > r.start);
        ranges.sort_by_key(|r| r.start);

        // Coalesce runs of adjacent rows from the same file.
        let mut by_start: BTreeMap<u64, DebugRange> = BTreeMap::new();
        let mut pending: Option<DebugRange> = None;
        for range in ranges {
            match pending.take() {
                Some(mut prev) if prev.end == range.start && prev.file == range.file => {
                    prev.end = range.end;
                    pending = Some(prev);
                }
                Some(prev) => {
                    by_start.insert(prev.start, prev);
                    pending = Some(range);
                }
                None => pending = Some(range),
            }
        }
        if let Some(prev) = pending {
            by_start.insert(prev.start, prev);
        }

        Self { by_start, warnings }
    }

    /// The range covering an address, if any.
    pub fn lookup(&self, addr: u64) -> Option<&DebugRange> {
        self.by_start
            .range(..=addr)
            .next_back()
            .map(|(_, r)| r)
            .filter(|r| addr < r.end)
    }

    /// Source file for an address, or None when unattributed.
    pub fn source_file(&self, addr: u64) -> Option<&str> {
        self.lookup(addr).map(|r| r.file.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    /// Warnings recorded while parsing debug info.
    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<AnalysisWarning> {
        self.warnings
    }
}

/// Load DWARF through gimli and walk every unit's line program.
///
/// Decode faults are recorded per unit; the surviving units still
/// contribute ranges.
fn collect_line_ranges<'d>(
    elf: &ElfImage<'d>,
    warnings: &mut Vec<AnalysisWarning>,
) -> Vec<DebugRange> {
    let endian = if elf.endian().is_little_endian() {
        gimli::RunTimeEndian::Little
    } else {
        gimli::RunTimeEndian::Big
    };

    let load_section = |id: gimli::SectionId| -> Result<Cow<'d, [u8]>, gimli::Error> {
        Ok(Cow::Borrowed(elf.section_data(id.name())))
    };

    let dwarf_cow = match gimli::Dwarf::load(load_section) {
        Ok(d) => d,
        Err(e) => {
            warnings.push(AnalysisWarning::new(
                WarningKind::MalformedDebugRecord,
                format!("failed to load debug sections: {}", e),
            ));
            return Vec::new();
        }
    };
    let dwarf = dwarf_cow.borrow(|section| gimli::EndianSlice::new(section, endian));

    let mut ranges = Vec::new();
    let mut units = dwarf.units();
    loop {
        let header = match units.next() {
            Ok(Some(h)) => h,
            Ok(None) => break,
            Err(e) => {
                warnings.push(AnalysisWarning::new(
                    WarningKind::MalformedDebugRecord,
                    format!("bad compilation unit header: {}", e),
                ));
                break;
            }
        };

        let unit = match dwarf.unit(header) {
            Ok(u) => u,
            Err(e) => {
                warnings.push(AnalysisWarning::new(
                    WarningKind::MalformedDebugRecord,
                    format!("bad compilation unit: {}", e),
                ));
                continue;
            }
        };

        if let Some(program) = unit.line_program.clone() {
            if let Err(e) = walk_line_program(&dwarf, &unit, program, &mut ranges, warnings) {
                warnings.push(AnalysisWarning::new(
                    WarningKind::MalformedDebugRecord,
                    format!("bad line program: {}", e),
                ));
            }
        }
    }

    ranges
}

fn walk_line_program<'i>(
    dwarf: &gimli::Dwarf<Slice<'i>>,
    unit: &gimli::Unit<Slice<'i>>,
    program: gimli::IncompleteLineProgram<Slice<'i>>,
    out: &mut Vec<DebugRange>,
    warnings: &mut Vec<AnalysisWarning>,
) -> Result<(), gimli::Error> {
    let mut rows = program.rows();
    let mut last: Option<DebugRange> = None;

    while let Some((header, row)) = rows.next_row()? {
        if let Some(mut pending) = last.take() {
            pending.end = row.address();
            out.push(pending);
        }

        if !row.end_sequence() {
            let file = match row.file(header) {
                Some(file) => {
                    let path = dwarf.attr_string(unit, file.path_name())?;
                    match file.directory(header) {
                        Some(directory) => format!(
                            "{}/{}",
                            dwarf.attr_string(unit, directory)?.to_string_lossy(),
                            path.to_string_lossy()
                        ),
                        None => path.to_string_lossy().into_owned(),
                    }
                }
                None => UNKNOWN_SOURCE.to_string(),
            };

            last = Some(DebugRange {
                start: row.address(),
                end: 0,
                file,
                line: row.line().map(|l| l.get()),
            });
        }
    }

    if last.is_some() {
        warnings.push(AnalysisWarning::new(
            WarningKind::MalformedDebugRecord,
            "line program not terminated by end sequence",
        ));
    }
    Ok(())
}
