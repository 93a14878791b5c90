//! symsize — symbol-level size attribution for ELF shared objects.
//!
//! Answers "what is taking up space in this binary": parses a non-stripped
//! ELF shared object, extracts its symbols, correlates them with DWARF line
//! information, computes each symbol's effective byte span from sorted
//! virtual addresses, and aggregates the result into a size-ranked report.
//!
//! ```no_run
//! use symsize::{analyze, AnalysisOptions, GroupBy};
//!
//! let options = AnalysisOptions {
//!     symbol_count: Some(25),
//!     group_by: GroupBy::SourceFile,
//!     ..Default::default()
//! };
//! let report = analyze("target/release/libexample.so", &options)?;
//! for entry in &report.entries {
//!     println!("{:>10}  {}", entry.total_size, entry.label);
//! }
//! # Ok::<(), symsize::SymsizeError>(())
//! ```
//!
//! Stripped binaries are not an error: without debug info every symbol
//! attributes to `"unknown"`, and the report records the degraded fidelity
//! through its warning list.

pub mod analyze;
pub mod demangle;
pub mod dwarf;
pub mod error;
pub mod formats;
pub mod io;
pub mod logging;
pub mod report;
pub mod resolve;
pub mod symbols;

pub use analyze::{analyze, analyze_bytes, AnalysisOptions};
pub use error::{AnalysisWarning, Result, SymsizeError, WarningKind};
pub use report::{human_size, GroupBy, ReportEntry, SizeReport};
pub use resolve::ResolvedSymbol;
