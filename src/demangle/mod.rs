//! Demangler helpers for Rust and C++ (Itanium) symbols.
//!
//! ELF shared objects only ever carry these two flavors; anything
//! unrecognized passes through untouched.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_ITA_MANGLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_Z[A-Za-z0-9_$.]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFlavor {
    Rust,
    Itanium,
    Unknown,
}

pub fn detect_flavor(s: &str) -> SymbolFlavor {
    if rustc_demangle::try_demangle(s).is_ok() {
        return SymbolFlavor::Rust;
    }
    if RE_ITA_MANGLED.is_match(s) {
        return SymbolFlavor::Itanium;
    }
    SymbolFlavor::Unknown
}

/// Attempt to demangle a single symbol. Returns None when not recognized.
pub fn demangle_one(s: &str) -> Option<String> {
    // Rust (v0 + legacy) demangler
    if let Ok(dm) = rustc_demangle::try_demangle(s) {
        return Some(dm.to_string());
    }
    // C++ (Itanium) demangler
    if RE_ITA_MANGLED.is_match(s) {
        if let Ok(sym) = cpp_demangle::Symbol::new(s) {
            return Some(sym.to_string());
        }
    }
    None
}

/// Demangle when possible, otherwise hand the raw name back.
pub fn demangle_or_original(s: &str) -> String {
    demangle_one(s).unwrap_or_else(|| s.to_string())
}
