//! Bounded, read-only file loading.
//!
//! The whole pipeline works off a single read-only memory map of the input;
//! `ImageFile` owns the map and hands out one borrowed slice. A file-size
//! ceiling guards against mapping absurd inputs.

pub mod error;

pub use error::IoError;

use crate::io::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resource limits for loading an input binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoLimits {
    /// The maximum file size that will be mapped.
    pub max_file_size: u64,
}

impl Default for IoLimits {
    fn default() -> Self {
        Self {
            max_file_size: 2 * 1024 * 1024 * 1024, // 2GiB
        }
    }
}

/// A read-only, memory-mapped input file.
pub struct ImageFile {
    path: PathBuf,
    // None when the file is empty; memmap cannot map zero bytes.
    mmap: Option<Mmap>,
    file_size: u64,
}

impl ImageFile {
    /// Open and map a file read-only.
    ///
    /// Fails if the file size exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: IoLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            "Mapping input binary"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File exceeds size limit"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map over a regular file we just opened.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.file_size
    }

    /// The full file contents.
    pub fn data(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}
