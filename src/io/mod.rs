//! Bounded, read-only access to the image under analysis.
//!
//! The whole file is memory-mapped once and handed to the PE parser as a
//! byte slice. The only limit enforced is the total file size, checked before
//! mapping so oversized inputs never touch the address space.

pub mod error;

use crate::io::error::{IoError, Result};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default ceiling on the size of an image we are willing to map (512 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Resource limits for opening an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
}

impl Default for ReaderLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// A read-only memory map of an executable image.
pub struct MappedImage {
    path: PathBuf,
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    file_size: u64,
}

impl MappedImage {
    /// Opens `path` and maps it read-only, refusing files above
    /// `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: &ReaderLimits) -> Result<Self> {
        let path = path.as_ref();
        let open_err = |source| IoError::Open {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(open_err)?;
        let file_size = file.metadata().map_err(open_err)?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening image"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File is too large"
            );
            return Err(IoError::FileTooLarge {
                path: path.to_path_buf(),
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map of a regular file; the mapping is never
            // handed out mutably.
            let map = unsafe { Mmap::map(&file) }.map_err(|source| IoError::Map {
                path: path.to_path_buf(),
                source,
            })?;
            Some(map)
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            file_size,
        })
    }

    /// Path the image was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the underlying file in bytes.
    pub fn size(&self) -> u64 {
        self.file_size
    }

    /// The mapped contents; empty for a zero-length file.
    pub fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}
