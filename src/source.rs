// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Kernel source loading.
//!
//! The source is opaque text. It is read verbatim and silently truncated at
//! the configured byte limit; nothing here parses it.

use crate::error::{CombineError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Upper bound on the number of source bytes read from disk.
pub const MAX_SOURCE_SIZE: usize = 0x10_0000;

/// Kernel program text plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSource {
    text: String,
    origin: Option<PathBuf>,
    truncated: bool,
}

impl KernelSource {
    /// Wrap in-memory source text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: None,
            truncated: false,
        }
    }

    /// Read at most `max_bytes` from `path`.
    ///
    /// Invalid UTF-8 (including a multi-byte sequence cut by the limit) is
    /// replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `CombineError::KernelSource` if the file cannot be opened or read.
    pub fn load(path: impl AsRef<Path>, max_bytes: usize) -> Result<Self> {
        let path = path.as_ref();
        let file =
            std::fs::File::open(path).map_err(|e| CombineError::kernel_source(path, e))?;

        // Read one byte past the limit to learn whether anything was dropped.
        let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
        let mut bytes = Vec::new();
        file.take(limit)
            .read_to_end(&mut bytes)
            .map_err(|e| CombineError::kernel_source(path, e))?;

        let truncated = bytes.len() > max_bytes;
        if truncated {
            bytes.truncate(max_bytes);
            tracing::debug!(
                path = %path.display(),
                max_bytes,
                "kernel source truncated at size limit"
            );
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "kernel source loaded");
        Ok(Self {
            text: String::from_utf8_lossy(&bytes).into_owned(),
            origin: Some(path.to_path_buf()),
            truncated,
        })
    }

    /// Source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Size of the source text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// `true` if the source text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// File the source was read from, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Whether the file was longer than the size limit.
    #[must_use]
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_reads_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "__kernel void hello() {{}}").unwrap();

        let src = KernelSource::load(file.path(), MAX_SOURCE_SIZE).unwrap();
        assert_eq!(src.text(), "__kernel void hello() {}\n");
        assert_eq!(src.origin(), Some(file.path()));
        assert!(!src.was_truncated());
    }

    #[test]
    fn test_load_truncates_at_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        let src = KernelSource::load(file.path(), 4).unwrap();
        assert_eq!(src.text(), "0123");
        assert_eq!(src.len(), 4);
        assert!(src.was_truncated());

        let exact = KernelSource::load(file.path(), 10).unwrap();
        assert_eq!(exact.text(), "0123456789");
        assert!(!exact.was_truncated());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("hello.cl");
        let err = KernelSource::load(&missing, MAX_SOURCE_SIZE).unwrap_err();
        match err {
            CombineError::KernelSource { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_text() {
        let src = KernelSource::from_text("");
        assert!(src.is_empty());
        assert!(src.origin().is_none());
    }
}
