// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Run configuration.
//!
//! The program itself always runs with [`CombineConfig::default`]; the
//! builder methods exist for library callers and tests.

use crate::device::DeviceSelector;
use crate::error::{CombineError, Result};
use crate::source::MAX_SOURCE_SIZE;
use crate::traits::ValidatableConfig;
use std::path::PathBuf;

/// Relative path of the companion kernel source.
pub const DEFAULT_KERNEL_PATH: &str = "hello.cl";

/// Entry point resolved from the compiled program.
pub const DEFAULT_ENTRY_POINT: &str = "hello";

/// Work-items per work-group.
pub const DEFAULT_LOCAL_WORK_SIZE: usize = 1;

/// Settings for one combine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineConfig {
    /// Where the kernel source is read from.
    pub kernel_path: PathBuf,
    /// Kernel function to instantiate.
    pub entry_point: String,
    /// Platform/device choice.
    pub device: DeviceSelector,
    /// Work-group size used for dispatch.
    pub local_work_size: usize,
    /// Source bytes beyond this are dropped.
    pub max_source_bytes: usize,
    /// Device memory budget in bytes (0 = no limit).
    pub memory_limit: usize,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            kernel_path: PathBuf::from(DEFAULT_KERNEL_PATH),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            device: DeviceSelector::default(),
            local_work_size: DEFAULT_LOCAL_WORK_SIZE,
            max_source_bytes: MAX_SOURCE_SIZE,
            memory_limit: 0,
        }
    }
}

impl CombineConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the kernel source path.
    #[must_use]
    pub fn with_kernel_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kernel_path = path.into();
        self
    }

    /// Set the kernel entry point.
    #[must_use]
    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }

    /// Set the device selector.
    #[must_use]
    pub fn with_device(mut self, selector: DeviceSelector) -> Self {
        self.device = selector;
        self
    }

    /// Set the work-group size.
    #[must_use]
    pub fn with_local_work_size(mut self, size: usize) -> Self {
        self.local_work_size = size;
        self
    }

    /// Set the source size limit in bytes.
    #[must_use]
    pub fn with_max_source_bytes(mut self, bytes: usize) -> Self {
        self.max_source_bytes = bytes;
        self
    }

    /// Set the device memory budget in bytes.
    #[must_use]
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = bytes;
        self
    }
}

impl ValidatableConfig for CombineConfig {
    fn validate(&self) -> Result<()> {
        if self.entry_point.trim().is_empty() {
            return Err(CombineError::invalid_config("entry point must not be empty"));
        }
        if self.local_work_size == 0 {
            return Err(CombineError::invalid_config(
                "local work size must be greater than 0",
            ));
        }
        if self.max_source_bytes == 0 {
            return Err(CombineError::invalid_config(
                "source size limit must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CombineConfig::default();
        assert_eq!(config.kernel_path, PathBuf::from("hello.cl"));
        assert_eq!(config.entry_point, "hello");
        assert_eq!(config.local_work_size, 1);
        assert_eq!(config.max_source_bytes, 0x10_0000);
        assert_eq!(config.memory_limit, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = CombineConfig::new()
            .with_kernel_path("kernels/add.cl")
            .with_entry_point("add")
            .with_local_work_size(4)
            .with_max_source_bytes(128)
            .with_memory_limit(192);

        assert_eq!(config.kernel_path, PathBuf::from("kernels/add.cl"));
        assert_eq!(config.entry_point, "add");
        assert_eq!(config.local_work_size, 4);
        assert_eq!(config.max_source_bytes, 128);
        assert_eq!(config.memory_limit, 192);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(CombineConfig::new().with_entry_point("  ").validate().is_err());
        assert!(CombineConfig::new().with_local_work_size(0).validate().is_err());
        assert!(CombineConfig::new().with_max_source_bytes(0).validate().is_err());
    }
}
