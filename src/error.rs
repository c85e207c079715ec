// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Error types for the vector-combine pipeline.
//!
//! Every accelerator call returns a [`Result`]; nothing is silently discarded.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CombineError
//! ├── DeviceNotAvailable  - No platform/device to run on (class a)
//! ├── KernelSource        - Kernel source file unreadable (class b)
//! ├── Compilation         - Kernel program failed to build (class c)
//! ├── KernelError         - Argument binding or dispatch failure (class d)
//! ├── Api                 - Raw accelerator status code from a named call
//! ├── ShapeMismatch       - Host/device buffer length disagreement
//! ├── InvalidConfig       - Configuration validation failures
//! └── OutOfMemory         - Device memory budget exhausted
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vector-combine operations.
pub type Result<T> = std::result::Result<T, CombineError>;

/// Coarse failure class, used for diagnostics and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// No accelerator platform or device could be acquired.
    ResourceUnavailable,
    /// The kernel source resource could not be read.
    ResourceIo,
    /// The kernel source did not compile.
    Compilation,
    /// Argument binding, dispatch, or transfer failed at runtime.
    Dispatch,
    /// Anything else (configuration, memory budget, ...).
    Other,
}

/// Errors raised while acquiring, driving, or releasing an accelerator session.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CombineError {
    /// Requested platform or device is not available.
    #[error("device not available: {device}")]
    DeviceNotAvailable {
        /// Description of the missing platform/device.
        device: String,
    },

    /// Kernel source could not be opened or read.
    #[error("failed to load kernel source {}: {source}", path.display())]
    KernelSource {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Program build failed.
    ///
    /// Carries whatever build log the backend produced.
    #[error("kernel compilation failed: {log}")]
    Compilation {
        /// Compiler diagnostic text.
        log: String,
    },

    /// Kernel instantiation, argument binding, or execution failure.
    #[error("kernel error: {message}")]
    KernelError {
        /// Descriptive error message.
        message: String,
    },

    /// Non-success status code returned by an accelerator API call.
    #[error("{call} failed with status {code}")]
    Api {
        /// Name of the API entry point.
        call: &'static str,
        /// Raw status code.
        code: i32,
    },

    /// Buffer length mismatch.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        /// Expected element count.
        expected: usize,
        /// Actual element count.
        actual: usize,
    },

    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Device memory budget exceeded.
    #[error("out of memory: {message}")]
    OutOfMemory {
        /// Descriptive error message.
        message: String,
    },
}

impl CombineError {
    /// Create a device not available error.
    pub fn device_not_available(device: impl Into<String>) -> Self {
        Self::DeviceNotAvailable {
            device: device.into(),
        }
    }

    /// Create a kernel source error for `path`.
    pub fn kernel_source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::KernelSource {
            path: path.into(),
            source,
        }
    }

    /// Create a compilation error carrying the build log.
    pub fn compilation(log: impl Into<String>) -> Self {
        Self::Compilation { log: log.into() }
    }

    /// Create a kernel error.
    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::KernelError {
            message: msg.into(),
        }
    }

    /// Create an API status error.
    #[must_use]
    pub fn api(call: &'static str, code: i32) -> Self {
        Self::Api { call, code }
    }

    /// Create a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an out of memory error.
    pub fn oom(msg: impl Into<String>) -> Self {
        Self::OutOfMemory {
            message: msg.into(),
        }
    }

    /// Failure class of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::DeviceNotAvailable { .. } => ErrorClass::ResourceUnavailable,
            Self::KernelSource { .. } => ErrorClass::ResourceIo,
            Self::Compilation { .. } => ErrorClass::Compilation,
            Self::KernelError { .. } | Self::Api { .. } | Self::ShapeMismatch { .. } => {
                ErrorClass::Dispatch
            }
            Self::InvalidConfig(_) | Self::OutOfMemory { .. } => ErrorClass::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CombineError::invalid_config("entry point must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid configuration: entry point must not be empty"
        );

        let err = CombineError::shape_mismatch(16, 4);
        assert_eq!(err.to_string(), "shape mismatch: expected 16 elements, got 4");

        let err = CombineError::api("clEnqueueNDRangeKernel", -54);
        assert_eq!(
            err.to_string(),
            "clEnqueueNDRangeKernel failed with status -54"
        );
    }

    #[test]
    fn test_kernel_source_display_includes_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = CombineError::kernel_source("./hello.cl", io);
        let msg = err.to_string();
        assert!(msg.contains("./hello.cl"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            CombineError::device_not_available("platform 0").class(),
            ErrorClass::ResourceUnavailable
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(
            CombineError::kernel_source("k.cl", io).class(),
            ErrorClass::ResourceIo
        );
        assert_eq!(
            CombineError::compilation("syntax error").class(),
            ErrorClass::Compilation
        );
        assert_eq!(CombineError::kernel("bad arg").class(), ErrorClass::Dispatch);
        assert_eq!(CombineError::api("clFinish", -5).class(), ErrorClass::Dispatch);
        assert_eq!(CombineError::oom("budget").class(), ErrorClass::Other);
    }

    #[test]
    fn test_kernel_source_keeps_io_cause() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CombineError::kernel_source("hello.cl", io);
        let cause = err.source().expect("io cause");
        assert_eq!(cause.to_string(), "denied");
    }
}
