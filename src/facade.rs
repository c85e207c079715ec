// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! High-level entry point: load the kernel, run one session, return C.
//!
//! ## Example
//!
//! ```rust
//! use vector_combine::backend::HostBackend;
//! use vector_combine::{format_grid, CombineConfig, KernelSource, VectorCombine, GRID_COLUMNS};
//!
//! let backend = HostBackend::new().with_kernel("hello", |a, b| a + b);
//! let combiner = VectorCombine::new(backend, CombineConfig::default())?;
//!
//! let source = KernelSource::from_text("__kernel void hello(float* A, float* B, float* C) {}");
//! let c = combiner.run_indexed_with_source(&source)?;
//! assert_eq!(c[15], 30.0);
//! assert_eq!(format_grid(c.as_slice(), GRID_COLUMNS).lines().count(), 4);
//! # Ok::<(), vector_combine::CombineError>(())
//! ```

use crate::buffer::FixedVector;
use crate::config::CombineConfig;
use crate::error::Result;
use crate::session::Session;
use crate::source::KernelSource;
use crate::traits::{ComputeBackend, ValidatableConfig};

/// Number of elements in each buffer.
pub const INPUT_LEN: usize = 16;

/// Values per printed row.
pub const GRID_COLUMNS: usize = 4;

/// The program's input/output buffer type.
pub type Vector16 = FixedVector<f32, INPUT_LEN>;

/// Load the kernel named by `config` and combine `a` and `b` on `backend`.
///
/// The kernel source is read before any accelerator resource is created, so
/// a missing file leaves the backend untouched.
///
/// # Errors
///
/// Returns `KernelSource` if the file cannot be read, plus every error of
/// [`Session::open`] and [`Session::run`].
pub fn combine<B: ComputeBackend, const N: usize>(
    backend: &B,
    config: &CombineConfig,
    a: &FixedVector<f32, N>,
    b: &FixedVector<f32, N>,
) -> Result<FixedVector<f32, N>> {
    config.validate()?;
    let source = KernelSource::load(&config.kernel_path, config.max_source_bytes)?;
    combine_with_source(backend, config, &source, a, b)
}

/// Combine `a` and `b` with an already loaded kernel source.
///
/// # Errors
///
/// Every error of [`Session::open`] and [`Session::run`].
pub fn combine_with_source<B: ComputeBackend, const N: usize>(
    backend: &B,
    config: &CombineConfig,
    source: &KernelSource,
    a: &FixedVector<f32, N>,
    b: &FixedVector<f32, N>,
) -> Result<FixedVector<f32, N>> {
    let session = Session::open(backend, config, source, a.as_slice(), b.as_slice())?;
    let out = session.run()?;
    drop(session);
    FixedVector::try_from_slice(&out)
}

/// A backend paired with a validated configuration.
#[derive(Debug, Clone)]
pub struct VectorCombine<B: ComputeBackend> {
    backend: B,
    config: CombineConfig,
}

impl<B: ComputeBackend> VectorCombine<B> {
    /// Validate `config` and bind it to `backend`.
    ///
    /// # Errors
    ///
    /// Returns `CombineError::InvalidConfig` if validation fails.
    pub fn new(backend: B, config: CombineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Combine two caller-supplied vectors using the configured kernel file.
    ///
    /// # Errors
    ///
    /// See [`combine`].
    pub fn combine<const N: usize>(
        &self,
        a: &FixedVector<f32, N>,
        b: &FixedVector<f32, N>,
    ) -> Result<FixedVector<f32, N>> {
        combine(&self.backend, &self.config, a, b)
    }

    /// Run the program's fixed workload: A = B = `0..16`.
    ///
    /// # Errors
    ///
    /// See [`combine`].
    pub fn run_indexed(&self) -> Result<Vector16> {
        let (a, b) = indexed_inputs();
        self.combine(&a, &b)
    }

    /// Same as [`Self::run_indexed`] with in-memory kernel source.
    ///
    /// # Errors
    ///
    /// See [`combine_with_source`].
    pub fn run_indexed_with_source(&self, source: &KernelSource) -> Result<Vector16> {
        let (a, b) = indexed_inputs();
        combine_with_source(&self.backend, &self.config, source, &a, &b)
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &CombineConfig {
        &self.config
    }
}

/// The fixed inputs: `A[k] = B[k] = k`.
#[must_use]
pub fn indexed_inputs() -> (Vector16, Vector16) {
    (Vector16::indexed(), Vector16::indexed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HostBackend;
    use crate::error::CombineError;

    const ADD: &str = "__kernel void hello(__global float* A, __global float* B, __global float* C)\n\
                       {\n    int i = get_global_id(0);\n    C[i] = A[i] + B[i];\n}\n";

    #[test]
    fn test_indexed_inputs() {
        let (a, b) = indexed_inputs();
        assert_eq!(a, b);
        assert_eq!(a[0], 0.0);
        assert_eq!(a[15], 15.0);
    }

    #[test]
    fn test_run_indexed_with_source() {
        let backend = HostBackend::new().with_kernel("hello", |a, b| a + b);
        let combiner = VectorCombine::new(backend, CombineConfig::default()).unwrap();
        let c = combiner
            .run_indexed_with_source(&KernelSource::from_text(ADD))
            .unwrap();
        for k in 0..INPUT_LEN {
            assert_eq!(c[k], 2.0 * Vector16::indexed()[k]);
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = VectorCombine::new(
            HostBackend::new(),
            CombineConfig::new().with_local_work_size(0),
        )
        .unwrap_err();
        assert!(matches!(err, CombineError::InvalidConfig(_)));
    }

    #[test]
    fn test_combine_missing_source_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = HostBackend::new().with_kernel("hello", |a, b| a + b);
        let config = CombineConfig::new().with_kernel_path(dir.path().join("hello.cl"));
        let (a, b) = indexed_inputs();

        let err = combine(&backend, &config, &a, &b).unwrap_err();
        assert!(matches!(err, CombineError::KernelSource { .. }));
        assert!(backend.log().events().is_empty());
    }
}
