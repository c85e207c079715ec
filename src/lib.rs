// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! # vector-combine
//!
//! Combine two `f32` buffers elementwise on a compute accelerator: upload A
//! and B, run one externally supplied kernel, read C back.
//!
//! ## Design Philosophy
//!
//! **Scoped acquisition**: every accelerator resource is owned by a value
//! whose `Drop` releases it. A [`Session`] is built from those values in
//! acquisition order and declares them in release order, so teardown is
//! symmetric on success and on every early failure.
//!
//! **Results everywhere**: each accelerator call returns a [`Result`]; build
//! and dispatch failures are fatal errors, never silently ignored.
//!
//! ## Modules
//!
//! - [`session`] - Acquisition, staging, dispatch, retrieval, teardown
//! - [`backend`] - Host reference backend and the `OpenCL` backend
//! - [`traits`] - [`ComputeBackend`] seam and config validation
//! - [`buffer`] - Fixed-length numeric containers
//! - [`grid`] - Row/column output formatting
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust
//! use vector_combine::backend::HostBackend;
//! use vector_combine::{combine_with_source, CombineConfig, FixedVector, KernelSource, Result};
//!
//! fn main() -> Result<()> {
//!     let backend = HostBackend::new().with_kernel("hello", |a, b| a * b);
//!     let source = KernelSource::from_text("__kernel void hello(float* A, float* B, float* C) {}");
//!
//!     let a = FixedVector::<f32, 4>::indexed();
//!     let c = combine_with_source(&backend, &CombineConfig::default(), &source, &a, &a)?;
//!     assert_eq!(c.as_slice(), &[0.0, 1.0, 4.0, 9.0]);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `opencl` (default) - The `OpenCL` backend and the `vector-combine` binary.
//!   The ICD loader is resolved at runtime, so hosts without `OpenCL` still
//!   build and report `DeviceNotAvailable` at discovery

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod buffer;
pub mod config;
pub mod device;
pub mod error;
pub mod facade;
pub mod grid;
pub mod logging;
pub mod memory;
pub mod session;
pub mod source;
pub mod traits;

// Re-exports for convenience
pub use buffer::{Element, FixedVector};
pub use config::{CombineConfig, DEFAULT_ENTRY_POINT, DEFAULT_KERNEL_PATH};
pub use device::{warn_if_cpu, DeviceInfo, DeviceKind, DeviceSelector};
pub use error::{CombineError, ErrorClass, Result};
pub use facade::{
    combine, combine_with_source, indexed_inputs, Vector16, VectorCombine, GRID_COLUMNS,
    INPUT_LEN,
};
pub use grid::{format_grid, write_grid};
pub use logging::{init_logging, LogConfig, LogLevel};
pub use memory::{estimate_buffer_bytes, estimate_session_bytes, MemoryTracker};
pub use session::Session;
pub use source::{KernelSource, MAX_SOURCE_SIZE};
pub use traits::{BufferSlot, ComputeBackend, ValidatableConfig, WorkRange};
