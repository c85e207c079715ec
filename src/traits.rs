// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Shared traits: configuration validation and the accelerator backend seam.
//!
//! ## Core Traits
//!
//! - [`ValidatableConfig`] - Configuration validation interface
//! - [`ComputeBackend`] - Everything a session needs from an accelerator API
//!
//! ## Resource Ownership
//!
//! Each associated handle type of [`ComputeBackend`] owns one accelerator
//! resource and releases it in its `Drop` impl. A session never calls a
//! release function directly; release order follows from ownership and drop
//! order, so a resource is released exactly once and only if it was created.

use crate::device::{DeviceInfo, DeviceSelector};
use crate::error::Result;
use crate::source::KernelSource;
use std::fmt;

/// Configuration validation trait.
///
/// # Example
///
/// ```rust
/// use vector_combine::{CombineError, Result, ValidatableConfig};
///
/// #[derive(Clone)]
/// struct LaunchConfig {
///     local_work_size: usize,
/// }
///
/// impl ValidatableConfig for LaunchConfig {
///     fn validate(&self) -> Result<()> {
///         if self.local_work_size == 0 {
///             return Err(CombineError::invalid_config("local work size must be > 0"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait ValidatableConfig: Clone + Send + Sync {
    /// Validate the configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns `CombineError::InvalidConfig` if validation fails.
    fn validate(&self) -> Result<()>;
}

/// One of the three device regions a session owns.
///
/// The discriminant order is also the kernel argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferSlot {
    /// First input operand.
    A,
    /// Second input operand.
    B,
    /// Output written by the kernel.
    C,
}

impl BufferSlot {
    /// All slots in allocation and argument order.
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    /// Positional kernel argument index.
    #[must_use]
    pub fn arg_index(self) -> u32 {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl fmt::Display for BufferSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One-dimensional dispatch geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    /// Total number of work-items.
    pub global: usize,
    /// Work-items per work-group.
    pub local: usize,
}

impl WorkRange {
    /// Create a range of `global` work-items in groups of `local`.
    #[must_use]
    pub fn new(global: usize, local: usize) -> Self {
        Self { global, local }
    }

    /// Number of work-groups, if `local` evenly divides `global`.
    #[must_use]
    pub fn groups(&self) -> Option<usize> {
        if self.local == 0 || self.global % self.local != 0 {
            None
        } else {
            Some(self.global / self.local)
        }
    }
}

/// An accelerator API as seen by a [`crate::Session`].
///
/// Methods are listed in lifecycle order. Every call is blocking; when it
/// returns `Ok`, the operation has completed on the device.
///
/// Implementations must release the underlying resource when a handle is
/// dropped and must not release anything else.
pub trait ComputeBackend {
    /// Selected device. Devices are not reference-counted resources.
    type Device;
    /// Execution context bound to one device.
    type Context;
    /// In-order command queue on a context.
    type Queue;
    /// Device-resident `f32` region.
    type Buffer;
    /// Compiled program.
    type Program;
    /// Kernel instance resolved from a program.
    type Kernel;

    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Enumerate platforms and devices and pick one according to `selector`.
    ///
    /// # Errors
    ///
    /// Returns `CombineError::DeviceNotAvailable` if nothing matches.
    fn discover(&self, selector: &DeviceSelector) -> Result<(Self::Device, DeviceInfo)>;

    /// Create an execution context on `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if the accelerator API rejects the request.
    fn create_context(&self, device: &Self::Device) -> Result<Self::Context>;

    /// Create a command queue on `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the accelerator API rejects the request.
    fn create_queue(&self, context: &Self::Context, device: &Self::Device)
        -> Result<Self::Queue>;

    /// Allocate a read-write region of `len` elements for `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation fails.
    fn create_buffer(
        &self,
        context: &Self::Context,
        slot: BufferSlot,
        len: usize,
    ) -> Result<Self::Buffer>;

    /// Blocking host → device copy of `data` into `buffer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails or the lengths disagree.
    fn write_buffer(
        &self,
        queue: &Self::Queue,
        buffer: &mut Self::Buffer,
        data: &[f32],
    ) -> Result<()>;

    /// Compile `source` for `device`.
    ///
    /// # Errors
    ///
    /// Returns `CombineError::Compilation` with the build log on failure.
    fn build_program(
        &self,
        context: &Self::Context,
        device: &Self::Device,
        source: &KernelSource,
    ) -> Result<Self::Program>;

    /// Resolve the entry point `name` in `program`.
    ///
    /// # Errors
    ///
    /// Returns an error if the program has no such entry point.
    fn create_kernel(&self, program: &Self::Program, name: &str) -> Result<Self::Kernel>;

    /// Bind `buffer` as positional argument `index` of `kernel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or argument type is rejected.
    fn set_buffer_arg(
        &self,
        kernel: &mut Self::Kernel,
        index: u32,
        buffer: &Self::Buffer,
    ) -> Result<()>;

    /// Execute `kernel` over `range` and wait for completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the launch or execution fails.
    fn dispatch(&self, queue: &Self::Queue, kernel: &Self::Kernel, range: WorkRange)
        -> Result<()>;

    /// Blocking device → host copy of `buffer` into `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails or the lengths disagree.
    fn read_buffer(&self, queue: &Self::Queue, buffer: &Self::Buffer, out: &mut [f32])
        -> Result<()>;

    /// Flush `queue` and wait until all queued work has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be drained.
    fn drain(&self, queue: &Self::Queue) -> Result<()>;
}
