// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! [`ComputeBackend`](crate::ComputeBackend) implementations.
//!
//! - [`HostBackend`] - in-process reference with a lifecycle log, always built
//! - `OpenClBackend` - real accelerator via `opencl3` (`opencl` feature, on by default)
//!
//! Library users who only need the host backend can opt out:
//!
//! ```toml
//! [dependencies]
//! vector-combine = { version = "0.1", default-features = false }
//! ```

mod host;

#[cfg(feature = "opencl")]
mod opencl;

pub use host::{
    FailurePoint, HostBackend, HostBuffer, HostContext, HostDevice, HostKernel, HostKernelFn,
    HostProgram, HostQueue, LifecycleEvent, LifecycleLog, Resource,
};

#[cfg(feature = "opencl")]
pub use opencl::{ClBuffer, OpenClBackend};
