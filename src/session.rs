// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Accelerator session: acquisition, staging, dispatch, retrieval, teardown.
//!
//! ## Why This Module Exists
//!
//! An accelerator API hands out raw handles that must be released by hand, in
//! the right order, and only if they were actually created. Written as a
//! straight line of calls, every early return is a chance to leak a context
//! or free a buffer a queued kernel still reads. This module turns the whole
//! protocol into one owned value: acquiring it is the setup, dropping it is
//! the teardown, and the compiler checks that nothing is used after release.
//!
//! ## Lifecycle
//!
//! ```text
//! open:  discover → context → queue → regions A, B, C → stage A, B
//!        → program → kernel → bind A, B, C
//! run:   dispatch → read C
//! drop:  drain queue → kernel → program → C → B → A → queue → context
//! ```
//!
//! Acquisition happens in local variables inside [`Session::open`]. If any
//! step fails, the locals created so far are dropped in reverse declaration
//! order, which releases exactly the resources that exist. On success the
//! locals move into the session, whose fields are declared in release order.

use crate::buffer::Element;
use crate::config::CombineConfig;
use crate::device::{warn_if_cpu, DeviceInfo};
use crate::error::{CombineError, Result};
use crate::logging::{log_memory_usage, log_transfer, TransferDirection};
use crate::memory::{estimate_buffer_bytes, estimate_session_bytes, MemoryTracker};
use crate::source::KernelSource;
use crate::traits::{BufferSlot, ComputeBackend, ValidatableConfig, WorkRange};
use std::sync::Arc;

/// A device region plus its memory accounting.
struct DeviceRegion<B: ComputeBackend> {
    buffer: B::Buffer,
    slot: BufferSlot,
    bytes: usize,
    memory: Arc<MemoryTracker>,
}

impl<B: ComputeBackend> DeviceRegion<B> {
    fn allocate(
        backend: &B,
        context: &B::Context,
        slot: BufferSlot,
        len: usize,
        memory: &Arc<MemoryTracker>,
    ) -> Result<Self> {
        let bytes = estimate_buffer_bytes::<f32>(len);
        memory.allocate(bytes)?;
        let buffer = match backend.create_buffer(context, slot, len) {
            Ok(buffer) => buffer,
            Err(err) => {
                memory.deallocate(bytes);
                return Err(err);
            }
        };
        log_memory_usage(memory.allocated_bytes(), memory.peak_bytes(), slot.label());
        Ok(Self {
            buffer,
            slot,
            bytes,
            memory: Arc::clone(memory),
        })
    }

    fn stage(&mut self, backend: &B, queue: &B::Queue, data: &[f32]) -> Result<()> {
        backend.write_buffer(queue, &mut self.buffer, data)?;
        log_transfer(
            TransferDirection::HostToDevice,
            self.slot.label(),
            f32::NAME,
            self.bytes,
        );
        Ok(())
    }
}

impl<B: ComputeBackend> Drop for DeviceRegion<B> {
    fn drop(&mut self) {
        self.memory.deallocate(self.bytes);
        tracing::trace!(slot = self.slot.label(), bytes = self.bytes, "device region released");
    }
}

/// An acquired accelerator session ready to dispatch one kernel.
///
/// ## Why This Struct
///
/// Holding every handle in one value makes release order a property of the
/// type instead of a convention at each call site. Rust drops fields in
/// declaration order, so declaring them kernel-first yields the reverse of
/// the acquisition order. A session that was never fully opened never
/// exists.
///
/// Dropping the session drains the queue and then releases every resource
/// in reverse acquisition order.
pub struct Session<'b, B: ComputeBackend> {
    // Declaration order is release order. Fields only held so that they are
    // released at the right point are never read after `open`.
    kernel: B::Kernel,
    #[allow(dead_code)]
    program: B::Program,
    c: DeviceRegion<B>,
    #[allow(dead_code)]
    b: DeviceRegion<B>,
    #[allow(dead_code)]
    a: DeviceRegion<B>,
    queue: B::Queue,
    #[allow(dead_code)]
    context: B::Context,
    #[allow(dead_code)]
    device: B::Device,
    backend: &'b B,
    info: DeviceInfo,
    memory: Arc<MemoryTracker>,
    range: WorkRange,
}

impl<'b, B: ComputeBackend> Session<'b, B> {
    /// Acquire every resource, stage `a` and `b`, build `source` and bind
    /// the kernel arguments.
    ///
    /// Configuration and input shapes are checked before the backend is
    /// touched.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` / `ShapeMismatch` before any acquisition
    /// - `DeviceNotAvailable` from discovery
    /// - `OutOfMemory` if the regions exceed `config.memory_limit`
    /// - `Compilation` if the program does not build
    /// - any backend error from the remaining steps
    pub fn open(
        backend: &'b B,
        config: &CombineConfig,
        source: &KernelSource,
        a: &[f32],
        b: &[f32],
    ) -> Result<Self> {
        config.validate()?;
        if a.len() != b.len() {
            return Err(CombineError::shape_mismatch(a.len(), b.len()));
        }
        let len = a.len();
        if len == 0 {
            return Err(CombineError::invalid_config("input buffers must not be empty"));
        }
        let range = WorkRange::new(len, config.local_work_size);
        if range.groups().is_none() {
            return Err(CombineError::invalid_config(format!(
                "local work size {} does not divide global work size {len}",
                config.local_work_size
            )));
        }
        let memory = Arc::new(MemoryTracker::with_limit(config.memory_limit));
        tracing::debug!(
            regions = BufferSlot::ALL.len(),
            element = f32::NAME,
            bytes = estimate_session_bytes::<f32>(BufferSlot::ALL.len(), len),
            "device footprint"
        );

        let (device, info) = backend.discover(&config.device)?;
        tracing::info!(backend = backend.name(), device = %info, "accelerator selected");
        warn_if_cpu(&info);

        let context = backend.create_context(&device)?;
        let queue = backend.create_queue(&context, &device)?;
        tracing::debug!("context and command queue created");

        let mut region_a = DeviceRegion::allocate(backend, &context, BufferSlot::A, len, &memory)?;
        let mut region_b = DeviceRegion::allocate(backend, &context, BufferSlot::B, len, &memory)?;
        let region_c = DeviceRegion::allocate(backend, &context, BufferSlot::C, len, &memory)?;

        region_a.stage(backend, &queue, a)?;
        region_b.stage(backend, &queue, b)?;

        let program = backend.build_program(&context, &device, source)?;
        tracing::debug!(bytes = source.len(), "program built");

        let mut kernel = backend.create_kernel(&program, &config.entry_point)?;
        for region in [&region_a, &region_b, &region_c] {
            backend.set_buffer_arg(&mut kernel, region.slot.arg_index(), &region.buffer)?;
        }
        tracing::debug!(entry_point = %config.entry_point, "kernel arguments bound");

        Ok(Self {
            kernel,
            program,
            c: region_c,
            b: region_b,
            a: region_a,
            queue,
            context,
            device,
            backend,
            info,
            memory,
            range,
        })
    }

    /// Dispatch the kernel over every element and read C back.
    ///
    /// # Errors
    ///
    /// Returns the backend error if dispatch or the read-back fails.
    pub fn run(&self) -> Result<Vec<f32>> {
        self.backend.dispatch(&self.queue, &self.kernel, self.range)?;
        tracing::debug!(
            global = self.range.global,
            local = self.range.local,
            "kernel dispatched"
        );

        let mut out = vec![0.0; self.range.global];
        self.backend.read_buffer(&self.queue, &self.c.buffer, &mut out)?;
        log_transfer(
            TransferDirection::DeviceToHost,
            self.c.slot.label(),
            f32::NAME,
            self.c.bytes,
        );
        Ok(out)
    }

    /// Selected device.
    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Number of elements per region.
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.global
    }

    /// Always `false`; sessions are never opened over empty inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.global == 0
    }

    /// Device memory accounting for this session.
    ///
    /// The tracker outlives the session when cloned; after the session is
    /// dropped its allocated count is zero.
    #[must_use]
    pub fn memory(&self) -> Arc<MemoryTracker> {
        Arc::clone(&self.memory)
    }
}

impl<B: ComputeBackend> Drop for Session<'_, B> {
    fn drop(&mut self) {
        // Queued work must finish before anything it references is released.
        if let Err(err) = self.backend.drain(&self.queue) {
            tracing::warn!(error = %err, "failed to drain command queue; releasing anyway");
        }
        tracing::debug!(backend = self.backend.name(), "releasing accelerator session");
    }
}
