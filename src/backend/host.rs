// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! In-process reference accelerator.
//!
//! `HostBackend` runs the whole session protocol without an accelerator
//! runtime. Kernel bodies cannot be compiled on the host, so each entry point
//! is backed by a registered Rust closure `f(a, b) -> c`; the program source
//! only has to declare it as `__kernel void <name>(...)`.
//!
//! Every acquisition and release is appended to a shared [`LifecycleLog`],
//! and a [`FailurePoint`] can be armed to make one step fail. Together they
//! let tests check the release order on success and on every early exit.

use crate::device::{DeviceInfo, DeviceKind, DeviceSelector};
use crate::error::{CombineError, Result};
use crate::source::KernelSource;
use crate::traits::{BufferSlot, ComputeBackend, WorkRange};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Host implementation of a kernel entry point.
pub type HostKernelFn = Arc<dyn Fn(f32, f32) -> f32 + Send + Sync>;

type SharedData = Arc<Mutex<Vec<f32>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An accelerator resource with an explicit release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Execution context.
    Context,
    /// Command queue.
    Queue,
    /// Device memory region.
    Buffer(BufferSlot),
    /// Compiled program.
    Program,
    /// Kernel instance.
    Kernel,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context => f.write_str("context"),
            Self::Queue => f.write_str("queue"),
            Self::Buffer(slot) => write!(f, "buffer {slot}"),
            Self::Program => f.write_str("program"),
            Self::Kernel => f.write_str("kernel"),
        }
    }
}

/// One observable step of a session, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A platform and device were selected.
    Discovered,
    /// A resource was created.
    Acquired(Resource),
    /// Host data was copied into a region.
    Staged(BufferSlot),
    /// A region was bound as a kernel argument.
    ArgBound(BufferSlot),
    /// The kernel ran to completion.
    Dispatched,
    /// A region was copied back to the host.
    Retrieved(BufferSlot),
    /// The queue was flushed and finished.
    Drained,
    /// A resource was released.
    Released(Resource),
}

/// Shared, append-only record of lifecycle events.
#[derive(Debug, Clone, Default)]
pub struct LifecycleLog {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl LifecycleLog {
    fn record(&self, event: LifecycleEvent) {
        tracing::trace!(?event, "host lifecycle");
        lock(&self.events).push(event);
    }

    /// Snapshot of every event so far.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        lock(&self.events).clone()
    }

    /// Resources in the order they were acquired.
    #[must_use]
    pub fn acquired(&self) -> Vec<Resource> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                LifecycleEvent::Acquired(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    /// Resources in the order they were released.
    #[must_use]
    pub fn released(&self) -> Vec<Resource> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                LifecycleEvent::Released(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    /// Resources acquired but not (yet) released.
    #[must_use]
    pub fn outstanding(&self) -> Vec<Resource> {
        let mut live = self.acquired();
        for released in self.released() {
            if let Some(pos) = live.iter().position(|r| *r == released) {
                live.remove(pos);
            }
        }
        live
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

/// A lifecycle step that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// Context creation.
    Context,
    /// Queue creation.
    Queue,
    /// Allocation of one region.
    Buffer(BufferSlot),
    /// Host → device copy into one region.
    Write(BufferSlot),
    /// Program build.
    Build,
    /// Kernel instantiation.
    Kernel,
    /// Binding one argument.
    SetArg(BufferSlot),
    /// Kernel execution.
    Dispatch,
    /// Device → host copy.
    Read,
    /// Queue flush/finish.
    Drain,
}

impl FailurePoint {
    fn error(self) -> CombineError {
        // Status codes mirror what an OpenCL runtime reports for each call.
        match self {
            Self::Context => CombineError::api("clCreateContext", -6),
            Self::Queue => CombineError::api("clCreateCommandQueue", -6),
            Self::Buffer(_) => CombineError::api("clCreateBuffer", -4),
            Self::Write(_) => CombineError::api("clEnqueueWriteBuffer", -5),
            Self::Build => CombineError::compilation("injected build failure"),
            Self::Kernel => CombineError::kernel("injected kernel creation failure"),
            Self::SetArg(slot) => {
                CombineError::kernel(format!("injected failure binding argument {slot}"))
            }
            Self::Dispatch => CombineError::api("clEnqueueNDRangeKernel", -5),
            Self::Read => CombineError::api("clEnqueueReadBuffer", -5),
            Self::Drain => CombineError::api("clFinish", -36),
        }
    }
}

/// Releases one resource into the log when dropped.
#[derive(Debug)]
struct ReleaseGuard {
    resource: Resource,
    log: LifecycleLog,
}

impl ReleaseGuard {
    fn acquire(resource: Resource, log: &LifecycleLog) -> Self {
        log.record(LifecycleEvent::Acquired(resource));
        Self {
            resource,
            log: log.clone(),
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.log.record(LifecycleEvent::Released(self.resource));
    }
}

/// Device selected by [`HostBackend::discover`].
#[derive(Debug, Clone)]
pub struct HostDevice {
    platform: usize,
    index: usize,
}

/// Host execution context.
#[derive(Debug)]
pub struct HostContext {
    _guard: ReleaseGuard,
}

/// Host command queue.
#[derive(Debug)]
pub struct HostQueue {
    _guard: ReleaseGuard,
}

/// Host-resident stand-in for a device region.
#[derive(Debug)]
pub struct HostBuffer {
    slot: BufferSlot,
    data: SharedData,
    _guard: ReleaseGuard,
}

/// Host program: the entry points declared by the source.
#[derive(Debug)]
pub struct HostProgram {
    entry_points: Vec<String>,
    _guard: ReleaseGuard,
}

/// Host kernel: a registered closure plus its bound arguments.
pub struct HostKernel {
    name: String,
    op: HostKernelFn,
    args: [Option<(BufferSlot, SharedData)>; 3],
    _guard: ReleaseGuard,
}

impl fmt::Debug for HostKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostKernel")
            .field("name", &self.name)
            .field("bound", &self.args.iter().filter(|a| a.is_some()).count())
            .finish_non_exhaustive()
    }
}

/// Reference backend that executes kernels on the calling thread.
///
/// ```rust
/// use vector_combine::backend::HostBackend;
///
/// let backend = HostBackend::new().with_kernel("hello", |a, b| a + b);
/// assert_eq!(backend.platform_count(), 1);
/// ```
#[derive(Clone)]
pub struct HostBackend {
    platforms: usize,
    devices_per_platform: usize,
    device_kind: DeviceKind,
    kernels: HashMap<String, HostKernelFn>,
    fail_at: Option<FailurePoint>,
    log: LifecycleLog,
}

impl Default for HostBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kernels: Vec<&str> = self.kernels.keys().map(String::as_str).collect();
        kernels.sort_unstable();
        f.debug_struct("HostBackend")
            .field("platforms", &self.platforms)
            .field("devices_per_platform", &self.devices_per_platform)
            .field("device_kind", &self.device_kind)
            .field("kernels", &kernels)
            .field("fail_at", &self.fail_at)
            .finish_non_exhaustive()
    }
}

impl HostBackend {
    /// One platform with one GPU-kind device and no kernels.
    #[must_use]
    pub fn new() -> Self {
        Self {
            platforms: 1,
            devices_per_platform: 1,
            device_kind: DeviceKind::Gpu,
            kernels: HashMap::new(),
            fail_at: None,
            log: LifecycleLog::default(),
        }
    }

    /// Register the host body of entry point `name`.
    #[must_use]
    pub fn with_kernel(
        mut self,
        name: impl Into<String>,
        op: impl Fn(f32, f32) -> f32 + Send + Sync + 'static,
    ) -> Self {
        self.kernels.insert(name.into(), Arc::new(op));
        self
    }

    /// Number of platforms reported by discovery.
    #[must_use]
    pub fn with_platforms(mut self, count: usize) -> Self {
        self.platforms = count;
        self
    }

    /// Number of devices on each platform.
    #[must_use]
    pub fn with_devices(mut self, count: usize) -> Self {
        self.devices_per_platform = count;
        self
    }

    /// Category reported for every device.
    #[must_use]
    pub fn with_device_kind(mut self, kind: DeviceKind) -> Self {
        self.device_kind = kind;
        self
    }

    /// Make `point` fail when it is reached.
    #[must_use]
    pub fn failing_at(mut self, point: FailurePoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    /// Number of platforms reported by discovery.
    #[must_use]
    pub fn platform_count(&self) -> usize {
        self.platforms
    }

    /// Shared event log; clones observe the same events.
    #[must_use]
    pub fn log(&self) -> &LifecycleLog {
        &self.log
    }

    fn check(&self, point: FailurePoint) -> Result<()> {
        match self.fail_at {
            Some(armed) if armed == point => Err(point.error()),
            _ => Ok(()),
        }
    }

    fn parse_entry_points(source: &str) -> Vec<String> {
        source
            .split("__kernel")
            .skip(1)
            .filter_map(|fragment| {
                let after_void = fragment.trim_start().strip_prefix("void")?;
                let name = after_void.split('(').next()?.trim();
                let valid = !name.is_empty()
                    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                valid.then(|| name.to_string())
            })
            .collect()
    }
}

impl ComputeBackend for HostBackend {
    type Device = HostDevice;
    type Context = HostContext;
    type Queue = HostQueue;
    type Buffer = HostBuffer;
    type Program = HostProgram;
    type Kernel = HostKernel;

    fn name(&self) -> &'static str {
        "host"
    }

    fn discover(&self, selector: &DeviceSelector) -> Result<(HostDevice, DeviceInfo)> {
        if self.platforms == 0 {
            return Err(CombineError::device_not_available("no accelerator platform found"));
        }
        if selector.platform_index >= self.platforms {
            return Err(CombineError::device_not_available(format!(
                "platform {} (found {})",
                selector.platform_index, self.platforms
            )));
        }
        let matching = if selector.kind.accepts(self.device_kind) {
            self.devices_per_platform
        } else {
            0
        };
        if selector.device_index >= matching {
            return Err(CombineError::device_not_available(format!(
                "{} device {} on platform {} (found {matching})",
                selector.kind, selector.device_index, selector.platform_index
            )));
        }

        self.log.record(LifecycleEvent::Discovered);
        let device = HostDevice {
            platform: selector.platform_index,
            index: selector.device_index,
        };
        let info = DeviceInfo {
            platform_name: format!("Host Reference {}", device.platform),
            device_name: format!("host-{}", device.index),
            kind: self.device_kind,
        };
        Ok((device, info))
    }

    fn create_context(&self, _device: &HostDevice) -> Result<HostContext> {
        self.check(FailurePoint::Context)?;
        Ok(HostContext {
            _guard: ReleaseGuard::acquire(Resource::Context, &self.log),
        })
    }

    fn create_queue(&self, _context: &HostContext, _device: &HostDevice) -> Result<HostQueue> {
        self.check(FailurePoint::Queue)?;
        Ok(HostQueue {
            _guard: ReleaseGuard::acquire(Resource::Queue, &self.log),
        })
    }

    fn create_buffer(
        &self,
        _context: &HostContext,
        slot: BufferSlot,
        len: usize,
    ) -> Result<HostBuffer> {
        self.check(FailurePoint::Buffer(slot))?;
        Ok(HostBuffer {
            slot,
            data: Arc::new(Mutex::new(vec![0.0; len])),
            _guard: ReleaseGuard::acquire(Resource::Buffer(slot), &self.log),
        })
    }

    fn write_buffer(&self, _queue: &HostQueue, buffer: &mut HostBuffer, data: &[f32]) -> Result<()> {
        self.check(FailurePoint::Write(buffer.slot))?;
        let mut dst = lock(&buffer.data);
        if dst.len() != data.len() {
            return Err(CombineError::shape_mismatch(dst.len(), data.len()));
        }
        dst.copy_from_slice(data);
        self.log.record(LifecycleEvent::Staged(buffer.slot));
        Ok(())
    }

    fn build_program(
        &self,
        _context: &HostContext,
        _device: &HostDevice,
        source: &KernelSource,
    ) -> Result<HostProgram> {
        self.check(FailurePoint::Build)?;
        let text = source.text();
        if text.trim().is_empty() {
            return Err(CombineError::compilation("program source is empty"));
        }
        if text.contains("#error") {
            return Err(CombineError::compilation("#error directive in source"));
        }
        if text.matches('{').count() != text.matches('}').count() {
            return Err(CombineError::compilation("unbalanced braces"));
        }
        let entry_points = Self::parse_entry_points(text);
        if entry_points.is_empty() {
            return Err(CombineError::compilation("no __kernel entry points declared"));
        }
        Ok(HostProgram {
            entry_points,
            _guard: ReleaseGuard::acquire(Resource::Program, &self.log),
        })
    }

    fn create_kernel(&self, program: &HostProgram, name: &str) -> Result<HostKernel> {
        self.check(FailurePoint::Kernel)?;
        if !program.entry_points.iter().any(|e| e == name) {
            return Err(CombineError::kernel(format!(
                "program has no entry point named `{name}`"
            )));
        }
        let op = self.kernels.get(name).cloned().ok_or_else(|| {
            CombineError::kernel(format!("no host implementation registered for `{name}`"))
        })?;
        Ok(HostKernel {
            name: name.to_string(),
            op,
            args: [None, None, None],
            _guard: ReleaseGuard::acquire(Resource::Kernel, &self.log),
        })
    }

    fn set_buffer_arg(&self, kernel: &mut HostKernel, index: u32, buffer: &HostBuffer) -> Result<()> {
        self.check(FailurePoint::SetArg(buffer.slot))?;
        let max = kernel.args.len();
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| kernel.args.get_mut(i))
            .ok_or_else(|| {
                CombineError::kernel(format!(
                    "argument index {index} out of range for `{}` ({max} arguments)",
                    kernel.name
                ))
            })?;
        *slot = Some((buffer.slot, Arc::clone(&buffer.data)));
        self.log.record(LifecycleEvent::ArgBound(buffer.slot));
        Ok(())
    }

    fn dispatch(&self, _queue: &HostQueue, kernel: &HostKernel, range: WorkRange) -> Result<()> {
        self.check(FailurePoint::Dispatch)?;
        if range.global == 0 || range.groups().is_none() {
            return Err(CombineError::kernel(format!(
                "invalid work range: global {} local {}",
                range.global, range.local
            )));
        }
        let bound = |i: usize| {
            kernel.args[i].as_ref().map(|(_, d)| Arc::clone(d)).ok_or_else(|| {
                CombineError::kernel(format!("argument {i} of `{}` is not set", kernel.name))
            })
        };
        let (a, b, c) = (bound(0)?, bound(1)?, bound(2)?);

        // Inputs are snapshotted so A and B may alias without deadlocking on C.
        let a = lock(&a).clone();
        let b = lock(&b).clone();
        let mut c = lock(&c);
        if a.len() < range.global || b.len() < range.global || c.len() < range.global {
            return Err(CombineError::kernel(format!(
                "work range {} exceeds bound buffer length",
                range.global
            )));
        }

        // Work-items are independent; visiting them group by group is one
        // valid schedule among many.
        for group in 0..range.global / range.local {
            for lid in 0..range.local {
                let gid = group * range.local + lid;
                c[gid] = (kernel.op)(a[gid], b[gid]);
            }
        }
        self.log.record(LifecycleEvent::Dispatched);
        Ok(())
    }

    fn read_buffer(&self, _queue: &HostQueue, buffer: &HostBuffer, out: &mut [f32]) -> Result<()> {
        self.check(FailurePoint::Read)?;
        let src = lock(&buffer.data);
        if src.len() != out.len() {
            return Err(CombineError::shape_mismatch(src.len(), out.len()));
        }
        out.copy_from_slice(&src);
        self.log.record(LifecycleEvent::Retrieved(buffer.slot));
        Ok(())
    }

    fn drain(&self, _queue: &HostQueue) -> Result<()> {
        self.check(FailurePoint::Drain)?;
        self.log.record(LifecycleEvent::Drained);
        Ok(())
    }
}
