// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! OpenCL backend built on `opencl3`.
//!
//! The `opencl3` handle types release their object in `Drop`, so they are
//! used directly as the [`ComputeBackend`] associated types. Every status
//! code is mapped to a [`CombineError`] naming the failing call.

use crate::device::{DeviceInfo, DeviceKind, DeviceSelector};
use crate::error::{CombineError, Result};
use crate::source::KernelSource;
use crate::traits::{BufferSlot, ComputeBackend, WorkRange};
use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::{
    Device, CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU,
    CL_DEVICE_TYPE_DEFAULT, CL_DEVICE_TYPE_GPU,
};
use opencl3::error_codes::{ClError, CL_DEVICE_NOT_FOUND};
use opencl3::kernel::Kernel;
use opencl3::memory::{Buffer, ClMem, CL_MEM_READ_WRITE};
use opencl3::platform::get_platforms;
use opencl3::program::Program;
use opencl3::types::{cl_device_type, cl_float, CL_BLOCKING};
use std::ptr;

fn api(call: &'static str) -> impl FnOnce(ClError) -> CombineError {
    move |err| CombineError::api(call, err.0)
}

fn device_type_mask(kind: DeviceKind) -> cl_device_type {
    match kind {
        DeviceKind::Default => CL_DEVICE_TYPE_DEFAULT,
        DeviceKind::Gpu => CL_DEVICE_TYPE_GPU,
        DeviceKind::Cpu => CL_DEVICE_TYPE_CPU,
        DeviceKind::Accelerator => CL_DEVICE_TYPE_ACCELERATOR,
        DeviceKind::All => CL_DEVICE_TYPE_ALL,
    }
}

fn device_kind(mask: cl_device_type) -> DeviceKind {
    if mask & CL_DEVICE_TYPE_GPU != 0 {
        DeviceKind::Gpu
    } else if mask & CL_DEVICE_TYPE_CPU != 0 {
        DeviceKind::Cpu
    } else if mask & CL_DEVICE_TYPE_ACCELERATOR != 0 {
        DeviceKind::Accelerator
    } else {
        DeviceKind::Default
    }
}

/// A platform without devices of the requested type reports
/// `CL_DEVICE_NOT_FOUND`; that is an empty list, not an API failure.
fn matching_devices<T>(result: std::result::Result<Vec<T>, ClError>) -> Result<Vec<T>> {
    match result {
        Ok(ids) => Ok(ids),
        Err(ClError(CL_DEVICE_NOT_FOUND)) => Ok(Vec::new()),
        Err(err) => Err(CombineError::api("clGetDeviceIDs", err.0)),
    }
}

/// OpenCL accelerator backend.
///
/// The ICD loader is resolved at runtime; on a machine without an OpenCL
/// runtime, discovery fails with `DeviceNotAvailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenClBackend;

impl OpenClBackend {
    /// Create the backend. No OpenCL call is made until discovery.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// An OpenCL region together with its element count.
#[derive(Debug)]
pub struct ClBuffer {
    inner: Buffer<cl_float>,
    slot: BufferSlot,
    len: usize,
}

impl ComputeBackend for OpenClBackend {
    type Device = Device;
    type Context = Context;
    type Queue = CommandQueue;
    type Buffer = ClBuffer;
    type Program = Program;
    type Kernel = Kernel;

    fn name(&self) -> &'static str {
        "opencl"
    }

    fn discover(&self, selector: &DeviceSelector) -> Result<(Device, DeviceInfo)> {
        let platforms = get_platforms().map_err(|err| {
            CombineError::device_not_available(format!(
                "no accelerator platform found (clGetPlatformIDs status {})",
                err.0
            ))
        })?;
        let platform = platforms.get(selector.platform_index).ok_or_else(|| {
            CombineError::device_not_available(format!(
                "platform {} (found {})",
                selector.platform_index,
                platforms.len()
            ))
        })?;

        let ids = matching_devices(platform.get_devices(device_type_mask(selector.kind)))?;
        let id = ids.get(selector.device_index).copied().ok_or_else(|| {
            CombineError::device_not_available(format!(
                "{} device {} on platform {} (found {})",
                selector.kind,
                selector.device_index,
                selector.platform_index,
                ids.len()
            ))
        })?;

        let device = Device::new(id);
        let info = DeviceInfo {
            platform_name: platform.name().map_err(api("clGetPlatformInfo"))?,
            device_name: device.name().map_err(api("clGetDeviceInfo"))?,
            kind: device_kind(device.dev_type().map_err(api("clGetDeviceInfo"))?),
        };
        Ok((device, info))
    }

    fn create_context(&self, device: &Device) -> Result<Context> {
        Context::from_device(device).map_err(api("clCreateContext"))
    }

    // clCreateCommandQueue is deprecated from 2.0 but is the call 1.x devices accept.
    #[allow(deprecated)]
    fn create_queue(&self, context: &Context, _device: &Device) -> Result<CommandQueue> {
        // The context holds exactly the selected device, so the default
        // device of the context is that device.
        CommandQueue::create_default(context, 0).map_err(api("clCreateCommandQueue"))
    }

    fn create_buffer(&self, context: &Context, slot: BufferSlot, len: usize) -> Result<ClBuffer> {
        // SAFETY: no host pointer is passed, so the runtime owns the storage.
        let inner = unsafe {
            Buffer::<cl_float>::create(context, CL_MEM_READ_WRITE, len, ptr::null_mut())
        }
        .map_err(api("clCreateBuffer"))?;
        Ok(ClBuffer { inner, slot, len })
    }

    fn write_buffer(&self, queue: &CommandQueue, buffer: &mut ClBuffer, data: &[f32]) -> Result<()> {
        if data.len() != buffer.len {
            return Err(CombineError::shape_mismatch(buffer.len, data.len()));
        }
        // SAFETY: the write is blocking, so `data` outlives the transfer.
        unsafe { queue.enqueue_write_buffer(&mut buffer.inner, CL_BLOCKING, 0, data, &[]) }
            .map_err(api("clEnqueueWriteBuffer"))?;
        tracing::trace!(slot = %buffer.slot, "blocking write complete");
        Ok(())
    }

    fn build_program(
        &self,
        context: &Context,
        _device: &Device,
        source: &KernelSource,
    ) -> Result<Program> {
        // The error string carries the build log for every device in the context.
        Program::create_and_build_from_source(context, source.text(), "")
            .map_err(CombineError::compilation)
    }

    fn create_kernel(&self, program: &Program, name: &str) -> Result<Kernel> {
        Kernel::create(program, name).map_err(|err| {
            CombineError::kernel(format!("clCreateKernel(`{name}`) failed with status {}", err.0))
        })
    }

    fn set_buffer_arg(&self, kernel: &mut Kernel, index: u32, buffer: &ClBuffer) -> Result<()> {
        let mem = buffer.inner.get();
        // SAFETY: `mem` is a live cl_mem owned by the session for longer than
        // the kernel; the argument size matches a `__global float*` parameter.
        unsafe { kernel.set_arg(index, &mem) }.map_err(|err| {
            CombineError::kernel(format!(
                "clSetKernelArg({index}, {}) failed with status {}",
                buffer.slot, err.0
            ))
        })
    }

    fn dispatch(&self, queue: &CommandQueue, kernel: &Kernel, range: WorkRange) -> Result<()> {
        let global = [range.global];
        let local = [range.local];
        // SAFETY: the work sizes point at live one-element arrays matching
        // work_dim = 1, and every kernel argument was bound at session open.
        let event = unsafe {
            queue.enqueue_nd_range_kernel(
                kernel.get(),
                1,
                ptr::null(),
                global.as_ptr(),
                local.as_ptr(),
                &[],
            )
        }
        .map_err(api("clEnqueueNDRangeKernel"))?;
        event.wait().map_err(api("clWaitForEvents"))
    }

    fn read_buffer(&self, queue: &CommandQueue, buffer: &ClBuffer, out: &mut [f32]) -> Result<()> {
        if out.len() != buffer.len {
            return Err(CombineError::shape_mismatch(buffer.len, out.len()));
        }
        // SAFETY: the read is blocking, so `out` is filled before we return.
        unsafe { queue.enqueue_read_buffer(&buffer.inner, CL_BLOCKING, 0, out, &[]) }
            .map_err(api("clEnqueueReadBuffer"))?;
        Ok(())
    }

    fn drain(&self, queue: &CommandQueue) -> Result<()> {
        queue.flush().map_err(api("clFlush"))?;
        queue.finish().map_err(api("clFinish"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencl3::error_codes::CL_INVALID_PLATFORM;

    #[test]
    fn test_device_type_mapping() {
        assert_eq!(device_type_mask(DeviceKind::Gpu), CL_DEVICE_TYPE_GPU);
        assert_eq!(device_kind(CL_DEVICE_TYPE_GPU), DeviceKind::Gpu);
        assert_eq!(device_kind(CL_DEVICE_TYPE_CPU), DeviceKind::Cpu);
        assert_eq!(
            device_kind(CL_DEVICE_TYPE_ACCELERATOR),
            DeviceKind::Accelerator
        );
        assert_eq!(device_kind(CL_DEVICE_TYPE_DEFAULT), DeviceKind::Default);
    }

    #[test]
    fn test_device_not_found_is_an_empty_list() {
        let ids = matching_devices::<u8>(Err(ClError(CL_DEVICE_NOT_FOUND))).unwrap();
        assert!(ids.is_empty());
        assert_eq!(matching_devices(Ok(vec![1u8, 2])).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_other_device_query_failures_propagate() {
        let err = matching_devices::<u8>(Err(ClError(CL_INVALID_PLATFORM))).unwrap_err();
        assert!(matches!(
            err,
            CombineError::Api {
                call: "clGetDeviceIDs",
                code: CL_INVALID_PLATFORM
            }
        ));
    }

    #[test]
    fn test_discover_reports_unavailable_or_device() {
        // Passes with or without an OpenCL runtime on the test machine.
        match OpenClBackend::new().discover(&DeviceSelector::default()) {
            Ok((_, info)) => assert!(!info.device_name.is_empty()),
            Err(err) => assert!(matches!(err, CombineError::DeviceNotAvailable { .. })),
        }
    }

    #[test]
    fn test_out_of_range_platform() {
        let selector = DeviceSelector::new().with_platform_index(usize::MAX);
        let err = OpenClBackend::new().discover(&selector).unwrap_err();
        assert!(matches!(err, CombineError::DeviceNotAvailable { .. }));
    }
}
