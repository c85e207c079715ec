// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Deterministic platform/device selection.
//!
//! Selection is by position: the platform at `platform_index`, then the
//! device at `device_index` among that platform's devices of the requested
//! [`DeviceKind`]. The defaults pick the first of each, and nothing is read
//! from the environment.
//!
//! ## Example
//!
//! ```rust
//! use vector_combine::{DeviceKind, DeviceSelector};
//!
//! let selector = DeviceSelector::default();
//! assert_eq!(selector.platform_index, 0);
//! assert_eq!(selector.kind, DeviceKind::Default);
//!
//! let gpu = DeviceSelector::new().with_kind(DeviceKind::Gpu).with_device_index(1);
//! assert_eq!(gpu.device_index, 1);
//! ```

use std::fmt;
use std::sync::Once;

/// Accelerator device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    /// Whatever the platform reports as its default device.
    #[default]
    Default,
    /// Graphics processor.
    Gpu,
    /// Host CPU exposed as a compute device.
    Cpu,
    /// Dedicated accelerator card.
    Accelerator,
    /// Any device type.
    All,
}

impl DeviceKind {
    /// Whether a device of kind `actual` satisfies a request for `self`.
    #[must_use]
    pub fn accepts(self, actual: DeviceKind) -> bool {
        matches!(self, Self::Default | Self::All) || self == actual
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Default => "default",
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
            Self::Accelerator => "accelerator",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

/// Which platform and device to use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSelector {
    /// Position of the platform in enumeration order.
    pub platform_index: usize,
    /// Position of the device among matching devices on that platform.
    pub device_index: usize,
    /// Requested device category.
    pub kind: DeviceKind,
}

impl DeviceSelector {
    /// First platform, first default device.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the platform position.
    #[must_use]
    pub fn with_platform_index(mut self, index: usize) -> Self {
        self.platform_index = index;
        self
    }

    /// Set the device position.
    #[must_use]
    pub fn with_device_index(mut self, index: usize) -> Self {
        self.device_index = index;
        self
    }

    /// Set the requested device category.
    #[must_use]
    pub fn with_kind(mut self, kind: DeviceKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Human-readable description of the selected device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Platform (vendor implementation) name.
    pub platform_name: String,
    /// Device name.
    pub device_name: String,
    /// Device category as reported by the platform.
    pub kind: DeviceKind,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} ({})", self.platform_name, self.device_name, self.kind)
    }
}

/// Emit a one-time warning when the selected compute device is a CPU.
///
/// The program still runs; the warning only makes it visible that no
/// dedicated accelerator was picked.
pub fn warn_if_cpu(info: &DeviceInfo) {
    static WARN_ONCE: Once = Once::new();

    if info.kind == DeviceKind::Cpu {
        WARN_ONCE.call_once(|| {
            tracing::warn!(
                device = %info,
                "selected compute device is a CPU; results are correct but no accelerator is in use"
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_default_picks_first() {
        let selector = DeviceSelector::default();
        assert_eq!(selector.platform_index, 0);
        assert_eq!(selector.device_index, 0);
        assert_eq!(selector.kind, DeviceKind::Default);
    }

    #[test]
    fn test_selector_builder() {
        let selector = DeviceSelector::new()
            .with_platform_index(2)
            .with_device_index(1)
            .with_kind(DeviceKind::Accelerator);

        assert_eq!(selector.platform_index, 2);
        assert_eq!(selector.device_index, 1);
        assert_eq!(selector.kind, DeviceKind::Accelerator);
    }

    #[test]
    fn test_kind_accepts() {
        assert!(DeviceKind::Default.accepts(DeviceKind::Cpu));
        assert!(DeviceKind::All.accepts(DeviceKind::Gpu));
        assert!(DeviceKind::Gpu.accepts(DeviceKind::Gpu));
        assert!(!DeviceKind::Gpu.accepts(DeviceKind::Cpu));
    }

    #[test]
    fn test_device_info_display() {
        let info = DeviceInfo {
            platform_name: "Portable".into(),
            device_name: "cpu-0".into(),
            kind: DeviceKind::Cpu,
        };
        assert_eq!(info.to_string(), "Portable / cpu-0 (cpu)");
        warn_if_cpu(&info);
        warn_if_cpu(&info);
    }
}
