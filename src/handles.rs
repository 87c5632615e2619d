// Handle and value types shared by the runtime seam, the selector and the
// lifecycle coordinator.
//
// Owned resources (instance, messenger, surface, device) travel inside
// `Owned<T>`, which only this crate can construct. Physical devices are plain
// `Copy` query results and have no destroy path at all.

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use std::fmt;
use std::ops::Deref;

use crate::error::BootstrapError;

/// A resource the context created and must destroy exactly once.
#[derive(Debug)]
pub struct Owned<T>(T);

impl<T> Owned<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(value)
    }

    /// Release the raw resource for destruction.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Owned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Non-owning reference to a GPU, valid while its instance is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalDevice<H>(H);

impl<H: Copy> PhysicalDevice<H> {
    pub fn new(raw: H) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> H {
        self.0
    }
}

/// Vulkan API version, ordered by (major, minor, patch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ApiVersion {
    pub const V1_0: ApiVersion = ApiVersion::new(1, 0, 0);
    pub const V1_1: ApiVersion = ApiVersion::new(1, 1, 0);
    pub const V1_2: ApiVersion = ApiVersion::new(1, 2, 0);
    pub const V1_3: ApiVersion = ApiVersion::new(1, 3, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Decode a packed `VK_MAKE_API_VERSION` word. The variant bits are ignored.
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            major: vk::api_version_major(raw),
            minor: vk::api_version_minor(raw),
            patch: vk::api_version_patch(raw),
        }
    }

    pub const fn to_raw(self) -> u32 {
        vk::make_api_version(0, self.major, self.minor, self.patch)
    }
}

impl From<(u32, u32)> for ApiVersion {
    fn from((major, minor): (u32, u32)) -> Self {
        Self::new(major, minor, 0)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Kind of GPU as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Discrete,
    Integrated,
    Virtual,
    Cpu,
    Other,
}

impl DeviceKind {
    /// Selection preference, higher wins.
    pub fn score(self) -> u32 {
        match self {
            DeviceKind::Discrete => 1000,
            DeviceKind::Integrated => 100,
            DeviceKind::Virtual => 10,
            DeviceKind::Cpu => 5,
            DeviceKind::Other => 1,
        }
    }
}

impl From<vk::PhysicalDeviceType> for DeviceKind {
    fn from(ty: vk::PhysicalDeviceType) -> Self {
        match ty {
            vk::PhysicalDeviceType::DISCRETE_GPU => DeviceKind::Discrete,
            vk::PhysicalDeviceType::INTEGRATED_GPU => DeviceKind::Integrated,
            vk::PhysicalDeviceType::VIRTUAL_GPU => DeviceKind::Virtual,
            vk::PhysicalDeviceType::CPU => DeviceKind::Cpu,
            _ => DeviceKind::Other,
        }
    }
}

/// What one queue family of a device can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilySupport {
    pub graphics: bool,
    pub present: bool,
}

/// Everything the selector needs to know about one enumerated GPU.
#[derive(Debug, Clone)]
pub struct AdapterInfo<H> {
    pub device: PhysicalDevice<H>,
    /// Position in the runtime's enumeration order.
    pub index: usize,
    pub name: String,
    pub kind: DeviceKind,
    pub api_version: ApiVersion,
    /// Per-family capabilities; presentation is against the context's surface.
    pub queue_families: Vec<QueueFamilySupport>,
    pub supports_swapchain: bool,
}

/// Queue families the logical device is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    /// Distinct family indices, graphics first.
    pub fn unique(&self) -> Vec<u32> {
        if self.graphics == self.present {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// The device picked by the selector.
#[derive(Debug, Clone)]
pub struct SelectedDevice<H> {
    pub adapter: AdapterInfo<H>,
    pub queues: QueueFamilies,
}

impl<H: Copy> SelectedDevice<H> {
    pub fn physical_device(&self) -> PhysicalDevice<H> {
        self.adapter.device
    }
}

/// Raw display + window handle pair of an externally owned window.
#[derive(Debug, Clone, Copy)]
pub struct WindowTarget {
    display: RawDisplayHandle,
    window: RawWindowHandle,
}

impl WindowTarget {
    /// # Safety
    ///
    /// Both handles must refer to a live window that outlives every surface
    /// created from this target.
    pub unsafe fn new(display: RawDisplayHandle, window: RawWindowHandle) -> Self {
        Self { display, window }
    }

    /// Capture the raw handles of a window.
    ///
    /// # Safety
    ///
    /// `window` must outlive every surface created from the returned target.
    pub unsafe fn from_window<W>(window: &W) -> Result<Self, BootstrapError>
    where
        W: HasDisplayHandle + HasWindowHandle + ?Sized,
    {
        let display = window.display_handle().map_err(|e| {
            log::error!("Window has no usable display handle: {}", e);
            BootstrapError::SurfaceCreationFailed(vk::Result::ERROR_INITIALIZATION_FAILED)
        })?;
        let handle = window.window_handle().map_err(|e| {
            log::error!("Window has no usable window handle: {}", e);
            BootstrapError::SurfaceCreationFailed(vk::Result::ERROR_INITIALIZATION_FAILED)
        })?;

        Ok(Self::new(display.as_raw(), handle.as_raw()))
    }

    pub fn display(&self) -> RawDisplayHandle {
        self.display
    }

    pub fn window(&self) -> RawWindowHandle {
        self.window
    }
}
