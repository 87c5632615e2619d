// Vulkan Device - adapter queries + logical device
//
// Responsibilities:
// - Describe every physical device for the selector (kind, version,
//   queue families, presentation support against our surface)
// - Logical device + queue creation for the selected GPU

use ash::vk;
use std::ffi::{c_char, CStr};

use super::VulkanInstance;
use crate::error::BootstrapError;
use crate::handles::{
    AdapterInfo, ApiVersion, PhysicalDevice, QueueFamilies, QueueFamilySupport, SelectedDevice,
};

/// Query every GPU the instance can see.
pub fn enumerate_adapters(
    instance: &VulkanInstance,
    surface: vk::SurfaceKHR,
) -> Result<Vec<AdapterInfo<vk::PhysicalDevice>>, BootstrapError> {
    let devices = unsafe { instance.raw().enumerate_physical_devices() }
        .map_err(BootstrapError::DeviceQueryFailed)?;

    log::debug!("Found {} physical device(s)", devices.len());

    Ok(devices
        .into_iter()
        .enumerate()
        .map(|(index, device)| describe_adapter(instance, surface, index, device))
        .collect())
}

fn describe_adapter(
    instance: &VulkanInstance,
    surface: vk::SurfaceKHR,
    index: usize,
    device: vk::PhysicalDevice,
) -> AdapterInfo<vk::PhysicalDevice> {
    let raw = instance.raw();
    let props = unsafe { raw.get_physical_device_properties(device) };
    let name = unsafe { CStr::from_ptr(props.device_name.as_ptr()) }
        .to_string_lossy()
        .into_owned();

    let queue_families = unsafe { raw.get_physical_device_queue_family_properties(device) }
        .iter()
        .enumerate()
        .map(|(family, family_props)| {
            let present = unsafe {
                instance.surface_loader().get_physical_device_surface_support(
                    device,
                    family as u32,
                    surface,
                )
            }
            .unwrap_or_else(|code| {
                log::debug!("Present support query failed on '{}' family {}: {}", name, family, code);
                false
            });

            QueueFamilySupport {
                graphics: family_props.queue_flags.contains(vk::QueueFlags::GRAPHICS),
                present,
            }
        })
        .collect();

    let supports_swapchain = match unsafe { raw.enumerate_device_extension_properties(device) } {
        Ok(extensions) => extensions.iter().any(|ext| {
            let ext_name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
            ext_name == ash::khr::swapchain::NAME
        }),
        Err(code) => {
            log::debug!("Extension query failed on '{}': {}", name, code);
            false
        }
    };

    AdapterInfo {
        device: PhysicalDevice::new(device),
        index,
        name,
        kind: props.device_type.into(),
        api_version: ApiVersion::from_raw(props.api_version),
        queue_families,
        supports_swapchain,
    }
}

/// Logical device with its default queues.
pub struct VulkanDevice {
    device: ash::Device,
    physical_device: vk::PhysicalDevice,
    queue_families: QueueFamilies,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
}

impl VulkanDevice {
    pub fn new(
        instance: &VulkanInstance,
        selected: &SelectedDevice<vk::PhysicalDevice>,
    ) -> Result<Self, BootstrapError> {
        let physical_device = selected.physical_device().raw();
        let queue_families = selected.queues;

        let queue_priorities = [1.0];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = queue_families
            .unique()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        // Required device extensions
        #[allow(unused_mut)]
        let mut extensions: Vec<*const c_char> = vec![ash::khr::swapchain::NAME.as_ptr()];
        #[cfg(target_os = "macos")]
        extensions.push(ash::khr::portability_subset::NAME.as_ptr());

        let features = vk::PhysicalDeviceFeatures::default();
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .raw()
                .create_device(physical_device, &create_info, None)
        }
        .map_err(BootstrapError::DeviceCreationFailed)?;

        let graphics_queue = unsafe { device.get_device_queue(queue_families.graphics, 0) };
        let present_queue = unsafe { device.get_device_queue(queue_families.present, 0) };

        log::info!(
            "Logical device created on '{}' (graphics family {}, present family {})",
            selected.adapter.name,
            queue_families.graphics,
            queue_families.present
        );

        Ok(Self {
            device,
            physical_device,
            queue_families,
            graphics_queue,
            present_queue,
        })
    }

    pub fn raw(&self) -> &ash::Device {
        &self.device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn queue_families(&self) -> QueueFamilies {
        self.queue_families
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Wait for device to be idle (e.g., before cleanup)
    pub fn wait_idle(&self) -> Result<(), vk::Result> {
        unsafe { self.device.device_wait_idle() }
    }

    pub(crate) fn destroy(self) {
        log::debug!("Destroying logical device");

        if let Err(code) = self.wait_idle() {
            log::warn!("device_wait_idle failed before destruction: {}", code);
        }
        unsafe { self.device.destroy_device(None) };
    }
}
