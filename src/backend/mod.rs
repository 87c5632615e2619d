// Backend module - the graphics runtime seam
//
// Design: the lifecycle coordinator only talks to `GraphicsRuntime`.
// `VulkanRuntime` is the ash implementation; tests plug in a scripted fake.
// Destroy operations only accept `Owned<T>`, so query-only handles such as
// physical devices can never reach them.

pub mod device;
pub mod instance;
pub mod surface;

use ash::vk;

use crate::config::ContextConfig;
use crate::error::BootstrapError;
use crate::handles::{AdapterInfo, Owned, SelectedDevice, WindowTarget};

pub use device::VulkanDevice;
pub use instance::{DiagnosticsChannel, VulkanInstance};

/// The operations needed to bring up and tear down a GPU context.
pub trait GraphicsRuntime {
    type Instance;
    type Messenger;
    type Surface;
    type Device;
    /// Raw physical device reference; never destroyed.
    type Adapter: Copy + std::fmt::Debug;

    fn create_instance(
        &mut self,
        config: &ContextConfig,
        window: &WindowTarget,
    ) -> Result<Self::Instance, BootstrapError>;

    fn create_diagnostics(
        &mut self,
        instance: &Self::Instance,
        config: &ContextConfig,
    ) -> Result<Self::Messenger, BootstrapError>;

    fn create_surface(
        &mut self,
        instance: &Self::Instance,
        window: &WindowTarget,
    ) -> Result<Self::Surface, BootstrapError>;

    /// Report every GPU, with presentation support checked against `surface`.
    fn enumerate_adapters(
        &mut self,
        instance: &Self::Instance,
        surface: &Self::Surface,
    ) -> Result<Vec<AdapterInfo<Self::Adapter>>, BootstrapError>;

    fn create_device(
        &mut self,
        instance: &Self::Instance,
        selected: &SelectedDevice<Self::Adapter>,
    ) -> Result<Self::Device, BootstrapError>;

    fn destroy_device(&mut self, device: Owned<Self::Device>);

    fn destroy_surface(&mut self, instance: &Self::Instance, surface: Owned<Self::Surface>);

    fn destroy_diagnostics(&mut self, instance: &Self::Instance, messenger: Owned<Self::Messenger>);

    fn destroy_instance(&mut self, instance: Owned<Self::Instance>);
}

/// Vulkan runtime backed by the system loader.
#[derive(Debug, Default)]
pub struct VulkanRuntime;

impl VulkanRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl GraphicsRuntime for VulkanRuntime {
    type Instance = VulkanInstance;
    type Messenger = DiagnosticsChannel;
    type Surface = vk::SurfaceKHR;
    type Device = VulkanDevice;
    type Adapter = vk::PhysicalDevice;

    fn create_instance(
        &mut self,
        config: &ContextConfig,
        window: &WindowTarget,
    ) -> Result<VulkanInstance, BootstrapError> {
        VulkanInstance::new(config, window)
    }

    fn create_diagnostics(
        &mut self,
        instance: &VulkanInstance,
        config: &ContextConfig,
    ) -> Result<DiagnosticsChannel, BootstrapError> {
        DiagnosticsChannel::new(instance, config.verbose_diagnostics)
    }

    fn create_surface(
        &mut self,
        instance: &VulkanInstance,
        window: &WindowTarget,
    ) -> Result<vk::SurfaceKHR, BootstrapError> {
        surface::create_surface(instance, window)
    }

    fn enumerate_adapters(
        &mut self,
        instance: &VulkanInstance,
        surface: &vk::SurfaceKHR,
    ) -> Result<Vec<AdapterInfo<vk::PhysicalDevice>>, BootstrapError> {
        device::enumerate_adapters(instance, *surface)
    }

    fn create_device(
        &mut self,
        instance: &VulkanInstance,
        selected: &SelectedDevice<vk::PhysicalDevice>,
    ) -> Result<VulkanDevice, BootstrapError> {
        VulkanDevice::new(instance, selected)
    }

    fn destroy_device(&mut self, device: Owned<VulkanDevice>) {
        device.into_inner().destroy();
    }

    fn destroy_surface(&mut self, instance: &VulkanInstance, surface: Owned<vk::SurfaceKHR>) {
        surface::destroy_surface(instance, surface.into_inner());
    }

    fn destroy_diagnostics(&mut self, _instance: &VulkanInstance, messenger: Owned<DiagnosticsChannel>) {
        messenger.into_inner().destroy();
    }

    fn destroy_instance(&mut self, instance: Owned<VulkanInstance>) {
        instance.into_inner().destroy();
    }
}
