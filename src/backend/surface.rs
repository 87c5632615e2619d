// Surface Binder - window presentation target
//
// The window itself belongs to the caller; we only create and destroy the
// VkSurfaceKHR that points at it.

use ash::vk;

use super::VulkanInstance;
use crate::error::BootstrapError;
use crate::handles::WindowTarget;

pub fn create_surface(
    instance: &VulkanInstance,
    window: &WindowTarget,
) -> Result<vk::SurfaceKHR, BootstrapError> {
    // SAFETY: WindowTarget's constructors require the window to outlive the surface
    let surface = unsafe {
        ash_window::create_surface(
            instance.entry(),
            instance.raw(),
            window.display(),
            window.window(),
            None,
        )
    }
    .map_err(|code| {
        log::error!("Window system could not create a surface: {}", code);
        BootstrapError::SurfaceCreationFailed(code)
    })?;

    log::debug!("Surface created: {:?}", surface);
    Ok(surface)
}

pub fn destroy_surface(instance: &VulkanInstance, surface: vk::SurfaceKHR) {
    log::debug!("Destroying surface: {:?}", surface);
    unsafe { instance.surface_loader().destroy_surface(surface, None) };
}
