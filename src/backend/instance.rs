// Context Builder - Vulkan instance + diagnostics channel
//
// Responsibilities:
// - Load the Vulkan loader and check the runtime version
// - Verify validation layers exist before asking for them
// - Instance creation with the window system's surface extensions
// - Debug messenger forwarding validation output to `log`
//
// Neither type implements Drop: the context's teardown stack decides when
// (and in which order) they are destroyed.

use ash::{vk, Entry};
use std::ffi::{c_char, CStr, CString};

use crate::config::ContextConfig;
use crate::error::BootstrapError;
use crate::handles::{ApiVersion, WindowTarget};

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Highest API version we ask the driver for.
const MAX_REQUESTED_VERSION: ApiVersion = ApiVersion::V1_3;

/// Vulkan instance plus the loaders derived from it.
pub struct VulkanInstance {
    entry: Entry,
    instance: ash::Instance,
    surface_loader: ash::khr::surface::Instance,
    api_version: ApiVersion,
}

impl VulkanInstance {
    /// Create the Vulkan instance
    ///
    /// # Arguments
    /// * `config` - Application label, validation and version requirements
    /// * `window` - Display the instance must be able to create surfaces for
    pub fn new(config: &ContextConfig, window: &WindowTarget) -> Result<Self, BootstrapError> {
        config.validate()?;
        let app_name = CString::new(config.application_label.as_str()).map_err(|_| {
            BootstrapError::InvalidConfiguration(
                "application label must not contain NUL bytes".to_string(),
            )
        })?;

        log::info!("Creating Vulkan instance: {}", config.application_label);

        // Step 1: Load Vulkan library
        let entry = unsafe { Entry::load() }.map_err(|e| BootstrapError::UnsupportedRuntime {
            reason: format!("failed to load the Vulkan library ({}). Is Vulkan installed?", e),
            code: None,
        })?;

        // Step 2: Check runtime version
        let instance_version = match unsafe { entry.try_enumerate_instance_version() } {
            Ok(Some(raw)) => ApiVersion::from_raw(raw),
            Ok(None) => ApiVersion::V1_0,
            Err(code) => {
                return Err(BootstrapError::UnsupportedRuntime {
                    reason: "could not query the instance version".to_string(),
                    code: Some(code),
                })
            }
        };
        if instance_version < config.min_api_version {
            return Err(BootstrapError::UnsupportedRuntime {
                reason: format!(
                    "runtime supports Vulkan {}, {} required",
                    instance_version, config.min_api_version
                ),
                code: Some(vk::Result::ERROR_INCOMPATIBLE_DRIVER),
            });
        }
        let api_version = instance_version
            .min(MAX_REQUESTED_VERSION)
            .max(config.min_api_version);

        // Step 3: Validation layers
        if config.enable_validation && !Self::check_validation_layer_support(&entry)? {
            return Err(BootstrapError::ValidationLayerUnavailable {
                layer: VALIDATION_LAYER.to_string_lossy().into_owned(),
            });
        }
        let layer_names: Vec<*const c_char> = if config.enable_validation {
            vec![VALIDATION_LAYER.as_ptr()]
        } else {
            vec![]
        };

        // Step 4: Extensions (surface support for this display + debug utils)
        let mut extensions = ash_window::enumerate_required_extensions(window.display())
            .map_err(|code| BootstrapError::UnsupportedRuntime {
                reason: "display type has no Vulkan surface support".to_string(),
                code: Some(code),
            })?
            .to_vec();
        if config.enable_default_diagnostics {
            extensions.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        #[allow(unused_mut)]
        let mut flags = vk::InstanceCreateFlags::empty();
        #[cfg(target_os = "macos")]
        {
            extensions.push(ash::khr::portability_enumeration::NAME.as_ptr());
            flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
        }

        Self::check_extension_support(&entry, &extensions)?;

        let engine_name = c"gpu-bootstrap";
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(engine_name)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(api_version.to_raw());

        let create_info = vk::InstanceCreateInfo::default()
            .flags(flags)
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_names);

        // Step 5: Create instance
        let instance = unsafe { entry.create_instance(&create_info, None) }.map_err(|code| match code {
            vk::Result::ERROR_LAYER_NOT_PRESENT => BootstrapError::ValidationLayerUnavailable {
                layer: VALIDATION_LAYER.to_string_lossy().into_owned(),
            },
            code => BootstrapError::UnsupportedRuntime {
                reason: "instance creation was rejected by the driver".to_string(),
                code: Some(code),
            },
        })?;

        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        log::info!("Vulkan instance created (API {})", api_version);
        if config.enable_validation {
            log::info!("Validation layers enabled");
        }

        Ok(Self {
            entry,
            instance,
            surface_loader,
            api_version,
        })
    }

    fn check_validation_layer_support(entry: &Entry) -> Result<bool, BootstrapError> {
        let layers = unsafe { entry.enumerate_instance_layer_properties() }.map_err(|code| {
            BootstrapError::UnsupportedRuntime {
                reason: "could not enumerate instance layers".to_string(),
                code: Some(code),
            }
        })?;

        let found = layers
            .iter()
            .any(|layer| unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) } == VALIDATION_LAYER);
        if !found {
            log::warn!("Validation layer not available: {:?}", VALIDATION_LAYER);
        }
        Ok(found)
    }

    fn check_extension_support(
        entry: &Entry,
        required: &[*const c_char],
    ) -> Result<(), BootstrapError> {
        let available = unsafe { entry.enumerate_instance_extension_properties(None) }.map_err(
            |code| BootstrapError::UnsupportedRuntime {
                reason: "could not enumerate instance extensions".to_string(),
                code: Some(code),
            },
        )?;

        let available: Vec<&CStr> = available
            .iter()
            .map(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) })
            .collect();
        let required: Vec<&CStr> = required
            .iter()
            .map(|&name| unsafe { CStr::from_ptr(name) })
            .collect();

        match missing_extensions_error(&required, &available) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn raw(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn surface_loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }

    /// API version the instance was created with.
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub(crate) fn destroy(self) {
        log::debug!("Destroying Vulkan instance");
        // SAFETY: every child (messenger, surface, device) was destroyed first
        unsafe { self.instance.destroy_instance(None) };
    }
}

/// Map unavailable instance extensions to the bootstrap error they cause.
///
/// A missing debug-utils extension means the requested diagnostics channel
/// cannot exist on this host; anything else is a runtime the window system
/// cannot use.
fn missing_extensions_error(required: &[&CStr], available: &[&CStr]) -> Option<BootstrapError> {
    let missing: Vec<&CStr> = required
        .iter()
        .copied()
        .filter(|name| !available.contains(name))
        .collect();

    if missing.is_empty() {
        return None;
    }
    if missing.contains(&ash::ext::debug_utils::NAME) {
        log::warn!("Diagnostics requested but {:?} is not available", ash::ext::debug_utils::NAME);
        return Some(BootstrapError::ValidationLayerUnavailable {
            layer: ash::ext::debug_utils::NAME.to_string_lossy().into_owned(),
        });
    }

    let names: Vec<String> = missing
        .iter()
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    Some(BootstrapError::UnsupportedRuntime {
        reason: format!("missing instance extensions: {}", names.join(", ")),
        code: Some(vk::Result::ERROR_EXTENSION_NOT_PRESENT),
    })
}

/// Debug messenger attached to an instance.
pub struct DiagnosticsChannel {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DiagnosticsChannel {
    pub fn new(instance: &VulkanInstance, verbose: bool) -> Result<Self, BootstrapError> {
        let loader = ash::ext::debug_utils::Instance::new(instance.entry(), instance.raw());

        let mut severity = vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
        if verbose {
            severity |= vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE;
        }

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(severity)
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        let messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None) }
            .map_err(BootstrapError::DiagnosticsSetupFailed)?;

        log::debug!("Debug messenger registered");
        Ok(Self { loader, messenger })
    }

    pub(crate) fn destroy(self) {
        log::debug!("Destroying debug messenger");
        unsafe {
            self.loader
                .destroy_debug_utils_messenger(self.messenger, None)
        };
    }
}

// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*p_callback_data).p_message).to_string_lossy();

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Vulkan] ({:?}) {}", message_type, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Vulkan] ({:?}) {}", message_type, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            log::info!("[Vulkan] ({:?}) {}", message_type, message);
        }
        _ => {
            log::trace!("[Vulkan] ({:?}) {}", message_type, message);
        }
    }

    vk::FALSE
}
