//! GPU context bootstrap and teardown.
//!
//! [`GpuContext`] creates the Vulkan instance, an optional debug messenger,
//! a window surface, picks a physical device and creates the logical device,
//! in that order. Shutdown (explicit, after a failed bootstrap, or on drop)
//! destroys them in exactly the reverse order.
//!
//! The coordinator only talks to a [`GraphicsRuntime`]; [`VulkanRuntime`] is
//! the `ash` implementation.
//!
//! ```no_run
//! use gpu_bootstrap::{ContextConfig, GpuContext, VulkanRuntime, WindowTarget};
//! # fn run(window: &winit::window::Window) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ContextConfig::new("viewer").with_min_api_version((1, 1));
//! // SAFETY: the window outlives the context
//! let target = unsafe { WindowTarget::from_window(window)? };
//! let mut context = GpuContext::bootstrap(VulkanRuntime::new(), &config, target)?;
//! let handles = context.handles()?;
//! println!("running on {}", handles.selected.adapter.name);
//! context.shutdown()?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod handles;
pub mod lifecycle;
pub mod selector;

pub use backend::{GraphicsRuntime, VulkanRuntime};
pub use config::{Config, ContextConfig};
pub use error::{BootstrapError, LifecycleError, Stage};
pub use handles::{
    AdapterInfo, ApiVersion, DeviceKind, Owned, PhysicalDevice, QueueFamilies, QueueFamilySupport,
    SelectedDevice, WindowTarget,
};
pub use lifecycle::{ContextHandles, ContextState, GpuContext, Resource, TeardownStack};
pub use selector::{Rejection, Requirements};
