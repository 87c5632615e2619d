// =============================================================================
// LIFECYCLE COORDINATOR - owns the GPU context from bootstrap to teardown
// =============================================================================
//
// CREATION ORDER (fixed):
//   instance -> debug messenger (optional) -> surface -> [select GPU] -> device
//
// Every handle that gets created is recorded on a teardown stack. Shutdown,
// partial cleanup after a failed bootstrap, and Drop all pop that same stack,
// so destruction is always the exact reverse of creation:
//   device -> surface -> debug messenger -> instance
//
// The window is not ours. It must outlive the context.
// =============================================================================

use std::fmt;

use crate::backend::GraphicsRuntime;
use crate::config::ContextConfig;
use crate::error::{BootstrapError, LifecycleError};
use crate::handles::{Owned, PhysicalDevice, SelectedDevice, WindowTarget};
use crate::selector::{select_device, Requirements};

/// Where a context is in its one-shot life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    Initializing,
    Ready,
    ShuttingDown,
    Destroyed,
}

/// Destroyable resources, in the order they are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Instance,
    Diagnostics,
    Surface,
    Device,
}

/// Record of created resources; popping yields them in destruction order.
#[derive(Debug, Default)]
pub struct TeardownStack {
    entries: Vec<Resource>,
}

impl TeardownStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly created resource.
    ///
    /// # Panics
    ///
    /// If the resource is already recorded, or if anything other than the
    /// instance is recorded while no instance is live. Either would let a
    /// child outlive its instance.
    pub fn push(&mut self, resource: Resource) {
        assert!(
            !self.entries.contains(&resource),
            "{:?} recorded twice on the teardown stack",
            resource
        );
        assert!(
            resource == Resource::Instance || self.entries.first() == Some(&Resource::Instance),
            "{:?} created without a live instance",
            resource
        );
        self.entries.push(resource);
    }

    pub fn pop(&mut self) -> Option<Resource> {
        self.entries.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Recorded resources in creation order.
    pub fn entries(&self) -> &[Resource] {
        &self.entries
    }
}

/// Read-only loan of the live handles.
pub struct ContextHandles<'a, R: GraphicsRuntime> {
    pub instance: &'a R::Instance,
    pub physical_device: PhysicalDevice<R::Adapter>,
    pub selected: &'a SelectedDevice<R::Adapter>,
    pub device: &'a R::Device,
    pub surface: &'a R::Surface,
}

/// GPU context: instance, surface, physical device and logical device.
pub struct GpuContext<R: GraphicsRuntime> {
    runtime: R,
    state: ContextState,
    teardown: TeardownStack,

    // Owned handles, each present exactly while its stack entry is
    instance: Option<Owned<R::Instance>>,
    diagnostics: Option<Owned<R::Messenger>>,
    surface: Option<Owned<R::Surface>>,
    device: Option<Owned<R::Device>>,

    // Query result, nothing to destroy
    selected: Option<SelectedDevice<R::Adapter>>,
}

impl<R: GraphicsRuntime> GpuContext<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            state: ContextState::Uninitialized,
            teardown: TeardownStack::new(),
            instance: None,
            diagnostics: None,
            surface: None,
            device: None,
            selected: None,
        }
    }

    /// Create a context and run the full bootstrap sequence.
    pub fn bootstrap(
        runtime: R,
        config: &ContextConfig,
        window: WindowTarget,
    ) -> Result<Self, BootstrapError> {
        let mut context = Self::new(runtime);
        context.initialize(config, window)?;
        Ok(context)
    }

    /// Run the bootstrap sequence once.
    ///
    /// On failure everything created so far is destroyed in reverse order
    /// and the context ends up `Destroyed`; it cannot be retried.
    pub fn initialize(
        &mut self,
        config: &ContextConfig,
        window: WindowTarget,
    ) -> Result<(), BootstrapError> {
        if self.state != ContextState::Uninitialized {
            return Err(BootstrapError::InvalidState(self.state));
        }

        self.state = ContextState::Initializing;
        log::info!("Bootstrapping GPU context for '{}'", config.application_label);

        match self.build(config, &window) {
            Ok(()) => {
                self.state = ContextState::Ready;
                log::info!("GPU context ready");
                Ok(())
            }
            Err(err) => {
                log::error!("GPU context bootstrap failed at {} stage: {}", err.stage(), err);
                self.run_teardown();
                self.state = ContextState::Destroyed;
                Err(err)
            }
        }
    }

    fn build(&mut self, config: &ContextConfig, window: &WindowTarget) -> Result<(), BootstrapError> {
        config.validate()?;

        // Step 1: Instance
        let instance = &**self
            .instance
            .insert(Owned::new(self.runtime.create_instance(config, window)?));
        self.teardown.push(Resource::Instance);

        // Step 2: Diagnostics channel, lives and dies with the instance
        if config.enable_default_diagnostics {
            let messenger = self.runtime.create_diagnostics(instance, config)?;
            self.diagnostics = Some(Owned::new(messenger));
            self.teardown.push(Resource::Diagnostics);
        }

        // Step 3: Surface
        let surface = &**self
            .surface
            .insert(Owned::new(self.runtime.create_surface(instance, window)?));
        self.teardown.push(Resource::Surface);

        // Step 4: Pick physical device
        let candidates = self.runtime.enumerate_adapters(instance, surface)?;
        let requirements = Requirements {
            min_api_version: config.min_api_version,
        };
        let selected = select_device(candidates, &requirements)?;
        log::info!(
            "Selected GPU: {} ({:?}, Vulkan {})",
            selected.adapter.name,
            selected.adapter.kind,
            selected.adapter.api_version
        );

        // Step 5: Logical device
        let device = self.runtime.create_device(instance, &selected)?;
        self.device = Some(Owned::new(device));
        self.teardown.push(Resource::Device);
        self.selected = Some(selected);

        Ok(())
    }

    /// Destroy every handle in reverse creation order.
    ///
    /// A second call is rejected with `AlreadyDestroyed` and touches nothing.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            ContextState::Destroyed => Err(LifecycleError::AlreadyDestroyed),
            ContextState::Initializing | ContextState::ShuttingDown => {
                Err(LifecycleError::NotReady(self.state))
            }
            ContextState::Uninitialized => {
                self.state = ContextState::Destroyed;
                Ok(())
            }
            ContextState::Ready => {
                log::info!("Shutting down GPU context...");
                self.state = ContextState::ShuttingDown;
                self.run_teardown();
                self.state = ContextState::Destroyed;
                log::info!("GPU context destroyed");
                Ok(())
            }
        }
    }

    fn run_teardown(&mut self) {
        while let Some(resource) = self.teardown.pop() {
            match resource {
                Resource::Device => {
                    if let Some(device) = self.device.take() {
                        self.runtime.destroy_device(device);
                    }
                }
                Resource::Surface => match (self.surface.take(), self.instance.as_deref()) {
                    (Some(surface), Some(instance)) => self.runtime.destroy_surface(instance, surface),
                    (Some(_), None) => log::error!("Surface outlived its instance, leaking it"),
                    _ => {}
                },
                Resource::Diagnostics => match (self.diagnostics.take(), self.instance.as_deref()) {
                    (Some(messenger), Some(instance)) => {
                        self.runtime.destroy_diagnostics(instance, messenger)
                    }
                    (Some(_), None) => log::error!("Debug messenger outlived its instance, leaking it"),
                    _ => {}
                },
                Resource::Instance => {
                    if self.device.is_some() || self.surface.is_some() || self.diagnostics.is_some() {
                        // Destroying now would leave dangling children
                        log::error!("Instance still has live children, leaking it");
                        continue;
                    }
                    if let Some(instance) = self.instance.take() {
                        self.runtime.destroy_instance(instance);
                    }
                }
            }
        }
        self.selected = None;
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ContextState::Ready
    }

    /// The GPU picked during bootstrap.
    pub fn selected_device(&self) -> Option<&SelectedDevice<R::Adapter>> {
        self.selected.as_ref()
    }

    /// Borrow the live handles. Only available while `Ready`.
    pub fn handles(&self) -> Result<ContextHandles<'_, R>, LifecycleError> {
        match self.state {
            ContextState::Ready => {}
            ContextState::Destroyed => return Err(LifecycleError::AlreadyDestroyed),
            state => return Err(LifecycleError::NotReady(state)),
        }

        match (&self.instance, &self.selected, &self.device, &self.surface) {
            (Some(instance), Some(selected), Some(device), Some(surface)) => Ok(ContextHandles {
                instance: &**instance,
                physical_device: selected.physical_device(),
                selected,
                device: &**device,
                surface: &**surface,
            }),
            _ => Err(LifecycleError::NotReady(self.state)),
        }
    }
}

impl<R: GraphicsRuntime> fmt::Debug for GpuContext<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuContext")
            .field("state", &self.state)
            .field("live", &self.teardown.entries())
            .finish_non_exhaustive()
    }
}

impl<R: GraphicsRuntime> Drop for GpuContext<R> {
    fn drop(&mut self) {
        if self.teardown.is_empty() {
            return;
        }

        log::warn!("GPU context dropped without shutdown, cleaning up");
        self.state = ContextState::ShuttingDown;
        self.run_teardown();
        self.state = ContextState::Destroyed;
    }
}
