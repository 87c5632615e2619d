// Scripted GraphicsRuntime for driving GpuContext without a GPU.
//
// Every create/destroy call is appended to a shared event log, and live
// handles are tracked so tests can assert nothing leaks or dies twice.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use ash::vk;
use gpu_bootstrap::{
    AdapterInfo, ApiVersion, BootstrapError, ContextConfig, DeviceKind, GraphicsRuntime, Owned,
    PhysicalDevice, QueueFamilySupport, SelectedDevice, WindowTarget,
};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, XlibDisplayHandle, XlibWindowHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Instance,
    Messenger,
    Surface,
    Device,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Created(Kind, u64),
    Destroyed(Kind, u64),
}

#[derive(Debug, Clone)]
pub struct FakeGpu {
    pub name: &'static str,
    pub kind: DeviceKind,
    pub version: ApiVersion,
    pub can_present: bool,
}

impl FakeGpu {
    pub fn new(name: &'static str, kind: DeviceKind) -> Self {
        Self {
            name,
            kind,
            version: ApiVersion::V1_3,
            can_present: true,
        }
    }

    pub fn version(mut self, major: u32, minor: u32) -> Self {
        self.version = ApiVersion::new(major, minor, 0);
        self
    }

    pub fn headless(mut self) -> Self {
        self.can_present = false;
        self
    }
}

/// What the simulated host offers.
#[derive(Debug, Clone)]
pub struct FakeHost {
    pub runtime_installed: bool,
    pub validation_layers: bool,
    pub diagnostics_error: Option<vk::Result>,
    pub surface_error: Option<vk::Result>,
    pub enumerate_error: Option<vk::Result>,
    pub device_error: Option<vk::Result>,
    pub gpus: Vec<FakeGpu>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            runtime_installed: true,
            validation_layers: true,
            diagnostics_error: None,
            surface_error: None,
            enumerate_error: None,
            device_error: None,
            gpus: vec![FakeGpu::new("Fake Discrete", DeviceKind::Discrete)],
        }
    }
}

#[derive(Debug, Default)]
pub struct Journal {
    pub events: Vec<Event>,
    pub live: HashSet<(Kind, u64)>,
}

impl Journal {
    pub fn created(&self) -> Vec<Kind> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Created(kind, _) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&self) -> Vec<Kind> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Destroyed(kind, _) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    fn is_live(&self, kind: Kind, id: u64) -> bool {
        self.live.contains(&(kind, id))
    }
}

pub struct FakeRuntime {
    host: FakeHost,
    journal: Rc<RefCell<Journal>>,
    next_id: u64,
}

impl FakeRuntime {
    pub fn new(host: FakeHost) -> (Self, Rc<RefCell<Journal>>) {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let runtime = Self {
            host,
            journal: journal.clone(),
            next_id: 100,
        };
        (runtime, journal)
    }

    fn create(&mut self, kind: Kind) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        let mut journal = self.journal.borrow_mut();
        journal.events.push(Event::Created(kind, id));
        journal.live.insert((kind, id));
        id
    }

    fn destroy(&mut self, kind: Kind, id: u64) {
        let mut journal = self.journal.borrow_mut();
        assert!(journal.live.remove(&(kind, id)), "{:?} {} destroyed twice or never created", kind, id);
        journal.events.push(Event::Destroyed(kind, id));
    }

    fn assert_instance_live(&self, instance: &FakeInstance) {
        assert!(
            self.journal.borrow().is_live(Kind::Instance, instance.0),
            "child used after its instance was destroyed"
        );
    }
}

#[derive(Debug)]
pub struct FakeInstance(pub u64);
#[derive(Debug)]
pub struct FakeMessenger(pub u64);
#[derive(Debug)]
pub struct FakeSurface(pub u64);
#[derive(Debug)]
pub struct FakeDevice {
    pub id: u64,
    pub adapter: u64,
}

impl GraphicsRuntime for FakeRuntime {
    type Instance = FakeInstance;
    type Messenger = FakeMessenger;
    type Surface = FakeSurface;
    type Device = FakeDevice;
    type Adapter = u64;

    fn create_instance(
        &mut self,
        config: &ContextConfig,
        _window: &WindowTarget,
    ) -> Result<FakeInstance, BootstrapError> {
        if !self.host.runtime_installed {
            return Err(BootstrapError::UnsupportedRuntime {
                reason: "loader not found".to_string(),
                code: None,
            });
        }
        if config.enable_validation && !self.host.validation_layers {
            return Err(BootstrapError::ValidationLayerUnavailable {
                layer: "VK_LAYER_KHRONOS_validation".to_string(),
            });
        }
        Ok(FakeInstance(self.create(Kind::Instance)))
    }

    fn create_diagnostics(
        &mut self,
        instance: &FakeInstance,
        _config: &ContextConfig,
    ) -> Result<FakeMessenger, BootstrapError> {
        self.assert_instance_live(instance);
        if let Some(code) = self.host.diagnostics_error {
            return Err(BootstrapError::DiagnosticsSetupFailed(code));
        }
        Ok(FakeMessenger(self.create(Kind::Messenger)))
    }

    fn create_surface(
        &mut self,
        instance: &FakeInstance,
        _window: &WindowTarget,
    ) -> Result<FakeSurface, BootstrapError> {
        self.assert_instance_live(instance);
        if let Some(code) = self.host.surface_error {
            return Err(BootstrapError::SurfaceCreationFailed(code));
        }
        Ok(FakeSurface(self.create(Kind::Surface)))
    }

    fn enumerate_adapters(
        &mut self,
        instance: &FakeInstance,
        _surface: &FakeSurface,
    ) -> Result<Vec<AdapterInfo<u64>>, BootstrapError> {
        self.assert_instance_live(instance);
        if let Some(code) = self.host.enumerate_error {
            return Err(BootstrapError::DeviceQueryFailed(code));
        }
        Ok(self
            .host
            .gpus
            .iter()
            .enumerate()
            .map(|(index, gpu)| AdapterInfo {
                device: PhysicalDevice::new(index as u64),
                index,
                name: gpu.name.to_string(),
                kind: gpu.kind,
                api_version: gpu.version,
                queue_families: vec![QueueFamilySupport {
                    graphics: true,
                    present: gpu.can_present,
                }],
                supports_swapchain: true,
            })
            .collect())
    }

    fn create_device(
        &mut self,
        instance: &FakeInstance,
        selected: &SelectedDevice<u64>,
    ) -> Result<FakeDevice, BootstrapError> {
        self.assert_instance_live(instance);
        if let Some(code) = self.host.device_error {
            return Err(BootstrapError::DeviceCreationFailed(code));
        }
        Ok(FakeDevice {
            id: self.create(Kind::Device),
            adapter: selected.physical_device().raw(),
        })
    }

    fn destroy_device(&mut self, device: Owned<FakeDevice>) {
        let device = device.into_inner();
        self.destroy(Kind::Device, device.id);
    }

    fn destroy_surface(&mut self, instance: &FakeInstance, surface: Owned<FakeSurface>) {
        self.assert_instance_live(instance);
        self.destroy(Kind::Surface, surface.into_inner().0);
    }

    fn destroy_diagnostics(&mut self, instance: &FakeInstance, messenger: Owned<FakeMessenger>) {
        self.assert_instance_live(instance);
        self.destroy(Kind::Messenger, messenger.into_inner().0);
    }

    fn destroy_instance(&mut self, instance: Owned<FakeInstance>) {
        let id = instance.into_inner().0;
        let children_live = self
            .journal
            .borrow()
            .live
            .iter()
            .any(|(kind, _)| *kind != Kind::Instance);
        assert!(!children_live, "instance destroyed while children are still live");
        self.destroy(Kind::Instance, id);
    }
}

/// A window target that is never dereferenced by the fake runtime.
pub fn window() -> WindowTarget {
    // SAFETY: FakeRuntime never touches the handles
    unsafe {
        WindowTarget::new(
            RawDisplayHandle::Xlib(XlibDisplayHandle::new(None, 0)),
            RawWindowHandle::Xlib(XlibWindowHandle::new(0x2a)),
        )
    }
}

pub fn config() -> ContextConfig {
    ContextConfig::new("lifecycle-test")
        .with_validation(true)
        .with_diagnostics(true)
        .with_min_api_version((1, 1))
}
