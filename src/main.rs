// =============================================================================
// GPU BOOTSTRAP DEMO
// =============================================================================
//
// Opens a window, brings up the GPU context against it and keeps it alive
// until the window is closed.
//
// LIFECYCLE:
// ┌─────────────────────────────────────────────────────────────────┐
// │  Window (winit, owned here, outlives everything below)          │
// │    └── GpuContext                                               │
// │          └── Instance -> Messenger -> Surface -> Device         │
// └─────────────────────────────────────────────────────────────────┘
//
// Bootstrap failures are fatal: the error is logged with the failing stage
// and the process exits. A window that cannot be created is fatal too.
//
// =============================================================================

use anyhow::Result;
use gpu_bootstrap::{BootstrapError, Config, GpuContext, VulkanRuntime, WindowTarget};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    // Load configuration from config.toml
    let config = Config::load();

    // Initialize logging
    init_logging(&config);
    log::info!("Starting GPU bootstrap demo");

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.fatal.take() {
        fail_fast(&err);
    }
    if let Some(reason) = app.window_error.take() {
        anyhow::bail!("failed to create window: {}", reason);
    }
    Ok(())
}

/// Initialize logging; RUST_LOG still overrides the configured level
fn init_logging(config: &Config) {
    use env_logger::Builder;

    let mut builder = Builder::new();
    builder.filter_level(config.get_log_level());
    builder.parse_default_env();
    builder.init();
}

/// Terminate on a bootstrap failure. Partial cleanup already ran.
fn fail_fast(err: &BootstrapError) -> ! {
    match err.code() {
        Some(code) => log::error!(
            "FATAL: GPU context bootstrap failed at {} stage: {} (VkResult {:?})",
            err.stage(),
            err,
            code
        ),
        None => log::error!(
            "FATAL: GPU context bootstrap failed at {} stage: {}",
            err.stage(),
            err
        ),
    }
    std::process::exit(1)
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// IMPORTANT: `context` is declared before `window` so the context is
/// dropped first if we ever unwind without an explicit shutdown.
struct App {
    config: Config,
    context: Option<GpuContext<VulkanRuntime>>,
    window: Option<Arc<Window>>,
    fatal: Option<BootstrapError>,
    window_error: Option<String>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            context: None,
            window: None,
            fatal: None,
            window_error: None,
        }
    }

    fn init_context(&mut self, window: &Window) -> Result<(), BootstrapError> {
        let context_config = self.config.context_config();

        // SAFETY: the window is stored in `self.window` and only released
        // after the context has been shut down
        let target = unsafe { WindowTarget::from_window(window)? };
        let context = GpuContext::bootstrap(VulkanRuntime::new(), &context_config, target)?;

        if let Some(selected) = context.selected_device() {
            log::info!(
                "Using '{}' ({:?}), Vulkan {}, queues: graphics {} / present {}",
                selected.adapter.name,
                selected.adapter.kind,
                selected.adapter.api_version,
                selected.queues.graphics,
                selected.queues.present
            );
        }

        self.context = Some(context);
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(mut context) = self.context.take() {
            if let Err(e) = context.shutdown() {
                log::error!("Shutdown failed: {}", e);
            }
        }
        // Window goes last
        self.window = None;
    }
}

// =============================================================================
// EVENT HANDLING
// =============================================================================

impl ApplicationHandler for App {
    /// Called when the application is ready to create windows.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {:?}", e);
                self.window_error = Some(e.to_string());
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.init_context(&window) {
            self.fatal = Some(e);
            event_loop.exit();
            return;
        }

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};

                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    log::info!("ESC pressed, exiting...");
                    self.shutdown();
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
