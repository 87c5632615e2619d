// Error types for context bootstrap and teardown
//
// Every bootstrap error is fatal: the coordinator cleans up whatever it built
// and hands the error back, and the entry point decides how to terminate.

use ash::vk;
use std::fmt;
use thiserror::Error;

use crate::lifecycle::ContextState;

/// The bootstrap step an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Instance,
    Diagnostics,
    Surface,
    Selection,
    Device,
    Lifecycle,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Instance => "instance",
            Stage::Diagnostics => "diagnostics",
            Stage::Surface => "surface",
            Stage::Selection => "device selection",
            Stage::Device => "logical device",
            Stage::Lifecycle => "lifecycle",
        };
        f.write_str(name)
    }
}

/// Fatal failure while bringing up the GPU context.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("no compatible Vulkan runtime: {reason}")]
    UnsupportedRuntime {
        reason: String,
        code: Option<vk::Result>,
    },

    #[error("validation layer {layer} was requested but is not installed on this host")]
    ValidationLayerUnavailable { layer: String },

    #[error("failed to create debug messenger: {0}")]
    DiagnosticsSetupFailed(vk::Result),

    #[error("failed to create presentation surface: {0}")]
    SurfaceCreationFailed(vk::Result),

    #[error("failed to query physical devices: {0}")]
    DeviceQueryFailed(vk::Result),

    #[error("no suitable GPU found ({candidates} candidate(s) rejected)")]
    NoSuitableDevice { candidates: usize },

    #[error("failed to create logical device: {0}")]
    DeviceCreationFailed(vk::Result),

    #[error("invalid context configuration: {0}")]
    InvalidConfiguration(String),

    #[error("context cannot be initialized from state {0:?}")]
    InvalidState(ContextState),
}

impl BootstrapError {
    pub fn stage(&self) -> Stage {
        match self {
            BootstrapError::UnsupportedRuntime { .. }
            | BootstrapError::ValidationLayerUnavailable { .. }
            | BootstrapError::InvalidConfiguration(_) => Stage::Instance,
            BootstrapError::DiagnosticsSetupFailed(_) => Stage::Diagnostics,
            BootstrapError::SurfaceCreationFailed(_) => Stage::Surface,
            BootstrapError::DeviceQueryFailed(_) | BootstrapError::NoSuitableDevice { .. } => {
                Stage::Selection
            }
            BootstrapError::DeviceCreationFailed(_) => Stage::Device,
            BootstrapError::InvalidState(_) => Stage::Lifecycle,
        }
    }

    /// Raw runtime error code, when the runtime reported one.
    pub fn code(&self) -> Option<vk::Result> {
        match self {
            BootstrapError::UnsupportedRuntime { code, .. } => *code,
            BootstrapError::DiagnosticsSetupFailed(code)
            | BootstrapError::SurfaceCreationFailed(code)
            | BootstrapError::DeviceQueryFailed(code)
            | BootstrapError::DeviceCreationFailed(code) => Some(*code),
            _ => None,
        }
    }
}

/// Misuse of a context after (or instead of) bootstrap.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("context has already been destroyed")]
    AlreadyDestroyed,

    #[error("context is not ready (state: {0:?})")]
    NotReady(ContextState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_and_code_identify_the_failure() {
        let err = BootstrapError::DeviceCreationFailed(vk::Result::ERROR_FEATURE_NOT_PRESENT);
        assert_eq!(err.stage(), Stage::Device);
        assert_eq!(err.code(), Some(vk::Result::ERROR_FEATURE_NOT_PRESENT));

        let err = BootstrapError::NoSuitableDevice { candidates: 2 };
        assert_eq!(err.stage(), Stage::Selection);
        assert_eq!(err.code(), None);
        assert!(err.to_string().contains("2 candidate"));
    }

    #[test]
    fn missing_layer_is_an_instance_failure() {
        let err = BootstrapError::ValidationLayerUnavailable {
            layer: "VK_LAYER_KHRONOS_validation".to_string(),
        };
        assert_eq!(err.stage(), Stage::Instance);
        assert_eq!(err.stage().to_string(), "instance");
    }
}
