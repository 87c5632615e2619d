// Capability Selector - pick the GPU the context will run on
//
// Hard requirements filter candidates out; the survivors are scored by device
// kind. Equal scores fall back to enumeration order so the pick is stable for
// a given driver setup (first enumerated wins).

use std::fmt;

use crate::error::BootstrapError;
use crate::handles::{AdapterInfo, ApiVersion, QueueFamilies, QueueFamilySupport, SelectedDevice};

/// Hard requirements every candidate must meet.
#[derive(Debug, Clone, Copy)]
pub struct Requirements {
    pub min_api_version: ApiVersion,
}

/// Why a candidate was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoPresentSupport,
    ApiVersionTooLow {
        required: ApiVersion,
        reported: ApiVersion,
    },
    NoGraphicsQueue,
    MissingSwapchainExtension,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoPresentSupport => f.write_str("cannot present to the surface"),
            Rejection::ApiVersionTooLow { required, reported } => {
                write!(f, "API version {} is below required {}", reported, required)
            }
            Rejection::NoGraphicsQueue => f.write_str("no graphics queue family"),
            Rejection::MissingSwapchainExtension => f.write_str("VK_KHR_swapchain not supported"),
        }
    }
}

/// Pick queue families, preferring one family that does both graphics and
/// presentation over two separate ones.
pub fn resolve_queue_families(families: &[QueueFamilySupport]) -> Option<QueueFamilies> {
    let index = |i: usize| i as u32;

    if let Some(shared) = families.iter().position(|f| f.graphics && f.present) {
        return Some(QueueFamilies {
            graphics: index(shared),
            present: index(shared),
        });
    }

    let graphics = families.iter().position(|f| f.graphics)?;
    let present = families.iter().position(|f| f.present)?;
    Some(QueueFamilies {
        graphics: index(graphics),
        present: index(present),
    })
}

/// Check one candidate against the hard requirements.
pub fn evaluate<H>(
    adapter: &AdapterInfo<H>,
    requirements: &Requirements,
) -> Result<QueueFamilies, Rejection> {
    if !adapter.queue_families.iter().any(|f| f.present) {
        return Err(Rejection::NoPresentSupport);
    }
    if adapter.api_version < requirements.min_api_version {
        return Err(Rejection::ApiVersionTooLow {
            required: requirements.min_api_version,
            reported: adapter.api_version,
        });
    }
    if !adapter.supports_swapchain {
        return Err(Rejection::MissingSwapchainExtension);
    }
    resolve_queue_families(&adapter.queue_families).ok_or(Rejection::NoGraphicsQueue)
}

/// Select the best candidate, or fail with `NoSuitableDevice`.
pub fn select_device<H: Copy>(
    candidates: Vec<AdapterInfo<H>>,
    requirements: &Requirements,
) -> Result<SelectedDevice<H>, BootstrapError> {
    let total = candidates.len();
    let mut best: Option<(u32, SelectedDevice<H>)> = None;

    for adapter in candidates {
        let queues = match evaluate(&adapter, requirements) {
            Ok(queues) => queues,
            Err(reason) => {
                log::debug!("Rejecting GPU '{}': {}", adapter.name, reason);
                continue;
            }
        };

        let score = adapter.kind.score();
        log::debug!(
            "Candidate GPU '{}' ({:?}, Vulkan {}) scored {}",
            adapter.name,
            adapter.kind,
            adapter.api_version,
            score
        );

        // Strictly greater keeps the earliest enumerated device on ties
        let better = match &best {
            Some((best_score, current)) => {
                score > *best_score
                    || (score == *best_score && adapter.index < current.adapter.index)
            }
            None => true,
        };
        if better {
            best = Some((score, SelectedDevice { adapter, queues }));
        }
    }

    best.map(|(_, selected)| selected)
        .ok_or(BootstrapError::NoSuitableDevice { candidates: total })
}
