//! Firing null intents at one or all discovered components.
//!
//! Nothing here returns an error: every delivery failure is turned into a
//! result line, since a misbehaving target is exactly what the fuzzer is
//! looking for.

use std::fmt;

use log::{debug, info, warn};

use crate::{
    component::ComponentRef, component_registry::ComponentRegistry, device::Device,
    error::DeliveryError, ipc_kind::IpcKind,
};

/// Result of fuzzing the selected component.
#[derive(Debug)]
pub enum SingleOutcome {
    Delivered {
        kind: IpcKind,
        target: ComponentRef,
    },
    Failed {
        /// What was addressed: the null intent, or the selection that did
        /// not resolve to a component.
        target: String,
        reason: String,
    },
}

impl SingleOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SingleOutcome::Delivered { .. })
    }
}

impl fmt::Display for SingleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingleOutcome::Delivered {
                kind: IpcKind::Instrumentation,
                target,
            } => write!(f, "Started instrumentation: {}", target.flatten_short()),
            SingleOutcome::Delivered { target, .. } => write!(f, "Sent: {}", target.null_intent()),
            SingleOutcome::Failed { target, reason } => write!(f, "Failed: {}: {}", target, reason),
        }
    }
}

/// Sends a null intent to the first component whose class is `selection`.
pub fn fuzz_single<D: Device>(
    device: &D,
    kind: IpcKind,
    registry: &ComponentRegistry,
    selection: Option<&str>,
) -> SingleOutcome {
    let Some(selection) = selection else {
        return SingleOutcome::Failed {
            target: kind.label().to_owned(),
            reason: "nothing selected".to_owned(),
        };
    };

    let Some(target) = registry.resolve(selection) else {
        return SingleOutcome::Failed {
            target: selection.to_owned(),
            reason: "no such component".to_owned(),
        };
    };

    if kind.am_command().is_none() {
        return SingleOutcome::Failed {
            target: target.flatten_short(),
            reason: DeliveryError::Unsupported(kind).to_string(),
        };
    }

    info!("Fuzzing {} {}", kind, target.flatten());
    match device.deliver(kind, target) {
        Ok(()) => SingleOutcome::Delivered {
            kind,
            target: target.clone(),
        },
        Err(err) => {
            warn!("Delivery to {} failed: {}", target.flatten(), err);
            SingleOutcome::Failed {
                target: target.null_intent(),
                reason: err.to_string(),
            }
        }
    }
}

/// Result of fuzzing every component of a kind.
#[derive(Debug)]
pub enum BatchOutcome {
    Completed {
        kind: IpcKind,
        attempted: usize,
        /// Per-component failure lines, in delivery order.
        failures: Vec<String>,
    },
    NotImplemented(IpcKind),
}

impl BatchOutcome {
    /// One line summarizing the batch.
    pub fn summary(&self) -> String {
        match self {
            BatchOutcome::Completed {
                kind, attempted, ..
            } => format!("Sent {} null intents to {}", attempted, kind),
            BatchOutcome::NotImplemented(kind) => {
                format!("Fuzz all is not implemented for {}", kind)
            }
        }
    }
}

/// Sends a null intent to every registry entry, duplicates included.
pub fn fuzz_all<D: Device>(device: &D, kind: IpcKind, registry: &ComponentRegistry) -> BatchOutcome {
    if !kind.supports_batch() {
        return BatchOutcome::NotImplemented(kind);
    }

    info!("Fuzzing all {} {}", registry.len(), kind);

    let mut attempted = 0;
    let mut failures = Vec::new();

    for target in registry.components() {
        attempted += 1;
        let result = device.deliver(kind, target);

        match (kind, result) {
            // Broadcasts are fire-and-forget
            (IpcKind::Broadcast, result) => {
                debug!("Broadcast to {}: {:?}", target.flatten(), result);
            }
            (_, Ok(())) => {}
            (_, Err(err)) => {
                warn!("Delivery to {} failed: {}", target.flatten(), err);
                failures.push(format!("Failed: {}: {}", target.null_intent(), err));
            }
        }
    }

    BatchOutcome::Completed {
        kind,
        attempted,
        failures,
    }
}
