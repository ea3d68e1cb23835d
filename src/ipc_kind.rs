//! The kinds of IPC surfaces that can be enumerated and fuzzed.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum IpcKind {
    #[strum(serialize = "Activities", serialize = "activity")]
    Activity,
    #[strum(serialize = "Broadcasts", serialize = "broadcast", serialize = "receiver")]
    Broadcast,
    #[strum(serialize = "Providers", serialize = "provider")]
    Provider,
    #[strum(serialize = "Services", serialize = "service")]
    Service,
    #[strum(serialize = "Instrumentations", serialize = "instrumentation")]
    Instrumentation,
}

impl IpcKind {
    /// The label shown to the user for this kind.
    pub fn label(self) -> &'static str {
        match self {
            IpcKind::Activity => "Activities",
            IpcKind::Broadcast => "Broadcasts",
            IpcKind::Provider => "Providers",
            IpcKind::Service => "Services",
            IpcKind::Instrumentation => "Instrumentations",
        }
    }

    /// The `am` sub-command delivering a null intent to this kind, if any.
    pub fn am_command(self) -> Option<&'static str> {
        match self {
            IpcKind::Activity => Some("start"),
            IpcKind::Broadcast => Some("broadcast"),
            IpcKind::Service => Some("startservice"),
            IpcKind::Instrumentation => Some("instrument"),
            // Content providers are not addressed by intents
            IpcKind::Provider => None,
        }
    }

    /// Whether "fuzz all" has a batch path for this kind.
    pub fn supports_batch(self) -> bool {
        matches!(self, IpcKind::Broadcast | IpcKind::Service)
    }
}

impl fmt::Display for IpcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
