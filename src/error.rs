use std::{io, string::FromUtf8Error, time::Duration};

use thiserror::Error;

use crate::ipc_kind::IpcKind;

#[derive(Error, Debug)]
pub enum DeviceError {
    /// adb could not be spawned or its output could not be read
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("adb output is not valid UTF-8")]
    InvalidOutput(#[from] FromUtf8Error),

    #[error(transparent)]
    Popen(#[from] subprocess::PopenError),

    /// The shell command exited with a non-zero status
    #[error("command `{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("command `{command}` timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

/// Why a null intent could not be delivered to a component.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The platform refused the intent (no such component, not exported, ...)
    #[error("{reason}")]
    Rejected { reason: String },

    #[error("{0} cannot receive intents")]
    Unsupported(IpcKind),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
