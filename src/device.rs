//! The platform the fuzzer runs against.

use crate::{
    component::{ComponentRef, PackageRecord},
    error::{DeliveryError, DeviceError},
    ipc_kind::IpcKind,
};

/// Package registry and IPC delivery of an Android device.
pub trait Device {
    /// All installed packages, in platform order, each with the components
    /// it exposes for `kind`.
    fn list_packages(&self, kind: IpcKind) -> Result<Vec<PackageRecord>, DeviceError>;

    /// Sends an empty intent (or starts an instrumentation) addressed only
    /// to `target`.
    fn deliver(&self, kind: IpcKind, target: &ComponentRef) -> Result<(), DeliveryError>;
}
