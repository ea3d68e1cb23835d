//! Finding the components of one IPC kind on the device.

use log::debug;

use crate::{
    component::ComponentRef, component_registry::ComponentRegistry, device::Device,
    error::DeviceError, ipc_kind::IpcKind,
};

/// Lists the components of `kind` of every installed package, or of the
/// system packages only. Platform order is preserved.
pub fn discover<D: Device>(
    device: &D,
    kind: IpcKind,
    system_only: bool,
) -> Result<ComponentRegistry, DeviceError> {
    let packages = device.list_packages(kind)?;

    let components: Vec<ComponentRef> = packages
        .iter()
        .filter(|package| !system_only || package.system)
        .flat_map(|package| {
            package
                .components
                .iter()
                .map(|class| ComponentRef::new(&package.name, class))
        })
        .collect();

    debug!(
        "Discovered {} {} in {} packages (system only: {})",
        components.len(),
        kind,
        packages.len(),
        system_only
    );

    Ok(ComponentRegistry::new(components))
}
