//! In-memory [Device] for tests.

use std::{cell::RefCell, collections::HashSet};

use crate::{
    component::{ComponentRef, PackageRecord},
    device::Device,
    error::{DeliveryError, DeviceError},
    ipc_kind::IpcKind,
};

#[derive(Default)]
pub struct FakeDevice {
    packages: Vec<PackageRecord>,
    /// Zero-based delivery attempts that fail.
    failing_calls: HashSet<usize>,
    listing_fails: bool,
    pub delivered: RefCell<Vec<(IpcKind, ComponentRef)>>,
    pub listed: RefCell<Vec<IpcKind>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a package declaring `classes` for every kind.
    pub fn package(mut self, name: &str, system: bool, classes: &[&str]) -> Self {
        self.packages.push(PackageRecord {
            name: name.to_owned(),
            system,
            components: classes.iter().map(|class| class.to_string()).collect(),
        });
        self
    }

    pub fn failing_call(mut self, index: usize) -> Self {
        self.failing_calls.insert(index);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn delivery_count(&self) -> usize {
        self.delivered.borrow().len()
    }
}

impl Device for FakeDevice {
    fn list_packages(&self, kind: IpcKind) -> Result<Vec<PackageRecord>, DeviceError> {
        self.listed.borrow_mut().push(kind);
        if self.listing_fails {
            return Err(DeviceError::CommandFailed {
                command: "pm list packages".to_owned(),
                stderr: "adb: no devices/emulators found".to_owned(),
            });
        }
        Ok(self.packages.clone())
    }

    fn deliver(&self, kind: IpcKind, target: &ComponentRef) -> Result<(), DeliveryError> {
        let mut delivered = self.delivered.borrow_mut();
        let index = delivered.len();
        delivered.push((kind, target.clone()));

        if self.failing_calls.contains(&index) {
            return Err(DeliveryError::Rejected {
                reason: format!("java.lang.SecurityException: {} is not exported", target),
            });
        }
        Ok(())
    }
}
