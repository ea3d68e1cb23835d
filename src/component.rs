//! Identifiers for the components that receive null intents.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A component on the device, e.g. `com.example.app/.ExampleReceiver`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    /// The package declaring the component.
    pub package: String,
    /// The fully qualified class of the component.
    pub class: String,
}

impl ComponentRef {
    pub fn new(package: &str, class: &str) -> Self {
        Self {
            package: package.to_owned(),
            class: class.to_owned(),
        }
    }

    /// Parses `package/class`, expanding the `package/.Class` short form.
    pub fn from_flattened(flattened: &str) -> Option<Self> {
        let (package, class) = flattened.split_once('/')?;
        if package.is_empty() || class.is_empty() {
            return None;
        }

        let class = match class.strip_prefix('.') {
            Some(rest) => format!("{}.{}", package, rest),
            None => class.to_owned(),
        };

        Some(Self {
            package: package.to_owned(),
            class,
        })
    }

    /// The component as understood by `am -n`, e.g.
    /// `com.example.app/com.example.app.ExampleReceiver`
    pub fn flatten(&self) -> String {
        format!("{}/{}", self.package, self.class)
    }

    /// Like [ComponentRef::flatten] but abbreviates classes living in the
    /// declaring package.
    pub fn flatten_short(&self) -> String {
        match self.class.strip_prefix(&self.package) {
            Some(rest) if rest.starts_with('.') => format!("{}/{}", self.package, rest),
            _ => self.flatten(),
        }
    }

    /// Describes an empty intent addressed only to this component.
    pub fn null_intent(&self) -> String {
        format!("Intent {{ cmp={} }}", self.flatten_short())
    }
}

/// Components are displayed by their class only.
impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class)
    }
}

/// An installed package with the components it declares for one IPC kind.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub system: bool,
    /// Fully qualified class names.
    pub components: Vec<String>,
}
