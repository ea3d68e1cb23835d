//! The discovered components of one IPC kind and the list shown to the user.

use std::collections::HashSet;

use serde::Serialize;

use crate::component::ComponentRef;

/// Components in platform enumeration order. Duplicated class names are kept.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentRegistry {
    components: Vec<ComponentRef>,
}

impl ComponentRegistry {
    pub fn new(components: Vec<ComponentRef>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[ComponentRef] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Unique class names in order of first appearance.
    pub fn display_list(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.components
            .iter()
            .filter(|component| seen.insert(component.class.as_str()))
            .map(|component| component.class.clone())
            .collect()
    }

    /// Number of entries whose class name already appeared earlier.
    pub fn collisions(&self) -> usize {
        let mut seen = HashSet::new();
        self.components
            .iter()
            .filter(|component| !seen.insert(component.class.as_str()))
            .count()
    }

    /// The first component with the given class name. Later entries with the
    /// same class are only reachable through a batch.
    pub fn resolve(&self, class: &str) -> Option<&ComponentRef> {
        self.components
            .iter()
            .find(|component| component.class == class)
    }
}
