//! Tool catalog - arena of descriptors with stable indices
//!
//! Descriptors live in slots of a `Vec`; a [`ToolId`] is the slot index and
//! never changes for the lifetime of the catalog. Removing a tool leaves a
//! tombstone so ids are not reused, and iteration follows declaration order,
//! which rule-based routing relies on for deterministic tie-breaking.

use std::collections::HashMap;

use super::entities::{RiskLevel, ToolDescriptor, ToolName};

/// Stable index of a descriptor inside a [`ToolCatalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolId(usize);

impl ToolId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Catalog of registered tool descriptors
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    slots: Vec<Option<ToolDescriptor>>,
    index: HashMap<ToolName, ToolId>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor. Returns `None` if the name is already taken.
    pub fn insert(&mut self, descriptor: ToolDescriptor) -> Option<ToolId> {
        if self.index.contains_key(&descriptor.name) {
            return None;
        }
        let id = ToolId(self.slots.len());
        self.index.insert(descriptor.name.clone(), id);
        self.slots.push(Some(descriptor));
        Some(id)
    }

    /// Builder-style insert; later duplicates are ignored
    pub fn with(mut self, descriptor: ToolDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Remove a descriptor, leaving a tombstone in its slot
    pub fn remove(&mut self, name: &str) -> Option<ToolDescriptor> {
        let id = self.index.remove(name)?;
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn id_of(&self, name: &str) -> Option<ToolId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.id_of(name).and_then(|id| self.get_by_id(id))
    }

    pub fn get_by_id(&self, id: ToolId) -> Option<&ToolDescriptor> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Live descriptors in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (ToolId, &ToolDescriptor)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|d| (ToolId(i), d)))
    }

    pub fn names(&self) -> impl Iterator<Item = &ToolName> {
        self.iter().map(|(_, d)| &d.name)
    }

    pub fn by_risk(&self, risk: RiskLevel) -> impl Iterator<Item = &ToolDescriptor> {
        self.iter()
            .map(|(_, d)| d)
            .filter(move |d| d.risk_hint == risk)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
