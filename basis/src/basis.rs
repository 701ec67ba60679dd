use crate::shell::Shell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Basis set templates: for each atomic number, the ordered shells of that
/// element centered at the origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasisSet {
    pub name: String,
    elements: BTreeMap<u32, Vec<Shell>>,
}

impl BasisSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: BTreeMap::new(),
        }
    }

    pub fn push_shell(&mut self, atomic_number: u32, shell: Shell) {
        self.elements.entry(atomic_number).or_default().push(shell);
    }

    /// Template shells of an element, `None` when the basis does not cover it.
    pub fn shells_for(&self, atomic_number: u32) -> Option<&[Shell]> {
        self.elements.get(&atomic_number).map(Vec::as_slice)
    }

    pub fn contains(&self, atomic_number: u32) -> bool {
        self.elements.contains_key(&atomic_number)
    }

    /// Atomic numbers covered, ascending.
    pub fn elements(&self) -> impl Iterator<Item = u32> + '_ {
        self.elements.keys().copied()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn max_l(&self) -> usize {
        self.elements
            .values()
            .flatten()
            .map(|s| s.l)
            .max()
            .unwrap_or(0)
    }

    /// Number of basis functions one atom of this element contributes.
    pub fn functions_for(&self, atomic_number: u32) -> Option<usize> {
        self.shells_for(atomic_number)
            .map(|shells| shells.iter().map(Shell::size).sum())
    }
}
