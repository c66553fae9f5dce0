// src/register/handle.rs

//! Lightweight qubit views.
//!
//! A handle is a register id plus one or more qubit indices; it owns no
//! amplitude data and stays valid only as long as its register does.
//! Handles are freely copyable, and every consuming operation checks the
//! id so that views of two different registers cannot be mixed.

use std::fmt;

use crate::core::error::{QuregError, SystemId};

/// A view of a single qubit inside a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Qubit {
    pub(crate) system: SystemId,
    pub(crate) index: usize,
}

impl Qubit {
    /// Index of the qubit within its register.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Id of the register this handle was created from.
    pub fn system_id(&self) -> SystemId {
        self.system
    }

    /// This qubit as a one-element group.
    pub fn as_group(&self) -> QubitGroup {
        QubitGroup { system: self.system, indexes: vec![self.index] }
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Qubit({} in {})", self.index, self.system)
    }
}

/// An ordered view of several qubits inside one register.
///
/// The order matters: multi-qubit operations such as the QFT process the
/// group front to back. Indices may repeat inside a group; operations that
/// require distinct operands check and reject repetition themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QubitGroup {
    pub(crate) system: SystemId,
    pub(crate) indexes: Vec<usize>,
}

impl QubitGroup {
    pub(crate) fn new(system: SystemId, indexes: Vec<usize>) -> Self {
        Self { system, indexes }
    }

    /// Id of the register this group views.
    pub fn system_id(&self) -> SystemId {
        self.system
    }

    /// Number of qubits in the group.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// The qubit indices in group order.
    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    /// The qubit at `position`, counting from the back when negative.
    pub fn get(&self, position: isize) -> Result<Qubit, QuregError> {
        let len = self.indexes.len() as isize;
        let resolved = if position < 0 { position + len } else { position };
        if resolved < 0 || resolved >= len {
            return Err(QuregError::InvalidIndex {
                index: position,
                len: self.indexes.len(),
            });
        }
        Ok(Qubit { system: self.system, index: self.indexes[resolved as usize] })
    }

    /// Iterates over the group as single-qubit handles.
    pub fn iter(&self) -> impl Iterator<Item = Qubit> + '_ {
        let system = self.system;
        self.indexes.iter().map(move |&index| Qubit { system, index })
    }

    /// A new group holding this group's qubits in reverse order.
    pub fn reversed(&self) -> QubitGroup {
        let mut indexes = self.indexes.clone();
        indexes.reverse();
        QubitGroup { system: self.system, indexes }
    }

    /// Concatenates two groups from the same register.
    pub fn join(&self, other: &QubitGroup) -> Result<QubitGroup, QuregError> {
        if self.system != other.system {
            return Err(QuregError::CrossSystem {
                expected: self.system,
                found: other.system,
            });
        }
        let mut indexes = self.indexes.clone();
        indexes.extend_from_slice(&other.indexes);
        Ok(QubitGroup { system: self.system, indexes })
    }

    /// Appends a single qubit from the same register.
    pub fn with(&self, qubit: Qubit) -> Result<QubitGroup, QuregError> {
        self.join(&qubit.as_group())
    }

    /// Whether the group contains the given index.
    pub fn contains(&self, index: usize) -> bool {
        self.indexes.contains(&index)
    }

    /// First index appearing more than once, if any.
    pub(crate) fn first_duplicate(&self) -> Option<usize> {
        for (position, &index) in self.indexes.iter().enumerate() {
            if self.indexes[..position].contains(&index) {
                return Some(index);
            }
        }
        None
    }
}

impl fmt::Display for QubitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Qubits({} qubits in {})", self.indexes.len(), self.system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(indexes: &[usize]) -> QubitGroup {
        QubitGroup::new(SystemId(7), indexes.to_vec())
    }

    #[test]
    fn negative_positions_count_from_back() {
        let g = group(&[2, 5, 9]);
        assert_eq!(g.get(-1).unwrap().index(), 9);
        assert_eq!(g.get(0).unwrap().index(), 2);
        assert!(matches!(g.get(3), Err(QuregError::InvalidIndex { .. })));
        assert!(matches!(g.get(-4), Err(QuregError::InvalidIndex { .. })));
    }

    #[test]
    fn join_rejects_foreign_groups() {
        let g = group(&[0]);
        let foreign = QubitGroup::new(SystemId(8), vec![1]);
        assert!(matches!(g.join(&foreign), Err(QuregError::CrossSystem { .. })));
    }

    #[test]
    fn first_duplicate_finds_repetition() {
        assert_eq!(group(&[1, 2, 3]).first_duplicate(), None);
        assert_eq!(group(&[1, 2, 1]).first_duplicate(), Some(1));
    }

    #[test]
    fn reversed_preserves_contents() {
        let g = group(&[4, 1, 0]).reversed();
        assert_eq!(g.indexes(), &[0, 1, 4]);
    }
}
