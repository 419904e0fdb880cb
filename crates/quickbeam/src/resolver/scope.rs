//! Binding arena, lexical scopes and move states

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ast::Grade;
use crate::span::Span;

/// Index into the resolver's binding arena.
pub(super) type BindingId = usize;

/// Static move state of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveState {
    /// Readable
    Live,
    /// Moved out at the given read
    Moved(Span),
    /// Removed by the given `delete`
    Deleted(Span),
    /// Declared with `var` but never assigned
    Uninitialized,
}

impl MoveState {
    /// Combine the states of two control-flow paths. A move on either path
    /// wins, then a delete, then a missing initialization.
    pub fn merge(self, other: MoveState) -> MoveState {
        match (self, other) {
            (MoveState::Moved(at), _) | (_, MoveState::Moved(at)) => MoveState::Moved(at),
            (MoveState::Deleted(at), _) | (_, MoveState::Deleted(at)) => MoveState::Deleted(at),
            (MoveState::Uninitialized, _) | (_, MoveState::Uninitialized) => {
                MoveState::Uninitialized
            }
            (MoveState::Live, MoveState::Live) => MoveState::Live,
        }
    }
}

/// Flow facts about one binding on the current path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Slot {
    pub(super) state: MoveState,
    /// Clock reading of the latest `set` that every path to here passed
    pub(super) assigned: u32,
}

impl Slot {
    pub(super) fn new(state: MoveState) -> Self {
        Self { state, assigned: 0 }
    }

    fn merge(self, other: Slot) -> Slot {
        Slot {
            state: self.state.merge(other.state),
            assigned: self.assigned.min(other.assigned),
        }
    }
}

/// Merge two snapshots elementwise. Entries only one side has are kept.
pub(super) fn merge_states(a: &[Slot], b: &[Slot]) -> Vec<Slot> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    long.iter()
        .enumerate()
        .map(|(i, slot)| match short.get(i) {
            Some(other) => slot.merge(*other),
            None => *slot,
        })
        .collect()
}

/// Fold `states` into an optional accumulator.
pub(super) fn merge_into(acc: Option<Vec<Slot>>, states: &[Slot]) -> Vec<Slot> {
    match acc {
        Some(acc) => merge_states(&acc, states),
        None => states.to_vec(),
    }
}

/// What a name was declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `let`/`var` or a parameter
    Variable,
    /// `function` declaration
    Function,
    /// `class` declaration
    Class,
    /// Method receiver
    This,
}

impl BindingKind {
    /// Only plain variables are consumed by reads.
    pub fn is_movable(self) -> bool {
        self == BindingKind::Variable
    }
}

/// Static information about one declaration.
#[derive(Debug, Clone)]
pub struct BindingInfo {
    /// Declared name
    pub name: String,
    /// Declared privileges
    pub grade: Grade,
    /// What kind of declaration introduced it
    pub kind: BindingKind,
    /// Where it was declared
    pub declared_at: Span,
}

/// Names visible in one lexical block.
#[derive(Debug, Default)]
pub(super) struct Scope {
    names: HashMap<String, BindingId>,
}

impl Scope {
    pub(super) fn get(&self, name: &str) -> Option<BindingId> {
        self.names.get(name).copied()
    }

    pub(super) fn insert(&mut self, name: String, id: BindingId) {
        self.names.insert(name, id);
    }
}

/// How a loop body touched an outer binding before reassigning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Access {
    /// Needs the value: moved or deleted on the back edge is an error
    Read,
    /// `set` or `delete`: only needs the binding to still exist
    Write,
}

/// Per-loop bookkeeping.
///
/// Break and continue states flow out of the loop and back to its
/// condition. `exposed` holds the first use of every binding declared
/// before the loop that no `set` inside the loop precedes; those uses see
/// whatever the previous iteration left behind.
#[derive(Debug, Default)]
pub(super) struct LoopFrame {
    pub(super) breaks: Option<Vec<Slot>>,
    pub(super) continues: Option<Vec<Slot>>,
    /// Clock reading when the loop was entered
    pub(super) entered: u32,
    /// Bindings with a lower id were declared before the loop
    pub(super) outer_bindings: usize,
    pub(super) exposed: IndexMap<BindingId, (Access, Span)>,
}

impl LoopFrame {
    pub(super) fn new(entered: u32, outer_bindings: usize) -> Self {
        Self {
            entered,
            outer_bindings,
            ..Self::default()
        }
    }

    /// Record a use of `id` unless a stronger one is already recorded.
    pub(super) fn expose(&mut self, id: BindingId, access: Access, span: Span) {
        match self.exposed.get(&id) {
            Some((Access::Read, _)) => {}
            Some((Access::Write, _)) if access == Access::Write => {}
            _ => {
                self.exposed.insert(id, (access, span));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_wins_merge() {
        let at = Span::new(3, 4);
        assert_eq!(MoveState::Live.merge(MoveState::Moved(at)), MoveState::Moved(at));
        assert_eq!(
            MoveState::Deleted(at).merge(MoveState::Uninitialized),
            MoveState::Deleted(at)
        );
        assert_eq!(
            MoveState::Uninitialized.merge(MoveState::Live),
            MoveState::Uninitialized
        );
        assert_eq!(MoveState::Live.merge(MoveState::Live), MoveState::Live);
    }

    #[test]
    fn test_merge_states_keeps_longer_tail() {
        let at = Span::new(0, 1);
        let moved = Slot::new(MoveState::Moved(at));
        let a = vec![Slot::new(MoveState::Live), moved];
        let b = vec![moved];
        assert_eq!(merge_states(&a, &b), vec![moved, moved]);
    }

    #[test]
    fn test_merge_keeps_earliest_assignment() {
        let early = Slot {
            state: MoveState::Live,
            assigned: 2,
        };
        let late = Slot {
            state: MoveState::Live,
            assigned: 9,
        };
        assert_eq!(merge_states(&[early], &[late])[0].assigned, 2);
    }

    #[test]
    fn test_read_exposure_outranks_write() {
        let mut frame = LoopFrame::new(1, 4);
        frame.expose(0, Access::Write, Span::new(0, 1));
        frame.expose(0, Access::Read, Span::new(5, 6));
        frame.expose(0, Access::Write, Span::new(9, 10));
        assert_eq!(frame.exposed[&0], (Access::Read, Span::new(5, 6)));
    }
}
