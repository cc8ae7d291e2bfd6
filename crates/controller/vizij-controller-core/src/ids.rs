//! Identifiers and the allocator that hands them out.
//!
//! Every state machine and behaviour in a [`ControllerGraph`](crate::graph::ControllerGraph)
//! carries one of these ids. They are the identity the rest of the crate keys on:
//! layer indices shift as layers are inserted and removed, ids never do.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct StateMachineId(pub u32);

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct BehaviourId(pub u32);

impl fmt::Display for StateMachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sm#{}", self.0)
    }
}

impl fmt::Display for BehaviourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "behaviour#{}", self.0)
    }
}

/// Monotonic allocator for graph identities.
///
/// Id 0 is never handed out so that a default-constructed id is recognisably
/// unassigned (JSON-loaded graphs carry zeroes until adopted).
#[derive(Debug)]
pub struct IdAllocator {
    next_state_machine: u32,
    next_behaviour: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_state_machine: 1,
            next_behaviour: 1,
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_state_machine(&mut self) -> StateMachineId {
        let id = StateMachineId(self.next_state_machine);
        self.next_state_machine = self.next_state_machine.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_behaviour(&mut self) -> BehaviourId {
        let id = BehaviourId(self.next_behaviour);
        self.next_behaviour = self.next_behaviour.wrapping_add(1);
        id
    }

    /// Skip past an id already in use so later allocations can't collide with it.
    pub fn observe_state_machine(&mut self, id: StateMachineId) {
        if id.0 >= self.next_state_machine {
            self.next_state_machine = id.0.wrapping_add(1);
        }
    }

    pub fn observe_behaviour(&mut self, id: BehaviourId) {
        if id.0 >= self.next_behaviour {
            self.next_behaviour = id.0.wrapping_add(1);
        }
    }
}
