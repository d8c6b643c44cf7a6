//! Commit gate shared between a unit of work and the task waiting on it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const RUNNING: u8 = 0;
const COMMITTING: u8 = 1;
const ABANDONED: u8 = 2;

/// Decides, exactly once, whether a unit of work commits or is abandoned.
///
/// The worker calls [`CommitGate::try_commit`] right before `COMMIT`; the
/// waiter calls [`CommitGate::abandon`] when its timeout fires. Whichever
/// flips the gate first wins: an abandoned unit of work always rolls back,
/// and a committing one is always awaited to completion.
#[derive(Debug, Clone, Default)]
pub struct CommitGate {
    state: Arc<AtomicU8>,
}

impl CommitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to commit. False if the waiter already gave up.
    pub fn try_commit(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Give up on the unit of work. False if it is already committing.
    pub fn abandon(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_abandoned(&self) -> bool {
        self.state.load(Ordering::Acquire) == ABANDONED
    }
}
