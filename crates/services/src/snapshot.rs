use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

/// Issued by `SnapshotSlot::begin` before a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// What happened to a fetched snapshot handed to `SnapshotSlot::apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotUpdate {
    /// Installed. `superseded` is set when a newer fetch had already landed
    /// and this older result overwrote it.
    Applied { superseded: bool },
    /// The owning view was closed; the result was dropped.
    Discarded,
}

struct SlotState<T> {
    value: Arc<T>,
    issued: u64,
    applied: u64,
    mounted: bool,
}

/// Latest snapshot held by a mounted view.
///
/// Overlapping fetches are not fenced: whichever resolves last wins. Once
/// the view unmounts, late results are discarded.
pub struct SnapshotSlot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T> SnapshotSlot<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(SlotState {
                value: Arc::new(initial),
                issued: 0,
                applied: 0,
                mounted: true,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn current(&self) -> Arc<T> {
        Arc::clone(&self.lock().value)
    }

    pub fn begin(&self) -> FetchTicket {
        let mut state = self.lock();
        state.issued += 1;
        FetchTicket(state.issued)
    }

    pub fn apply(&self, ticket: FetchTicket, value: T) -> SlotUpdate {
        let mut state = self.lock();
        if !state.mounted {
            warn!(ticket = ticket.0, "view closed; discarding late snapshot");
            return SlotUpdate::Discarded;
        }

        let superseded = ticket.0 < state.applied;
        if superseded {
            warn!(
                ticket = ticket.0,
                newest = state.applied,
                "older snapshot overwrote a newer one"
            );
        }
        state.value = Arc::new(value);
        state.applied = state.applied.max(ticket.0);
        SlotUpdate::Applied { superseded }
    }

    pub fn unmount(&self) {
        self.lock().mounted = false;
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }
}
