/**
 * Presence Registry
 *
 * Tracks which identities currently hold at least one live connection. An
 * identity may hold several connections at once (multiple tabs or devices);
 * it is online while any of them is open.
 *
 * # Invariants
 *
 * - An identity appears in the online set iff its handle set is non-empty.
 *   Entries are removed when their last handle goes away.
 * - A handle is bound to exactly one identity for its lifetime.
 * - `revision` increases by one on every change of the online set and never
 *   otherwise, so snapshots can be ordered by revision.
 *
 * # Locking
 *
 * All state sits behind one `std::sync::Mutex`. Every method takes the lock
 * for a short, synchronous critical section and computes the returned
 * snapshot under it, so a `PresenceChange` always describes the state right
 * after its own mutation. The lock is never held across an `.await`.
 */
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier of one live connection
///
/// Handed out from a process-wide counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What a register/deregister call did to the identity's presence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The identity had no connection before this one
    CameOnline,
    /// The identity is online before and after the call
    StillOnline,
    /// The identity's last connection went away
    WentOffline,
    /// Nothing changed (unknown handle)
    Unchanged,
}

impl Transition {
    /// Whether the online set changed and must be broadcast
    pub fn changes_online_set(self) -> bool {
        matches!(self, Self::CameOnline | Self::WentOffline)
    }
}

/// Result of a registry mutation together with the state right after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceChange {
    pub transition: Transition,
    /// Sorted online set after the mutation
    pub online: Vec<Uuid>,
    /// Online-set revision after the mutation
    pub revision: u64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PresenceError {
    #[error("Connection {handle} is already bound to another identity")]
    HandleOwnedByOther { handle: ConnectionId },
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<Uuid, HashSet<ConnectionId>>,
    owners: HashMap<ConnectionId, Uuid>,
    revision: u64,
}

impl Inner {
    fn snapshot(&self) -> Vec<Uuid> {
        let mut online: Vec<Uuid> = self.entries.keys().copied().collect();
        online.sort();
        online
    }

    fn change(&self, transition: Transition) -> PresenceChange {
        PresenceChange {
            transition,
            online: self.snapshot(),
            revision: self.revision,
        }
    }
}

#[derive(Debug, Default)]
pub struct PresenceRegistry {
    inner: Mutex<Inner>,
    next_handle: AtomicU64,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere cannot leave `Inner` half-updated: every mutation is
    // a handful of infallible map operations.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a fresh connection handle
    pub fn next_handle(&self) -> ConnectionId {
        ConnectionId(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Record that `identity` opened the connection `handle`
    ///
    /// Registering the same handle for the same identity twice is a no-op
    /// reported as `StillOnline`.
    pub fn register(&self, identity: Uuid, handle: ConnectionId) -> Result<PresenceChange, PresenceError> {
        let mut inner = self.lock();

        match inner.owners.get(&handle) {
            Some(owner) if *owner != identity => {
                return Err(PresenceError::HandleOwnedByOther { handle });
            }
            Some(_) => return Ok(inner.change(Transition::StillOnline)),
            None => {}
        }

        inner.owners.insert(handle, identity);
        let handles = inner.entries.entry(identity).or_default();
        let was_offline = handles.is_empty();
        handles.insert(handle);

        let transition = if was_offline {
            inner.revision += 1;
            Transition::CameOnline
        } else {
            Transition::StillOnline
        };
        Ok(inner.change(transition))
    }

    /// Record that the connection `handle` of `identity` closed
    ///
    /// Unknown handles, or a handle that belongs to someone else, leave the
    /// registry untouched and report `Unchanged`.
    pub fn deregister(&self, identity: Uuid, handle: ConnectionId) -> PresenceChange {
        let mut inner = self.lock();

        if inner.owners.get(&handle) != Some(&identity) {
            return inner.change(Transition::Unchanged);
        }
        inner.owners.remove(&handle);

        let now_empty = match inner.entries.get_mut(&identity) {
            Some(handles) => {
                handles.remove(&handle);
                handles.is_empty()
            }
            None => false,
        };

        let transition = if now_empty {
            inner.entries.remove(&identity);
            inner.revision += 1;
            Transition::WentOffline
        } else {
            Transition::StillOnline
        };
        inner.change(transition)
    }

    /// Sorted list of online identities
    pub fn snapshot(&self) -> Vec<Uuid> {
        self.lock().snapshot()
    }

    /// Online set together with its revision, read atomically
    pub fn snapshot_with_revision(&self) -> (u64, Vec<Uuid>) {
        let inner = self.lock();
        (inner.revision, inner.snapshot())
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub fn is_online(&self, identity: Uuid) -> bool {
        self.lock().entries.contains_key(&identity)
    }

    pub fn connection_count(&self, identity: Uuid) -> usize {
        self.lock().entries.get(&identity).map_or(0, HashSet::len)
    }
}
