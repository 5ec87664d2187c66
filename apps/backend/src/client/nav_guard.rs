//! Navigation guards - keeping one logical screen transition from firing
//! twice.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use crate::entities::matches::MatchStatus;

/// Process-wide registry mapping match id -> already-navigated.
///
/// Checked and set in one atomic step immediately before a screen transition
/// keyed by that match id, and released on screen teardown so a legitimate
/// future re-entry is not permanently blocked.
#[derive(Debug, Default)]
pub struct NavigationGuard {
    navigated: DashMap<i64, ()>,
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic check-and-set. True means the caller owns the transition;
    /// false means someone already navigated for this match.
    pub fn try_begin_navigation(&self, match_id: i64) -> bool {
        match self.navigated.entry(match_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(());
                true
            }
        }
    }

    /// Screen teardown hook.
    pub fn release(&self, match_id: i64) {
        self.navigated.remove(&match_id);
    }

    pub fn is_navigated(&self, match_id: i64) -> bool {
        self.navigated.contains_key(&match_id)
    }
}

/// Per-screen-instance guard, defense in depth behind the registry.
///
/// Owned by the rendered screen itself: each gameplay screen instance holds
/// one and checks it before acting on its own entry animation, so even a
/// bug above the registry cannot double-fire within a single instance.
#[derive(Debug, Default)]
pub struct ScreenGuard {
    fired: AtomicBool,
}

impl ScreenGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once per instance.
    pub fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::SeqCst)
    }
}

/// Duplicate-event filter: inbound events whose status equals the last
/// observed status for that match are discarded before any side effect,
/// including before the navigation guard is consulted. Push delivery does
/// not suppress duplicates for us.
#[derive(Debug, Default)]
pub struct StatusTracker {
    last_status: DashMap<i64, MatchStatus>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `status` for `match_id`. Returns false when it matches the
    /// last observed status - the caller drops the event.
    pub fn observe(&self, match_id: i64, status: MatchStatus) -> bool {
        match self.last_status.insert(match_id, status) {
            Some(previous) => previous != status,
            None => true,
        }
    }

    /// Forget a match (terminal cleanup).
    pub fn forget(&self, match_id: i64) {
        self.last_status.remove(&match_id);
    }
}
