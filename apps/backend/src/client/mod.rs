//! Headless client core: RPC surface, bucket reconciliation, navigation
//! guards and the turn handoff protocol. No rendering - the UI layer
//! consumes `Buckets` and `UiAction`s.

pub mod api;
pub mod handoff;
pub mod nav_guard;
pub mod reconcile;

pub use api::{LocalApi, MatchApi};
pub use handoff::{EntryOutcome, MatchSession, ScheduledEntry, SubmitOutcome, UiAction};
pub use nav_guard::{NavigationGuard, ScreenGuard, StatusTracker};
pub use reconcile::{classify, reload, Bucket, Buckets};
