//! Scheduled cleanup of accounts that never confirmed their email.
//!
//! Each run walks the pending-signup ledger. Entries still inside the grace
//! period are left alone. Older entries are settled against the identity
//! store: unverified identities are deleted along with their entry, verified
//! ones only lose the entry. The identity is always deleted before the
//! ledger entry, so an interrupted run is picked up again by the next one.

pub mod lease;
pub mod scheduler;
pub mod services;
pub mod summary;

pub use scheduler::Scheduler;
pub use services::Reaper;
pub use summary::{RecordOutcome, RecordResult, Resolution, RunSummary, SkipReason};
