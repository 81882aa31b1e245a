//! Business rules
//!
//! Each service function is a complete use case: authorization, validation,
//! the conditional write, then post-commit event dispatch. Handlers stay thin
//! and tests drive these functions directly against the in-memory store.

pub mod messages;
pub mod orders;
pub mod shops;

use chrono::NaiveDateTime;

/// Wall-clock time on the server's local clock — schedules are interpreted in
/// the shop's (= deployment's) timezone
pub(crate) fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
