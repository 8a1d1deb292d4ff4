//! crates/study_assistant_core/src/listing.rs
//!
//! Ordering for the dashboard's study-session list.

use crate::domain::StudySession;

/// Sorts newest first. Sessions created in the same instant fall back to id order
/// so the list is stable between fetches.
pub fn sort_newest_first(sessions: &mut [StudySession]) {
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}
