use crate::api::models::Snapshot;

/// Delivered by the refresh loop to whichever view is active.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    /// A complete snapshot fetched by cycle `seq`.
    Refreshed { seq: u64, snapshot: Snapshot },
    /// Cycle `seq` failed; the previous snapshot stays current.
    Failed { seq: u64, reason: String },
}

impl RefreshEvent {
    pub fn seq(&self) -> u64 {
        match self {
            RefreshEvent::Refreshed { seq, .. } | RefreshEvent::Failed { seq, .. } => *seq,
        }
    }
}
