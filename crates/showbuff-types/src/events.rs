use crate::models::{ActivityKind, ListKind};

/// Side effects the list and review operations hand to the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    /// A show was added to a list
    AddedToList { list: ListKind },

    /// A show was moved from one list into another
    MovedToList { from: ListKind, to: ListKind },

    /// A review was written for the first time
    Reviewed,

    /// An existing review was edited in place
    ReviewUpdated,

    /// A free-form post
    Posted,
}

impl ActivityEvent {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Self::AddedToList { .. } | Self::MovedToList { .. } => ActivityKind::ListChange,
            Self::Reviewed | Self::ReviewUpdated => ActivityKind::Review,
            Self::Posted => ActivityKind::Post,
        }
    }

    /// Action label stored on the activity row, e.g. `added_to_watchlist`.
    pub fn action_label(&self) -> String {
        match self {
            Self::AddedToList { list } => format!("added_to_{}", list.as_str()),
            Self::MovedToList { to, .. } => format!("moved_to_{}", to.as_str()),
            Self::Reviewed => "reviewed".to_string(),
            Self::ReviewUpdated => "updated_review".to_string(),
            Self::Posted => "posted".to_string(),
        }
    }
}
