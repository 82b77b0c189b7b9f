use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type ShowId = i64;
pub type ActivityId = i64;
pub type RequestId = i64;
pub type MessageId = i64;
pub type ImportId = i64;

/// Error returned when a stored or submitted label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum using the
/// same labels the serde representation uses, so SQLite text columns and JSON
/// agree on spelling. Extra `| "alias"` spellings are accepted on input only.
macro_rules! labelled_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label $(| $alias)* => Ok($ty::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// The three per-user lists. A show sits in at most one of them per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Watchlist,
    #[serde(alias = "currently-watching")]
    CurrentlyWatching,
    Watched,
}

labelled_enum!(ListKind, "list kind", {
    Watchlist => "watchlist",
    CurrentlyWatching => "currently_watching" | "currently-watching",
    Watched => "watched",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

labelled_enum!(MediaKind, "media kind", {
    Movie => "movie",
    Series => "series",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Friends,
    Private,
}

labelled_enum!(Visibility, "visibility", {
    Public => "public",
    Friends => "friends",
    Private => "private",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

labelled_enum!(RequestStatus, "request status", {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    ShowRecommendation,
}

labelled_enum!(MessageKind, "message kind", {
    Text => "text",
    ShowRecommendation => "show_recommendation",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ListChange,
    Review,
    Post,
}

labelled_enum!(ActivityKind, "activity kind", {
    ListChange => "list_change",
    Review => "review",
    Post => "post",
});

/// An import stays pending until the user confirms their picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Pending,
    Completed,
}

labelled_enum!(ImportStatus, "import status", {
    Pending => "pending",
    Completed => "completed",
});

/// Ordering for comments in an activity overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSort {
    #[default]
    Newest,
    Top,
}

/// Canonical, order-independent address of a two-party conversation.
///
/// Both writes and unread aggregation go through this key so a pair of users
/// always maps to the same storage location regardless of who sent what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationKey {
    low: UserId,
    high: UserId,
}

impl ConversationKey {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    /// The participant that is not `me`, or `None` if `me` is not in the pair.
    pub fn other(&self, me: UserId) -> Option<UserId> {
        if me == self.low {
            Some(self.high)
        } else if me == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    pub fn contains(&self, user: UserId) -> bool {
        user == self.low || user == self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_key_is_order_independent() {
        assert_eq!(ConversationKey::new(7, 3), ConversationKey::new(3, 7));
        let key = ConversationKey::new(9, 2);
        assert_eq!(key.low(), 2);
        assert_eq!(key.high(), 9);
        assert_eq!(key.other(2), Some(9));
        assert_eq!(key.other(9), Some(2));
        assert_eq!(key.other(5), None);
    }

    #[test]
    fn self_conversation_key() {
        let key = ConversationKey::new(4, 4);
        assert!(key.contains(4));
        assert_eq!(key.other(4), Some(4));
    }

    #[test]
    fn labels_match_serde() {
        for kind in ListKind::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<ListKind>().unwrap(), *kind);
        }
        assert_eq!(
            serde_json::to_string(&MessageKind::ShowRecommendation).unwrap(),
            "\"show_recommendation\""
        );
    }

    #[test]
    fn hyphenated_list_kind_is_accepted() {
        assert_eq!("currently-watching".parse::<ListKind>().unwrap(), ListKind::CurrentlyWatching);
        let kind: ListKind = serde_json::from_str("\"currently-watching\"").unwrap();
        assert_eq!(kind, ListKind::CurrentlyWatching);
        // Always written back in the canonical spelling
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"currently_watching\"");
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "to_watch".parse::<ListKind>().unwrap_err();
        assert_eq!(err.kind, "list kind");
        assert_eq!(err.to_string(), "unknown list kind 'to_watch'");
    }
}
