//! Likes and comments layered over durable activity rows.
//!
//! This state lives only in this process. It is lost on restart and is not
//! shared between server instances, so counts read from two instances can
//! disagree. Treat it as best-effort social metadata, never as a source of
//! truth; a production deployment would likely persist it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use showbuff_types::api::{CommentView, OverlayView};
use showbuff_types::models::{ActivityId, CommentSort, UserId};

#[derive(Debug, Default)]
struct Overlay {
    likes: HashSet<UserId>,
    comments: Vec<Comment>,
}

impl Overlay {
    fn is_empty(&self) -> bool {
        self.likes.is_empty() && self.comments.is_empty()
    }
}

#[derive(Debug)]
struct Comment {
    id: u64,
    author_id: UserId,
    author_name: String,
    text: String,
    created_at: DateTime<Utc>,
    likes: HashSet<UserId>,
}

impl Comment {
    fn view(&self, viewer: UserId) -> CommentView {
        CommentView {
            id: self.id,
            author_id: self.author_id,
            author_name: self.author_name.clone(),
            text: self.text.clone(),
            created_at: self.created_at,
            like_count: self.likes.len(),
            liked_by_me: self.likes.contains(&viewer),
        }
    }
}

/// Counts attached to a feed item at read time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlaySummary {
    pub like_count: usize,
    pub comment_count: usize,
    pub liked_by_me: bool,
}

pub struct OverlayStore {
    /// activity_id -> overlay; activities nobody has touched have no entry
    overlays: RwLock<HashMap<ActivityId, Overlay>>,
    next_comment_id: AtomicU64,
}

impl Default for OverlayStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayStore {
    pub fn new() -> Self {
        Self {
            overlays: RwLock::new(HashMap::new()),
            next_comment_id: AtomicU64::new(1),
        }
    }

    /// Flip `user`'s like on an activity. Returns (liked, like_count) after the flip.
    pub async fn toggle_like(&self, activity: ActivityId, user: UserId) -> (bool, usize) {
        let mut overlays = self.overlays.write().await;
        let overlay = overlays.entry(activity).or_default();

        let liked = if overlay.likes.remove(&user) {
            false
        } else {
            overlay.likes.insert(user);
            true
        };
        let count = overlay.likes.len();

        // Unliking the last like must leave no trace
        if overlay.is_empty() {
            overlays.remove(&activity);
        }
        (liked, count)
    }

    pub async fn add_comment(
        &self,
        activity: ActivityId,
        author_id: UserId,
        author_name: &str,
        text: &str,
    ) -> CommentView {
        let comment = Comment {
            id: self.next_comment_id.fetch_add(1, Ordering::Relaxed),
            author_id,
            author_name: author_name.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
            likes: HashSet::new(),
        };
        let view = comment.view(author_id);

        self.overlays
            .write()
            .await
            .entry(activity)
            .or_default()
            .comments
            .push(comment);
        view
    }

    /// Flip `user`'s like on a comment. `None` if the comment does not exist
    /// on that activity.
    pub async fn toggle_comment_like(
        &self,
        activity: ActivityId,
        comment_id: u64,
        user: UserId,
    ) -> Option<(bool, usize)> {
        let mut overlays = self.overlays.write().await;
        let comment = overlays
            .get_mut(&activity)?
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)?;

        let liked = if comment.likes.remove(&user) {
            false
        } else {
            comment.likes.insert(user);
            true
        };
        Some((liked, comment.likes.len()))
    }

    pub async fn view(&self, activity: ActivityId, viewer: UserId, sort: CommentSort) -> OverlayView {
        let overlays = self.overlays.read().await;
        let Some(overlay) = overlays.get(&activity) else {
            return OverlayView {
                activity_id: activity,
                like_count: 0,
                liked_by_me: false,
                comment_count: 0,
                comments: Vec::new(),
            };
        };

        let mut comments: Vec<&Comment> = overlay.comments.iter().collect();
        match sort {
            CommentSort::Newest => {
                comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
            CommentSort::Top => comments.sort_by(|a, b| {
                b.likes
                    .len()
                    .cmp(&a.likes.len())
                    .then(b.created_at.cmp(&a.created_at))
                    .then(b.id.cmp(&a.id))
            }),
        }

        OverlayView {
            activity_id: activity,
            like_count: overlay.likes.len(),
            liked_by_me: overlay.likes.contains(&viewer),
            comment_count: overlay.comments.len(),
            comments: comments.into_iter().map(|c| c.view(viewer)).collect(),
        }
    }

    /// Summaries for a batch of activities under a single read lock.
    pub async fn summaries<I>(&self, activities: I, viewer: UserId) -> HashMap<ActivityId, OverlaySummary>
    where
        I: IntoIterator<Item = ActivityId>,
    {
        let overlays = self.overlays.read().await;
        activities
            .into_iter()
            .filter_map(|id| {
                overlays.get(&id).map(|o| {
                    (
                        id,
                        OverlaySummary {
                            like_count: o.likes.len(),
                            comment_count: o.comments.len(),
                            liked_by_me: o.likes.contains(&viewer),
                        },
                    )
                })
            })
            .collect()
    }
}
