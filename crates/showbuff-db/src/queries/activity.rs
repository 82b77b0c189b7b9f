use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use showbuff_types::api::ShowRef;
use showbuff_types::events::ActivityEvent;
use showbuff_types::models::{ActivityId, ActivityKind, ShowId, UserId, Visibility};

use crate::Database;
use crate::models::{ActivityRow, label, optional_show_at};
use crate::queries::shows::upsert_show;

/// Upper bound on rows returned by either feed.
pub const FEED_LIMIT: u32 = 100;

/// An activity row about to be appended to the log.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub actor_id: UserId,
    pub kind: ActivityKind,
    pub action: String,
    pub show_id: Option<ShowId>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub visibility: Visibility,
}

impl NewActivity {
    pub fn from_event(actor_id: UserId, event: ActivityEvent, visibility: Visibility) -> Self {
        Self {
            actor_id,
            kind: event.kind(),
            action: event.action_label(),
            show_id: None,
            rating: None,
            comment: None,
            visibility,
        }
    }

    pub fn show(mut self, show_id: ShowId) -> Self {
        self.show_id = Some(show_id);
        self
    }

    pub fn rating(mut self, rating: i64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}

impl Database {
    /// Append one row to the activity log.
    pub fn record_activity(&self, activity: &NewActivity) -> Result<ActivityRow> {
        self.with_conn(|conn| {
            let id = insert_activity(conn, activity)?;
            get_activity(conn, id)?.ok_or_else(|| anyhow!("Activity {} vanished after insert", id))
        })
    }

    /// Store a free-form post, upserting the referenced show first.
    pub fn create_post(
        &self,
        actor_id: UserId,
        content: &str,
        visibility: Visibility,
        show: Option<&ShowRef>,
    ) -> Result<ActivityRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut activity = NewActivity::from_event(actor_id, ActivityEvent::Posted, visibility)
                .comment(Some(content.to_string()));
            if let Some(show) = show {
                activity = activity.show(upsert_show(&tx, show)?.id);
            }

            let id = insert_activity(&tx, &activity)?;
            let row = get_activity(&tx, id)?
                .ok_or_else(|| anyhow!("Activity {} vanished after insert", id))?;

            tx.commit()?;
            Ok(row)
        })
    }

    /// Look up one activity as `viewer` sees it.
    ///
    /// An activity is visible when it would show up in either of the
    /// viewer's feeds: their own rows, friends' non-private rows, and
    /// non-private posts. Hidden and missing rows both come back as `None`.
    pub fn visible_activity(&self, id: ActivityId, viewer: UserId) -> Result<Option<ActivityRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "{ACTIVITY_SELECT}
                         WHERE a.id = ?1
                           AND (a.actor_id = ?2
                                OR (a.visibility != 'private'
                                    AND (a.kind = 'post'
                                         OR a.actor_id IN (SELECT friend_id FROM friendships WHERE user_id = ?2))))"
                    ),
                    rusqlite::params![id, viewer],
                    activity_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Activity by `user` plus their friends' non-private activity, newest first.
    pub fn personal_feed(&self, user: UserId) -> Result<Vec<ActivityRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{ACTIVITY_SELECT}
                 WHERE a.actor_id = ?1
                    OR (a.actor_id IN (SELECT friend_id FROM friendships WHERE user_id = ?1)
                        AND a.visibility != 'private')
                 ORDER BY a.created_at DESC, a.id DESC
                 LIMIT ?2"
            ))?;

            let rows = stmt
                .query_map(rusqlite::params![user, FEED_LIMIT], activity_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Global feed of posts that are not private, newest first.
    pub fn social_feed(&self) -> Result<Vec<ActivityRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{ACTIVITY_SELECT}
                 WHERE a.kind = 'post' AND a.visibility IN ('public', 'friends')
                 ORDER BY a.created_at DESC, a.id DESC
                 LIMIT ?1"
            ))?;

            let rows = stmt
                .query_map([FEED_LIMIT], activity_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

// Show columns start at index 9, in `SHOW_COLUMNS` order.
const ACTIVITY_SELECT: &str = "SELECT a.id, a.actor_id, u.display_name, a.kind, a.action, a.rating, a.comment, a.visibility, a.created_at,
        s.id, s.tmdb_id, s.media_kind, s.title, s.poster_path, s.release_date, s.first_air_date
     FROM activities a
     JOIN users u ON u.id = a.actor_id
     LEFT JOIN shows s ON s.id = a.show_id";

pub(crate) fn insert_activity(conn: &Connection, activity: &NewActivity) -> Result<ActivityId> {
    conn.execute(
        "INSERT INTO activities (actor_id, kind, action, show_id, rating, comment, visibility, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            activity.actor_id,
            activity.kind.as_str(),
            activity.action,
            activity.show_id,
            activity.rating,
            activity.comment,
            activity.visibility.as_str(),
            Utc::now(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn get_activity(conn: &Connection, id: ActivityId) -> Result<Option<ActivityRow>> {
    let row = conn
        .query_row(
            &format!("{ACTIVITY_SELECT} WHERE a.id = ?1"),
            [id],
            activity_from_row,
        )
        .optional()?;
    Ok(row)
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityRow> {
    Ok(ActivityRow {
        id: row.get(0)?,
        actor_id: row.get(1)?,
        actor_name: row.get(2)?,
        kind: label(row, 3)?,
        action: row.get(4)?,
        rating: row.get(5)?,
        comment: row.get(6)?,
        visibility: label(row, 7)?,
        created_at: row.get(8)?,
        show: optional_show_at(row, 9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, movie, user};

    #[test]
    fn post_with_show() {
        let db = db();
        let ana = user(&db, "ana");

        let post = db
            .create_post(ana, "rewatching this", Visibility::Public, Some(&movie(100, "Heat")))
            .unwrap();
        assert_eq!(post.kind, ActivityKind::Post);
        assert_eq!(post.action, "posted");
        assert_eq!(post.actor_name, "ana");
        assert_eq!(post.comment.as_deref(), Some("rewatching this"));
        assert_eq!(post.show.unwrap().title, "Heat");
    }

    #[test]
    fn personal_feed_includes_friends_only() {
        let db = db();
        let ana = user(&db, "ana");
        let ben = user(&db, "ben");
        let cid = user(&db, "cid");

        db.create_post(ana, "mine", Visibility::Public, None).unwrap();
        db.create_post(ben, "ben's", Visibility::Friends, None).unwrap();
        db.create_post(ben, "ben's secret", Visibility::Private, None).unwrap();
        db.create_post(cid, "stranger", Visibility::Public, None).unwrap();

        let feed = db.personal_feed(ana).unwrap();
        assert_eq!(feed.len(), 1);

        let req = match db.send_friend_request(ana, ben).unwrap() {
            crate::SendRequestOutcome::Created(req) => req,
            other => panic!("unexpected outcome: {other:?}"),
        };
        db.accept_friend_request(req.id, ben).unwrap();

        let feed = db.personal_feed(ana).unwrap();
        let bodies: Vec<_> = feed.iter().filter_map(|a| a.comment.as_deref()).collect();
        assert_eq!(bodies, vec!["ben's", "mine"]);

        // Own private activity stays visible to its author
        let own = db.personal_feed(ben).unwrap();
        assert_eq!(own.len(), 3);
    }

    #[test]
    fn social_feed_is_posts_only_and_not_private() {
        let db = db();
        let ana = user(&db, "ana");

        db.create_post(ana, "public", Visibility::Public, None).unwrap();
        db.create_post(ana, "friends", Visibility::Friends, None).unwrap();
        db.create_post(ana, "private", Visibility::Private, None).unwrap();
        db.record_activity(
            &NewActivity::from_event(ana, ActivityEvent::Reviewed, Visibility::Public).rating(8),
        )
        .unwrap();

        let feed = db.social_feed().unwrap();
        let bodies: Vec<_> = feed.iter().filter_map(|a| a.comment.as_deref()).collect();
        assert_eq!(bodies, vec!["friends", "public"]);
    }

    #[test]
    fn visibility_follows_the_feeds() {
        let db = db();
        let ana = user(&db, "ana");
        let ben = user(&db, "ben");

        let public = db.create_post(ana, "public", Visibility::Public, None).unwrap();
        let secret = db.create_post(ana, "secret", Visibility::Private, None).unwrap();
        let listed = db
            .record_activity(&NewActivity::from_event(
                ana,
                ActivityEvent::Reviewed,
                Visibility::Public,
            ))
            .unwrap();

        assert!(db.visible_activity(public.id, ben).unwrap().is_some());
        assert!(db.visible_activity(secret.id, ben).unwrap().is_none());
        assert!(db.visible_activity(listed.id, ben).unwrap().is_none());
        assert!(db.visible_activity(secret.id, ana).unwrap().is_some());
        assert!(db.visible_activity(9999, ana).unwrap().is_none());

        let req = match db.send_friend_request(ben, ana).unwrap() {
            crate::SendRequestOutcome::Created(req) => req,
            other => panic!("unexpected outcome: {other:?}"),
        };
        db.accept_friend_request(req.id, ana).unwrap();

        assert!(db.visible_activity(listed.id, ben).unwrap().is_some());
        assert!(db.visible_activity(secret.id, ben).unwrap().is_none());
    }

    #[test]
    fn feeds_are_bounded() {
        let db = db();
        let ana = user(&db, "ana");
        for i in 0..(FEED_LIMIT + 5) {
            db.create_post(ana, &format!("post {i}"), Visibility::Public, None)
                .unwrap();
        }

        let personal = db.personal_feed(ana).unwrap();
        assert_eq!(personal.len(), FEED_LIMIT as usize);
        assert_eq!(personal[0].comment.as_deref(), Some("post 104"));
        assert_eq!(db.social_feed().unwrap().len(), FEED_LIMIT as usize);
    }
}
