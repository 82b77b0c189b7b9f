use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use showbuff_types::api::ReviewRequest;
use showbuff_types::events::ActivityEvent;
use showbuff_types::models::UserId;

use crate::Database;
use crate::models::{ReviewRow, label, show_at};
use crate::queries::activity::{NewActivity, insert_activity};
use crate::queries::shows::upsert_show;

impl Database {
    /// Create or edit the user's review of a show. A second write for the same
    /// (user, show, media kind) updates the existing row in place. Returns the
    /// stored review and whether it was newly created.
    pub fn upsert_review(&self, user: UserId, review: &ReviewRequest) -> Result<(ReviewRow, bool)> {
        let tags = serde_json::to_string(&review.tags)?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let show = upsert_show(&tx, &review.show)?;
            let now = Utc::now();

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM reviews WHERE user_id = ?1 AND show_id = ?2 AND media_kind = ?3",
                    rusqlite::params![user, show.id, show.media_kind.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            let (id, event) = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE reviews
                         SET rating = ?2, comment = ?3, tags = ?4, rewatch = ?5, spoiler = ?6,
                             visibility = ?7, updated_at = ?8
                         WHERE id = ?1",
                        rusqlite::params![
                            id,
                            review.rating,
                            review.comment,
                            tags,
                            review.rewatch,
                            review.spoiler,
                            review.visibility.as_str(),
                            now,
                        ],
                    )?;
                    (id, ActivityEvent::ReviewUpdated)
                }
                None => {
                    tx.execute(
                        "INSERT INTO reviews
                            (user_id, show_id, media_kind, rating, comment, tags, rewatch, spoiler,
                             visibility, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                        rusqlite::params![
                            user,
                            show.id,
                            show.media_kind.as_str(),
                            review.rating,
                            review.comment,
                            tags,
                            review.rewatch,
                            review.spoiler,
                            review.visibility.as_str(),
                            now,
                        ],
                    )?;
                    (tx.last_insert_rowid(), ActivityEvent::Reviewed)
                }
            };

            let activity = NewActivity::from_event(user, event, review.visibility)
                .show(show.id)
                .rating(review.rating)
                .comment(review.comment.clone());
            insert_activity(&tx, &activity)?;

            let row = get_review(&tx, id)?.ok_or_else(|| anyhow!("Review {} vanished after write", id))?;
            tx.commit()?;
            Ok((row, existing.is_none()))
        })
    }

    /// All reviews written by `user`, most recently edited first.
    pub fn reviews_by_user(&self, user: UserId) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{REVIEW_SELECT} WHERE r.user_id = ?1 ORDER BY r.updated_at DESC, r.id DESC"
            ))?;
            let rows = stmt
                .query_map([user], review_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

// Show columns start at index 10.
const REVIEW_SELECT: &str = "SELECT r.id, r.user_id, r.rating, r.comment, r.tags, r.rewatch, r.spoiler,
        r.visibility, r.created_at, r.updated_at,
        s.id, s.tmdb_id, s.media_kind, s.title, s.poster_path, s.release_date, s.first_air_date
     FROM reviews r
     JOIN shows s ON s.id = r.show_id";

fn get_review(conn: &Connection, id: i64) -> Result<Option<ReviewRow>> {
    let row = conn
        .query_row(&format!("{REVIEW_SELECT} WHERE r.id = ?1"), [id], review_from_row)
        .optional()?;
    Ok(row)
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewRow> {
    let tags: String = row.get(4)?;
    let tags = serde_json::from_str(&tags).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ReviewRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        rating: row.get(2)?,
        comment: row.get(3)?,
        tags,
        rewatch: row.get(5)?,
        spoiler: row.get(6)?,
        visibility: label(row, 7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        show: show_at(row, 10)?,
    })
}
