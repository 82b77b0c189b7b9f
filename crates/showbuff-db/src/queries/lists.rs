use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use showbuff_types::api::ShowRef;
use showbuff_types::events::ActivityEvent;
use showbuff_types::models::{ActivityId, ListKind, MediaKind, ShowId, UserId, Visibility};

use crate::Database;
use crate::models::{ListItemRow, SHOW_COLUMNS, ShowRow, label, show_at};
use crate::queries::activity::{NewActivity, insert_activity};
use crate::queries::shows::{find_show, upsert_show};

/// List-change activity is shared with friends by default.
const LIST_ACTIVITY_VISIBILITY: Visibility = Visibility::Friends;

#[derive(Debug, Clone)]
pub enum AddOutcome {
    Added { show: ShowRow, activity_id: ActivityId },
    /// Already in the requested list; nothing changed.
    AlreadyMember { show: ShowRow },
    /// The show sits in a different list; the caller may offer a move.
    Conflict { show: ShowRow, existing: ListKind },
}

#[derive(Debug, Clone)]
pub enum MoveOutcome {
    Moved { show: ShowRow, activity_id: ActivityId },
    NotInSource,
}

impl Database {
    /// Add a show to one of the user's lists, enforcing that it lives in at
    /// most one list. The show upsert is kept even when the add is refused.
    pub fn add_to_list(&self, user: UserId, show: &ShowRef, list: ListKind) -> Result<AddOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let show = upsert_show(&tx, show)?;

            let outcome = match membership(&tx, user, show.id)? {
                Some(existing) if existing == list => AddOutcome::AlreadyMember { show },
                Some(existing) => AddOutcome::Conflict { show, existing },
                None => {
                    insert_item(&tx, user, show.id, list)?;
                    let activity = NewActivity::from_event(
                        user,
                        ActivityEvent::AddedToList { list },
                        LIST_ACTIVITY_VISIBILITY,
                    )
                    .show(show.id);
                    let activity_id = insert_activity(&tx, &activity)?;
                    AddOutcome::Added { show, activity_id }
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    /// Remove a show from a list. Returns whether anything was removed.
    pub fn remove_from_list(&self, user: UserId, show: &ShowRef, list: ListKind) -> Result<bool> {
        self.with_conn(|conn| {
            let Some(show) = find_show(conn, show.tmdb_id, show.media_kind)? else {
                return Ok(false);
            };

            let removed = conn.execute(
                "DELETE FROM list_items
                 WHERE user_id = ?1 AND show_id = ?2
                   AND list_id IN (SELECT id FROM lists WHERE user_id = ?1 AND kind = ?3)",
                rusqlite::params![user, show.id, list.as_str()],
            )?;
            Ok(removed > 0)
        })
    }

    /// Move a show between two lists as one transaction: the show is never
    /// observable in neither or both lists.
    pub fn move_between_lists(
        &self,
        user: UserId,
        show: &ShowRef,
        from: ListKind,
        to: ListKind,
    ) -> Result<MoveOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(show) = find_show(&tx, show.tmdb_id, show.media_kind)? else {
                return Ok(MoveOutcome::NotInSource);
            };
            if membership(&tx, user, show.id)? != Some(from) {
                return Ok(MoveOutcome::NotInSource);
            }

            tx.execute(
                "DELETE FROM list_items WHERE user_id = ?1 AND show_id = ?2",
                rusqlite::params![user, show.id],
            )?;
            insert_item(&tx, user, show.id, to)?;

            let activity = NewActivity::from_event(
                user,
                ActivityEvent::MovedToList { from, to },
                LIST_ACTIVITY_VISIBILITY,
            )
            .show(show.id);
            let activity_id = insert_activity(&tx, &activity)?;

            tx.commit()?;
            Ok(MoveOutcome::Moved { show, activity_id })
        })
    }

    /// Shows in one list, newest-added first.
    pub fn list_contents(&self, user: UserId, list: ListKind) -> Result<Vec<ListItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT l.kind, i.added_at, {SHOW_COLUMNS}
                 FROM list_items i
                 JOIN lists l ON l.id = i.list_id
                 JOIN shows s ON s.id = i.show_id
                 WHERE l.user_id = ?1 AND l.kind = ?2
                 ORDER BY i.added_at DESC, i.id DESC"
            ))?;

            let rows = stmt
                .query_map(rusqlite::params![user, list.as_str()], |row| {
                    Ok(ListItemRow {
                        list: label(row, 0)?,
                        added_at: row.get(1)?,
                        show: show_at(row, 2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Which list, if any, currently holds the show for this user.
    pub fn list_status(&self, user: UserId, tmdb_id: i64, media_kind: MediaKind) -> Result<Option<ListKind>> {
        self.with_conn(|conn| match find_show(conn, tmdb_id, media_kind)? {
            Some(show) => membership(conn, user, show.id),
            None => Ok(None),
        })
    }
}

fn membership(conn: &Connection, user: UserId, show_id: ShowId) -> Result<Option<ListKind>> {
    let kind = conn
        .query_row(
            "SELECT l.kind FROM list_items i
             JOIN lists l ON l.id = i.list_id
             WHERE i.user_id = ?1 AND i.show_id = ?2",
            rusqlite::params![user, show_id],
            |row| label(row, 0),
        )
        .optional()?;
    Ok(kind)
}

/// Lists are created on first use.
fn ensure_list(conn: &Connection, user: UserId, list: ListKind) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO lists (user_id, kind) VALUES (?1, ?2)",
        rusqlite::params![user, list.as_str()],
    )?;
    let id = conn.query_row(
        "SELECT id FROM lists WHERE user_id = ?1 AND kind = ?2",
        rusqlite::params![user, list.as_str()],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn insert_item(conn: &Connection, user: UserId, show_id: ShowId, list: ListKind) -> Result<()> {
    let list_id = ensure_list(conn, user, list)?;
    conn.execute(
        "INSERT INTO list_items (list_id, user_id, show_id, added_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![list_id, user, show_id, Utc::now()],
    )?;
    Ok(())
}
