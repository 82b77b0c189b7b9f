use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use showbuff_types::models::{RequestId, RequestStatus, UserId};

use crate::Database;
use crate::models::{FriendRequestRow, FriendRow, label};
use crate::queries::users::user_exists;

#[derive(Debug, Clone)]
pub enum SendRequestOutcome {
    /// A new pending request was stored.
    Created(FriendRequestRow),
    /// An earlier accepted or rejected request from the same sender went back to pending.
    Reopened(FriendRequestRow),
    /// Sender and recipient are the same user.
    InvalidTarget,
    TargetMissing,
    AlreadyFriends,
    /// The recipient already has a pending request to the sender; accept that instead.
    ReciprocalPending(RequestId),
    /// This exact request is already pending.
    DuplicatePending(RequestId),
}

#[derive(Debug, Clone)]
pub enum RespondOutcome {
    Done(FriendRequestRow),
    /// No pending request with that id is addressed to the acting user.
    NotFound,
}

#[derive(Debug, Clone)]
pub enum RequestLookup {
    Visible(FriendRequestRow),
    /// The request exists but the viewer is not a participant.
    Hidden,
    Missing,
}

impl Database {
    /// Send or re-send a friend request.
    ///
    /// A `(from, to)` pair owns a single request row for its whole life: a
    /// re-request after acceptance or rejection reopens that row rather than
    /// inserting another one.
    pub fn send_friend_request(&self, from: UserId, to: UserId) -> Result<SendRequestOutcome> {
        if from == to {
            return Ok(SendRequestOutcome::InvalidTarget);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !user_exists(&tx, to)? {
                return Ok(SendRequestOutcome::TargetMissing);
            }
            if are_friends(&tx, from, to)? {
                return Ok(SendRequestOutcome::AlreadyFriends);
            }
            if let Some((id, RequestStatus::Pending)) = find_request(&tx, to, from)? {
                return Ok(SendRequestOutcome::ReciprocalPending(id));
            }

            let now = Utc::now();
            let outcome = match find_request(&tx, from, to)? {
                Some((id, RequestStatus::Pending)) => SendRequestOutcome::DuplicatePending(id),
                Some((id, previous)) => {
                    tx.execute(
                        "UPDATE friend_requests
                         SET status = 'pending', created_at = ?2, responded_at = NULL
                         WHERE id = ?1",
                        rusqlite::params![id, now],
                    )?;
                    debug!("Reopened friend request {} (was {})", id, previous);
                    SendRequestOutcome::Reopened(load_request(&tx, id)?)
                }
                None => {
                    tx.execute(
                        "INSERT INTO friend_requests (from_user_id, to_user_id, status, created_at)
                         VALUES (?1, ?2, 'pending', ?3)",
                        rusqlite::params![from, to, now],
                    )?;
                    let id = tx.last_insert_rowid();
                    SendRequestOutcome::Created(load_request(&tx, id)?)
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    /// Accept a pending request addressed to `acting_user` and materialize
    /// both friendship directions in the same transaction.
    pub fn accept_friend_request(&self, id: RequestId, acting_user: UserId) -> Result<RespondOutcome> {
        self.respond(id, acting_user, RequestStatus::Accepted)
    }

    pub fn reject_friend_request(&self, id: RequestId, acting_user: UserId) -> Result<RespondOutcome> {
        self.respond(id, acting_user, RequestStatus::Rejected)
    }

    fn respond(&self, id: RequestId, acting_user: UserId, status: RequestStatus) -> Result<RespondOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(request) = get_request(&tx, id)? else {
                return Ok(RespondOutcome::NotFound);
            };
            if request.to_user_id != acting_user || request.status != RequestStatus::Pending {
                return Ok(RespondOutcome::NotFound);
            }

            let now = Utc::now();
            tx.execute(
                "UPDATE friend_requests SET status = ?2, responded_at = ?3 WHERE id = ?1",
                rusqlite::params![id, status.as_str(), now],
            )?;

            if status == RequestStatus::Accepted {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at) VALUES (?1, ?2, ?3)",
                )?;
                stmt.execute(rusqlite::params![request.from_user_id, request.to_user_id, now])?;
                stmt.execute(rusqlite::params![request.to_user_id, request.from_user_id, now])?;
            }

            let updated = load_request(&tx, id)?;
            tx.commit()?;
            Ok(RespondOutcome::Done(updated))
        })
    }

    /// Delete both directions of a friendship. Idempotent.
    pub fn remove_friend(&self, user: UserId, friend: UserId) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM friendships
                 WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)",
                rusqlite::params![user, friend],
            )?;
            tx.commit()?;
            Ok(removed > 0)
        })
    }

    pub fn are_friends(&self, a: UserId, b: UserId) -> Result<bool> {
        self.with_conn(|conn| are_friends(conn, a, b))
    }

    pub fn friends(&self, user: UserId) -> Result<Vec<FriendRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.display_name, f.created_at
                 FROM friendships f
                 JOIN users u ON u.id = f.friend_id
                 WHERE f.user_id = ?1
                 ORDER BY u.display_name",
            )?;

            let rows = stmt
                .query_map([user], |row| {
                    Ok(FriendRow {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        since: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Pending requests addressed to `user`, newest first.
    pub fn incoming_requests(&self, user: UserId) -> Result<Vec<FriendRequestRow>> {
        self.with_conn(|conn| pending_requests(conn, "r.to_user_id = ?1", user))
    }

    /// Pending requests sent by `user`, newest first.
    pub fn outgoing_requests(&self, user: UserId) -> Result<Vec<FriendRequestRow>> {
        self.with_conn(|conn| pending_requests(conn, "r.from_user_id = ?1", user))
    }

    /// Look up a request on behalf of `viewer`; only participants may see it.
    pub fn friend_request_for(&self, id: RequestId, viewer: UserId) -> Result<RequestLookup> {
        self.with_conn(|conn| {
            Ok(match get_request(conn, id)? {
                Some(r) if r.from_user_id == viewer || r.to_user_id == viewer => RequestLookup::Visible(r),
                Some(_) => RequestLookup::Hidden,
                None => RequestLookup::Missing,
            })
        })
    }
}

pub(crate) fn are_friends(conn: &Connection, a: UserId, b: UserId) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM friendships
            WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)
         )",
        rusqlite::params![a, b],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub(crate) fn count_pending_incoming(conn: &Connection, user: UserId) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM friend_requests WHERE to_user_id = ?1 AND status = 'pending'",
        [user],
        |row| row.get(0),
    )?;
    Ok(count)
}

const REQUEST_SELECT: &str = "SELECT r.id, r.from_user_id, fu.display_name, r.to_user_id, tu.display_name,
        r.status, r.created_at, r.responded_at
     FROM friend_requests r
     JOIN users fu ON fu.id = r.from_user_id
     JOIN users tu ON tu.id = r.to_user_id";

fn find_request(conn: &Connection, from: UserId, to: UserId) -> Result<Option<(RequestId, RequestStatus)>> {
    let found = conn
        .query_row(
            "SELECT id, status FROM friend_requests WHERE from_user_id = ?1 AND to_user_id = ?2",
            rusqlite::params![from, to],
            |row| Ok((row.get(0)?, label(row, 1)?)),
        )
        .optional()?;
    Ok(found)
}

fn get_request(conn: &Connection, id: RequestId) -> Result<Option<FriendRequestRow>> {
    let row = conn
        .query_row(&format!("{REQUEST_SELECT} WHERE r.id = ?1"), [id], request_from_row)
        .optional()?;
    Ok(row)
}

fn load_request(conn: &Connection, id: RequestId) -> Result<FriendRequestRow> {
    get_request(conn, id)?.ok_or_else(|| anyhow!("Friend request {} not found", id))
}

fn pending_requests(conn: &Connection, filter: &str, user: UserId) -> Result<Vec<FriendRequestRow>> {
    let mut stmt = conn.prepare(&format!(
        "{REQUEST_SELECT} WHERE {filter} AND r.status = 'pending' ORDER BY r.created_at DESC, r.id DESC"
    ))?;
    let rows = stmt
        .query_map([user], request_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<FriendRequestRow> {
    Ok(FriendRequestRow {
        id: row.get(0)?,
        from_user_id: row.get(1)?,
        from_display_name: row.get(2)?,
        to_user_id: row.get(3)?,
        to_display_name: row.get(4)?,
        status: label(row, 5)?,
        created_at: row.get(6)?,
        responded_at: row.get(7)?,
    })
}
