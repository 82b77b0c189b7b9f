use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use showbuff_types::api::ShowRef;
use showbuff_types::models::{ConversationKey, MessageId, MessageKind, UserId};

use crate::Database;
use crate::models::{MessageRow, UnreadCountRow, label, optional_show_at};
use crate::queries::friends::count_pending_incoming;
use crate::queries::shows::upsert_show;
use crate::queries::users::user_exists;

#[derive(Debug, Clone)]
pub enum SendMessageOutcome {
    Sent(MessageRow),
    ReceiverMissing,
}

/// Unread badge breakdown. The total deliberately counts pending incoming
/// friend requests alongside unread messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadTotals {
    pub messages: i64,
    pub friend_requests: i64,
}

impl UnreadTotals {
    pub fn total(&self) -> i64 {
        self.messages + self.friend_requests
    }
}

impl Database {
    pub fn send_message(
        &self,
        sender: UserId,
        receiver: UserId,
        body: &str,
        kind: MessageKind,
        show: Option<&ShowRef>,
    ) -> Result<SendMessageOutcome> {
        let key = ConversationKey::new(sender, receiver);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !user_exists(&tx, receiver)? {
                return Ok(SendMessageOutcome::ReceiverMissing);
            }

            let show_id = match show {
                Some(show) => Some(upsert_show(&tx, show)?.id),
                None => None,
            };

            tx.execute(
                "INSERT INTO messages (user_low, user_high, sender_id, receiver_id, kind, body, show_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    key.low(),
                    key.high(),
                    sender,
                    receiver,
                    kind.as_str(),
                    body,
                    show_id,
                    Utc::now(),
                ],
            )?;
            let id = tx.last_insert_rowid();
            let row = get_message(&tx, id)?.ok_or_else(|| anyhow!("Message {} vanished after insert", id))?;

            tx.commit()?;
            Ok(SendMessageOutcome::Sent(row))
        })
    }

    /// Every message between the pair, oldest first, whichever side sent it.
    pub fn conversation(&self, a: UserId, b: UserId) -> Result<Vec<MessageRow>> {
        let key = ConversationKey::new(a, b);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 WHERE m.user_low = ?1 AND m.user_high = ?2
                 ORDER BY m.created_at ASC, m.id ASC"
            ))?;

            let rows = stmt
                .query_map(rusqlite::params![key.low(), key.high()], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark everything `sender` sent to `receiver` as read. Returns how many
    /// messages changed; a second call returns 0.
    pub fn mark_read(&self, receiver: UserId, sender: UserId) -> Result<usize> {
        let key = ConversationKey::new(receiver, sender);

        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET read_at = ?5
                 WHERE user_low = ?1 AND user_high = ?2
                   AND sender_id = ?3 AND receiver_id = ?4
                   AND read_at IS NULL",
                rusqlite::params![key.low(), key.high(), sender, receiver, Utc::now()],
            )?;
            Ok(changed)
        })
    }

    /// Unread messages addressed to `user`, counted per sender.
    pub fn unread_counts(&self, user: UserId) -> Result<Vec<UnreadCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.sender_id, u.display_name, COUNT(*)
                 FROM messages m
                 JOIN users u ON u.id = m.sender_id
                 WHERE m.receiver_id = ?1 AND m.read_at IS NULL
                 GROUP BY m.user_low, m.user_high, m.sender_id
                 ORDER BY m.sender_id",
            )?;

            let rows = stmt
                .query_map([user], |row| {
                    Ok(UnreadCountRow {
                        sender_id: row.get(0)?,
                        sender_name: row.get(1)?,
                        count: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn total_unread(&self, user: UserId) -> Result<UnreadTotals> {
        self.with_conn(|conn| {
            let messages = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1 AND read_at IS NULL",
                [user],
                |row| row.get(0),
            )?;
            let friend_requests = count_pending_incoming(conn, user)?;
            Ok(UnreadTotals {
                messages,
                friend_requests,
            })
        })
    }
}

// Show columns start at index 7.
const MESSAGE_SELECT: &str = "SELECT m.id, m.sender_id, m.receiver_id, m.kind, m.body, m.created_at, m.read_at,
        s.id, s.tmdb_id, s.media_kind, s.title, s.poster_path, s.release_date, s.first_air_date
     FROM messages m
     LEFT JOIN shows s ON s.id = m.show_id";

fn get_message(conn: &Connection, id: MessageId) -> Result<Option<MessageRow>> {
    let row = conn
        .query_row(&format!("{MESSAGE_SELECT} WHERE m.id = ?1"), [id], message_from_row)
        .optional()?;
    Ok(row)
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        kind: label(row, 3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
        read_at: row.get(6)?,
        show: optional_show_at(row, 7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, movie, user};

    fn send(db: &Database, from: UserId, to: UserId, body: &str) -> MessageRow {
        match db.send_message(from, to, body, MessageKind::Text, None).unwrap() {
            SendMessageOutcome::Sent(row) => row,
            SendMessageOutcome::ReceiverMissing => panic!("receiver should exist"),
        }
    }

    #[test]
    fn conversation_is_symmetric_and_ordered() {
        let db = db();
        let u1 = user(&db, "u1");
        let u2 = user(&db, "u2");
        let u3 = user(&db, "u3");

        send(&db, u1, u2, "hi");
        send(&db, u2, u1, "hey");
        send(&db, u1, u2, "movie tonight?");
        send(&db, u1, u3, "unrelated");

        let ab: Vec<_> = db.conversation(u1, u2).unwrap().into_iter().map(|m| m.body).collect();
        let ba: Vec<_> = db.conversation(u2, u1).unwrap().into_iter().map(|m| m.body).collect();
        assert_eq!(ab, vec!["hi", "hey", "movie tonight?"]);
        assert_eq!(ab, ba);
    }

    #[test]
    fn unread_flow() {
        let db = db();
        let u1 = user(&db, "u1");
        let u2 = user(&db, "u2");
        let u3 = user(&db, "u3");

        let msg = send(&db, u1, u2, "hi");
        assert!(msg.read_at.is_none());
        send(&db, u3, u2, "one");
        send(&db, u3, u2, "two");

        let counts: Vec<_> = db
            .unread_counts(u2)
            .unwrap()
            .into_iter()
            .map(|c| (c.sender_id, c.count))
            .collect();
        assert_eq!(counts, vec![(u1, 1), (u3, 2)]);

        db.send_friend_request(u3, u2).unwrap();
        let before = db.total_unread(u2).unwrap();
        assert_eq!(before, UnreadTotals { messages: 3, friend_requests: 1 });
        assert_eq!(before.total(), 4);

        assert_eq!(db.mark_read(u2, u1).unwrap(), 1);
        let after = db.total_unread(u2).unwrap();
        assert_eq!(after.total(), before.total() - 1);

        // Idempotent
        assert_eq!(db.mark_read(u2, u1).unwrap(), 0);
        assert_eq!(db.total_unread(u2).unwrap(), after);
    }

    #[test]
    fn mark_read_only_touches_one_direction() {
        let db = db();
        let u1 = user(&db, "u1");
        let u2 = user(&db, "u2");

        send(&db, u1, u2, "to u2");
        send(&db, u2, u1, "to u1");

        db.mark_read(u2, u1).unwrap();
        assert_eq!(db.total_unread(u2).unwrap().messages, 0);
        assert_eq!(db.total_unread(u1).unwrap().messages, 1);
    }

    #[test]
    fn recommendation_carries_show() {
        let db = db();
        let u1 = user(&db, "u1");
        let u2 = user(&db, "u2");

        let outcome = db
            .send_message(u1, u2, "watch this", MessageKind::ShowRecommendation, Some(&movie(100, "Heat")))
            .unwrap();
        let SendMessageOutcome::Sent(msg) = outcome else {
            panic!("send should succeed");
        };
        assert_eq!(msg.kind, MessageKind::ShowRecommendation);
        assert_eq!(msg.show.unwrap().title, "Heat");
    }

    #[test]
    fn missing_receiver() {
        let db = db();
        let u1 = user(&db, "u1");
        assert!(matches!(
            db.send_message(u1, u1 + 9, "hello?", MessageKind::Text, None).unwrap(),
            SendMessageOutcome::ReceiverMissing
        ));
    }
}
