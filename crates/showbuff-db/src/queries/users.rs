use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};

use showbuff_types::models::UserId;

use crate::Database;
use crate::models::UserRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created(UserId),
    /// The email or display name was registered first by someone else.
    IdentityTaken,
}

impl Database {
    /// Insert a user. A UNIQUE violation on email or display name is an
    /// outcome, so a registration that loses a race still reads as a conflict.
    pub fn create_user(&self, email: &str, display_name: &str, password_hash: &str) -> Result<CreateUserOutcome> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (email, display_name, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                (email, display_name, password_hash, Utc::now()),
            );
            match inserted {
                Ok(_) => Ok(CreateUserOutcome::Created(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    Ok(CreateUserOutcome::IdentityTaken)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, email, display_name, password_hash, created_at FROM users WHERE email = ?1",
                    [email],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, email, display_name, password_hash, created_at FROM users WHERE id = ?1",
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// True if either the email or the display name is already registered.
    pub fn identity_taken(&self, email: &str, display_name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 OR display_name = ?2)",
                [email, display_name],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }
}

pub(crate) fn user_exists(conn: &Connection, id: UserId) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}
