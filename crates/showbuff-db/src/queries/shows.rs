use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use showbuff_types::api::ShowRef;
use showbuff_types::models::MediaKind;

use crate::Database;
use crate::models::{SHOW_COLUMNS, ShowRow, show_at};

impl Database {
    pub fn upsert_show(&self, show: &ShowRef) -> Result<ShowRow> {
        self.with_conn(|conn| upsert_show(conn, show))
    }

    pub fn find_show(&self, tmdb_id: i64, media_kind: MediaKind) -> Result<Option<ShowRow>> {
        self.with_conn(|conn| find_show(conn, tmdb_id, media_kind))
    }
}

/// Insert the show if it is new. Display fields are first-writer-wins: an
/// existing value is never overwritten, an empty one is filled in.
pub(crate) fn upsert_show(conn: &Connection, show: &ShowRef) -> Result<ShowRow> {
    let row = conn.query_row(
        "INSERT INTO shows (tmdb_id, media_kind, title, poster_path, release_date, first_air_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(tmdb_id, media_kind) DO UPDATE SET
            title = CASE WHEN shows.title = '' THEN excluded.title ELSE shows.title END,
            poster_path = COALESCE(shows.poster_path, excluded.poster_path),
            release_date = COALESCE(shows.release_date, excluded.release_date),
            first_air_date = COALESCE(shows.first_air_date, excluded.first_air_date)
         RETURNING id, tmdb_id, media_kind, title, poster_path, release_date, first_air_date",
        rusqlite::params![
            show.tmdb_id,
            show.media_kind.as_str(),
            show.title.as_deref().unwrap_or_default(),
            show.poster_path,
            show.release_date,
            show.first_air_date,
        ],
        |row| show_at(row, 0),
    )?;
    Ok(row)
}

pub(crate) fn find_show(conn: &Connection, tmdb_id: i64, media_kind: MediaKind) -> Result<Option<ShowRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {SHOW_COLUMNS} FROM shows s WHERE s.tmdb_id = ?1 AND s.media_kind = ?2"),
            rusqlite::params![tmdb_id, media_kind.as_str()],
            |row| show_at(row, 0),
        )
        .optional()?;
    Ok(row)
}
