//! Database row types. These map directly to SQLite rows and stay distinct from
//! the showbuff-types API models; `From` impls below do the conversion.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

use showbuff_types::api;
use showbuff_types::models::{
    ActivityId, ActivityKind, ImportId, ImportStatus, ListKind, MediaKind, MessageId,
    MessageKind, RequestId, RequestStatus, ShowId, UnknownVariant, UserId, Visibility,
};

pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowRow {
    pub id: ShowId,
    pub tmdb_id: i64,
    pub media_kind: MediaKind,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListItemRow {
    pub list: ListKind,
    pub show: ShowRow,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FriendRequestRow {
    pub id: RequestId,
    pub from_user_id: UserId,
    pub from_display_name: String,
    pub to_user_id: UserId,
    pub to_display_name: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct FriendRow {
    pub id: UserId,
    pub display_name: String,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub kind: MessageKind,
    pub body: String,
    pub show: Option<ShowRow>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct UnreadCountRow {
    pub sender_id: UserId,
    pub sender_name: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct ActivityRow {
    pub id: ActivityId,
    pub actor_id: UserId,
    pub actor_name: String,
    pub kind: ActivityKind,
    pub action: String,
    pub show: Option<ShowRow>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub id: i64,
    pub user_id: UserId,
    pub show: ShowRow,
    pub rating: i64,
    pub comment: Option<String>,
    pub tags: Vec<String>,
    pub rewatch: bool,
    pub spoiler: bool,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ImportSessionRow {
    pub id: ImportId,
    pub user_id: UserId,
    pub source: String,
    pub status: ImportStatus,
    pub original_filename: Option<String>,
    pub default_list: Option<ListKind>,
    pub total_titles: i64,
    pub matched_count: i64,
    pub unmatched_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExtractedTitleRow {
    pub id: i64,
    pub import_id: ImportId,
    pub raw_text: String,
    pub normalized_title: String,
    pub year: Option<i32>,
}

// -- Row mapping helpers --

/// Read a TEXT column holding an enum label.
pub(crate) fn label<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Nullable variant of `label`.
pub(crate) fn optional_label<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        raw.parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Column list matching `show_at`. Callers alias the shows table as `s`.
pub(crate) const SHOW_COLUMNS: &str =
    "s.id, s.tmdb_id, s.media_kind, s.title, s.poster_path, s.release_date, s.first_air_date";

/// Read the seven `SHOW_COLUMNS` starting at `offset`.
pub(crate) fn show_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<ShowRow> {
    Ok(ShowRow {
        id: row.get(offset)?,
        tmdb_id: row.get(offset + 1)?,
        media_kind: label(row, offset + 2)?,
        title: row.get(offset + 3)?,
        poster_path: row.get(offset + 4)?,
        release_date: row.get(offset + 5)?,
        first_air_date: row.get(offset + 6)?,
    })
}

/// Same as `show_at` for a LEFT JOIN that may not have matched.
pub(crate) fn optional_show_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<ShowRow>> {
    let id: Option<ShowId> = row.get(offset)?;
    match id {
        Some(_) => show_at(row, offset).map(Some),
        None => Ok(None),
    }
}

// -- API conversions --

impl From<ShowRow> for api::Show {
    fn from(row: ShowRow) -> Self {
        Self {
            id: row.id,
            tmdb_id: row.tmdb_id,
            media_kind: row.media_kind,
            title: row.title,
            poster_path: row.poster_path,
            release_date: row.release_date,
            first_air_date: row.first_air_date,
        }
    }
}

impl From<ListItemRow> for api::ListEntry {
    fn from(row: ListItemRow) -> Self {
        Self {
            list: row.list,
            show: row.show.into(),
            added_at: row.added_at,
        }
    }
}

impl From<FriendRequestRow> for api::FriendRequest {
    fn from(row: FriendRequestRow) -> Self {
        Self {
            id: row.id,
            from_user_id: row.from_user_id,
            from_display_name: row.from_display_name,
            to_user_id: row.to_user_id,
            to_display_name: row.to_display_name,
            status: row.status,
            created_at: row.created_at,
            responded_at: row.responded_at,
        }
    }
}

impl From<FriendRow> for api::Friend {
    fn from(row: FriendRow) -> Self {
        Self {
            id: row.id,
            display_name: row.display_name,
            since: row.since,
        }
    }
}

impl From<MessageRow> for api::Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            kind: row.kind,
            body: row.body,
            show: row.show.map(Into::into),
            created_at: row.created_at,
            read_at: row.read_at,
        }
    }
}

impl From<UnreadCountRow> for api::UnreadCount {
    fn from(row: UnreadCountRow) -> Self {
        Self {
            sender_id: row.sender_id,
            sender_name: row.sender_name,
            count: row.count,
        }
    }
}

impl From<ReviewRow> for api::Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            show: row.show.into(),
            rating: row.rating,
            comment: row.comment,
            tags: row.tags,
            rewatch: row.rewatch,
            spoiler: row.spoiler,
            visibility: row.visibility,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<UserRow> for api::UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
        }
    }
}

impl From<ImportSessionRow> for api::ImportSession {
    fn from(row: ImportSessionRow) -> Self {
        Self {
            import_id: row.id,
            status: row.status,
            source: row.source,
            original_filename: row.original_filename,
            default_list: row.default_list,
            total_titles: row.total_titles,
            matched_count: row.matched_count,
            unmatched_count: row.unmatched_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<ExtractedTitleRow> for api::ExtractedTitle {
    fn from(row: ExtractedTitleRow) -> Self {
        Self {
            id: row.id,
            raw_text: row.raw_text,
            normalized_title: row.normalized_title,
            year: row.year,
        }
    }
}
