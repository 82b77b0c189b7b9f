use std::collections::HashSet;

use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use showbuff_types::api::ShowRef;
use showbuff_types::import::ParsedTitle;
use showbuff_types::models::{ImportId, ImportStatus, ListKind, UserId};

use crate::Database;
use crate::models::{ExtractedTitleRow, ImportSessionRow, ShowRow, label, optional_label};
use crate::queries::lists::AddOutcome;

/// One pick from the import review screen: which extracted line it resolves
/// and the catalog entry the user chose for it.
#[derive(Debug, Clone)]
pub struct ImportChoice {
    pub extracted_title_id: i64,
    pub show: ShowRef,
    /// Falls back to the session's default list when absent.
    pub list: Option<ListKind>,
}

#[derive(Debug, Clone)]
pub enum ChoiceOutcome {
    Added { list: ListKind, show: ShowRow },
    AlreadyMember { list: ListKind, show: ShowRow },
    Conflict { list: ListKind, show: ShowRow, existing: ListKind },
    /// Nothing was written for this choice.
    Invalid { reason: &'static str },
}

impl ChoiceOutcome {
    fn is_match(&self) -> bool {
        matches!(self, Self::Added { .. } | Self::AlreadyMember { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmedImport {
    pub session: ImportSessionRow,
    pub results: Vec<(i64, ChoiceOutcome)>,
}

impl Database {
    /// Open a pending import holding `titles`, all unmatched so far.
    pub fn create_import(
        &self,
        user: UserId,
        source: &str,
        original_filename: Option<&str>,
        default_list: Option<ListKind>,
        titles: &[ParsedTitle],
    ) -> Result<(ImportSessionRow, Vec<ExtractedTitleRow>)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let now = Utc::now();
            let total = titles.len() as i64;

            tx.execute(
                "INSERT INTO import_sessions
                     (user_id, source, status, original_filename, default_list,
                      total_titles, matched_count, unmatched_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?6, ?7, ?7)",
                rusqlite::params![
                    user,
                    source,
                    ImportStatus::Pending.as_str(),
                    original_filename,
                    default_list.map(|l| l.as_str()),
                    total,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO extracted_titles (import_id, raw_text, normalized_title, year)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for title in titles {
                    stmt.execute(rusqlite::params![id, title.raw_text, title.title, title.year])?;
                }
            }

            let session = find_session(&tx, id, user)?
                .ok_or_else(|| anyhow!("Import {} vanished after insert", id))?;
            let rows = extracted_titles(&tx, id)?;

            tx.commit()?;
            Ok((session, rows))
        })
    }

    /// An import and its extracted titles, visible to its owner only.
    pub fn import_session(
        &self,
        id: ImportId,
        user: UserId,
    ) -> Result<Option<(ImportSessionRow, Vec<ExtractedTitleRow>)>> {
        self.with_conn(|conn| {
            let Some(session) = find_session(conn, id, user)? else {
                return Ok(None);
            };
            let titles = extracted_titles(conn, id)?;
            Ok(Some((session, titles)))
        })
    }

    /// The user's unconfirmed imports, newest first.
    pub fn pending_imports(&self, user: UserId) -> Result<Vec<ImportSessionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SESSION_SELECT}
                 WHERE user_id = ?1 AND status = ?2
                 ORDER BY created_at DESC, id DESC"
            ))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![user, ImportStatus::Pending.as_str()],
                    session_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Apply the user's picks through the normal add-to-list path and close
    /// the import. Returns `None` if the import does not exist or is not
    /// owned by `user`.
    ///
    /// Each choice is its own transaction, so a failure part-way leaves the
    /// earlier picks applied. Confirming again is safe: those come back as
    /// `AlreadyMember`.
    pub fn confirm_import(
        &self,
        user: UserId,
        id: ImportId,
        choices: &[ImportChoice],
    ) -> Result<Option<ConfirmedImport>> {
        let Some((session, titles)) = self.import_session(id, user)? else {
            return Ok(None);
        };
        let known: HashSet<i64> = titles.iter().map(|t| t.id).collect();

        let mut results = Vec::with_capacity(choices.len());
        for choice in choices {
            let outcome = if !known.contains(&choice.extracted_title_id) {
                ChoiceOutcome::Invalid {
                    reason: "extracted title does not belong to this import",
                }
            } else if let Some(list) = choice.list.or(session.default_list) {
                match self.add_to_list(user, &choice.show, list)? {
                    AddOutcome::Added { show, .. } => ChoiceOutcome::Added { list, show },
                    AddOutcome::AlreadyMember { show } => ChoiceOutcome::AlreadyMember { list, show },
                    AddOutcome::Conflict { show, existing } => ChoiceOutcome::Conflict { list, show, existing },
                }
            } else {
                ChoiceOutcome::Invalid {
                    reason: "no list chosen and the import has no default list",
                }
            };
            results.push((choice.extracted_title_id, outcome));
        }

        let matched: HashSet<i64> = results
            .iter()
            .filter(|(_, outcome)| outcome.is_match())
            .map(|(title_id, _)| *title_id)
            .collect();
        let matched = matched.len() as i64;

        let session = self.with_conn(|conn| {
            conn.execute(
                "UPDATE import_sessions
                 SET status = ?1, matched_count = ?2, unmatched_count = total_titles - ?2, updated_at = ?3
                 WHERE id = ?4",
                rusqlite::params![ImportStatus::Completed.as_str(), matched, Utc::now(), session.id],
            )?;
            find_session(conn, session.id, user)?
                .ok_or_else(|| anyhow!("Import {} vanished during confirm", session.id))
        })?;

        Ok(Some(ConfirmedImport { session, results }))
    }
}

const SESSION_SELECT: &str = "SELECT id, user_id, source, status, original_filename, default_list,
        total_titles, matched_count, unmatched_count, created_at, updated_at
     FROM import_sessions";

fn find_session(conn: &Connection, id: ImportId, user: UserId) -> Result<Option<ImportSessionRow>> {
    let row = conn
        .query_row(
            &format!("{SESSION_SELECT} WHERE id = ?1 AND user_id = ?2"),
            rusqlite::params![id, user],
            session_from_row,
        )
        .optional()?;
    Ok(row)
}

fn extracted_titles(conn: &Connection, id: ImportId) -> Result<Vec<ExtractedTitleRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, import_id, raw_text, normalized_title, year
         FROM extracted_titles
         WHERE import_id = ?1
         ORDER BY id",
    )?;

    let rows = stmt
        .query_map([id], |row| {
            Ok(ExtractedTitleRow {
                id: row.get(0)?,
                import_id: row.get(1)?,
                raw_text: row.get(2)?,
                normalized_title: row.get(3)?,
                year: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<ImportSessionRow> {
    Ok(ImportSessionRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        source: row.get(2)?,
        status: label(row, 3)?,
        original_filename: row.get(4)?,
        default_list: optional_label(row, 5)?,
        total_titles: row.get(6)?,
        matched_count: row.get(7)?,
        unmatched_count: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
