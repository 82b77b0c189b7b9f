use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use showbuff_db::models::{ExtractedTitleRow, ImportSessionRow};
use showbuff_db::{ChoiceOutcome, ImportChoice};
use showbuff_types::api::{
    ChoiceResult, ChoiceStatus, ConfirmImportRequest, ConfirmImportResponse, ImportDetail,
    ImportSession, ImportTextRequest,
};
use showbuff_types::import::extract_titles;
use showbuff_types::models::ImportId;

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::lists::validate_show_ref;
use crate::middleware::AuthUser;

const MAX_IMPORT_TEXT_LEN: usize = 256 * 1024;
const MAX_IMPORT_TITLES: usize = 1000;
const MAX_SOURCE_LEN: usize = 32;
const MAX_FILENAME_LEN: usize = 255;
const DEFAULT_SOURCE: &str = "text";

fn to_detail(session: ImportSessionRow, titles: Vec<ExtractedTitleRow>) -> ImportDetail {
    ImportDetail {
        session: session.into(),
        titles: titles.into_iter().map(Into::into).collect(),
    }
}

fn to_result(extracted_title_id: i64, outcome: ChoiceOutcome) -> ChoiceResult {
    let mut result = ChoiceResult {
        extracted_title_id,
        status: ChoiceStatus::Invalid,
        list: None,
        existing_list: None,
        show: None,
        reason: None,
    };
    match outcome {
        ChoiceOutcome::Added { list, show } => {
            result.status = ChoiceStatus::Added;
            result.list = Some(list);
            result.show = Some(show.into());
        }
        ChoiceOutcome::AlreadyMember { list, show } => {
            result.status = ChoiceStatus::AlreadyMember;
            result.list = Some(list);
            result.show = Some(show.into());
        }
        ChoiceOutcome::Conflict { list, show, existing } => {
            result.status = ChoiceStatus::Conflict;
            result.list = Some(list);
            result.existing_list = Some(existing);
            result.show = Some(show.into());
        }
        ChoiceOutcome::Invalid { reason } => result.reason = Some(reason.to_string()),
    }
    result
}

/// Trimmed optional text field, `None` when blank.
fn optional_field(value: Option<String>, name: &str, max: usize) -> Result<Option<String>, ApiError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.len() > max {
        return Err(ApiError::Validation(format!(
            "{} must be at most {} bytes",
            name, max
        )));
    }
    Ok(Some(value))
}

/// POST /api/import/text
///
/// One title per line, with an optional trailing `(year)`.
pub async fn import_text(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<ImportTextRequest>, ApiError>,
) -> Result<(StatusCode, Json<ImportDetail>), ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::Validation("text is required".into()));
    }
    if req.text.len() > MAX_IMPORT_TEXT_LEN {
        return Err(ApiError::Validation(format!(
            "text must be at most {} bytes",
            MAX_IMPORT_TEXT_LEN
        )));
    }

    let titles = extract_titles(&req.text);
    if titles.is_empty() {
        return Err(ApiError::Validation("No titles found in text".into()));
    }
    if titles.len() > MAX_IMPORT_TITLES {
        return Err(ApiError::Validation(format!(
            "An import may hold at most {} titles",
            MAX_IMPORT_TITLES
        )));
    }

    let source = optional_field(req.source, "source", MAX_SOURCE_LEN)?
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let filename = optional_field(req.original_filename, "originalFilename", MAX_FILENAME_LEN)?;
    let default_list = req.list_type;

    let (session, titles) = with_db(&state, move |db| {
        db.create_import(user.id, &source, filename.as_deref(), default_list, &titles)
    })
    .await?;

    info!("User {} started import {} with {} titles", user.id, session.id, session.total_titles);

    Ok((StatusCode::CREATED, Json(to_detail(session, titles))))
}

/// GET /api/import/pending
pub async fn pending_imports(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ImportSession>>, ApiError> {
    let rows = with_db(&state, move |db| db.pending_imports(user.id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/import/{id}
pub async fn get_import(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<ImportId>, ApiError>,
) -> Result<Json<ImportDetail>, ApiError> {
    let (session, titles) = with_db(&state, move |db| db.import_session(id, user.id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Import not found".into()))?;
    Ok(Json(to_detail(session, titles)))
}

/// POST /api/import/confirm
///
/// Every choice goes through the regular add-to-list rules. A show that
/// already sits in another list is reported as a conflict for that choice
/// and left where it is.
pub async fn confirm_import(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<ConfirmImportRequest>, ApiError>,
) -> Result<Json<ConfirmImportResponse>, ApiError> {
    if req.choices.len() > MAX_IMPORT_TITLES {
        return Err(ApiError::Validation(format!(
            "At most {} choices may be confirmed at once",
            MAX_IMPORT_TITLES
        )));
    }
    for choice in &req.choices {
        validate_show_ref(&choice.show)?;
    }

    let import_id = req.import_id;
    let choices: Vec<ImportChoice> = req
        .choices
        .into_iter()
        .map(|c| ImportChoice {
            extracted_title_id: c.extracted_title_id,
            show: c.show,
            list: c.list_type,
        })
        .collect();

    let confirmed = with_db(&state, move |db| db.confirm_import(user.id, import_id, &choices))
        .await?
        .ok_or_else(|| ApiError::NotFound("Import not found".into()))?;

    info!(
        "User {} confirmed import {}: {} of {} titles matched",
        user.id, import_id, confirmed.session.matched_count, confirmed.session.total_titles
    );

    Ok(Json(ConfirmImportResponse {
        success: true,
        session: confirmed.session.into(),
        results: confirmed
            .results
            .into_iter()
            .map(|(id, outcome)| to_result(id, outcome))
            .collect(),
    }))
}
