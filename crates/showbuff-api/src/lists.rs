use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::{debug, warn};

use showbuff_db::{AddOutcome, MoveOutcome};
use showbuff_types::api::{
    AddToListRequest, AddToListResponse, ListEntry, ListStatusResponse, MoveToListRequest,
    MoveToListResponse, RemoveFromListRequest, RemoveFromListResponse, Show, ShowRef,
};
use showbuff_types::models::{ListKind, MediaKind};

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub(crate) fn validate_show_ref(show: &ShowRef) -> Result<(), ApiError> {
    if show.tmdb_id <= 0 {
        return Err(ApiError::Validation("showRef.tmdbId must be positive".into()));
    }
    Ok(())
}

/// POST /api/lists/add-to-list
pub async fn add_to_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<AddToListRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_show_ref(&req.show_ref)?;
    let list = req.list_kind;

    let outcome = with_db(&state, move |db| db.add_to_list(user.id, &req.show_ref, list)).await?;

    match outcome {
        AddOutcome::Added { show, activity_id } => {
            debug!("User {} added show {} to {} (activity {})", user.id, show.tmdb_id, list, activity_id);
            Ok((
                StatusCode::CREATED,
                Json(AddToListResponse {
                    success: true,
                    list,
                    show: show.into(),
                    already_member: false,
                }),
            ))
        }
        AddOutcome::AlreadyMember { show } => Ok((
            StatusCode::OK,
            Json(AddToListResponse {
                success: true,
                list,
                show: show.into(),
                already_member: true,
            }),
        )),
        AddOutcome::Conflict { show, existing } => {
            warn!("User {} tried to add show {} to {} but it is in {}", user.id, show.tmdb_id, list, existing);
            let show: Show = show.into();
            Err(ApiError::conflict(
                format!("Show is already in your {} list", existing),
                json!({ "existingList": existing, "requestedList": list, "show": show }),
            ))
        }
    }
}

/// POST /api/lists/move-to-list
pub async fn move_to_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<MoveToListRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_show_ref(&req.show_ref)?;
    let (from, to) = (req.from_list, req.to_list);
    if from == to {
        return Err(ApiError::Validation("fromList and toList must differ".into()));
    }

    let outcome = with_db(&state, move |db| db.move_between_lists(user.id, &req.show_ref, from, to)).await?;

    match outcome {
        MoveOutcome::Moved { show, .. } => Ok(Json(MoveToListResponse {
            success: true,
            from_list: from,
            to_list: to,
            show: show.into(),
        })),
        MoveOutcome::NotInSource => Err(ApiError::NotFound(format!(
            "Show is not in your {} list",
            from
        ))),
    }
}

/// POST /api/lists/remove-from-list
pub async fn remove_from_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<RemoveFromListRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_show_ref(&req.show_ref)?;
    let list = req.list_kind;

    let removed = with_db(&state, move |db| db.remove_from_list(user.id, &req.show_ref, list)).await?;

    Ok(Json(RemoveFromListResponse {
        success: true,
        removed,
    }))
}

/// GET /api/lists/{list_kind}
pub async fn list_contents(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(list), _): WithRejection<Path<ListKind>, ApiError>,
) -> Result<Json<Vec<ListEntry>>, ApiError> {
    let rows = with_db(&state, move |db| db.list_contents(user.id, list)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/lists/status/{media_kind}/{tmdb_id}
pub async fn list_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path((media_kind, tmdb_id)), _): WithRejection<Path<(MediaKind, i64)>, ApiError>,
) -> Result<Json<ListStatusResponse>, ApiError> {
    let list = with_db(&state, move |db| db.list_status(user.id, tmdb_id, media_kind)).await?;
    Ok(Json(ListStatusResponse { list }))
}
