use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use showbuff_db::models::ActivityRow;
use showbuff_types::api::{
    Activity, AddCommentRequest, CommentView, CreatePostRequest, CreatePostResponse, OverlayQuery,
    OverlayView, ToggleLikeResponse,
};
use showbuff_types::models::{ActivityId, UserId};

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::overlay::OverlaySummary;

const MAX_POST_LEN: usize = 5000;
const MAX_COMMENT_LEN: usize = 1000;

fn to_activity(row: ActivityRow, summary: OverlaySummary) -> Activity {
    Activity {
        id: row.id,
        actor_id: row.actor_id,
        actor_name: row.actor_name,
        kind: row.kind,
        action: row.action,
        show: row.show.map(Into::into),
        rating: row.rating,
        comment: row.comment,
        visibility: row.visibility,
        created_at: row.created_at,
        like_count: summary.like_count,
        comment_count: summary.comment_count,
        liked_by_me: summary.liked_by_me,
    }
}

/// Attach overlay counts as seen by `viewer`.
async fn decorate(state: &AppState, rows: Vec<ActivityRow>, viewer: UserId) -> Vec<Activity> {
    let summaries = state
        .overlay
        .summaries(rows.iter().map(|r| r.id), viewer)
        .await;

    rows.into_iter()
        .map(|row| {
            let summary = summaries.get(&row.id).copied().unwrap_or_default();
            to_activity(row, summary)
        })
        .collect()
}

/// 404 unless `viewer` may see the activity, so private rows are not leaked.
async fn ensure_activity(state: &AppState, id: ActivityId, viewer: UserId) -> Result<(), ApiError> {
    with_db(state, move |db| db.visible_activity(id, viewer))
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Activity not found".into()))
}

/// POST /api/activity/create-post
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<CreatePostRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("content is required".into()));
    }
    if content.len() > MAX_POST_LEN {
        return Err(ApiError::Validation(format!(
            "content must be at most {} bytes",
            MAX_POST_LEN
        )));
    }

    let visibility = req.visibility;
    let show = req.show;
    let row = with_db(&state, move |db| {
        db.create_post(user.id, &content, visibility, show.as_ref())
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            success: true,
            post: to_activity(row, OverlaySummary::default()),
        }),
    ))
}

/// GET /api/user/activity
pub async fn personal_feed(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    let rows = with_db(&state, move |db| db.personal_feed(user.id)).await?;
    Ok(Json(decorate(&state, rows, user.id).await))
}

/// GET /api/feed/social
pub async fn social_feed(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    let rows = with_db(&state, |db| db.social_feed()).await?;
    Ok(Json(decorate(&state, rows, user.id).await))
}

/// GET /api/activity/{id}/overlay?sort=newest|top
pub async fn overlay(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<ActivityId>, ApiError>,
    WithRejection(Query(query), _): WithRejection<Query<OverlayQuery>, ApiError>,
) -> Result<Json<OverlayView>, ApiError> {
    ensure_activity(&state, id, user.id).await?;
    Ok(Json(state.overlay.view(id, user.id, query.sort).await))
}

/// POST /api/activity/{id}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<ActivityId>, ApiError>,
) -> Result<Json<ToggleLikeResponse>, ApiError> {
    ensure_activity(&state, id, user.id).await?;
    let (liked, like_count) = state.overlay.toggle_like(id, user.id).await;
    Ok(Json(ToggleLikeResponse { liked, like_count }))
}

/// POST /api/activity/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<ActivityId>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<AddCommentRequest>, ApiError>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::Validation("text is required".into()));
    }
    if text.len() > MAX_COMMENT_LEN {
        return Err(ApiError::Validation(format!(
            "text must be at most {} bytes",
            MAX_COMMENT_LEN
        )));
    }

    ensure_activity(&state, id, user.id).await?;
    let comment = state
        .overlay
        .add_comment(id, user.id, &user.display_name, text)
        .await;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// POST /api/activity/{id}/comments/{comment_id}/like
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path((id, comment_id)), _): WithRejection<Path<(ActivityId, u64)>, ApiError>,
) -> Result<Json<ToggleLikeResponse>, ApiError> {
    ensure_activity(&state, id, user.id).await?;
    let (liked, like_count) = state
        .overlay
        .toggle_comment_like(id, comment_id, user.id)
        .await
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))?;
    Ok(Json(ToggleLikeResponse { liked, like_count }))
}
