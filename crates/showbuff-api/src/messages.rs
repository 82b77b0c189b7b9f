use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::debug;

use showbuff_db::SendMessageOutcome;
use showbuff_types::api::{
    ConversationResponse, MarkReadResponse, SendMessageRequest, SendMessageResponse,
    TotalUnreadResponse, UnreadCount,
};
use showbuff_types::models::{MessageKind, UserId};

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// POST /api/messages/send
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let body = req.text.trim().to_string();
    if body.is_empty() {
        return Err(ApiError::Validation("text is required".into()));
    }
    if req.receiver_id == user.id {
        return Err(ApiError::Validation("You cannot message yourself".into()));
    }
    if req.kind == MessageKind::ShowRecommendation && req.show.is_none() {
        return Err(ApiError::Validation(
            "A show recommendation needs a show".into(),
        ));
    }

    let receiver = req.receiver_id;
    let kind = req.kind;
    let show = req.show;
    let outcome = with_db(&state, move |db| {
        db.send_message(user.id, receiver, &body, kind, show.as_ref())
    })
    .await?;

    match outcome {
        SendMessageOutcome::Sent(message) => {
            debug!("Message {} from {} to {}", message.id, user.id, receiver);
            Ok((
                StatusCode::CREATED,
                Json(SendMessageResponse {
                    success: true,
                    message: message.into(),
                }),
            ))
        }
        SendMessageOutcome::ReceiverMissing => Err(ApiError::NotFound("Receiver not found".into())),
    }
}

/// GET /api/messages/conversation/{friend_id}
pub async fn conversation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(friend_id), _): WithRejection<Path<UserId>, ApiError>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let rows = with_db(&state, move |db| db.conversation(user.id, friend_id)).await?;
    Ok(Json(ConversationResponse {
        messages: rows.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/messages/mark-read/{friend_id}
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(friend_id), _): WithRejection<Path<UserId>, ApiError>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let marked = with_db(&state, move |db| db.mark_read(user.id, friend_id)).await?;
    Ok(Json(MarkReadResponse {
        success: true,
        marked,
    }))
}

/// GET /api/messages/unread
pub async fn unread_counts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<UnreadCount>>, ApiError> {
    let rows = with_db(&state, move |db| db.unread_counts(user.id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/messages/total-unread
pub async fn total_unread(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TotalUnreadResponse>, ApiError> {
    let totals = with_db(&state, move |db| db.total_unread(user.id)).await?;
    Ok(Json(TotalUnreadResponse {
        total: totals.total(),
        messages: totals.messages,
        friend_requests: totals.friend_requests,
    }))
}
