use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::{info, warn};

use showbuff_db::{RequestLookup, RespondOutcome, SendRequestOutcome};
use showbuff_types::api::{
    Friend, FriendRequest, FriendRequestBody, PendingRequestsResponse, SendFriendRequestResponse,
    SuccessResponse,
};
use showbuff_types::models::{RequestId, UserId};

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// POST /api/friends/request
pub async fn send_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<FriendRequestBody>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let target = req.user_id;
    let outcome = with_db(&state, move |db| db.send_friend_request(user.id, target)).await?;

    let (status, request) = match outcome {
        SendRequestOutcome::Created(request) => (StatusCode::CREATED, request),
        SendRequestOutcome::Reopened(request) => (StatusCode::OK, request),
        SendRequestOutcome::InvalidTarget => {
            return Err(ApiError::Validation(
                "You cannot send a friend request to yourself".into(),
            ));
        }
        SendRequestOutcome::TargetMissing => {
            return Err(ApiError::NotFound("User not found".into()));
        }
        SendRequestOutcome::AlreadyFriends => {
            return Err(ApiError::conflict(
                "You are already friends",
                json!({ "reason": "already_friends" }),
            ));
        }
        SendRequestOutcome::ReciprocalPending(id) => {
            return Err(ApiError::conflict(
                "This user has already sent you a request; accept it instead",
                json!({ "reason": "reciprocal_pending", "requestId": id }),
            ));
        }
        SendRequestOutcome::DuplicatePending(id) => {
            return Err(ApiError::conflict(
                "Friend request already pending",
                json!({ "reason": "duplicate_pending", "requestId": id }),
            ));
        }
    };

    info!("Friend request {} from {} to {}", request.id, user.id, target);
    Ok((
        status,
        Json(SendFriendRequestResponse {
            success: true,
            request: request.into(),
        }),
    ))
}

/// POST /api/friends/accept/{id}
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<RequestId>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let outcome = with_db(&state, move |db| db.accept_friend_request(id, user.id)).await?;
    respond(outcome, id, user.id)
}

/// POST /api/friends/reject/{id}
pub async fn reject_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<RequestId>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let outcome = with_db(&state, move |db| db.reject_friend_request(id, user.id)).await?;
    respond(outcome, id, user.id)
}

fn respond(outcome: RespondOutcome, id: RequestId, acting: UserId) -> Result<Json<SuccessResponse>, ApiError> {
    match outcome {
        RespondOutcome::Done(request) => {
            info!("Friend request {} is now {}", request.id, request.status);
            Ok(Json(SuccessResponse::ok()))
        }
        RespondOutcome::NotFound => {
            warn!("User {} responded to request {} which is not pending for them", acting, id);
            Err(ApiError::NotFound("Friend request not found".into()))
        }
    }
}

/// DELETE /api/friends/{friend_id}
pub async fn remove_friend(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(friend_id), _): WithRejection<Path<UserId>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    with_db(&state, move |db| db.remove_friend(user.id, friend_id)).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/friends
pub async fn list_friends(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Friend>>, ApiError> {
    let rows = with_db(&state, move |db| db.friends(user.id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/friends/requests
pub async fn pending_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PendingRequestsResponse>, ApiError> {
    let (incoming, outgoing) = with_db(&state, move |db| {
        Ok((db.incoming_requests(user.id)?, db.outgoing_requests(user.id)?))
    })
    .await?;

    Ok(Json(PendingRequestsResponse {
        incoming: incoming.into_iter().map(Into::into).collect(),
        outgoing: outgoing.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/friends/requests/{id}
pub async fn get_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<RequestId>, ApiError>,
) -> Result<Json<FriendRequest>, ApiError> {
    match with_db(&state, move |db| db.friend_request_for(id, user.id)).await? {
        RequestLookup::Visible(request) => Ok(Json(request.into())),
        RequestLookup::Hidden => Err(ApiError::Forbidden(
            "Only participants may view this request".into(),
        )),
        RequestLookup::Missing => Err(ApiError::NotFound("Friend request not found".into())),
    }
}
