use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use showbuff_types::api::{Review, ReviewRequest, ReviewResponse};

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::middleware::AuthUser;

const MAX_TAGS: usize = 20;

/// POST /api/reviews
///
/// Creates the review, or edits it in place if this user already reviewed the show.
pub async fn upsert_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<ReviewRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if !(1..=10).contains(&req.rating) {
        return Err(ApiError::Validation("rating must be between 1 and 10".into()));
    }
    if req.show.tmdb_id <= 0 {
        return Err(ApiError::Validation("show.tmdbId must be positive".into()));
    }
    if req.tags.len() > MAX_TAGS {
        return Err(ApiError::Validation(format!("at most {} tags", MAX_TAGS)));
    }

    let (row, created) = with_db(&state, move |db| db.upsert_review(user.id, &req)).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };

    Ok((
        status,
        Json(ReviewResponse {
            success: true,
            created,
            review: row.into(),
        }),
    ))
}

/// GET /api/reviews/me
pub async fn my_reviews(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let rows = with_db(&state, move |db| db.reviews_by_user(user.id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
