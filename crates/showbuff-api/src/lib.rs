pub mod activity;
pub mod auth;
pub mod error;
pub mod friends;
pub mod imports;
pub mod lists;
pub mod messages;
pub mod middleware;
pub mod overlay;
pub mod reviews;

use axum::{
    Json, Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AppState;
use crate::middleware::require_auth;

/// Build the full HTTP surface. Everything except health, register and login
/// sits behind the bearer-token gate.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        // Lists
        .route("/api/lists/add-to-list", post(lists::add_to_list))
        .route("/api/lists/move-to-list", post(lists::move_to_list))
        .route("/api/lists/remove-from-list", post(lists::remove_from_list))
        .route("/api/lists/status/{media_kind}/{tmdb_id}", get(lists::list_status))
        .route("/api/lists/{list_kind}", get(lists::list_contents))
        // Friends
        .route("/api/friends", get(friends::list_friends))
        .route("/api/friends/{friend_id}", delete(friends::remove_friend))
        .route("/api/friends/request", post(friends::send_request))
        .route("/api/friends/accept/{id}", post(friends::accept_request))
        .route("/api/friends/reject/{id}", post(friends::reject_request))
        .route("/api/friends/requests", get(friends::pending_requests))
        .route("/api/friends/requests/{id}", get(friends::get_request))
        // Messages
        .route("/api/messages/send", post(messages::send_message))
        .route("/api/messages/conversation/{friend_id}", get(messages::conversation))
        .route("/api/messages/mark-read/{friend_id}", post(messages::mark_read))
        .route("/api/messages/unread", get(messages::unread_counts))
        .route("/api/messages/total-unread", get(messages::total_unread))
        // Activity
        .route("/api/activity/create-post", post(activity::create_post))
        .route("/api/activity/{id}/overlay", get(activity::overlay))
        .route("/api/activity/{id}/like", post(activity::toggle_like))
        .route("/api/activity/{id}/comments", post(activity::add_comment))
        .route(
            "/api/activity/{id}/comments/{comment_id}/like",
            post(activity::toggle_comment_like),
        )
        .route("/api/user/activity", get(activity::personal_feed))
        .route("/api/feed/social", get(activity::social_feed))
        // Imports
        .route("/api/import/text", post(imports::import_text))
        .route("/api/import/pending", get(imports::pending_imports))
        .route("/api/import/confirm", post(imports::confirm_import))
        .route("/api/import/{id}", get(imports::get_import))
        // Reviews
        .route("/api/reviews", post(reviews::upsert_review))
        .route("/api/reviews/me", get(reviews::my_reviews))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "service": "showbuff" }))
}
