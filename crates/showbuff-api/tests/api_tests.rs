use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use showbuff_api::auth::{AppState, AppStateInner, create_token};
use showbuff_db::{CreateUserOutcome, Database};

struct TestApp {
    state: AppState,
    router: Router,
}

struct TestUser {
    id: i64,
    token: String,
}

impl TestApp {
    fn new() -> Self {
        let db = Database::open_in_memory().expect("in-memory database");
        let state = AppStateInner::new(db, "test-secret".to_string(), chrono::Duration::days(1));
        let router = showbuff_api::router(state.clone());
        Self { state, router }
    }

    /// Seed a user directly in the store and mint a token for it, skipping
    /// password hashing.
    fn user(&self, name: &str) -> TestUser {
        let email = format!("{name}@example.com");
        let CreateUserOutcome::Created(id) = self.state.db.create_user(&email, name, "unused").unwrap() else {
            panic!("{name} is already registered");
        };
        let token = create_token(&self.state, id, &email, name).unwrap();
        TestUser { id, token }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(&user.token), None).await
    }

    async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(&user.token), Some(body)).await
    }
}

fn heat() -> Value {
    json!({ "tmdbId": 100, "mediaKind": "movie", "title": "Heat", "posterPath": "/heat.jpg" })
}

fn list_ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["show"]["tmdbId"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new();

    let (status, _) = app.call(Method::GET, "/api/friends", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call(Method::GET, "/api/friends", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn register_login_me() {
    let app = TestApp::new();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "Ana@Example.com", "displayName": "ana", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["userId"].as_i64().unwrap();

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "ana@example.com", "displayName": "ana2", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);
    assert_eq!(body["displayName"], "ana");
}

#[tokio::test]
async fn list_conflict_then_move() {
    let app = TestApp::new();
    let u1 = app.user("u1");

    let (status, body) = app
        .post("/api/lists/add-to-list", &u1, json!({ "showRef": heat(), "listKind": "watchlist" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["list"], "watchlist");
    assert_eq!(body["show"]["title"], "Heat");

    let (status, body) = app
        .post("/api/lists/add-to-list", &u1, json!({ "showRef": heat(), "listKind": "watched" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["existingList"], "watchlist");

    let (status, body) = app
        .post(
            "/api/lists/move-to-list",
            &u1,
            json!({ "showRef": { "tmdbId": 100, "mediaKind": "movie" }, "fromList": "watchlist", "toList": "watched" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromList"], "watchlist");
    assert_eq!(body["toList"], "watched");
    assert_eq!(body["show"]["posterPath"], "/heat.jpg");

    let (_, watchlist) = app.get("/api/lists/watchlist", &u1).await;
    let (_, watched) = app.get("/api/lists/watched", &u1).await;
    assert!(list_ids(&watchlist).is_empty());
    assert_eq!(list_ids(&watched), vec![100]);

    let (_, status_body) = app.get("/api/lists/status/movie/100", &u1).await;
    assert_eq!(status_body["list"], "watched");
}

#[tokio::test]
async fn hyphenated_currently_watching_is_accepted() {
    let app = TestApp::new();
    let u1 = app.user("u1");

    let (status, body) = app
        .post("/api/lists/add-to-list", &u1, json!({ "showRef": heat(), "listKind": "currently-watching" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["list"], "currently_watching");

    let (status, body) = app.get("/api/lists/currently-watching", &u1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list_ids(&body), vec![100]);
}

#[tokio::test]
async fn list_validation_and_not_found() {
    let app = TestApp::new();
    let u1 = app.user("u1");

    let (status, _) = app.post("/api/lists/add-to-list", &u1, json!({ "showRef": heat() })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/lists/add-to-list", &u1, json!({ "showRef": heat(), "listKind": "favourites" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/lists/move-to-list", &u1, json!({ "showRef": heat(), "fromList": "watchlist" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/lists/move-to-list",
            &u1,
            json!({ "showRef": heat(), "fromList": "watchlist", "toList": "watched" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/lists/favourites", &u1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/lists/remove-from-list", &u1, json!({ "showRef": heat(), "listKind": "watched" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], false);
}

#[tokio::test]
async fn friend_request_accept_remove() {
    let app = TestApp::new();
    let u1 = app.user("u1");
    let u2 = app.user("u2");

    let (status, body) = app.post("/api/friends/request", &u1, json!({ "userId": u2.id })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["request"]["status"], "pending");
    let request_id = body["request"]["id"].as_i64().unwrap();

    // Only the recipient may accept
    let (status, _) = app.post(&format!("/api/friends/accept/{request_id}"), &u1, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.post(&format!("/api/friends/accept/{request_id}"), &u2, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, friends1) = app.get("/api/friends", &u1).await;
    let (_, friends2) = app.get("/api/friends", &u2).await;
    assert_eq!(friends1[0]["id"], u2.id);
    assert_eq!(friends2[0]["id"], u1.id);

    let (status, body) = app.post("/api/friends/request", &u2, json!({ "userId": u1.id })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "already_friends");

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/friends/{}", u2.id), Some(&u1.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, friends1) = app.get("/api/friends", &u1).await;
    let (_, friends2) = app.get("/api/friends", &u2).await;
    assert!(friends1.as_array().unwrap().is_empty());
    assert!(friends2.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn friend_request_errors() {
    let app = TestApp::new();
    let u1 = app.user("u1");
    let u2 = app.user("u2");
    let u3 = app.user("u3");

    let (status, _) = app.post("/api/friends/request", &u1, json!({ "userId": u1.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/api/friends/request", &u1, json!({ "userId": 9999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.post("/api/friends/request", &u1, json!({ "userId": u2.id })).await;
    let request_id = body["request"]["id"].as_i64().unwrap();

    let (status, body) = app.post("/api/friends/request", &u1, json!({ "userId": u2.id })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "duplicate_pending");

    let (status, body) = app.post("/api/friends/request", &u2, json!({ "userId": u1.id })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "reciprocal_pending");
    assert_eq!(body["requestId"], request_id);

    // Participants only
    let (status, _) = app.get(&format!("/api/friends/requests/{request_id}"), &u3).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.get(&format!("/api/friends/requests/{request_id}"), &u2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromUserId"], u1.id);

    let (_, pending) = app.get("/api/friends/requests", &u2).await;
    assert_eq!(pending["incoming"].as_array().unwrap().len(), 1);
    assert!(pending["outgoing"].as_array().unwrap().is_empty());

    let (status, _) = app.post(&format!("/api/friends/reject/{request_id}"), &u2, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post(&format!("/api/friends/reject/{request_id}"), &u2, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn messages_and_unread_totals() {
    let app = TestApp::new();
    let u1 = app.user("u1");
    let u2 = app.user("u2");
    let u3 = app.user("u3");

    // A pending request to u2 counts toward the unread total
    app.post("/api/friends/request", &u3, json!({ "userId": u2.id })).await;

    let (status, body) = app
        .post("/api/messages/send", &u1, json!({ "receiverId": u2.id, "text": "hi" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["body"], "hi");
    assert!(body["message"]["readAt"].is_null());

    let (_, totals) = app.get("/api/messages/total-unread", &u2).await;
    assert_eq!(totals["total"], 2);
    assert_eq!(totals["messages"], 1);
    assert_eq!(totals["friendRequests"], 1);

    let (_, unread) = app.get("/api/messages/unread", &u2).await;
    assert_eq!(unread[0]["senderId"], u1.id);
    assert_eq!(unread[0]["count"], 1);

    let (_, ab) = app.get(&format!("/api/messages/conversation/{}", u2.id), &u1).await;
    let (_, ba) = app.get(&format!("/api/messages/conversation/{}", u1.id), &u2).await;
    assert_eq!(ab["messages"], ba["messages"]);
    assert_eq!(ab["messages"].as_array().unwrap().len(), 1);

    let (_, marked) = app.post(&format!("/api/messages/mark-read/{}", u1.id), &u2, json!({})).await;
    assert_eq!(marked["marked"], 1);
    let (_, marked) = app.post(&format!("/api/messages/mark-read/{}", u1.id), &u2, json!({})).await;
    assert_eq!(marked["marked"], 0);

    let (_, totals) = app.get("/api/messages/total-unread", &u2).await;
    assert_eq!(totals["total"], 1);
    assert_eq!(totals["messages"], 0);
}

#[tokio::test]
async fn message_validation() {
    let app = TestApp::new();
    let u1 = app.user("u1");
    let u2 = app.user("u2");

    let (status, _) = app.post("/api/messages/send", &u1, json!({ "receiverId": u2.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/messages/send", &u1, json!({ "receiverId": u2.id, "text": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/messages/send",
            &u1,
            json!({ "receiverId": u2.id, "text": "watch", "kind": "show_recommendation" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/messages/send",
            &u1,
            json!({ "receiverId": u2.id, "text": "watch", "kind": "show_recommendation", "show": heat() }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["show"]["title"], "Heat");
}

#[tokio::test]
async fn feeds_and_overlay() {
    let app = TestApp::new();
    let u1 = app.user("u1");
    let u2 = app.user("u2");

    let (status, _) = app.post("/api/activity/create-post", &u1, json!({ "content": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/activity/create-post", &u1, json!({ "content": "loved it", "visibility": "public", "show": heat() }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["post"]["id"].as_i64().unwrap();
    assert_eq!(body["post"]["likeCount"], 0);

    app.post("/api/activity/create-post", &u1, json!({ "content": "just me", "visibility": "private" }))
        .await;

    let (_, social) = app.get("/api/feed/social", &u2).await;
    assert_eq!(social.as_array().unwrap().len(), 1);
    assert_eq!(social[0]["id"], post_id);

    // u2 is not a friend yet, so u1's activity is not in u2's feed
    let (_, personal) = app.get("/api/user/activity", &u2).await;
    assert!(personal.as_array().unwrap().is_empty());

    let (_, before) = app.get(&format!("/api/activity/{post_id}/overlay"), &u2).await;

    let (_, liked) = app.post(&format!("/api/activity/{post_id}/like"), &u2, json!({})).await;
    assert_eq!(liked["liked"], true);
    assert_eq!(liked["likeCount"], 1);

    let (_, social) = app.get("/api/feed/social", &u2).await;
    assert_eq!(social[0]["likeCount"], 1);
    assert_eq!(social[0]["likedByMe"], true);

    let (_, unliked) = app.post(&format!("/api/activity/{post_id}/like"), &u2, json!({})).await;
    assert_eq!(unliked["liked"], false);
    let (_, after) = app.get(&format!("/api/activity/{post_id}/overlay"), &u2).await;
    assert_eq!(before, after);

    let (status, first) = app
        .post(&format!("/api/activity/{post_id}/comments"), &u2, json!({ "text": "same" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["authorName"], "u2");
    let (_, second) = app
        .post(&format!("/api/activity/{post_id}/comments"), &u1, json!({ "text": "thanks" }))
        .await;

    let first_id = first["id"].as_u64().unwrap();
    app.post(&format!("/api/activity/{post_id}/comments/{first_id}/like"), &u1, json!({}))
        .await;

    let (_, newest) = app.get(&format!("/api/activity/{post_id}/overlay?sort=newest"), &u1).await;
    assert_eq!(newest["commentCount"], 2);
    assert_eq!(newest["comments"][0]["id"], second["id"]);

    let (_, top) = app.get(&format!("/api/activity/{post_id}/overlay?sort=top"), &u1).await;
    assert_eq!(top["comments"][0]["id"], first["id"]);
    assert_eq!(top["comments"][0]["likeCount"], 1);

    let (status, _) = app.get("/api/activity/9999/overlay", &u1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post("/api/activity/9999/like", &u1, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn private_activity_overlay_is_owner_only() {
    let app = TestApp::new();
    let u1 = app.user("u1");
    let u2 = app.user("u2");

    let (_, body) = app
        .post("/api/activity/create-post", &u1, json!({ "content": "just me", "visibility": "private" }))
        .await;
    let post_id = body["post"]["id"].as_i64().unwrap();

    let (status, comment) = app
        .post(&format!("/api/activity/{post_id}/comments"), &u1, json!({ "text": "note to self" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = comment["id"].as_u64().unwrap();

    let (status, _) = app.get(&format!("/api/activity/{post_id}/overlay"), &u2).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post(&format!("/api/activity/{post_id}/like"), &u2, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .post(&format!("/api/activity/{post_id}/comments"), &u2, json!({ "text": "peek" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .post(&format!("/api/activity/{post_id}/comments/{comment_id}/like"), &u2, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, overlay) = app.get(&format!("/api/activity/{post_id}/overlay"), &u1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overlay["commentCount"], 1);
    assert_eq!(overlay["comments"][0]["likeCount"], 0);
}

#[tokio::test]
async fn personal_feed_follows_friendship() {
    let app = TestApp::new();
    let u1 = app.user("u1");
    let u2 = app.user("u2");

    app.post("/api/lists/add-to-list", &u1, json!({ "showRef": heat(), "listKind": "watchlist" }))
        .await;

    let (_, body) = app.post("/api/friends/request", &u2, json!({ "userId": u1.id })).await;
    let request_id = body["request"]["id"].as_i64().unwrap();
    app.post(&format!("/api/friends/accept/{request_id}"), &u1, json!({})).await;

    let (_, feed) = app.get("/api/user/activity", &u2).await;
    assert_eq!(feed[0]["action"], "added_to_watchlist");
    assert_eq!(feed[0]["actorName"], "u1");
    assert_eq!(feed[0]["kind"], "list_change");
}

#[tokio::test]
async fn import_text_then_confirm() {
    let app = TestApp::new();
    let u1 = app.user("u1");
    let u2 = app.user("u2");

    let (status, _) = app.post("/api/import/text", &u1, json!({ "text": " \n \n" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, import) = app
        .post(
            "/api/import/text",
            &u1,
            json!({ "text": "Heat (1995)\n\nThe Wire\nAlien (1979)\n", "listType": "watchlist", "originalFilename": "mine.txt" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(import["status"], "pending");
    assert_eq!(import["totalTitles"], 3);
    assert_eq!(import["titles"][0]["normalizedTitle"], "Heat");
    assert_eq!(import["titles"][0]["year"], 1995);
    assert_eq!(import["titles"][1]["year"], Value::Null);
    let import_id = import["importId"].as_i64().unwrap();
    let title_ids: Vec<i64> = import["titles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();

    let (_, pending) = app.get("/api/import/pending", &u1).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    let (status, _) = app.get(&format!("/api/import/{import_id}"), &u2).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Alien is already watched, so that pick conflicts instead of moving it
    app.post(
        "/api/lists/add-to-list",
        &u1,
        json!({ "showRef": { "tmdbId": 348, "mediaKind": "movie", "title": "Alien" }, "listKind": "watched" }),
    )
    .await;

    let (status, confirmed) = app
        .post(
            "/api/import/confirm",
            &u1,
            json!({
                "importId": import_id,
                "choices": [
                    { "extractedTitleId": title_ids[0], "show": heat() },
                    { "extractedTitleId": title_ids[1], "show": { "tmdbId": 1438, "mediaKind": "series" }, "listType": "currently-watching" },
                    { "extractedTitleId": title_ids[2], "show": { "tmdbId": 348, "mediaKind": "movie" } },
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["session"]["status"], "completed");
    assert_eq!(confirmed["session"]["matchedCount"], 2);
    assert_eq!(confirmed["session"]["unmatchedCount"], 1);
    let results = confirmed["results"].as_array().unwrap();
    assert_eq!(results[0]["status"], "added");
    assert_eq!(results[0]["list"], "watchlist");
    assert_eq!(results[1]["status"], "added");
    assert_eq!(results[1]["list"], "currently_watching");
    assert_eq!(results[2]["status"], "conflict");
    assert_eq!(results[2]["existingList"], "watched");

    let (_, watchlist) = app.get("/api/lists/watchlist", &u1).await;
    assert_eq!(list_ids(&watchlist), vec![100]);
    let (_, watched) = app.get("/api/lists/watched", &u1).await;
    assert_eq!(list_ids(&watched), vec![348]);

    let (_, pending) = app.get("/api/import/pending", &u1).await;
    assert!(pending.as_array().unwrap().is_empty());

    // Someone else's import cannot be confirmed
    let (status, _) = app
        .post("/api/import/confirm", &u2, json!({ "importId": import_id, "choices": [] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_upsert() {
    let app = TestApp::new();
    let u1 = app.user("u1");

    let (status, _) = app.post("/api/reviews", &u1, json!({ "show": heat(), "rating": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/reviews", &u1, json!({ "show": heat(), "rating": 8, "tags": ["heist"] }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);

    let (status, body) = app
        .post("/api/reviews", &u1, json!({ "show": heat(), "rating": 9, "comment": "better on rewatch", "rewatch": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
    assert_eq!(body["review"]["rating"], 9);

    let (_, mine) = app.get("/api/reviews/me", &u1).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["rewatch"], true);
}
