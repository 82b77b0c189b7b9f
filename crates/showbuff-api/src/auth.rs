use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tracing::{error, info};

use showbuff_db::{CreateUserOutcome, Database};
use showbuff_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserProfile,
};
use showbuff_types::models::UserId;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::overlay::OverlayStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub overlay: OverlayStore,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String, token_ttl: chrono::Duration) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret,
            token_ttl,
            overlay: OverlayStore::new(),
        })
    }
}

/// Run a blocking store call off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Store(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(ApiError::Store)
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    let display_name = req.display_name.trim().to_string();

    // Validate input
    if !email.contains('@') || email.len() > 254 {
        return Err(ApiError::Validation("A valid email is required".into()));
    }
    if display_name.len() < 3 || display_name.len() > 32 {
        return Err(ApiError::Validation(
            "Display name must be 3 to 32 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let (e, d) = (email.clone(), display_name.clone());
    if with_db(&state, move |db| db.identity_taken(&e, &d)).await? {
        return Err(identity_taken());
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Store(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let (e, d) = (email.clone(), display_name.clone());
    let user_id = match with_db(&state, move |db| db.create_user(&e, &d, &password_hash)).await? {
        CreateUserOutcome::Created(id) => id,
        CreateUserOutcome::IdentityTaken => return Err(identity_taken()),
    };
    info!("Registered user {} ({})", user_id, display_name);

    let token = create_token(&state, user_id, &email, &display_name)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

fn identity_taken() -> ApiError {
    ApiError::conflict("Email or display name is already registered", json!({}))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    let user = with_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".into()))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ApiError::Store(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Invalid email or password".into()))?;

    let token = create_token(&state, user.id, &user.email, &user.display_name)?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        display_name: user.display_name,
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>, ApiError> {
    let row = with_db(&state, move |db| db.get_user_by_id(user.id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(row.into()))
}

pub fn create_token(
    state: &AppStateInner,
    user_id: UserId,
    email: &str,
    display_name: &str,
) -> Result<String, ApiError> {
    let expires_at = chrono::Utc::now()
        .checked_add_signed(state.token_ttl)
        .ok_or_else(|| ApiError::Store(anyhow::anyhow!("token lifetime {} overflows", state.token_ttl)))?;

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        display_name: display_name.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Store(anyhow::anyhow!("token encoding failed: {}", e)))?;

    Ok(token)
}
