use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use showbuff_types::api::Claims;
use showbuff_types::models::UserId;

use crate::auth::AppState;
use crate::error::ApiError;

/// The identity resolved from a bearer token, available to handlers as an
/// `Extension`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            display_name: claims.display_name,
        }
    }
}

/// Extract and validate the JWT from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.map_err(|_| ApiError::Unauthorized("Missing bearer token".into()))?;

    let user = resolve(&state.jwt_secret, bearer.token())?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Resolve a bearer token into an identity or reject it.
pub fn resolve(secret: &str, token: &str) -> Result<AuthUser, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

    Ok(token_data.claims.into())
}
