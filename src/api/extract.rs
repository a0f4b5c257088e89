use crate::auth::extract_bearer_token;
use crate::error::AppError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;
use uuid::Uuid;

/// Caller identity taken from a verified bearer token
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = {
            let header = parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;
            let token = extract_bearer_token(header)
                .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))?;
            state.jwt.verify(token)?
        };

        // Tokens outlive deleted accounts
        state
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        Ok(AuthUser(user_id))
    }
}
