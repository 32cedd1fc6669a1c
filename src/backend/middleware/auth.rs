/**
 * Authentication Middleware
 *
 * Protects the REST endpoints with the same credential check the socket
 * handshake uses. The resolved profile is stored in the request extensions
 * and read back by the `AuthUser` extractor.
 */

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::auth::authenticate;
use crate::backend::error::ChatError;
use crate::backend::server::state::AppState;
use crate::shared::messaging::UserProfile;

/// Authenticated user data attached by `auth_middleware`
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub profile: UserProfile,
}

/// Bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Handshake credential: the header wins, then the `token` query parameter
pub fn handshake_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    bearer_token(headers).or_else(|| {
        query_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

/// Authentication middleware
///
/// Returns 401 with a JSON error body when the token is missing, invalid,
/// or names an unknown user.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ChatError> {
    let token = bearer_token(request.headers());
    let profile = authenticate(
        app_state.store.as_ref(),
        &app_state.config.jwt_secret,
        token.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::warn!("Rejected API request to {}: {}", request.uri().path(), e);
        e
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: profile.id,
        profile,
    });

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = ChatError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                ChatError::AuthenticationRequired
            })?;

        Ok(AuthUser(user))
    }
}
