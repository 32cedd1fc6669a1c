//! Connection gate
//!
//! Resolves a presented credential to the identity of an existing user.
//! Used both before a WebSocket upgrade and by the REST auth middleware.

use crate::backend::auth::sessions::verify_token;
use crate::backend::error::ChatError;
use crate::backend::store::ChatStore;
use crate::shared::messaging::UserProfile;

/// Authenticate a credential against the user store
///
/// Missing or blank credentials yield `AuthenticationRequired`. Bad
/// signatures, expired tokens and tokens without a usable user id yield
/// `InvalidCredential`, as does a failing user lookup. A valid token naming
/// an unknown user yields `UserNotFound`.
pub async fn authenticate(
    store: &dyn ChatStore,
    secret: &str,
    token: Option<&str>,
) -> Result<UserProfile, ChatError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ChatError::AuthenticationRequired)?;

    let claims = verify_token(secret, token).map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        ChatError::InvalidCredential
    })?;

    let user_id = claims.user_uuid().ok_or_else(|| {
        tracing::debug!("Token user id is not a UUID: {}", claims.user_id);
        ChatError::InvalidCredential
    })?;

    match store.find_user(user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ChatError::UserNotFound),
        Err(e) => {
            tracing::warn!("User lookup failed for {}: {}", user_id, e);
            Err(ChatError::InvalidCredential)
        }
    }
}
