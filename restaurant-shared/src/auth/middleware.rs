/// Token authentication middleware for Axum
///
/// Protected routes require the access token in a `token` header (no
/// `Bearer` prefix). On success the identity claims are added to request
/// extensions as an [`AuthContext`].
///
/// | Request | Response |
/// |---------|----------|
/// | no `token` header | `401`, empty body |
/// | token fails validation | `403`, `{"error":"forbidden","message":...}` |
/// | valid access token | handler runs |
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use restaurant_shared::auth::jwt::TokenService;
/// use restaurant_shared::auth::middleware::{token_auth, AuthContext};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     format!("{} {}", auth.first_name, auth.last_name)
/// }
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = Arc::new(TokenService::with_default_lifetimes("a-secret-of-at-least-32-bytes-long!")?);
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(tokens, token_auth));
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::jwt::{Claims, JwtError, TokenService};

/// Header carrying the access token
pub const TOKEN_HEADER: &str = "token";

/// Authenticated identity added to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    /// Public user id
    pub uid: String,
}

impl AuthContext {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            uid: claims.uid,
        }
    }
}

/// Error type for the authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable `token` header
    #[error("No token header provided")]
    MissingToken,

    /// Token present but rejected
    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingToken => StatusCode::UNAUTHORIZED.into_response(),
            AuthError::InvalidToken(message) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "forbidden", "message": message })),
            )
                .into_response(),
        }
    }
}

/// Validates the `token` header and attaches an [`AuthContext`]
pub async fn token_auth(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // A blank header, or one that is not visible ASCII, counts as absent
    let token = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.trim().is_empty())
        .ok_or(AuthError::MissingToken)?;

    let claims = tokens.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request token");
        AuthError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext::from_claims(claims));

    Ok(next.run(req).await)
}
