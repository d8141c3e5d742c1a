/// JWT session tokens
///
/// Every successful signup or login yields a [`TokenPair`]:
///
/// - **Access token**: carries the staff member's identity claims (email,
///   first/last name, user id). Sent on every protected request in the
///   `token` header. Default lifetime 24 hours.
/// - **Refresh token**: carries only the user id. Default lifetime 7 days.
///
/// Both are HS256-signed with one process-wide secret held by
/// [`TokenService`]. Tokens are never revoked; expiry is the only way a
/// token stops being valid.
///
/// # Example
///
/// ```
/// use restaurant_shared::auth::jwt::TokenService;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::with_default_lifetimes("a-secret-of-at-least-32-bytes-long!")?;
/// let pair = tokens.issue_token_pair("ana@bistro.io", "Ana", "Lopez", "65f1c0de")?;
///
/// let claims = tokens.validate_token(&pair.token)?;
/// assert_eq!(claims.uid, "65f1c0de");
/// assert_eq!(claims.first_name, "Ana");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::user::User;
use crate::store::{Collection, Filter, RequestScope, StoreResult, Update};

/// Issuer written into and required from every token
pub const ISSUER: &str = "restaurant";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// No signing secret was provided
    #[error("Token signing secret is missing")]
    MissingSecret,

    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token is well-formed and correctly signed but past its expiry
    #[error("Token has expired")]
    Expired,

    /// Malformed token, bad signature, wrong issuer or wrong token type
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::hours(168),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Identity claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    /// Public user id
    pub uid: String,

    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub token_type: TokenType,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub uid: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub token_type: TokenType,
}

/// Access and refresh token issued together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Issues and validates session tokens with one signing secret
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates the service
    ///
    /// # Errors
    ///
    /// Returns `JwtError::MissingSecret` if `secret` is empty or whitespace.
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, JwtError> {
        if secret.trim().is_empty() {
            return Err(JwtError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Creates the service with 24 h access and 168 h refresh lifetimes
    pub fn with_default_lifetimes(secret: &str) -> Result<Self, JwtError> {
        Self::new(
            secret,
            TokenType::Access.default_expiration(),
            TokenType::Refresh.default_expiration(),
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Signs a new access/refresh pair for the given identity
    pub fn issue_token_pair(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        user_id: &str,
    ) -> Result<TokenPair, JwtError> {
        let issued_at = Utc::now().timestamp();

        let claims = Claims {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            uid: user_id.to_string(),
            iss: ISSUER.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at + self.access_ttl.num_seconds(),
            token_type: TokenType::Access,
        };

        let refresh_claims = RefreshClaims {
            uid: user_id.to_string(),
            iss: ISSUER.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at + self.refresh_ttl.num_seconds(),
            token_type: TokenType::Refresh,
        };

        Ok(TokenPair {
            token: self.sign(&claims)?,
            refresh_token: self.sign(&refresh_claims)?,
        })
    }

    /// Validates an access token and returns its claims
    ///
    /// # Errors
    ///
    /// - `JwtError::Expired` if the token is authentic but past `exp`
    /// - `JwtError::InvalidToken` for anything else (bad signature, garbage,
    ///   wrong issuer, a refresh token)
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims: Claims = self.verify(token)?;
        if claims.token_type != TokenType::Access {
            return Err(JwtError::InvalidToken(format!(
                "expected access token, got {}",
                claims.token_type.as_str()
            )));
        }
        Ok(claims)
    }

    /// Validates a refresh token and returns its claims
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        let claims: RefreshClaims = self.verify(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(JwtError::InvalidToken(format!(
                "expected refresh token, got {}",
                claims.token_type.as_str()
            )));
        }
        Ok(claims)
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "nbf"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        decode::<C>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }
}

/// Stores a freshly issued pair on the user with public id `user_id`
///
/// Upserts `token`, `refresh_token` and `updated_at = stamp`. If no such user
/// exists the inserted record still decodes as a [`User`]: it gets a fresh
/// `_id`, blank profile fields and an empty digest, which no password
/// verifies. Callers treat a failure as non-fatal for the request that
/// triggered it and only log it.
pub async fn persist_token_pair(
    users: &Collection<User>,
    scope: &RequestScope,
    user_id: &str,
    pair: &TokenPair,
    stamp: DateTime<Utc>,
) -> StoreResult<()> {
    let update = Update::new()
        .set("token", pair.token.as_str())
        .set("refresh_token", pair.refresh_token.as_str())
        .set("updated_at", json!(stamp))
        .set_on_insert("_id", json!(Uuid::new_v4()))
        .set_on_insert("first_name", "")
        .set_on_insert("last_name", "")
        .set_on_insert("email", "")
        .set_on_insert("phone", "")
        .set_on_insert("password", "")
        .set_on_insert("created_at", json!(stamp));

    let result = users
        .upsert_one(scope, Filter::eq("user_id", user_id), update)
        .await?;

    if result.upserted {
        tracing::warn!(user_id, "Token persistence created a user record that did not exist");
    }

    Ok(())
}
