/// User endpoints
///
/// # Endpoints
///
/// - `POST /users/signup` - Create a staff account and get tokens (public)
/// - `POST /users/login` - Exchange credentials for tokens (public)
/// - `GET /users` - List users (token)
/// - `GET /users/:user_id` - Fetch one user (token)
///
/// The password digest is never part of any response.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::pagination::{ListParams, ListResponse, Pagination},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use restaurant_shared::{
    auth::{
        jwt::{persist_token_pair, TokenPair},
        middleware::AuthContext,
        password::{self, INCORRECT_CREDENTIALS},
    },
    models::{new_identity, now, user::User},
    store::RequestScope,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 2, max = 100, message = "First name must be 2 to 100 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, max = 100, message = "Last name must be 2 to 100 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext; validated for strength, then hashed
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 32, message = "Phone is required"))]
    pub phone: String,

    #[validate(url(message = "Avatar must be a URL"))]
    pub avatar: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// User as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_id: user.user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            avatar: user.avatar,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Signup and login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,

    /// Access token, sent back in the `token` header
    pub token: String,

    pub refresh_token: String,
}

impl AuthResponse {
    fn new(user: User, pair: TokenPair) -> Self {
        Self {
            user: user.into(),
            token: pair.token,
            refresh_token: pair.refresh_token,
        }
    }
}

/// Create a staff account
///
/// # Endpoint
///
/// ```text
/// POST /users/signup
/// Content-Type: application/json
///
/// {
///   "first_name": "Ana",
///   "last_name": "Lopez",
///   "email": "ana@bistro.io",
///   "password": "Waiter#2024",
///   "phone": "+1-555-0100"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "user": {...}, "token": "eyJ...", "refresh_token": "eyJ..." }`
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or validation failed
/// - `409 Conflict`: Email or phone already registered
/// - `500 Internal Server Error`: Server error
pub async fn signup(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    // Check and insert are separate operations; concurrent signups can race
    if User::email_taken(&state.users, &scope, &req.email).await? {
        return Err(ApiError::Conflict("this email already exists".to_string()));
    }
    if User::phone_taken(&state.users, &scope, &req.phone).await? {
        return Err(ApiError::Conflict("this phone number already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let (id, user_id) = new_identity();
    let pair = state
        .tokens
        .issue_token_pair(&req.email, &req.first_name, &req.last_name, &user_id)?;

    let stamp = now();
    let user = User {
        id,
        user_id,
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        phone: req.phone,
        password: password_hash,
        avatar: req.avatar,
        token: Some(pair.token.clone()),
        refresh_token: Some(pair.refresh_token.clone()),
        created_at: stamp,
        updated_at: stamp,
    };

    state.users.insert_one(&scope, &user).await?;

    tracing::info!(user_id = %user.user_id, "User signed up");

    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, pair))))
}

/// Exchange credentials for a fresh token pair
///
/// # Endpoint
///
/// ```text
/// POST /users/login
/// Content-Type: application/json
///
/// { "email": "ana@bistro.io", "password": "Waiter#2024" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or validation failed
/// - `401 Unauthorized`: Unknown email or wrong password (same message for both)
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let mut user = User::find_by_email(&state.users, &scope, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INCORRECT_CREDENTIALS.to_string()))?;

    let (valid, message) = password::verify_credentials(&req.password, &user.password);
    if !valid {
        return Err(ApiError::Unauthorized(message));
    }

    let pair = state.tokens.issue_token_pair(
        &user.email,
        &user.first_name,
        &user.last_name,
        &user.user_id,
    )?;

    let stamp = now();

    // Login succeeds even if the new pair cannot be stored
    if let Err(e) = persist_token_pair(&state.users, &scope, &user.user_id, &pair, stamp).await {
        tracing::warn!(user_id = %user.user_id, error = %e, "Failed to persist token pair");
    }

    user.token = Some(pair.token.clone());
    user.refresh_token = Some(pair.refresh_token.clone());
    user.updated_at = stamp;

    tracing::info!(user_id = %user.user_id, "User logged in");

    Ok(Json(AuthResponse::new(user, pair)))
}

/// List users
///
/// ```text
/// GET /users?page=1&recordsPerPage=10
/// token: eyJ...
/// ```
pub async fn list_users(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ListResponse<UserResponse>>> {
    let Query(params) = query?;
    let pagination = Pagination::from(&params);

    tracing::debug!(uid = %auth.uid, ?pagination, "Listing users");

    let page = state
        .users
        .find_page(&scope, pagination.skip, pagination.records_per_page)
        .await?;

    let items = page.items.into_iter().map(UserResponse::from).collect();

    Ok(Json(ListResponse::new(pagination, page.total_count, items)))
}

/// Fetch one user by public id
///
/// # Errors
///
/// - `404 Not Found`: No user with that id
pub async fn get_user(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_user_id(&state.users, &scope, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
