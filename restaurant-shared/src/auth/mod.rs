/// Authentication for restaurant staff
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and credential checks
/// - [`jwt`]: access/refresh token issuance and validation
/// - [`middleware`]: `token` header middleware for protected routes
///
/// # Example
///
/// ```no_run
/// use restaurant_shared::auth::jwt::TokenService;
/// use restaurant_shared::auth::password::{hash_password, verify_credentials};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let digest = hash_password("Waiter#2024")?;
/// let (valid, _) = verify_credentials("Waiter#2024", &digest);
/// assert!(valid);
///
/// let tokens = TokenService::with_default_lifetimes("a-secret-of-at-least-32-bytes-long!")?;
/// let pair = tokens.issue_token_pair("ana@bistro.io", "Ana", "Lopez", "65f1c0de")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
