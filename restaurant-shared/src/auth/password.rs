/// Password hashing using Argon2id
///
/// Staff passwords are stored as PHC strings
/// (`$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`); the plaintext never
/// reaches the store.
///
/// # Parameters
///
/// - Memory: 64 MB (65536 KB)
/// - Iterations: 3 passes
/// - Parallelism: 4 lanes
/// - Output: 32-byte hash, 16-byte random salt
///
/// # Example
///
/// ```
/// use restaurant_shared::auth::password::{hash_password, verify_credentials};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let digest = hash_password("Waiter#2024")?;
///
/// let (valid, message) = verify_credentials("Waiter#2024", &digest);
/// assert!(valid);
/// assert!(message.is_empty());
///
/// let (valid, message) = verify_credentials("guess", &digest);
/// assert!(!valid);
/// assert_eq!(message, "login or password is incorrect");
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Message returned for any failed credential check
///
/// Identical for unknown accounts and wrong passwords.
pub const INCORRECT_CREDENTIALS: &str = "login or password is incorrect";

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with Argon2id and a fresh random salt
///
/// # Errors
///
/// Returns `PasswordError::HashError` only if the parameters are rejected or
/// the hasher itself fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536) // 64 MB
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC digest
///
/// The comparison is constant-time. Parameters are read from the digest, so
/// hashes produced with older settings keep verifying.
///
/// # Returns
///
/// `Ok(true)` on match, `Ok(false)` on mismatch
///
/// # Errors
///
/// Returns an error if the digest cannot be parsed or verification fails for
/// a reason other than a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks a login attempt against a stored digest
///
/// Never says which part was wrong: every failure, including a corrupt
/// digest, yields `(false, INCORRECT_CREDENTIALS)`.
pub fn verify_credentials(candidate: &str, digest: &str) -> (bool, String) {
    match verify_password(candidate, digest) {
        Ok(true) => (true, String::new()),
        Ok(false) => (false, INCORRECT_CREDENTIALS.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password digest could not be verified");
            (false, INCORRECT_CREDENTIALS.to_string())
        }
    }
}

/// Validates password strength
///
/// Requires at least 8 characters with an uppercase letter, a lowercase
/// letter, a digit and a special character.
///
/// ```
/// use restaurant_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("MyP@ssw0rd!").is_ok());
/// assert!(validate_password_strength("Sh0rt!").is_err());
/// assert!(validate_password_strength("Password123").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one digit".to_string());
    }

    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}
