/// JWT token generation and validation module
///
/// Tokens are signed using HS256 (HMAC-SHA256) and identify a user by id and
/// email. They carry no organization; the active organization is chosen per
/// request through the organization-scoped routes.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable (default 24 hours)
/// - **Validation**: Signature, expiration, not-before and issuer checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use orghub_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, "user@example.com".to_string());
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into and required from every token
pub const ISSUER: &str = "orghub";

/// Default token lifetime in hours
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("failed to create token: {0}")]
    Create(String),

    /// Signature, expiry, not-before, issuer or format check failed
    #[error("invalid or expired token")]
    InvalidOrExpired,
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "orghub")
/// - `iat`: Issued at timestamp
/// - `nbf`: Not before timestamp
/// - `exp`: Expiration timestamp
///
/// # Custom Claims
///
/// - `email`: The user's email at issuance time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    pub email: String,

    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    /// Creates claims with the default 24 hour lifetime
    pub fn new(user_id: Uuid, email: String) -> Self {
        Self::with_expiration(user_id, email, Duration::hours(DEFAULT_EXPIRATION_HOURS))
    }

    /// Creates claims with a custom lifetime
    ///
    /// # Example
    ///
    /// ```
    /// use orghub_shared::auth::jwt::Claims;
    /// use chrono::Duration;
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::with_expiration(
    ///     Uuid::new_v4(),
    ///     "user@example.com".to_string(),
    ///     Duration::hours(1),
    /// );
    /// assert!(!claims.is_expired());
    /// ```
    pub fn with_expiration(user_id: Uuid, email: String, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a compact HS256 token
///
/// # Errors
///
/// Returns `JwtError::Create` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::Create(e.to_string()))
}

/// Validates a token and extracts its claims
///
/// Verifies the signature, `exp`, `nbf` and that the issuer is "orghub".
/// Every failure collapses to [`JwtError::InvalidOrExpired`]; the precise
/// cause is only logged at debug level.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token validation failed");
            JwtError::InvalidOrExpired
        })
}
