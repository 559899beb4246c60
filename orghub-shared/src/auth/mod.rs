/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 token issuance and validation
/// - [`middleware`]: Bearer header parsing into an [`middleware::AuthContext`]
/// - [`authorization`]: Organization membership and role checks
///
/// # Example
///
/// ```
/// use orghub_shared::auth::password::{hash_password, verify_password};
/// use orghub_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "user@example.com".to_string());
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// assert!(validate_token(&token, "secret-key-at-least-32-bytes-long").is_ok());
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
