/// Database models for OrgHub
///
/// This module contains the database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts (soft-deletable)
/// - `organization`: Organizations (soft-deletable, unique names)
/// - `membership`: User-organization links with an `admin`/`member` role
///
/// # Example
///
/// ```no_run
/// use orghub_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod organization;
pub mod user;
