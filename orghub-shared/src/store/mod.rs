/// Storage abstraction used by the HTTP handlers
///
/// Handlers talk to a [`Store`] rather than to a pool, so the same routes run
/// against PostgreSQL in production ([`PgStore`]) and against an in-process
/// [`MemoryStore`] in tests. Both enforce the same invariants:
///
/// - emails and organization names are unique
/// - at most one membership per (user, organization) pair
/// - an unrecognized membership role is stored as `member`
/// - soft-deleted users and organizations are invisible to lookups
/// - an organization's last admin membership cannot be removed
///
/// # Example
///
/// ```
/// use orghub_shared::store::{MemoryStore, Store};
/// use orghub_shared::models::user::CreateUser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = store.create_user(CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// assert!(store.find_user_by_email("user@example.com").await?.is_some());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::migrations::MEMBERSHIP_UNIQUE_CONSTRAINT;
use crate::models::{
    membership::{CreateMembership, MemberRemoval, MemberSummary, Membership},
    organization::{CreateOrganization, Organization, OrganizationWithRole},
    user::{CreateUser, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub(crate) const EMAIL_TAKEN: &str = "Email already registered";
pub(crate) const ORGANIZATION_NAME_TAKEN: &str = "Organization name already exists";
pub(crate) const ALREADY_MEMBER: &str = "User is already a member of this organization";
pub(crate) const MISSING_REFERENCE: &str = "Referenced user or organization does not exist";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Uniqueness violation (duplicate email, name or membership)
    #[error("{0}")]
    Conflict(String),

    /// Referenced row does not exist
    #[error("{0}")]
    NotFound(String),

    /// Backend cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(conflict_message(db_err.constraint()).to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::NotFound(MISSING_REFERENCE.to_string());
            }
        }

        StoreError::Database(err)
    }
}

/// Human-readable message for a violated unique constraint
fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("idx_users_email") => EMAIL_TAKEN,
        Some("idx_organizations_name") => ORGANIZATION_NAME_TAKEN,
        Some(c) if c == MEMBERSHIP_UNIQUE_CONSTRAINT => ALREADY_MEMBER,
        _ => "Resource already exists",
    }
}

/// CRUD surface for users, organizations and memberships
#[async_trait]
pub trait Store: Send + Sync {
    /// Liveness check against the backend
    async fn ping(&self) -> Result<(), StoreError>;

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Exact, case-sensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Hides a user from lookups; the email stays reserved
    async fn soft_delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Creates an organization plus an admin membership for `admin_user_id`
    async fn create_organization(
        &self,
        data: CreateOrganization,
        admin_user_id: Uuid,
    ) -> Result<(Organization, Membership), StoreError>;

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError>;

    async fn list_organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OrganizationWithRole>, StoreError>;

    async fn soft_delete_organization(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Creates a membership; unknown roles are stored as `member`
    async fn create_membership(&self, data: CreateMembership) -> Result<Membership, StoreError>;

    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError>;

    async fn list_members(&self, organization_id: Uuid) -> Result<Vec<MemberSummary>, StoreError>;

    /// Removes a membership atomically, refusing to drop the last admin
    async fn remove_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<MemberRemoval, StoreError>;
}
