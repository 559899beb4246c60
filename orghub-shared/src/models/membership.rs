/// Organization membership model and database operations
///
/// A membership links exactly one user to exactly one organization with a
/// role. At most one membership exists per (user, organization) pair, and
/// memberships are hard-deleted when either parent row is removed.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_role AS ENUM ('admin', 'member');
///
/// CREATE TABLE organization_memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL,
///     organization_id UUID NOT NULL,
///     role membership_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// -- plus, via ensure_membership_constraints():
/// --   UNIQUE (user_id, organization_id)
/// --   FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
/// --   FOREIGN KEY (organization_id) REFERENCES organizations(id) ON DELETE CASCADE
/// ```
///
/// # Example
///
/// ```no_run
/// use orghub_shared::models::membership::{CreateMembership, Membership};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, organization_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let membership = Membership::create(&pool, CreateMembership {
///     organization_id,
///     user_id,
///     role: "member".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a user within an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Manages the organization and its members
    Admin,

    /// Regular member
    Member,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
        }
    }

    /// Parses an exact role name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(MembershipRole::Admin),
            "member" => Some(MembershipRole::Member),
            _ => None,
        }
    }

    /// Parses a role, falling back to `Member` for anything unrecognized
    pub fn parse_or_default(s: &str) -> Self {
        match Self::parse(s) {
            Some(role) => role,
            None => {
                tracing::debug!(requested = s, "Unrecognized membership role, defaulting to member");
                MembershipRole::Member
            }
        }
    }

    /// Whether this role can manage the organization and its members
    pub fn is_admin(&self) -> bool {
        matches!(self, MembershipRole::Admin)
    }

    /// Checks if this role satisfies the required role (Admin > Member)
    pub fn satisfies(&self, required: MembershipRole) -> bool {
        self.level() >= required.level()
    }

    fn level(&self) -> u8 {
        match self {
            MembershipRole::Admin => 2,
            MembershipRole::Member => 1,
        }
    }
}

impl Default for MembershipRole {
    fn default() -> Self {
        MembershipRole::Member
    }
}

impl std::fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership linking a user to an organization
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: MembershipRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a membership
///
/// `role` is the raw requested role; anything other than `admin` or `member`
/// is stored as `member`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub role: String,
}

impl CreateMembership {
    /// The role that will actually be stored
    pub fn effective_role(&self) -> MembershipRole {
        MembershipRole::parse_or_default(&self.role)
    }
}

/// Member listing entry with the member's email
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberSummary {
    pub user_id: Uuid,
    pub email: String,
    pub role: MembershipRole,
    pub joined_at: DateTime<Utc>,
}

/// Result of removing a member from an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRemoval {
    Removed,
    NotFound,
    /// Refused: the member is the organization's only admin
    LastAdmin,
}

impl Membership {
    /// Creates a membership, coercing an unknown role to `member`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The (user, organization) pair already has a membership
    /// - The user or organization doesn't exist
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let role = data.effective_role();

        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO organization_memberships (user_id, organization_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, organization_id, role, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.organization_id)
        .bind(role)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            organization_id = %membership.organization_id,
            user_id = %membership.user_id,
            role = %membership.role,
            "Membership created"
        );

        Ok(membership)
    }

    /// Finds the membership for a (organization, user) pair
    pub async fn find(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, organization_id, role, created_at, updated_at
            FROM organization_memberships
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Lists members of an organization, oldest first
    ///
    /// Soft-deleted users are excluded.
    pub async fn list_members(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<MemberSummary>, sqlx::Error> {
        let members = sqlx::query_as::<_, MemberSummary>(
            r#"
            SELECT m.user_id, u.email, m.role, m.created_at AS joined_at
            FROM organization_memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.organization_id = $1 AND u.deleted_at IS NULL
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Deletes a membership unless it belongs to the organization's last admin
    ///
    /// The organization's admin rows are locked for the duration of the
    /// transaction, so concurrent removals cannot both pass the check.
    /// Admins are counted from memberships alone, including soft-deleted users.
    pub async fn remove(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<MemberRemoval, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let admins: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM organization_memberships
            WHERE organization_id = $1 AND role = 'admin'
            FOR UPDATE
            "#,
        )
        .bind(organization_id)
        .fetch_all(&mut *tx)
        .await?;

        let role: Option<MembershipRole> = sqlx::query_scalar(
            r#"
            SELECT role
            FROM organization_memberships
            WHERE organization_id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match role {
            None => MemberRemoval::NotFound,
            Some(role) if role.is_admin() && admins.len() <= 1 => MemberRemoval::LastAdmin,
            Some(_) => {
                sqlx::query(
                    "DELETE FROM organization_memberships WHERE organization_id = $1 AND user_id = $2",
                )
                .bind(organization_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
                MemberRemoval::Removed
            }
        };

        tx.commit().await?;

        if outcome == MemberRemoval::Removed {
            tracing::info!(%organization_id, %user_id, "Membership deleted");
        }

        Ok(outcome)
    }
}
