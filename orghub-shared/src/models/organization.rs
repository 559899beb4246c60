/// Organization model and database operations
///
/// Organizations own memberships. Names are unique. Billing details are an
/// opaque JSON object the API never interprets.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,           -- unique index idx_organizations_name
///     billing_details JSONB,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use orghub_shared::models::organization::{CreateOrganization, Organization};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let (org, membership) = Organization::create_with_admin(
///     &pool,
///     CreateOrganization { name: "Acme".to_string(), billing_details: None },
///     user_id,
/// ).await?;
///
/// for entry in Organization::list_for_user(&pool, user_id).await? {
///     println!("{} ({})", entry.organization.name, entry.role);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use super::membership::{Membership, MembershipRole};

/// Organization record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,

    /// Unique display name
    pub name: String,

    /// Opaque billing key/value map
    ///
    /// Example: {"plan": "pro", "vat_id": "DE123"}
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_details: Option<JsonValue>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Organization annotated with the requesting user's role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrganizationWithRole {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub organization: Organization,

    pub role: MembershipRole,
}

/// Input for creating an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,

    #[serde(default)]
    pub billing_details: Option<JsonValue>,
}

impl Organization {
    /// Creates an organization and makes `admin_user_id` its admin
    ///
    /// Both rows are written in one transaction; if either insert fails
    /// nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken (unique violation on
    /// `idx_organizations_name`), the user doesn't exist, or the database
    /// connection fails.
    pub async fn create_with_admin(
        pool: &PgPool,
        data: CreateOrganization,
        admin_user_id: Uuid,
    ) -> Result<(Self, Membership), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, billing_details)
            VALUES ($1, $2)
            RETURNING id, name, billing_details, created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.name)
        .bind(data.billing_details)
        .fetch_one(&mut *tx)
        .await?;

        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO organization_memberships (user_id, organization_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, organization_id, role, created_at, updated_at
            "#,
        )
        .bind(admin_user_id)
        .bind(organization.id)
        .bind(MembershipRole::Admin)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %organization.id,
            admin_user_id = %admin_user_id,
            "Organization created"
        );

        Ok((organization, membership))
    }

    /// Finds a live (not soft-deleted) organization
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, billing_details, created_at, updated_at, deleted_at
            FROM organizations
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(organization)
    }

    /// Lists the live organizations a user belongs to, with their role
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<OrganizationWithRole>, sqlx::Error> {
        let organizations = sqlx::query_as::<_, OrganizationWithRole>(
            r#"
            SELECT o.id, o.name, o.billing_details, o.created_at, o.updated_at,
                   o.deleted_at, m.role
            FROM organizations o
            JOIN organization_memberships m ON m.organization_id = o.id
            WHERE m.user_id = $1 AND o.deleted_at IS NULL
            ORDER BY o.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(organizations)
    }

    /// Soft-deletes an organization
    ///
    /// Memberships are left in place; the organization simply disappears from
    /// every default query.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Physically removes an organization
    ///
    /// ⚠️  Memberships are removed by the `ON DELETE CASCADE` foreign key.
    pub async fn purge(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
