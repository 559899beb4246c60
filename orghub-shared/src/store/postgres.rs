/// PostgreSQL-backed store
///
/// Thin adapter from the [`Store`] trait onto the model operations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::db::pool::health_check;
use crate::models::{
    membership::{CreateMembership, MemberRemoval, MemberSummary, Membership},
    organization::{CreateOrganization, Organization, OrganizationWithRole},
    user::{CreateUser, User},
};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn soft_delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(User::soft_delete(&self.pool, id).await?)
    }

    async fn create_organization(
        &self,
        data: CreateOrganization,
        admin_user_id: Uuid,
    ) -> Result<(Organization, Membership), StoreError> {
        Ok(Organization::create_with_admin(&self.pool, data, admin_user_id).await?)
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        Ok(Organization::find_by_id(&self.pool, id).await?)
    }

    async fn list_organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OrganizationWithRole>, StoreError> {
        Ok(Organization::list_for_user(&self.pool, user_id).await?)
    }

    async fn soft_delete_organization(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Organization::soft_delete(&self.pool, id).await?)
    }

    async fn create_membership(&self, data: CreateMembership) -> Result<Membership, StoreError> {
        Ok(Membership::create(&self.pool, data).await?)
    }

    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(Membership::find(&self.pool, organization_id, user_id).await?)
    }

    async fn list_members(&self, organization_id: Uuid) -> Result<Vec<MemberSummary>, StoreError> {
        Ok(Membership::list_members(&self.pool, organization_id).await?)
    }

    async fn remove_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<MemberRemoval, StoreError> {
        Ok(Membership::remove(&self.pool, organization_id, user_id).await?)
    }
}
