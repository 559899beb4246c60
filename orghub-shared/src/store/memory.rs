/// In-process store
///
/// Mirrors the PostgreSQL constraints (unique email, unique organization name,
/// unique membership pair, foreign keys) so handlers behave identically
/// without a database. Used by the API test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Store, StoreError, ALREADY_MEMBER, EMAIL_TAKEN, MISSING_REFERENCE, ORGANIZATION_NAME_TAKEN,
};
use crate::models::{
    membership::{CreateMembership, MemberRemoval, MemberSummary, Membership, MembershipRole},
    organization::{CreateOrganization, Organization, OrganizationWithRole},
    user::{CreateUser, User},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    organizations: HashMap<Uuid, Organization>,
    // insertion order doubles as join order
    memberships: Vec<Membership>,
}

/// Store backed by in-memory tables behind a single lock
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_membership(organization_id: Uuid, user_id: Uuid, role: MembershipRole) -> Membership {
    let now = Utc::now();
    Membership {
        id: Uuid::new_v4(),
        user_id,
        organization_id,
        role,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        // uniqueness spans soft-deleted rows, like the unique index
        if tables.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn soft_delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) if user.deleted_at.is_none() => {
                let now = Utc::now();
                user.deleted_at = Some(now);
                user.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_organization(
        &self,
        data: CreateOrganization,
        admin_user_id: Uuid,
    ) -> Result<(Organization, Membership), StoreError> {
        let mut tables = self.tables.write().await;

        if tables.organizations.values().any(|o| o.name == data.name) {
            return Err(StoreError::Conflict(ORGANIZATION_NAME_TAKEN.to_string()));
        }
        if !tables.users.contains_key(&admin_user_id) {
            return Err(StoreError::NotFound(MISSING_REFERENCE.to_string()));
        }

        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: data.name,
            billing_details: data.billing_details,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let membership = new_membership(organization.id, admin_user_id, MembershipRole::Admin);

        tables
            .organizations
            .insert(organization.id, organization.clone());
        tables.memberships.push(membership.clone());

        Ok((organization, membership))
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .organizations
            .get(&id)
            .filter(|o| o.deleted_at.is_none())
            .cloned())
    }

    async fn list_organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OrganizationWithRole>, StoreError> {
        let tables = self.tables.read().await;

        let mut organizations: Vec<OrganizationWithRole> = tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                tables
                    .organizations
                    .get(&m.organization_id)
                    .filter(|o| o.deleted_at.is_none())
                    .map(|o| OrganizationWithRole {
                        organization: o.clone(),
                        role: m.role,
                    })
            })
            .collect();
        organizations.sort_by(|a, b| a.organization.name.cmp(&b.organization.name));

        Ok(organizations)
    }

    async fn soft_delete_organization(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.organizations.get_mut(&id) {
            Some(org) if org.deleted_at.is_none() => {
                let now = Utc::now();
                org.deleted_at = Some(now);
                org.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_membership(&self, data: CreateMembership) -> Result<Membership, StoreError> {
        let role = data.effective_role();
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&data.user_id)
            || !tables.organizations.contains_key(&data.organization_id)
        {
            return Err(StoreError::NotFound(MISSING_REFERENCE.to_string()));
        }
        if tables
            .memberships
            .iter()
            .any(|m| m.user_id == data.user_id && m.organization_id == data.organization_id)
        {
            return Err(StoreError::Conflict(ALREADY_MEMBER.to_string()));
        }

        let membership = new_membership(data.organization_id, data.user_id, role);
        tables.memberships.push(membership.clone());

        Ok(membership)
    }

    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, organization_id: Uuid) -> Result<Vec<MemberSummary>, StoreError> {
        let tables = self.tables.read().await;

        let members = tables
            .memberships
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .filter_map(|m| {
                tables
                    .users
                    .get(&m.user_id)
                    .filter(|u| u.deleted_at.is_none())
                    .map(|u| MemberSummary {
                        user_id: u.id,
                        email: u.email.clone(),
                        role: m.role,
                        joined_at: m.created_at,
                    })
            })
            .collect();

        Ok(members)
    }

    async fn remove_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<MemberRemoval, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(index) = tables
            .memberships
            .iter()
            .position(|m| m.organization_id == organization_id && m.user_id == user_id)
        else {
            return Ok(MemberRemoval::NotFound);
        };

        if tables.memberships[index].role.is_admin() {
            // counted from memberships, so admins whose user is soft-deleted still count
            let admins = tables
                .memberships
                .iter()
                .filter(|m| m.organization_id == organization_id && m.role.is_admin())
                .count();
            if admins <= 1 {
                return Ok(MemberRemoval::LastAdmin);
            }
        }

        tables.memberships.remove(index);
        Ok(MemberRemoval::Removed)
    }
}
