/// Organization-scoped authorization
///
/// Every organization route goes through [`authorize_organization`]:
///
/// 1. **Organization exists**: unknown or soft-deleted organizations are 404
/// 2. **Membership**: the caller must be a member, otherwise 403
/// 3. **Role** (optional): the caller's role must satisfy the required one
///
/// On success the caller's [`AuthContext`] is returned scoped to the
/// organization, together with the organization itself.
///
/// # Example
///
/// ```no_run
/// use orghub_shared::auth::authorization::authorize_organization;
/// use orghub_shared::auth::middleware::AuthContext;
/// use orghub_shared::models::membership::MembershipRole;
/// use orghub_shared::store::Store;
/// use uuid::Uuid;
///
/// # async fn example(store: &dyn Store, auth: &AuthContext, org_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let (organization, scoped) =
///     authorize_organization(store, auth, org_id, Some(MembershipRole::Admin)).await?;
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::{membership::MembershipRole, organization::Organization};
use crate::store::{Store, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Organization not found")]
    OrganizationNotFound(Uuid),

    #[error("You are not a member of this organization")]
    NotMember(Uuid),

    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole {
        required: MembershipRole,
        actual: MembershipRole,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Checks that the caller may act on `organization_id`
///
/// `required_role` of `None` only requires membership.
pub async fn authorize_organization(
    store: &dyn Store,
    auth: &AuthContext,
    organization_id: Uuid,
    required_role: Option<MembershipRole>,
) -> Result<(Organization, AuthContext), AuthzError> {
    let organization = store
        .find_organization(organization_id)
        .await?
        .ok_or(AuthzError::OrganizationNotFound(organization_id))?;

    let membership = store
        .find_membership(organization_id, auth.user_id)
        .await?
        .ok_or(AuthzError::NotMember(organization_id))?;

    if let Some(required) = required_role {
        if !membership.role.satisfies(required) {
            tracing::debug!(
                user_id = %auth.user_id,
                organization_id = %organization_id,
                required = %required,
                actual = %membership.role,
                "Insufficient organization role"
            );
            return Err(AuthzError::InsufficientRole {
                required,
                actual: membership.role,
            });
        }
    }

    let scoped = auth.with_organization(organization_id, membership.role);
    Ok((organization, scoped))
}
