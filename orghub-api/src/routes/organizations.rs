/// Organization endpoints
///
/// All routes require a bearer token. Routes under `/:id` additionally
/// require membership in that organization, and mutating member routes
/// require the `admin` role.
///
/// # Endpoints
///
/// - `POST /api/organizations` - Create (caller becomes admin)
/// - `GET /api/organizations` - List the caller's organizations with roles
/// - `GET /api/organizations/:id` - Get one (member)
/// - `DELETE /api/organizations/:id` - Soft-delete (admin)
/// - `POST /api/organizations/:id/switch` - Select as active (member)
/// - `GET /api/organizations/:id/members` - List members (member)
/// - `POST /api/organizations/:id/members` - Add member by email (admin)
/// - `DELETE /api/organizations/:id/members/:user_id` - Remove member (admin)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use orghub_shared::{
    auth::{authorization::authorize_organization, middleware::AuthContext},
    models::{
        membership::{CreateMembership, MemberRemoval, MemberSummary, Membership, MembershipRole},
        organization::{CreateOrganization, Organization, OrganizationWithRole},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};

/// Create organization request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    /// Optional free-form billing object
    #[serde(default)]
    pub billing_details: Option<JsonValue>,
}

/// Add member request
///
/// `role` defaults to `member`; unrecognized values are stored as `member`.
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    pub role: Option<String>,
}

/// Switch organization response
#[derive(Debug, Serialize)]
pub struct SwitchResponse {
    pub organization: Organization,
    pub role: MembershipRole,
    pub message: String,
}

fn validation_error(field: &str, message: &str) -> ApiError {
    ApiError::ValidationError(vec![ValidationErrorDetail {
        field: field.to_string(),
        message: message.to_string(),
    }])
}

/// Create an organization
///
/// ```text
/// POST /api/organizations
/// {"name": "Acme", "billing_details": {"plan": "pro"}}
/// ```
///
/// Responds 201 with the organization and `"role": "admin"`.
/// A taken name is 409.
pub async fn create_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OrganizationWithRole>)> {
    let Json(req) = payload?;
    req.validate()?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(validation_error("name", "Name must not be blank"));
    }
    if matches!(req.billing_details, Some(ref details) if !details.is_object()) {
        return Err(validation_error(
            "billing_details",
            "Billing details must be a JSON object",
        ));
    }

    let (organization, membership) = state
        .store
        .create_organization(
            CreateOrganization {
                name,
                billing_details: req.billing_details,
            },
            auth.user_id,
        )
        .await?;

    tracing::info!(
        organization_id = %organization.id,
        user_id = %auth.user_id,
        "Organization created"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrganizationWithRole {
            organization,
            role: membership.role,
        }),
    ))
}

/// List the caller's organizations, ordered by name
pub async fn list_organizations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<OrganizationWithRole>>> {
    let organizations = state
        .store
        .list_organizations_for_user(auth.user_id)
        .await?;

    Ok(Json(organizations))
}

pub async fn get_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrganizationWithRole>> {
    let (organization, scoped) = authorize_organization(state.store.as_ref(), &auth, id, None).await?;

    Ok(Json(OrganizationWithRole {
        organization,
        role: scoped_role(&scoped),
    }))
}

/// Soft-delete an organization (admin only)
pub async fn delete_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize_organization(state.store.as_ref(), &auth, id, Some(MembershipRole::Admin)).await?;

    if !state.store.soft_delete_organization(id).await? {
        return Err(ApiError::NotFound("Organization not found".to_string()));
    }

    tracing::info!(organization_id = %id, user_id = %auth.user_id, "Organization deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Select an organization as the caller's active context
///
/// Only verifies membership; the client keeps the selection.
pub async fn switch_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SwitchResponse>> {
    let (organization, scoped) = authorize_organization(state.store.as_ref(), &auth, id, None).await?;

    let message = format!("Switched to organization {}", organization.name);
    tracing::debug!(organization_id = %id, user_id = %auth.user_id, "Organization switched");

    Ok(Json(SwitchResponse {
        role: scoped_role(&scoped),
        organization,
        message,
    }))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberSummary>>> {
    authorize_organization(state.store.as_ref(), &auth, id, None).await?;

    Ok(Json(state.store.list_members(id).await?))
}

/// Add an existing user to the organization (admin only)
///
/// ```text
/// POST /api/organizations/:id/members
/// {"email": "bob@example.com", "role": "member"}
/// ```
///
/// Unknown email is 404, an existing membership is 409.
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AddMemberRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    let Json(req) = payload?;
    req.validate()?;

    authorize_organization(state.store.as_ref(), &auth, id, Some(MembershipRole::Admin)).await?;

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let membership = state
        .store
        .create_membership(CreateMembership {
            organization_id: id,
            user_id: user.id,
            role: req.role.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// Remove a member (admin only)
///
/// The last remaining admin cannot be removed (409). The check and the
/// delete happen in one store operation.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    authorize_organization(state.store.as_ref(), &auth, id, Some(MembershipRole::Admin)).await?;

    match state.store.remove_member(id, user_id).await? {
        MemberRemoval::Removed => {}
        MemberRemoval::NotFound => {
            return Err(ApiError::NotFound("Membership not found".to_string()));
        }
        MemberRemoval::LastAdmin => {
            return Err(ApiError::Conflict(
                "Cannot remove the last admin of an organization".to_string(),
            ));
        }
    }

    tracing::info!(
        organization_id = %id,
        user_id = %user_id,
        removed_by = %auth.user_id,
        "Member removed"
    );
    Ok(StatusCode::NO_CONTENT)
}

fn scoped_role(scoped: &AuthContext) -> MembershipRole {
    scoped
        .organization
        .map(|org| org.role)
        .unwrap_or_default()
}
