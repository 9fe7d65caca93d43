use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::session::SessionContext;
use super::validation::{text_update, validate_name, validate_password_present};
use super::{ApiError, ApiJson, ApiResponse, AppState, MessageResponse};
use crate::models::{Member, ProfileChanges};

/// Fields a member may edit on their own profile. Anything else in the body,
/// such as `email` or `memberType`, is ignored. A blank optional field clears
/// the stored value.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub biography: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

#[derive(Serialize)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub profile: Member,
}

/// GET /user/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Json<ApiResponse<Member>>, ApiError> {
    let (user_id, _) = ctx.require_member()?;
    let member = state.auth_service().get_profile(user_id).await?;
    Ok(Json(ApiResponse::success(member)))
}

/// PUT /user/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileUpdateResponse>>, ApiError> {
    let (user_id, _) = ctx.require_member()?;

    let changes = ProfileChanges {
        name: payload.name.as_deref().map(validate_name).transpose()?,
        phone: text_update(payload.phone, "Phone")?,
        blood_group: text_update(payload.blood_group, "Blood group")?,
        address: text_update(payload.address, "Address")?,
        biography: text_update(payload.biography, "Biography")?,
        profile_image: text_update(payload.profile_image, "Profile image")?,
    };

    let profile = state.auth_service().update_profile(user_id, changes).await?;

    Ok(Json(ApiResponse::success(ProfileUpdateResponse {
        message: "Profile updated successfully".to_string(),
        profile,
    })))
}

/// PUT /user/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let (user_id, _) = ctx.require_member()?;

    validate_password_present(&payload.current_password, "Current password")?;
    validate_password_present(&payload.new_password, "New password")?;

    if let Some(confirm) = &payload.confirm_password
        && confirm != &payload.new_password
    {
        return Err(ApiError::validation("Passwords do not match"));
    }

    state
        .auth_service()
        .change_password(user_id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}
