use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::session::{SESSION_TOKEN_KEY, SessionContext};
use super::validation::{optional_text, validate_email, validate_name, validate_password_present};
use super::{ApiError, ApiJson, ApiResponse, AppState, MessageResponse};
use crate::auth::{Permission, granted_permissions, has_admin_access};
use crate::models::{AdminRole, MemberType};
use crate::services::{AuthError, SignUp};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub token: String,
    pub user: SessionUser,
    pub member_type: MemberType,
    pub admin_roles: Vec<AdminRole>,
    pub expires_at: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: String,
    pub member_type: MemberType,
    pub admin_roles: Vec<AdminRole>,
    pub has_admin_access: bool,
    pub permissions: Vec<Permission>,
    pub expires_at: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUserResponse {
    pub member_type: MemberType,
}

pub const PENDING_APPROVAL_MESSAGE: &str =
    "Your account is pending approval. You will be able to sign in once an administrator approves it.";

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Register a new member; the account stays pending until approved
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(&payload.name)?;
    let email = validate_email(&payload.email)?;
    validate_password_present(&payload.password, "Password")?;

    if payload.password != payload.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }

    let input = SignUp {
        name,
        email,
        password: payload.password,
        phone: optional_text(payload.phone, "Phone")?,
        blood_group: optional_text(payload.blood_group, "Blood group")?,
        address: optional_text(payload.address, "Address")?,
        biography: optional_text(payload.biography, "Biography")?,
    };

    let result = state.auth_service().sign_up(input).await;
    let outcome = match &result {
        Ok(_) => "created",
        Err(AuthError::EmailTaken) => "duplicate",
        Err(_) => "rejected",
    };
    metrics::counter!("auth_sign_up_total", "outcome" => outcome).increment(1);
    result?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MessageResponse::new(
            "Registration successful. Your account is pending approval.",
        ))),
    ))
}

/// POST /auth/signin
/// Verify credentials, issue a session token and bind it to the session cookie
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<Json<ApiResponse<SignInResponse>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    validate_password_present(&payload.password, "Password")?;

    let result = match state
        .auth_service()
        .sign_in(&payload.email, &payload.password)
        .await
    {
        Ok(result) => result,
        Err(AuthError::PendingApproval) => {
            metrics::counter!("auth_sign_in_total", "outcome" => "pending").increment(1);
            return Err(ApiError::unauthorized(PENDING_APPROVAL_MESSAGE));
        }
        Err(AuthError::InvalidCredentials) => {
            metrics::counter!("auth_sign_in_total", "outcome" => "invalid").increment(1);
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
        Err(e) => return Err(e.into()),
    };

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to rotate session: {e}")))?;
    session
        .insert(SESSION_TOKEN_KEY, &result.token)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    metrics::counter!("auth_sign_in_total", "outcome" => "success").increment(1);

    Ok(Json(ApiResponse::success(SignInResponse {
        token: result.token,
        user: SessionUser {
            id: result.identity.id,
            name: result.identity.name,
            email: result.identity.email,
        },
        member_type: result.claims.member_type,
        admin_roles: result.claims.admin_roles,
        expires_at: result.claims.exp,
    })))
}

/// POST /auth/signout
/// Drop the server-side session; bearer tokens simply stop being sent
pub async fn sign_out(session: Session) -> impl IntoResponse {
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to flush session: {e}");
    }
    Json(ApiResponse::success(MessageResponse::new("Signed out")))
}

/// GET /auth/session
/// Current session claims plus the permissions they grant
pub async fn current_session(
    ctx: SessionContext,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    let (_, claims) = ctx.require_member()?;

    Ok(Json(ApiResponse::success(SessionResponse {
        user_id: claims.sub.clone(),
        member_type: claims.member_type,
        admin_roles: claims.admin_roles.clone(),
        has_admin_access: has_admin_access(&claims.admin_roles),
        permissions: granted_permissions(&claims.admin_roles),
        expires_at: claims.exp,
    })))
}

/// POST /auth/check-user
/// Report the member type behind a credential pair
pub async fn check_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<Json<ApiResponse<CheckUserResponse>>, ApiError> {
    let member_type = state
        .auth_service()
        .member_type_for(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(CheckUserResponse { member_type })))
}
