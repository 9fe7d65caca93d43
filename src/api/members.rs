use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::session::SessionContext;
use super::validation::validate_member_id;
use super::{ApiError, ApiJson, ApiResponse, AppState};
use crate::auth::Permission;
use crate::models::{Member, MemberPage, MemberQuery, MemberType};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListMembersQuery {
    pub member_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangeMemberTypeRequest {
    pub member_type: String,
}

/// GET /admin/members
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(params): Query<ListMembersQuery>,
) -> Result<Json<ApiResponse<MemberPage>>, ApiError> {
    ctx.require(Permission::MembersRead)?;

    let defaults = MemberQuery::default();
    let member_type = params
        .member_type
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<MemberType>)
        .transpose()
        .map_err(ApiError::validation)?;

    let query = MemberQuery {
        member_type,
        search: params.search,
        page: params.page.unwrap_or(defaults.page),
        page_size: params.page_size.unwrap_or(defaults.page_size),
    };

    let page = state.member_service().list_members(query).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// PATCH /admin/members/{id}/member-type
pub async fn change_member_type(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<ChangeMemberTypeRequest>,
) -> Result<Json<ApiResponse<Member>>, ApiError> {
    let claims = ctx.require(Permission::MembersApprove)?;
    let id = validate_member_id(id)?;

    let member_type = payload
        .member_type
        .parse::<MemberType>()
        .map_err(ApiError::validation)?;

    let member = state
        .member_service()
        .change_member_type(id, member_type)
        .await?;

    tracing::info!(
        admin = %claims.sub,
        user_id = id,
        member_type = %member_type,
        "Member type updated by admin"
    );

    Ok(Json(ApiResponse::success(member)))
}
