//! Role listing handlers.
//!
//! Role is a permission-granting document, not an `EntityClass` the engine
//! resolves access to, so this does not go through
//! `validate_rbac_permissions`. Instead it lists the roles a user holds
//! within an account directly off the repository, and reports the caller's
//! account-admin status via the same `IS_ACCOUNT_ADMIN` introspection probe
//! the permissions-introspection endpoint exposes.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use warden_auth::RequestContext;
use warden_rbac::{ProbeParams, ProbeResult, RbacRepository};

use crate::{error::ApiError, state::AppState};

pub fn role_routes() -> Router<AppState> {
    Router::new().route("/", get(list_roles))
}

#[derive(Debug, Deserialize)]
pub struct ListRolesQuery {
    account_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct RoleSummary {
    id: Uuid,
    name: String,
    permissions: Value,
}

#[derive(Debug, Serialize)]
struct ListRolesResponse {
    roles: Vec<RoleSummary>,
    is_account_admin: bool,
}

async fn list_roles(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListRolesQuery>,
) -> Result<Json<ListRolesResponse>, ApiError> {
    let account_id = query.account_id.or(ctx.account_id).ok_or_else(|| {
        warden_core::Error::validation(
            "account_id is required, either as a query parameter or as request scope",
        )
    })?;

    let user_id = ctx.principal.user_id().ok_or_else(|| {
        warden_core::Error::forbidden("role listing is only meaningful for a user principal")
    })?;

    let roles = state.auth.repo.roles_for_user_account(user_id, account_id).await?;

    let mut probes = HashMap::new();
    probes.insert("IS_ACCOUNT_ADMIN".to_string(), ProbeParams::default());
    let probe_results = state
        .rbac
        .evaluate_permissions(&ctx.principal, Some(account_id), ctx.project_id, &probes)
        .await?;

    let is_account_admin = matches!(
        probe_results.get("IS_ACCOUNT_ADMIN"),
        Some(ProbeResult::Admin { overall_permissions: true })
    );

    Ok(Json(ListRolesResponse {
        roles: roles
            .into_iter()
            .map(|r| RoleSummary { id: r.id, name: r.name, permissions: r.permissions })
            .collect(),
        is_account_admin,
    }))
}
