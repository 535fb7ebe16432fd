//! Project access-check handler — exercises C3 (entity resolution), C4
//! (ancestry) and C5 (precedence evaluation) for a single resolved entity.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use warden_auth::RequestContext;
use warden_rbac::{resolver::RequestParams, EntityClass};

use crate::{error::ApiError, state::AppState};

pub fn project_routes() -> Router<AppState> {
    Router::new().route("/:project_id", get(get_project))
}

#[derive(Debug, Serialize)]
struct ProjectAccessResponse {
    project_id: Uuid,
    account_id: Option<Uuid>,
    allowed: bool,
}

async fn get_project(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectAccessResponse>, ApiError> {
    let mut params = RequestParams::new();
    if let Some(account_id) = ctx.account_id {
        params.insert("account_id".to_string(), account_id.to_string());
    }
    params.insert("project_id".to_string(), project_id.to_string());

    let info = state
        .rbac
        .validate_rbac_permissions(
            &params,
            &ctx.principal,
            EntityClass::Project,
            &["READ".to_string()],
        )
        .await?;

    Ok(Json(ProjectAccessResponse {
        project_id,
        account_id: info.account_id,
        allowed: info.overall_permissions(),
    }))
}
