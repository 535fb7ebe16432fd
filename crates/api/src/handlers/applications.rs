//! Application listing handler — exercises C7, the list-query filter
//! generator, over the branching `applicationType` typevalues C5 records
//! per tuple during the precedence evaluation of the list-mode check.

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

pub fn application_routes() -> Router<AppState> {
    Router::new().route("/:project_id/applications", get(list_applications))
}

#[derive(Debug, Serialize)]
struct ListApplicationsResponse {
    project_id: Uuid,
    allowed_type_values: Vec<Vec<String>>,
    denied_type_values: Vec<Vec<String>>,
    filter_sql: String,
    filter_binds: Vec<String>,
}

async fn list_applications(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ListApplicationsResponse>, ApiError> {
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
            EntityClass::Application,
            &["READ".to_string()],
        )
        .await?;

    let filter = state.rbac.get_filter_for_list_query(&info);
    let (filter_sql, filter_binds) = filter.to_sql(1);

    let mut allowed_type_values = Vec::new();
    let mut denied_type_values = Vec::new();
    for (tuple, allowed) in &info.target_typevalue_results {
        if *allowed {
            allowed_type_values.push(tuple.clone());
        } else {
            denied_type_values.push(tuple.clone());
        }
    }

    Ok(Json(ListApplicationsResponse {
        project_id,
        allowed_type_values,
        denied_type_values,
        filter_sql,
        filter_binds,
    }))
}
