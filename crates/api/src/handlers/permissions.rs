//! Batch permissions-introspection endpoint — exercises C6: a caller
//! submits a named set of probes (admin checks or `(entity, action)`
//! permission checks) and gets back one verdict per probe in a single
//! round trip, instead of issuing one request per thing it wants to know.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use warden_auth::RequestContext;
use warden_rbac::{IntrospectionResponse, ProbeParams};

use crate::{error::ApiError, state::AppState};

pub fn permissions_routes() -> Router<AppState> {
    Router::new().route("/introspect", post(introspect))
}

#[derive(Debug, Deserialize)]
pub struct IntrospectQuery {
    account_id: Option<Uuid>,
    project_id: Option<Uuid>,
}

async fn introspect(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<IntrospectQuery>,
    Json(probes): Json<HashMap<String, ProbeParams>>,
) -> Result<Json<IntrospectionResponse>, ApiError> {
    let account_id = query.account_id.or(ctx.account_id);
    let project_id = query.project_id.or(ctx.project_id);

    let response = state
        .rbac
        .evaluate_permissions(&ctx.principal, account_id, project_id, &probes)
        .await?;

    Ok(Json(response))
}
