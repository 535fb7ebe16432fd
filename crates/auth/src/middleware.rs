//! Principal extraction middleware.
//!
//! Grounded on `crates/api/src/api_middleware/tenant_context.rs`'s
//! header-extraction-then-insert-into-extensions style, generalized from
//! JWT/subdomain tenant resolution to reading the headers an upstream
//! identity-aware gateway is assumed to attach once it has already
//! authenticated the caller (spec.md §1, §6): `X-elevAIte-UserId` or
//! `X-elevAIte-ApiKeyId` names the principal; `X-elevAIte-AccountId` and
//! `X-elevAIte-ProjectId` carry the request's scope. This crate never
//! verifies a bearer token itself.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};
use uuid::Uuid;
use warden_rbac::{Principal, RbacRepository};

const HEADER_USER_ID: &str = "x-elevaite-userid";
const HEADER_API_KEY_ID: &str = "x-elevaite-apikeyid";
const HEADER_ACCOUNT_ID: &str = "x-elevaite-accountid";
const HEADER_PROJECT_ID: &str = "x-elevaite-projectid";

#[derive(Clone)]
pub struct AuthState {
    pub repo: Arc<dyn RbacRepository>,
}

/// The per-request principal plus whatever account/project scope the
/// caller declared via headers, made available to handlers through
/// `RequestContext`'s `FromRequestParts` impl rather than by re-reading
/// extensions by hand in every handler.
#[derive(Clone)]
pub struct RequestContext {
    pub principal: Principal,
    pub account_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

pub async fn principal_middleware(
    State(state): State<AuthState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_principal(&state, &headers).await {
        Ok(principal) => {
            let account_id = parse_uuid_header(&headers, HEADER_ACCOUNT_ID);
            let project_id = parse_uuid_header(&headers, HEADER_PROJECT_ID);
            request
                .extensions_mut()
                .insert(RequestContext { principal, account_id, project_id });
            next.run(request).await
        }
        Err(response) => response,
    }
}

async fn resolve_principal(state: &AuthState, headers: &HeaderMap) -> Result<Principal, Response> {
    if let Some(user_id) = parse_uuid_header(headers, HEADER_USER_ID) {
        let user = state
            .repo
            .get_user(user_id)
            .await
            .map_err(|err| {
                error!(%err, "failed to load principal user row");
                internal_error()
            })?
            .ok_or_else(|| {
                warn!(%user_id, "X-elevAIte-UserId names no known user");
                unauthorized("unknown user principal")
            })?;
        return Ok(Principal::User(user));
    }

    if let Some(api_key_id) = parse_uuid_header(headers, HEADER_API_KEY_ID) {
        let key = state
            .repo
            .get_api_key(api_key_id)
            .await
            .map_err(|err| {
                error!(%err, "failed to load principal api key row");
                internal_error()
            })?
            .ok_or_else(|| {
                warn!(%api_key_id, "X-elevAIte-ApiKeyId names no known api key");
                unauthorized("unknown api key principal")
            })?;
        return Ok(Principal::ApiKey(key));
    }

    Err(unauthorized("missing principal identity header"))
}

fn parse_uuid_header(headers: &HeaderMap, name: &str) -> Option<Uuid> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "error": message }))).into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "failed to resolve request principal" })),
    )
        .into_response()
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestContext>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "authentication required" })),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;
    use warden_rbac::repository::FakeRbacRepository;
    use warden_rbac::rows::UserRow;

    async fn whoami(ctx: RequestContext) -> String {
        match ctx.principal {
            Principal::User(u) => u.id.to_string(),
            Principal::ApiKey(k) => k.id.to_string(),
        }
    }

    fn app(state: AuthState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn_with_state(state, principal_middleware))
    }

    #[tokio::test]
    async fn resolves_user_principal_from_trusted_header() {
        let user_id = Uuid::new_v4();
        let mut repo = FakeRbacRepository::default();
        repo.users.insert(user_id, UserRow { id: user_id, is_superadmin: false });
        let state = AuthState { repo: Arc::new(repo) };

        let response = app(state)
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header("x-elevaite-userid", user_id.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_request_with_no_identity_header() {
        let state = AuthState { repo: Arc::new(FakeRbacRepository::default()) };

        let response = app(state)
            .oneshot(HttpRequest::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_unknown_user_id() {
        let state = AuthState { repo: Arc::new(FakeRbacRepository::default()) };

        let response = app(state)
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header("x-elevaite-userid", Uuid::new_v4().to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
