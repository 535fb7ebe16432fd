//! Integration-style coverage of the permissions-introspection response
//! shape (§4.6, §8 property 6 "introspection parity"), exercised through
//! `RbacEngine` rather than the individual `evaluator`/`introspection`
//! functions so a regression in how the two are wired together would show
//! up here even if each module's own unit tests still pass.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;
use warden_rbac::engine::CompiledSchemaSet;
use warden_rbac::entity::EntityClass;
use warden_rbac::evaluator::validate_rbac_permissions as evaluate_direct;
use warden_rbac::introspection::{ProbeParams, ProbeResult};
use warden_rbac::repository::{FakeRbacRepository, RbacRepository};
use warden_rbac::resolver::RequestParams;
use warden_rbac::rows::{AccountRow, ApplicationRow, ProjectRow, RoleRow, UserAccountRow, UserRow};
use warden_rbac::{Principal, RbacEngine};

fn params(pairs: &[(&str, String)]) -> RequestParams {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// §8 property 6: `evaluate()` returns `overall_permissions = true` iff
/// `validate_rbac_permissions()` would not raise 403 for the same context.
#[tokio::test]
async fn introspection_parity_with_direct_validation() {
    let schemas = CompiledSchemaSet::compile().unwrap();
    let account_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let mut repo = FakeRbacRepository::default();
    repo.users.insert(user_id, UserRow { id: user_id, is_superadmin: false });
    repo.accounts.insert(
        account_id,
        AccountRow { id: account_id, organization_id: Uuid::new_v4(), name: "acme".into() },
    );
    repo.user_accounts.insert(
        (user_id, account_id),
        UserAccountRow { id: Uuid::new_v4(), user_id, account_id, is_admin: false },
    );
    repo.roles_by_user_account.insert(
        (user_id, account_id),
        vec![RoleRow {
            id: Uuid::new_v4(),
            account_id,
            name: "dataset-reader".into(),
            permissions: serde_json::json!({
                "ENTITY_Project": { "ENTITY_Dataset": { "ACTION_READ": "Allow" } }
            }),
        }],
    );

    let direct_schemas_account = warden_rbac::compiler::CompiledSchema::compile(
        warden_rbac::schema::SchemaScope::Account.document(),
    )
    .unwrap();
    let direct_schemas_project = warden_rbac::compiler::CompiledSchema::compile(
        warden_rbac::schema::SchemaScope::Project.document(),
    )
    .unwrap();
    let direct_schemas_apikey = warden_rbac::compiler::CompiledSchema::compile(
        warden_rbac::schema::SchemaScope::ApiKey.document(),
    )
    .unwrap();
    let direct_schemas = warden_rbac::evaluator::Schemas {
        account: &direct_schemas_account,
        project: &direct_schemas_project,
        apikey: &direct_schemas_apikey,
    };

    let principal = Principal::User(repo.users[&user_id].clone());
    let direct_result = evaluate_direct(
        &repo,
        &direct_schemas,
        &params(&[("account_id", account_id.to_string())]),
        &principal,
        EntityClass::Dataset,
        &["READ".to_string()],
    )
    .await;
    assert!(direct_result.is_ok());

    let engine = RbacEngine::new(schemas, Arc::new(repo) as Arc<dyn RbacRepository>);
    let mut probes = HashMap::new();
    probes.insert("Dataset_READ".to_string(), ProbeParams::default());
    let response = engine
        .evaluate_permissions(&principal, Some(account_id), None, &probes)
        .await
        .unwrap();

    match &response["Dataset_READ"] {
        ProbeResult::Permission(p) => assert!(p.overall_permissions),
        other => panic!("unexpected probe result shape: {other:?}"),
    }
}

/// §4.6 step 6: a branching-type target with no per-type denials still
/// omits `specific_permissions` entirely rather than emitting an
/// all-true map (boundary behavior, §8).
#[tokio::test]
async fn fully_allowed_branching_target_has_no_specific_permissions_map() {
    let schemas = CompiledSchemaSet::compile().unwrap();
    let account_id = Uuid::new_v4();
    let project_id = Uuid::new_v4();
    let application_id = 1i64;
    let user_id = Uuid::new_v4();

    let mut repo = FakeRbacRepository::default();
    repo.users.insert(user_id, UserRow { id: user_id, is_superadmin: false });
    repo.accounts.insert(
        account_id,
        AccountRow { id: account_id, organization_id: Uuid::new_v4(), name: "acme".into() },
    );
    repo.projects.insert(
        project_id,
        ProjectRow {
            id: project_id,
            account_id,
            parent_project_id: None,
            name: "p1".into(),
            creator_user_email: "a@example.com".into(),
        },
    );
    repo.applications.insert(
        application_id,
        ApplicationRow { id: application_id, project_id, application_type: "ingest".into() },
    );
    repo.user_accounts.insert(
        (user_id, account_id),
        UserAccountRow { id: Uuid::new_v4(), user_id, account_id, is_admin: false },
    );
    repo.roles_by_user_account.insert(
        (user_id, account_id),
        vec![RoleRow {
            id: Uuid::new_v4(),
            account_id,
            name: "app-reader".into(),
            permissions: serde_json::json!({
                "ENTITY_Project": {
                    "ACTION_READ": "Allow",
                    "ENTITY_Application": {
                        "TYPENAMES_applicationType": {
                            "TYPEVALUES_ingest": { "ACTION_READ": "Allow" },
                            "TYPEVALUES_preprocess": { "ACTION_READ": "Allow" }
                        }
                    }
                }
            }),
        }],
    );

    let principal = Principal::User(repo.users[&user_id].clone());
    let engine = RbacEngine::new(schemas, Arc::new(repo) as Arc<dyn RbacRepository>);

    // Probing with application_id resolved means the target *was* visited
    // during the READ loop, so the evaluator re-runs the check directly
    // against that one instance rather than iterating all declared tuples.
    let mut ids = HashMap::new();
    ids.insert("project_id".to_string(), project_id.to_string());
    ids.insert("application_id".to_string(), application_id.to_string());
    let mut probes = HashMap::new();
    probes.insert("Application_READ".to_string(), ProbeParams { ids });

    let response = engine
        .evaluate_permissions(&principal, Some(account_id), Some(project_id), &probes)
        .await
        .unwrap();

    match &response["Application_READ"] {
        ProbeResult::Permission(p) => {
            assert!(p.overall_permissions);
            assert!(p.specific_permissions.is_none());
        }
        other => panic!("unexpected probe result shape: {other:?}"),
    }
}
