//! Permissions Introspection (C6).
//!
//! Grounded on `evaluate_rbac_permissions` in
//! `examples/original_source/.../validators/providers/rbac.py` (lines
//! 262-415): parse each probe field name into an `(entity, action_tuple)`
//! pair (or recognize the two reserved admin fields), validate it against
//! the compiled account scope, then run the same precedence evaluator used
//! by `validate_rbac_permissions`, catching only `PermissionDenied` per
//! probe and folding it into `overall_permissions: false` (Open Question 1
//! in DESIGN.md / SPEC_FULL.md §9 — decided 403-only).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityClass;
use crate::error::{RbacError, Result};
use crate::evaluator::{validate_rbac_permissions, Schemas};
use crate::principal::Principal;
use crate::repository::RbacRepository;
use crate::resolver::RequestParams;

const IS_PROJECT_ADMIN: &str = "IS_PROJECT_ADMIN";
const IS_ACCOUNT_ADMIN: &str = "IS_ACCOUNT_ADMIN";

/// One probe in an introspection request: its own `*_id` parameters,
/// merged with the outer `account_id`/`project_id` before resolution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeParams {
    #[serde(flatten)]
    pub ids: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeResult {
    Admin { overall_permissions: bool },
    Permission(PermissionProbeResult),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionProbeResult {
    pub overall_permissions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_permissions: Option<HashMap<String, HashMap<String, bool>>>,
}

pub type IntrospectionResponse = HashMap<String, ProbeResult>;

/// `evaluate` (§4.6): runs the full pipeline once per probe, per the
/// contract that introspection must never mutate state and must report
/// partial (per-probe) results rather than aborting the whole batch on the
/// first deny.
pub async fn evaluate(
    repo: &dyn RbacRepository,
    schemas: &Schemas<'_>,
    principal: &Principal,
    account_id: Option<Uuid>,
    project_id: Option<Uuid>,
    probes: &HashMap<String, ProbeParams>,
) -> Result<IntrospectionResponse> {
    let mut response = IntrospectionResponse::new();
    for (field, probe_params) in probes {
        let result = evaluate_one(
            repo,
            schemas,
            principal,
            account_id,
            project_id,
            field,
            probe_params,
        )
        .await?;
        response.insert(field.clone(), result);
    }
    Ok(response)
}

async fn evaluate_one(
    repo: &dyn RbacRepository,
    schemas: &Schemas<'_>,
    principal: &Principal,
    account_id: Option<Uuid>,
    project_id: Option<Uuid>,
    field: &str,
    probe_params: &ProbeParams,
) -> Result<ProbeResult> {
    // Superadmin and account-admin users short-circuit to all-true,
    // including for the two reserved admin probes (§4.6 step 6).
    if principal.is_superadmin() {
        return Ok(admin_short_circuit(field));
    }

    if field == IS_PROJECT_ADMIN || field == IS_ACCOUNT_ADMIN {
        return evaluate_admin_probe(repo, principal, field, account_id, project_id).await;
    }

    let (entity, action_tuple) = parse_probe_field(field)?;

    if !schemas.account.is_valid_action(entity, &action_tuple) {
        return Err(RbacError::SchemaLookupMiss(format!(
            "probe '{field}' names an action not declared in the account-scoped schema"
        )));
    }

    let scope_requirement = probe_scope_requirement(schemas, entity, &action_tuple);
    match scope_requirement {
        ScopeRequirement::AccountOnly if account_id.is_none() => {
            return Err(RbacError::AssociationMissing(format!(
                "probe '{field}' requires account context"
            )));
        }
        ScopeRequirement::ProjectOnly if project_id.is_none() => {
            return Err(RbacError::AssociationMissing(format!(
                "probe '{field}' requires project context"
            )));
        }
        ScopeRequirement::Either if account_id.is_none() && project_id.is_none() => {
            return Err(RbacError::AssociationMissing(format!(
                "probe '{field}' requires account or project context"
            )));
        }
        _ => {}
    }

    let mut params = RequestParams::new();
    if let Some(account_id) = account_id {
        params.insert("account_id".to_string(), account_id.to_string());
    }
    if let Some(project_id) = project_id {
        params.insert("project_id".to_string(), project_id.to_string());
    }
    for (key, value) in &probe_params.ids {
        params.insert(key.clone(), value.clone());
    }

    match validate_rbac_permissions(repo, schemas, &params, principal, entity, &action_tuple).await
    {
        Ok(info) => {
            if info.target_typevalue_results.is_empty() {
                Ok(ProbeResult::Permission(PermissionProbeResult {
                    overall_permissions: true,
                    specific_permissions: None,
                }))
            } else {
                let typenames = schemas.account.typenames(entity);
                let mut grouped: HashMap<String, HashMap<String, bool>> = HashMap::new();
                for (tuple, allowed) in &info.target_typevalue_results {
                    grouped
                        .entry(typenames.join("_"))
                        .or_default()
                        .insert(tuple.join("_"), *allowed);
                }
                Ok(ProbeResult::Permission(PermissionProbeResult {
                    overall_permissions: info.overall_permissions(),
                    specific_permissions: Some(grouped),
                }))
            }
        }
        Err(RbacError::PermissionDenied(_)) => Ok(ProbeResult::Permission(PermissionProbeResult {
            overall_permissions: false,
            specific_permissions: None,
        })),
        Err(other) => Err(other),
    }
}

fn admin_short_circuit(field: &str) -> ProbeResult {
    if field == IS_PROJECT_ADMIN || field == IS_ACCOUNT_ADMIN {
        ProbeResult::Admin { overall_permissions: true }
    } else {
        ProbeResult::Permission(PermissionProbeResult {
            overall_permissions: true,
            specific_permissions: None,
        })
    }
}

async fn evaluate_admin_probe(
    repo: &dyn RbacRepository,
    principal: &Principal,
    field: &str,
    account_id: Option<Uuid>,
    project_id: Option<Uuid>,
) -> Result<ProbeResult> {
    let Principal::User(user) = principal else {
        return Err(RbacError::ProbeValidation(format!(
            "probe '{field}' is not meaningful for an api-key principal"
        )));
    };

    let is_admin = if field == IS_ACCOUNT_ADMIN {
        let account_id = account_id.ok_or_else(|| {
            RbacError::ProbeValidation(format!("probe '{field}' requires account context"))
        })?;
        repo.find_user_account(user.id, account_id)
            .await?
            .is_some_and(|ua| ua.is_admin)
    } else {
        let project_id = project_id.ok_or_else(|| {
            RbacError::ProbeValidation(format!("probe '{field}' requires project context"))
        })?;
        repo.find_user_project(user.id, project_id)
            .await?
            .is_some_and(|up| up.is_admin)
    };

    Ok(ProbeResult::Admin { overall_permissions: is_admin })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeRequirement {
    AccountOnly,
    ProjectOnly,
    Either,
}

/// Per-action scope annotation (§4.6 step 3). `Project` only ever appears
/// in requests that carry a project in scope; everything else in the
/// validation_precedence_order is reachable from either an account-only or
/// a project-scoped request, since the schema documents don't separately
/// tag "account-only" vs "project-capable" actions — the project-scoped
/// schema's mere presence of a path for `(entity, action)` is what marks an
/// action as project-capable.
fn probe_scope_requirement(
    schemas: &Schemas<'_>,
    entity: EntityClass,
    action_tuple: &[String],
) -> ScopeRequirement {
    if entity == EntityClass::Project {
        // Probing whether the principal may act on a Project means asking
        // for account-scoped admission to the account the project would
        // live under; the project itself may not be resolvable yet (e.g.
        // a CREATE probe).
        return ScopeRequirement::AccountOnly;
    }
    // Every other entity nests under Project in both schemas (§3.2: the
    // schema root only ever contains `ENTITY_Project`), so the project
    // scope "supports" an action iff the project-scoped schema declares
    // this action for this entity at all.
    if schemas.project.is_valid_action(entity, action_tuple) {
        ScopeRequirement::Either
    } else {
        ScopeRequirement::AccountOnly
    }
}

/// Parse `<EntityName>_<ACTION_1>_<ACTION_2>_...` (SPEC_FULL.md §9: entity
/// names are single tokens, so splitting on the first underscore is
/// unambiguous).
fn parse_probe_field(field: &str) -> Result<(EntityClass, Vec<String>)> {
    let (entity_name, rest) = field.split_once('_').ok_or_else(|| {
        RbacError::ProbeValidation(format!(
            "probe field '{field}' is not of the form <Entity>_<ACTION>..."
        ))
    })?;
    let entity = EntityClass::from_schema_name(entity_name).ok_or_else(|| {
        RbacError::ProbeValidation(format!("probe field '{field}' names an unknown entity"))
    })?;
    if rest.is_empty() {
        return Err(RbacError::ProbeValidation(format!(
            "probe field '{field}' has an empty action tuple"
        )));
    }
    let action_tuple: Vec<String> = rest.split('_').map(str::to_string).collect();
    Ok((entity, action_tuple))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompiledSchema;
    use crate::repository::FakeRbacRepository;
    use crate::rows::{ProjectRow, RoleRow, UserAccountRow, UserProjectRow, UserRow};
    use crate::schema::SchemaScope;
    use serde_json::json;

    struct Schemas3 {
        account: CompiledSchema,
        project: CompiledSchema,
        apikey: CompiledSchema,
    }

    fn compile_all() -> Schemas3 {
        Schemas3 {
            account: CompiledSchema::compile(SchemaScope::Account.document()).unwrap(),
            project: CompiledSchema::compile(SchemaScope::Project.document()).unwrap(),
            apikey: CompiledSchema::compile(SchemaScope::ApiKey.document()).unwrap(),
        }
    }
    impl Schemas3 {
        fn as_refs(&self) -> Schemas<'_> {
            Schemas { account: &self.account, project: &self.project, apikey: &self.apikey }
        }
    }

    #[test]
    fn parses_single_and_multi_verb_fields() {
        let (entity, tuple) = parse_probe_field("Application_READ").unwrap();
        assert_eq!(entity, EntityClass::Application);
        assert_eq!(tuple, vec!["READ".to_string()]);

        let (entity, tuple) = parse_probe_field("Dataset_SERVICENOW_TICKET_INGEST").unwrap();
        assert_eq!(entity, EntityClass::Dataset);
        assert_eq!(tuple, vec!["SERVICENOW".to_string(), "TICKET".to_string(), "INGEST".to_string()]);
    }

    #[test]
    fn rejects_unknown_entity_in_field_name() {
        assert!(parse_probe_field("Widget_READ").is_err());
    }

    #[tokio::test]
    async fn superadmin_short_circuits_every_probe_to_true() {
        let schemas = compile_all();
        let repo = FakeRbacRepository::default();
        let principal = Principal::User(UserRow { id: Uuid::new_v4(), is_superadmin: true });

        let mut probes = HashMap::new();
        probes.insert("Dataset_DELETE".to_string(), ProbeParams::default());
        probes.insert(IS_ACCOUNT_ADMIN.to_string(), ProbeParams::default());

        let response = evaluate(&repo, &schemas.as_refs(), &principal, None, None, &probes)
            .await
            .unwrap();

        match &response["Dataset_DELETE"] {
            ProbeResult::Permission(p) => assert!(p.overall_permissions),
            _ => panic!("expected a permission probe result"),
        }
        match &response[IS_ACCOUNT_ADMIN] {
            ProbeResult::Admin { overall_permissions } => assert!(*overall_permissions),
            _ => panic!("expected an admin probe result"),
        }
    }

    #[tokio::test]
    async fn denied_probe_becomes_overall_false_without_erroring() {
        let schemas = compile_all();
        let account_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut repo = FakeRbacRepository::default();
        repo.users.insert(user_id, UserRow { id: user_id, is_superadmin: false });
        repo.accounts.insert(
            account_id,
            crate::rows::AccountRow { id: account_id, organization_id: Uuid::new_v4(), name: "a".into() },
        );
        repo.user_accounts.insert(
            (user_id, account_id),
            UserAccountRow { id: Uuid::new_v4(), user_id, account_id, is_admin: false },
        );
        // No roles granted at all -> account-scope allow check fails -> PermissionDenied.

        let principal = Principal::User(repo.users[&user_id].clone());
        let mut probes = HashMap::new();
        probes.insert("Dataset_DELETE".to_string(), ProbeParams::default());

        let response = evaluate(&repo, &schemas.as_refs(), &principal, Some(account_id), None, &probes)
            .await
            .unwrap();

        match &response["Dataset_DELETE"] {
            ProbeResult::Permission(p) => assert!(!p.overall_permissions),
            _ => panic!("expected a permission probe result"),
        }
    }

    #[tokio::test]
    async fn per_type_partition_reports_specific_permissions() {
        let schemas = compile_all();
        let account_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let project_id = Uuid::new_v4();

        let role_permissions = json!({
            "ENTITY_Project": {
                "ACTION_READ": "Allow",
                "ENTITY_Application": {
                    "TYPENAMES_applicationType": {
                        "TYPEVALUES_ingest": { "ACTION_READ": "Allow" },
                        "TYPEVALUES_preprocess": { "ACTION_READ": "Allow" }
                    }
                }
            }
        });
        let override_document = json!({
            "ENTITY_Project": {
                "ENTITY_Application": {
                    "TYPENAMES_applicationType": {
                        "TYPEVALUES_preprocess": { "ACTION_READ": "Deny" }
                    }
                }
            }
        });

        let mut repo = FakeRbacRepository::default();
        repo.users.insert(user_id, UserRow { id: user_id, is_superadmin: false });
        repo.accounts.insert(
            account_id,
            crate::rows::AccountRow { id: account_id, organization_id: Uuid::new_v4(), name: "a".into() },
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
        repo.user_accounts.insert(
            (user_id, account_id),
            UserAccountRow { id: Uuid::new_v4(), user_id, account_id, is_admin: false },
        );
        repo.user_projects.insert(
            (user_id, project_id),
            UserProjectRow {
                id: Uuid::new_v4(),
                user_id,
                project_id,
                is_admin: false,
                permission_overrides: override_document,
            },
        );
        repo.roles_by_user_account.insert(
            (user_id, account_id),
            vec![RoleRow { id: Uuid::new_v4(), account_id, name: "reader".into(), permissions: role_permissions }],
        );

        let principal = Principal::User(repo.users[&user_id].clone());
        let mut probe_ids = HashMap::new();
        probe_ids.insert("project_id".to_string(), project_id.to_string());
        let mut probes = HashMap::new();
        probes.insert("Application_READ".to_string(), ProbeParams { ids: probe_ids });

        let response = evaluate(
            &repo,
            &schemas.as_refs(),
            &principal,
            Some(account_id),
            Some(project_id),
            &probes,
        )
        .await
        .unwrap();

        match &response["Application_READ"] {
            ProbeResult::Permission(p) => {
                assert!(p.overall_permissions);
                let specific = p.specific_permissions.as_ref().unwrap();
                let by_value = &specific["applicationType"];
                assert_eq!(by_value["ingest"], true);
                assert_eq!(by_value["preprocess"], false);
            }
            _ => panic!("expected a permission probe result"),
        }
    }
}
