//! Precedence Evaluator (C5) and the per-request `ValidationInfo` it
//! produces (§3.4, §4.4, §4.5).
//!
//! Grounded on `validate_rbac_permissions` in
//! `examples/original_source/.../validators/providers/rbac.py`: the
//! superadmin/account-admin short-circuits, the precedence-ordered READ
//! walk over two parallel path/header accumulators, and the asymmetric
//! treatment of a missing compiled path (always fatal for the account
//! scope; "skip" for project/api-key scope during the walk, but "deny" for
//! api-key specifically at the final target check) are all carried over
//! from its control flow, rewritten as explicit `Result`-returning Rust
//! instead of the original's exception-driven style.

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::compiler::{ActionTuple, CompiledSchema};
use crate::entity::EntityClass;
use crate::error::{RbacError, Result};
use crate::principal::Principal;
use crate::repository::RbacRepository;
use crate::resolver::{
    build_id_map, derive_account_from_project, load_instances, validate_inter_model_associations,
    RequestParams,
};
use crate::rows::{ResolvedEntity, RoleRow, UserAccountRow, UserProjectRow};

/// Per-request working state, returned to the handler on success and
/// consumed internally by introspection (C6) and the filter generator (C7).
#[derive(Debug)]
pub struct ValidationInfo {
    pub account_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub resolved: HashMap<EntityClass, ResolvedEntity>,
    pub target_entity: EntityClass,
    pub target_action: ActionTuple,
    /// Populated only when the target entity was not itself resolvable
    /// (list/create requests) and has branching types: one entry per
    /// declared type-value tuple, `true` iff that tuple is allowed.
    pub target_typevalue_results: HashMap<Vec<String>, bool>,
}

impl ValidationInfo {
    /// `true` iff at least one type-value tuple is allowed, or the target
    /// has no branching types at all (in which case reaching this point
    /// already means the single check passed).
    pub fn overall_permissions(&self) -> bool {
        if self.target_typevalue_results.is_empty() {
            true
        } else {
            self.target_typevalue_results.values().any(|allowed| *allowed)
        }
    }
}

/// The three compiled schemas the evaluator checks against, held by
/// reference for the duration of one call. `RbacEngine` (`engine.rs`) owns
/// these behind `Arc`s and passes references in.
pub struct Schemas<'a> {
    pub account: &'a CompiledSchema,
    pub project: &'a CompiledSchema,
    pub apikey: &'a CompiledSchema,
}

const READ: &str = "READ";

pub async fn validate_rbac_permissions(
    repo: &dyn RbacRepository,
    schemas: &Schemas<'_>,
    params: &RequestParams,
    principal: &Principal,
    target_entity: EntityClass,
    target_action: &[String],
) -> Result<ValidationInfo> {
    // Step 1 — resolve account/project first, then the rest.
    let mut scoped_params = RequestParams::new();
    for key in ["account_id", "project_id"] {
        if let Some(value) = params.get(key) {
            scoped_params.insert(key.to_string(), value.clone());
        }
    }
    let mut id_map = build_id_map(&scoped_params)?;
    let instances = load_instances(repo, &id_map).await?;
    derive_account_from_project(&instances, &mut id_map);
    validate_inter_model_associations(&instances, &scoped_params)?;

    let account_id = entity_id_to_uuid(id_map.get(&EntityClass::Account).copied());
    let project_id = entity_id_to_uuid(id_map.get(&EntityClass::Project).copied());

    let (user_account, user_project) =
        check_identity_association(repo, principal, account_id, project_id).await?;

    // Extend the id map with the remaining request parameters and re-run
    // association validation against the fuller instance set.
    let full_id_map = build_id_map(params)?;
    let mut full_instances = load_instances(repo, &full_id_map).await?;
    full_instances.extend(instances);
    validate_inter_model_associations(&full_instances, params)?;

    // Step 2 — short-circuit by identity class.
    if principal.is_superadmin() {
        return Ok(ValidationInfo {
            account_id,
            project_id,
            resolved: full_instances,
            target_entity,
            target_action: target_action.to_vec(),
            target_typevalue_results: HashMap::new(),
        });
    }
    if let Some(ua) = &user_account {
        if ua.is_admin {
            return Ok(ValidationInfo {
                account_id,
                project_id,
                resolved: full_instances,
                target_entity,
                target_action: target_action.to_vec(),
                target_typevalue_results: HashMap::new(),
            });
        }
    }
    if let Principal::ApiKey(key) = principal {
        match project_id {
            Some(pid) if pid == key.project_id => {}
            _ => {
                return Err(RbacError::AssociationMissing(format!(
                    "api key is scoped to project '{}' but the request resolved project '{}'",
                    key.project_id,
                    project_id.map(|p| p.to_string()).unwrap_or_else(|| "<none>".into()),
                )));
            }
        }
    }

    // Step 3 — precedence-ordered READ chain.
    let path_entities = schemas
        .account
        .path_entities(target_entity, target_action)
        .ok_or_else(|| {
            RbacError::SchemaLookupMiss(format!(
                "no compiled account-scope path for {target_entity} action {target_action:?}"
            ))
        })?
        .clone();

    let mut path_sequence: (Vec<EntityClass>, Vec<Vec<String>>) = (Vec::new(), Vec::new());
    let mut header_sequence: (Vec<EntityClass>, Vec<Vec<String>>) = (Vec::new(), Vec::new());
    let mut snapshots: HashMap<EntityClass, (Vec<EntityClass>, Vec<Vec<String>>)> = HashMap::new();

    for &step_entity in EntityClass::VALIDATION_PRECEDENCE_ORDER.iter() {
        let Some(resolved) = full_instances.get(&step_entity) else {
            continue;
        };
        let typevalues = resolved.typevalues();
        let sequence = if path_entities.contains(&step_entity) {
            &mut path_sequence
        } else {
            &mut header_sequence
        };
        sequence.0.push(step_entity);
        sequence.1.push(typevalues);
        snapshots.insert(step_entity, sequence.clone());

        let allowed = check_allow(
            repo,
            schemas,
            principal,
            account_id,
            user_project.as_ref(),
            &sequence.0,
            &sequence.1,
            &[READ.to_string()],
            false,
        )
        .await?;
        if !allowed {
            return Err(RbacError::PermissionDenied(format!(
                "READ denied on {step_entity} while resolving {target_entity} {target_action:?} (account {})",
                account_id.map(|a| a.to_string()).unwrap_or_else(|| "<none>".into()),
            )));
        }
    }

    // Step 4 — target action check.
    let mut target_typevalue_results = HashMap::new();
    if let Some(snapshot) = snapshots.get(&target_entity) {
        let allowed = check_allow(
            repo,
            schemas,
            principal,
            account_id,
            user_project.as_ref(),
            &snapshot.0,
            &snapshot.1,
            target_action,
            true,
        )
        .await?;
        if !allowed {
            return Err(RbacError::PermissionDenied(format!(
                "{target_action:?} denied on {target_entity} (account {})",
                account_id.map(|a| a.to_string()).unwrap_or_else(|| "<none>".into()),
            )));
        }
    } else {
        let mut chain_entities = path_sequence.0.clone();
        chain_entities.push(target_entity);
        let declared_tuples = schemas.account.typevalues(target_entity).to_vec();

        if declared_tuples.is_empty() {
            let mut chain_tv = path_sequence.1.clone();
            chain_tv.push(Vec::new());
            let allowed = check_allow(
                repo,
                schemas,
                principal,
                account_id,
                user_project.as_ref(),
                &chain_entities,
                &chain_tv,
                target_action,
                true,
            )
            .await?;
            if !allowed {
                return Err(RbacError::PermissionDenied(format!(
                    "{target_action:?} denied on {target_entity} (no existing instance; account {})",
                    account_id.map(|a| a.to_string()).unwrap_or_else(|| "<none>".into()),
                )));
            }
        } else {
            for tuple in declared_tuples {
                let mut chain_tv = path_sequence.1.clone();
                chain_tv.push(tuple.clone());
                let allowed = check_allow(
                    repo,
                    schemas,
                    principal,
                    account_id,
                    user_project.as_ref(),
                    &chain_entities,
                    &chain_tv,
                    target_action,
                    true,
                )
                .await?;
                target_typevalue_results.insert(tuple, allowed);
            }
        }
    }

    Ok(ValidationInfo {
        account_id,
        project_id,
        resolved: full_instances,
        target_entity,
        target_action: target_action.to_vec(),
        target_typevalue_results,
    })
}

/// §4.5: association requirements that must hold before any permission math
/// runs. Returns the loaded `User_Account`/`User_Project` rows so later
/// steps (account-admin short-circuit, project-override deny) don't
/// re-query.
async fn check_identity_association(
    repo: &dyn RbacRepository,
    principal: &Principal,
    account_id: Option<Uuid>,
    project_id: Option<Uuid>,
) -> Result<(Option<UserAccountRow>, Option<UserProjectRow>)> {
    let Principal::User(user) = principal else {
        // ApiKey principals are checked against their own project_id in
        // Step 2; no User_Account/User_Project rows exist for them.
        return Ok((None, None));
    };
    if user.is_superadmin {
        return Ok((None, None));
    }

    let user_account = if let Some(account_id) = account_id {
        let ua = repo.find_user_account(user.id, account_id).await?;
        if ua.is_none() {
            return Err(RbacError::AssociationMissing(format!(
                "user '{}' has no User_Account row for account '{account_id}'",
                user.id
            )));
        }
        ua
    } else {
        None
    };

    let account_admin = user_account.as_ref().is_some_and(|ua| ua.is_admin);

    let user_project = if let Some(project_id) = project_id {
        if account_admin {
            repo.find_user_project(user.id, project_id).await?
        } else {
            let up = repo.find_user_project(user.id, project_id).await?;
            if up.is_none() {
                return Err(RbacError::AssociationMissing(format!(
                    "user '{}' has no User_Project row for project '{project_id}'",
                    user.id
                )));
            }
            if !crate::ancestry::is_user_associated_up_to_root(repo, user.id, project_id).await? {
                return Err(RbacError::AncestryGap(format!(
                    "user '{}' is missing a User_Project row for an ancestor of project '{project_id}'",
                    user.id
                )));
            }
            up
        }
    } else {
        None
    };

    Ok((user_account, user_project))
}

/// Core allow/deny decision for one `(entity_chain, typevalues_chain,
/// action)` point, dispatched by principal kind.
///
/// `missing_apikey_path_is_deny` encodes the asymmetry of §4.4.2: `false`
/// during the READ precedence loop (a path absent from the api-key schema
/// is a no-op, not a denial — the key simply wasn't scoped to comment on
/// this ancestor), `true` at the final target-action check (an api key is
/// deny-by-default outside its declared surface).
#[allow(clippy::too_many_arguments)]
async fn check_allow(
    repo: &dyn RbacRepository,
    schemas: &Schemas<'_>,
    principal: &Principal,
    account_id: Option<Uuid>,
    user_project: Option<&UserProjectRow>,
    entity_chain: &[EntityClass],
    typevalues_chain: &[Vec<String>],
    action: &[String],
    missing_apikey_path_is_deny: bool,
) -> Result<bool> {
    match principal {
        Principal::User(user) => {
            let account_path = schemas
                .account
                .leaf_path(entity_chain, typevalues_chain, action)
                .ok_or_else(|| {
                    RbacError::SchemaLookupMiss(format!(
                        "no compiled account-scope path for {entity_chain:?}/{typevalues_chain:?}/{action:?}"
                    ))
                })?;
            let account_id = account_id.ok_or_else(|| {
                RbacError::AssociationMissing("account-scope check requires a resolved account".into())
            })?;
            let roles = repo.roles_for_user_account(user.id, account_id).await?;
            if !account_scope_allows(&roles, account_path)? {
                return Ok(false);
            }

            if let Some(project_path) = schemas.project.leaf_path(entity_chain, typevalues_chain, action) {
                if let Some(up) = user_project {
                    if !up.is_admin {
                        if let Some(leaf) = traverse_leaf(&up.permission_overrides, project_path)? {
                            if leaf == "Deny" {
                                return Ok(false);
                            }
                        }
                    }
                }
            }
            Ok(true)
        }
        Principal::ApiKey(key) => {
            match schemas.apikey.leaf_path(entity_chain, typevalues_chain, action) {
                Some(path) => match traverse_leaf(&key.permissions, path)? {
                    Some(leaf) => Ok(leaf != "Deny"),
                    // The schema declares this leaf but the key's own
                    // `permissions` document is silent on it. During the
                    // READ precedence loop that's a pass-through (the key
                    // simply wasn't scoped to comment on this ancestor);
                    // at the final target-action check it's exactly the
                    // "outside its declared surface" case (§4.4.2) and
                    // must deny.
                    None => Ok(!missing_apikey_path_is_deny),
                },
                None => Ok(!missing_apikey_path_is_deny),
            }
        }
    }
}

/// §4.4.1: disjunctive-across-roles allow test.
fn account_scope_allows(roles: &[RoleRow], path: &[String]) -> Result<bool> {
    for role in roles {
        if let Some(leaf) = traverse_leaf(&role.permissions, path)? {
            if leaf == "Allow" {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Walk a permission document (Role/override/api-key) along a compiled raw
/// schema-key path, terminating in the leaf string if present. `Ok(None)`
/// means the path is simply absent from this document (not a schema
/// defect); `Err(MalformedOverride)` means the document's shape disagrees
/// with the compiled path partway through (an object expected where a
/// scalar was found, or vice versa).
fn traverse_leaf(document: &Value, path: &[String]) -> Result<Option<String>> {
    let mut current = document;
    for (i, key) in path.iter().enumerate() {
        let Some(object) = current.as_object() else {
            return Err(RbacError::MalformedOverride(format!(
                "expected an object at '{}' while traversing permission document",
                path[..i].join(".")
            )));
        };
        match object.get(key) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    match current {
        Value::String(leaf) => Ok(Some(leaf.clone())),
        Value::Null => Ok(None),
        _ => Err(RbacError::MalformedOverride(format!(
            "expected a string leaf at '{}' in permission document",
            path.join(".")
        ))),
    }
}

fn entity_id_to_uuid(id: Option<crate::entity::EntityId>) -> Option<Uuid> {
    match id {
        Some(crate::entity::EntityId::Uuid(uuid)) => Some(uuid),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::FakeRbacRepository;
    use crate::rows::{ApiKeyRow, ApplicationRow, ProjectRow, UserRow};
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

    fn params(pairs: &[(&str, String)]) -> RequestParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn superadmin_dominates_without_any_associations() {
        let schemas = compile_all();
        let repo = FakeRbacRepository::default();
        let principal = Principal::User(UserRow { id: Uuid::new_v4(), is_superadmin: true });

        let info = validate_rbac_permissions(
            &repo,
            &schemas.as_refs(),
            &RequestParams::new(),
            &principal,
            EntityClass::Dataset,
            &["READ".to_string()],
        )
        .await
        .unwrap();

        assert!(info.overall_permissions());
    }

    #[tokio::test]
    async fn account_admin_dominates_within_account() {
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
            crate::rows::UserAccountRow { id: Uuid::new_v4(), user_id, account_id, is_admin: true },
        );

        let principal = Principal::User(repo.users[&user_id].clone());
        let request_params = params(&[("account_id", account_id.to_string())]);

        let info = validate_rbac_permissions(
            &repo,
            &schemas.as_refs(),
            &request_params,
            &principal,
            EntityClass::Dataset,
            &["DELETE".to_string()],
        )
        .await
        .unwrap();

        assert!(info.overall_permissions());
    }

    #[tokio::test]
    async fn project_override_deny_beats_role_allow() {
        let schemas = compile_all();
        let account_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let project_id = Uuid::new_v4();
        let application_id = 1i64;

        let role_permissions = json!({
            "ENTITY_Project": {
                "ACTION_READ": "Allow",
                "ENTITY_Application": {
                    "TYPENAMES_applicationType": {
                        "TYPEVALUES_ingest": {
                            "ACTION_READ": "Allow",
                            "ENTITY_Configuration": { "ACTION_CREATE": "Allow" }
                        }
                    }
                }
            }
        });
        let override_document = json!({
            "ENTITY_Project": {
                "ENTITY_Application": {
                    "TYPENAMES_applicationType": {
                        "TYPEVALUES_ingest": {
                            "ENTITY_Configuration": { "ACTION_CREATE": "Deny" }
                        }
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
        repo.applications.insert(
            application_id,
            ApplicationRow { id: application_id, project_id, application_type: "ingest".into() },
        );
        repo.user_accounts.insert(
            (user_id, account_id),
            crate::rows::UserAccountRow { id: Uuid::new_v4(), user_id, account_id, is_admin: false },
        );
        repo.user_projects.insert(
            (user_id, project_id),
            crate::rows::UserProjectRow {
                id: Uuid::new_v4(),
                user_id,
                project_id,
                is_admin: false,
                permission_overrides: override_document,
            },
        );
        repo.roles_by_user_account.insert(
            (user_id, account_id),
            vec![crate::rows::RoleRow { id: Uuid::new_v4(), account_id, name: "builder".into(), permissions: role_permissions }],
        );

        let principal = Principal::User(repo.users[&user_id].clone());
        let request_params = params(&[
            ("account_id", account_id.to_string()),
            ("project_id", project_id.to_string()),
            ("application_id", application_id.to_string()),
        ]);

        let err = validate_rbac_permissions(
            &repo,
            &schemas.as_refs(),
            &request_params,
            &principal,
            EntityClass::Configuration,
            &["CREATE".to_string()],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RbacError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn ancestry_gap_denies_even_with_a_granting_role() {
        let schemas = compile_all();
        let account_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let root_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();

        let mut repo = FakeRbacRepository::default();
        repo.users.insert(user_id, UserRow { id: user_id, is_superadmin: false });
        repo.accounts.insert(
            account_id,
            crate::rows::AccountRow { id: account_id, organization_id: Uuid::new_v4(), name: "a".into() },
        );
        repo.projects.insert(
            root_id,
            ProjectRow { id: root_id, account_id, parent_project_id: None, name: "root".into(), creator_user_email: "a@example.com".into() },
        );
        repo.projects.insert(
            child_id,
            ProjectRow { id: child_id, account_id, parent_project_id: Some(root_id), name: "child".into(), creator_user_email: "a@example.com".into() },
        );
        repo.user_accounts.insert(
            (user_id, account_id),
            crate::rows::UserAccountRow { id: Uuid::new_v4(), user_id, account_id, is_admin: false },
        );
        repo.user_projects.insert(
            (user_id, child_id),
            crate::rows::UserProjectRow { id: Uuid::new_v4(), user_id, project_id: child_id, is_admin: false, permission_overrides: json!({}) },
        );
        repo.roles_by_user_account.insert(
            (user_id, account_id),
            vec![crate::rows::RoleRow {
                id: Uuid::new_v4(),
                account_id,
                name: "reader".into(),
                permissions: json!({ "ENTITY_Project": { "ACTION_READ": "Allow" } }),
            }],
        );

        let principal = Principal::User(repo.users[&user_id].clone());
        let request_params = params(&[
            ("account_id", account_id.to_string()),
            ("project_id", child_id.to_string()),
        ]);

        let err = validate_rbac_permissions(
            &repo,
            &schemas.as_refs(),
            &request_params,
            &principal,
            EntityClass::Project,
            &["READ".to_string()],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RbacError::AncestryGap(_)));
    }

    #[tokio::test]
    async fn api_key_outside_declared_surface_is_denied() {
        // The api-key schema never mentions Configuration at all (only
        // Instance nests under Application), so a key can never be granted
        // Configuration CREATE no matter what its own `permissions` document
        // says — the final target check must deny it outright.
        let schemas = compile_all();
        let project_id = Uuid::new_v4();
        let application_id = 7i64;

        let mut repo = FakeRbacRepository::default();
        repo.projects.insert(
            project_id,
            ProjectRow {
                id: project_id,
                account_id: Uuid::new_v4(),
                parent_project_id: None,
                name: "p".into(),
                creator_user_email: "a@example.com".into(),
            },
        );
        repo.applications.insert(
            application_id,
            ApplicationRow { id: application_id, project_id, application_type: "ingest".into() },
        );

        let key = ApiKeyRow { id: Uuid::new_v4(), project_id, permissions: json!({}) };
        let principal = Principal::ApiKey(key);
        let request_params = params(&[
            ("project_id", project_id.to_string()),
            ("application_id", application_id.to_string()),
        ]);

        let err = validate_rbac_permissions(
            &repo,
            &schemas.as_refs(),
            &request_params,
            &principal,
            EntityClass::Configuration,
            &["CREATE".to_string()],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RbacError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn api_key_document_silent_on_schema_declared_leaf_is_denied() {
        // Unlike `api_key_outside_declared_surface_is_denied`, the apikey
        // schema *does* declare `ENTITY_Project.ENTITY_Collection.ACTION_CREATE`
        // (as a "Deny" leaf, like every apikey-scope leaf). The key's own
        // `permissions` document simply never mentions Collection at all —
        // "declared surface" means the key's own document, not the
        // compiled schema (SPEC_FULL.md §4.4.2, scenario S4).
        let schemas = compile_all();
        let project_id = Uuid::new_v4();

        let mut repo = FakeRbacRepository::default();
        repo.projects.insert(
            project_id,
            ProjectRow {
                id: project_id,
                account_id: Uuid::new_v4(),
                parent_project_id: None,
                name: "p".into(),
                creator_user_email: "a@example.com".into(),
            },
        );

        // Key only ever grants Dataset READ; Collection never appears.
        let key = ApiKeyRow {
            id: Uuid::new_v4(),
            project_id,
            permissions: json!({ "ENTITY_Project": { "ENTITY_Dataset": { "ACTION_READ": "Allow" } } }),
        };
        let principal = Principal::ApiKey(key);
        let request_params = params(&[("project_id", project_id.to_string())]);

        let err = validate_rbac_permissions(
            &repo,
            &schemas.as_refs(),
            &request_params,
            &principal,
            EntityClass::Collection,
            &["CREATE".to_string()],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RbacError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn cross_id_mismatch_short_circuits_before_permission_math() {
        let schemas = compile_all();
        let account_a = Uuid::new_v4();
        let account_b = Uuid::new_v4();
        let project_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut repo = FakeRbacRepository::default();
        repo.users.insert(user_id, UserRow { id: user_id, is_superadmin: true });
        repo.accounts.insert(
            account_a,
            crate::rows::AccountRow { id: account_a, organization_id: Uuid::new_v4(), name: "a".into() },
        );
        repo.projects.insert(
            project_id,
            ProjectRow { id: project_id, account_id: account_b, parent_project_id: None, name: "p".into(), creator_user_email: "a@example.com".into() },
        );

        let principal = Principal::User(repo.users[&user_id].clone());
        let request_params = params(&[
            ("account_id", account_a.to_string()),
            ("project_id", project_id.to_string()),
        ]);

        let err = validate_rbac_permissions(
            &repo,
            &schemas.as_refs(),
            &request_params,
            &principal,
            EntityClass::Project,
            &["READ".to_string()],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RbacError::CrossIdMismatch(_)));
    }
}
