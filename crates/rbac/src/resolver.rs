//! Entity Resolver (C3).
//!
//! Grounded on the `build_id_map` / `load_instances` /
//! `validate_inter_model_associations` trio in
//! `examples/original_source/.../validators/providers/rbac.py`, replacing
//! its reflective `hasattr(instance, attribute_name)` walk with
//! `ResolvedEntity::related_ids`, a finite, typed field list per entity
//! (`rows.rs`).

use std::collections::HashMap;

use uuid::Uuid;

use crate::entity::{EntityClass, EntityId, IdKind};
use crate::error::{RbacError, Result};
use crate::repository::RbacRepository;
use crate::rows::ResolvedEntity;

/// Raw `*_id` fields merged from path, header, and body, keyed by their
/// wire field name (e.g. `"project_id"`, `"account_id"`).
pub type RequestParams = HashMap<String, String>;

/// `build_id_map` (§4.2): strips the `_id` suffix implicitly via
/// `EntityClass::from_param_name`, parses the id in the shape the class
/// expects, and rejects anything outside the closed vocabulary.
pub fn build_id_map(params: &RequestParams) -> Result<HashMap<EntityClass, EntityId>> {
    let mut map = HashMap::new();
    for (key, value) in params {
        let class = EntityClass::from_param_name(key).ok_or_else(|| {
            RbacError::SchemaLookupMiss(format!("request parameter '{key}' names no known entity class"))
        })?;
        let id = match class.id_kind() {
            IdKind::Uuid => {
                let parsed = Uuid::parse_str(value).map_err(|_| {
                    RbacError::SchemaLookupMiss(format!("'{key}' = '{value}' is not a valid UUID"))
                })?;
                EntityId::Uuid(parsed)
            }
            IdKind::Integer => {
                let parsed = value.parse::<i64>().map_err(|_| {
                    RbacError::SchemaLookupMiss(format!("'{key}' = '{value}' is not a valid integer id"))
                })?;
                EntityId::Integer(parsed)
            }
        };
        map.insert(class, id);
    }
    Ok(map)
}

/// `load_instances` (§4.2): one SELECT per class, via the repository trait
/// so evaluator/resolver logic can run against `FakeRbacRepository` in
/// tests. Missing row is the **404** case (not an association/permission
/// failure — those surface as 403 elsewhere in the pipeline).
pub async fn load_instances(
    repo: &dyn RbacRepository,
    id_map: &HashMap<EntityClass, EntityId>,
) -> Result<HashMap<EntityClass, ResolvedEntity>> {
    let mut instances = HashMap::new();
    for (&class, &id) in id_map {
        let resolved = match (class, id) {
            (EntityClass::Account, EntityId::Uuid(uuid)) => repo
                .get_account(uuid)
                .await?
                .map(ResolvedEntity::Account),
            (EntityClass::Project, EntityId::Uuid(uuid)) => repo
                .get_project(uuid)
                .await?
                .map(ResolvedEntity::Project),
            (EntityClass::User, EntityId::Uuid(uuid)) => {
                repo.get_user(uuid).await?.map(ResolvedEntity::User)
            }
            (EntityClass::Application, EntityId::Integer(int_id)) => repo
                .get_application(int_id)
                .await?
                .map(ResolvedEntity::Application),
            (EntityClass::Configuration, EntityId::Uuid(uuid)) => repo
                .get_configuration(uuid)
                .await?
                .map(ResolvedEntity::Configuration),
            (EntityClass::Instance, EntityId::Uuid(uuid)) => repo
                .get_instance(uuid)
                .await?
                .map(ResolvedEntity::Instance),
            (EntityClass::Dataset, EntityId::Uuid(uuid)) => repo
                .get_dataset(uuid)
                .await?
                .map(ResolvedEntity::Dataset),
            (EntityClass::Collection, EntityId::Uuid(uuid)) => repo
                .get_collection(uuid)
                .await?
                .map(ResolvedEntity::Collection),
            (EntityClass::ApiKey, EntityId::Uuid(uuid)) => {
                repo.get_api_key(uuid).await?.map(ResolvedEntity::ApiKey)
            }
            (class, id) => {
                return Err(RbacError::SchemaLookupMiss(format!(
                    "entity class {class} does not accept id kind of '{id}'"
                )));
            }
        };
        let resolved = resolved.ok_or_else(|| RbacError::NotFound {
            entity: class.schema_name(),
            id: id.to_string(),
        })?;
        instances.insert(class, resolved);
    }
    Ok(instances)
}

/// `derive_account_from_project` (§4.2): if a Project was resolved and no
/// Account id was given, fill it in from the project's own `account_id` so
/// later steps see a uniform id map.
pub fn derive_account_from_project(
    instances: &HashMap<EntityClass, ResolvedEntity>,
    id_map: &mut HashMap<EntityClass, EntityId>,
) {
    if id_map.contains_key(&EntityClass::Account) {
        return;
    }
    if let Some(ResolvedEntity::Project(project)) = instances.get(&EntityClass::Project) {
        id_map.insert(EntityClass::Account, EntityId::Uuid(project.account_id));
    }
}

/// `validate_inter_model_associations` (§4.2): for every resolved instance,
/// restricted to `VALIDATION_PRECEDENCE_ORDER` (Account and User are never
/// cross-checked this way — they have no foreign keys of this shape), check
/// every field the instance carries against the matching request parameter.
/// A mismatch is a **422** regardless of permissions (§8 property 7).
pub fn validate_inter_model_associations(
    instances: &HashMap<EntityClass, ResolvedEntity>,
    params: &RequestParams,
) -> Result<()> {
    for &class in EntityClass::VALIDATION_PRECEDENCE_ORDER.iter() {
        let Some(entity) = instances.get(&class) else {
            continue;
        };
        for (field_name, instance_value) in entity.related_ids() {
            if let Some(param_value) = params.get(field_name) {
                if param_value != &instance_value {
                    return Err(RbacError::CrossIdMismatch(format!(
                        "{class} '{}' has {field_name} = '{instance_value}' but the request declared {field_name} = '{param_value}'",
                        entity.id(),
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::FakeRbacRepository;
    use crate::rows::ProjectRow;

    fn sample_project(account_id: Uuid) -> ProjectRow {
        ProjectRow {
            id: Uuid::new_v4(),
            account_id,
            parent_project_id: None,
            name: "p1".into(),
            creator_user_email: "a@example.com".into(),
        }
    }

    #[test]
    fn build_id_map_rejects_unknown_param() {
        let mut params = RequestParams::new();
        params.insert("widget_id".into(), Uuid::new_v4().to_string());
        let err = build_id_map(&params).unwrap_err();
        assert!(matches!(err, RbacError::SchemaLookupMiss(_)));
    }

    #[test]
    fn build_id_map_parses_uuid_and_integer_ids() {
        let mut params = RequestParams::new();
        let project_id = Uuid::new_v4();
        params.insert("project_id".into(), project_id.to_string());
        params.insert("application_id".into(), "42".into());
        let map = build_id_map(&params).unwrap();
        assert_eq!(map[&EntityClass::Project], EntityId::Uuid(project_id));
        assert_eq!(map[&EntityClass::Application], EntityId::Integer(42));
    }

    #[tokio::test]
    async fn load_instances_reports_404_for_missing_row() {
        let repo = FakeRbacRepository::default();
        let mut id_map = HashMap::new();
        id_map.insert(EntityClass::Project, EntityId::Uuid(Uuid::new_v4()));
        let err = load_instances(&repo, &id_map).await.unwrap_err();
        assert!(matches!(err, RbacError::NotFound { entity: "Project", .. }));
    }

    #[test]
    fn derive_account_from_project_fills_in_missing_account() {
        let account_id = Uuid::new_v4();
        let project = sample_project(account_id);
        let project_id = project.id;
        let mut instances = HashMap::new();
        instances.insert(EntityClass::Project, ResolvedEntity::Project(project));
        let mut id_map = HashMap::new();
        id_map.insert(EntityClass::Project, EntityId::Uuid(project_id));

        derive_account_from_project(&instances, &mut id_map);

        assert_eq!(id_map[&EntityClass::Account], EntityId::Uuid(account_id));
    }

    #[test]
    fn validate_inter_model_associations_rejects_mismatch() {
        let account_a = Uuid::new_v4();
        let account_b = Uuid::new_v4();
        let project = sample_project(account_a);
        let mut instances = HashMap::new();
        instances.insert(EntityClass::Project, ResolvedEntity::Project(project));

        let mut params = RequestParams::new();
        params.insert("account_id".into(), account_b.to_string());

        let err = validate_inter_model_associations(&instances, &params).unwrap_err();
        assert!(matches!(err, RbacError::CrossIdMismatch(_)));
    }

    #[test]
    fn validate_inter_model_associations_accepts_matching_ids() {
        let account_id = Uuid::new_v4();
        let project = sample_project(account_id);
        let mut instances = HashMap::new();
        instances.insert(EntityClass::Project, ResolvedEntity::Project(project));

        let mut params = RequestParams::new();
        params.insert("account_id".into(), account_id.to_string());

        validate_inter_model_associations(&instances, &params).unwrap();
    }
}
