//! Schema Compiler (C2).
//!
//! Turns one of the three permission-schema documents (§3.2) into the five
//! lookup tables of §3.3, by a single depth-first walk that threads owned
//! path state through recursive calls rather than mutating a shared stack —
//! every recursive call receives its own `Vec` clones of the path state, so
//! there is nothing to pop on the way back up.
//!
//! Grounded on the traversal in
//! `examples/original_source/.../validators/providers/rbac.py` (the
//! `compile_permission_schema`-equivalent walk over `ENTITY_`/`ACTION_`/
//! `TYPENAMES_`/`TYPEVALUES_` keys), reworked from its mutable-accumulator,
//! exception-driven style into an explicit `Result`-returning recursion
//! idiomatic for Rust.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::entity::EntityClass;
use crate::error::{RbacError, Result};

pub type EntityChain = Vec<EntityClass>;
pub type TypevaluesChain = Vec<Vec<String>>;
pub type ActionTuple = Vec<String>;

const ENTITY_PREFIX: &str = "ENTITY_";
const ACTION_PREFIX: &str = "ACTION_";
const TYPENAMES_PREFIX: &str = "TYPENAMES_";
const TYPEVALUES_PREFIX: &str = "TYPEVALUES_";

/// The five lookup tables of §3.3, for one schema scope.
#[derive(Debug, Default)]
pub struct CompiledSchema {
    pub leaf_action_paths: HashMap<(EntityChain, TypevaluesChain, ActionTuple), Vec<String>>,
    pub entity_typenames: HashMap<EntityClass, Vec<String>>,
    pub entity_typevalues: HashMap<EntityClass, Vec<Vec<String>>>,
    pub valid_entity_actions: HashMap<EntityClass, HashSet<ActionTuple>>,
    pub entity_actions_to_path_entities: HashMap<(EntityClass, ActionTuple), HashSet<EntityClass>>,
}

impl CompiledSchema {
    pub fn compile(document: &Value) -> Result<Self> {
        let mut schema = CompiledSchema::default();
        let root = document.as_object().ok_or_else(|| {
            RbacError::SchemaCompile("schema document root must be a JSON object".into())
        })?;

        for (key, child) in root {
            if let Some(name) = key.strip_prefix(ENTITY_PREFIX) {
                let entity = EntityClass::from_schema_name(name).ok_or_else(|| {
                    RbacError::SchemaCompile(format!("unknown entity class '{name}'"))
                })?;
                compile_entity_body(
                    child,
                    entity,
                    vec![entity],
                    vec![],
                    vec![],
                    vec![key.clone()],
                    &mut schema,
                )?;
            } else {
                return Err(RbacError::SchemaCompile(format!(
                    "schema root key '{key}' must start with '{ENTITY_PREFIX}'"
                )));
            }
        }
        Ok(schema)
    }

    pub fn leaf_path(
        &self,
        entities: &[EntityClass],
        typevalues: &[Vec<String>],
        action: &[String],
    ) -> Option<&Vec<String>> {
        self.leaf_action_paths
            .get(&(entities.to_vec(), typevalues.to_vec(), action.to_vec()))
    }

    pub fn is_valid_action(&self, entity: EntityClass, action: &[String]) -> bool {
        self.valid_entity_actions
            .get(&entity)
            .is_some_and(|actions| actions.contains(action))
    }

    pub fn path_entities(&self, entity: EntityClass, action: &[String]) -> Option<&HashSet<EntityClass>> {
        self.entity_actions_to_path_entities
            .get(&(entity, action.to_vec()))
    }

    pub fn typenames(&self, entity: EntityClass) -> &[String] {
        self.entity_typenames
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn typevalues(&self, entity: EntityClass) -> &[Vec<String>] {
        self.entity_typevalues
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Process an entity's body: either it branches on `TYPENAMES_`/`TYPEVALUES_`
/// children, or it doesn't and contributes an empty type-value tuple to the
/// path for every action/nested entity directly inside it.
fn compile_entity_body(
    body: &Value,
    entity: EntityClass,
    entity_path: EntityChain,
    typevalues_path: TypevaluesChain,
    action_path: ActionTuple,
    raw_path: Vec<String>,
    schema: &mut CompiledSchema,
) -> Result<()> {
    let object = body.as_object().ok_or_else(|| {
        RbacError::SchemaCompile(format!("entity '{entity}' body must be a JSON object"))
    })?;

    let typenames_entry = object
        .iter()
        .find(|(key, _)| key.starts_with(TYPENAMES_PREFIX));

    match typenames_entry {
        Some((typenames_key, typevalues_node)) => {
            let columns: Vec<String> = typenames_key
                .strip_prefix(TYPENAMES_PREFIX)
                .unwrap()
                .split("__")
                .map(str::to_string)
                .collect();
            schema
                .entity_typenames
                .entry(entity)
                .or_insert_with(|| columns.clone());

            let typevalues_object = typevalues_node.as_object().ok_or_else(|| {
                RbacError::SchemaCompile(format!(
                    "entity '{entity}' TYPENAMES_ node must contain TYPEVALUES_ children"
                ))
            })?;

            for (tv_key, tv_body) in typevalues_object {
                let values: Vec<String> = tv_key
                    .strip_prefix(TYPEVALUES_PREFIX)
                    .ok_or_else(|| {
                        RbacError::SchemaCompile(format!(
                            "entity '{entity}' TYPENAMES_ node has non-TYPEVALUES_ child '{tv_key}'"
                        ))
                    })?
                    .split("__")
                    .map(str::to_string)
                    .collect();

                let entry = schema.entity_typevalues.entry(entity).or_default();
                if !entry.contains(&values) {
                    entry.push(values.clone());
                }

                let mut new_typevalues_path = typevalues_path.clone();
                new_typevalues_path.push(values);

                let mut new_raw_path = raw_path.clone();
                new_raw_path.push(typenames_key.clone());
                new_raw_path.push(tv_key.clone());

                compile_node(
                    tv_body,
                    entity,
                    entity_path.clone(),
                    new_typevalues_path,
                    action_path.clone(),
                    new_raw_path,
                    schema,
                )?;
            }
            Ok(())
        }
        None => {
            let mut new_typevalues_path = typevalues_path;
            new_typevalues_path.push(Vec::new());
            compile_node(
                body,
                entity,
                entity_path,
                new_typevalues_path,
                action_path,
                raw_path,
                schema,
            )
        }
    }
}

/// Process the ACTION_/ENTITY_ children of an entity's (already
/// type-branched) body.
fn compile_node(
    body: &Value,
    entity: EntityClass,
    entity_path: EntityChain,
    typevalues_path: TypevaluesChain,
    action_path: ActionTuple,
    raw_path: Vec<String>,
    schema: &mut CompiledSchema,
) -> Result<()> {
    let object = body.as_object().ok_or_else(|| {
        RbacError::SchemaCompile(format!("entity '{entity}' action body must be a JSON object"))
    })?;

    for (key, child) in object {
        if let Some(verb) = key.strip_prefix(ACTION_PREFIX) {
            let mut new_action_path = action_path.clone();
            new_action_path.push(verb.to_string());
            let mut new_raw_path = raw_path.clone();
            new_raw_path.push(key.clone());

            match child {
                Value::String(_leaf) => {
                    schema.leaf_action_paths.insert(
                        (entity_path.clone(), typevalues_path.clone(), new_action_path.clone()),
                        new_raw_path,
                    );
                    schema
                        .valid_entity_actions
                        .entry(entity)
                        .or_default()
                        .insert(new_action_path.clone());
                    schema
                        .entity_actions_to_path_entities
                        .entry((entity, new_action_path))
                        .or_insert_with(|| entity_path.iter().copied().collect());
                }
                Value::Object(_) => {
                    compile_node(
                        child,
                        entity,
                        entity_path.clone(),
                        typevalues_path.clone(),
                        new_action_path,
                        new_raw_path,
                        schema,
                    )?;
                }
                _ => {
                    return Err(RbacError::SchemaCompile(format!(
                        "ACTION_ leaf at '{}' must be a string or nested object",
                        new_raw_path.join(".")
                    )));
                }
            }
        } else if let Some(name) = key.strip_prefix(ENTITY_PREFIX) {
            let nested = EntityClass::from_schema_name(name).ok_or_else(|| {
                RbacError::SchemaCompile(format!("unknown entity class '{name}'"))
            })?;
            let mut nested_entity_path = entity_path.clone();
            nested_entity_path.push(nested);
            let mut new_raw_path = raw_path.clone();
            new_raw_path.push(key.clone());

            compile_entity_body(
                child,
                nested,
                nested_entity_path,
                typevalues_path.clone(),
                Vec::new(),
                new_raw_path,
                schema,
            )?;
        } else {
            return Err(RbacError::SchemaCompile(format!(
                "schema key '{key}' does not start with '{ACTION_PREFIX}' or '{ENTITY_PREFIX}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaScope;

    #[test]
    fn compiles_account_scope_without_error() {
        let compiled = CompiledSchema::compile(SchemaScope::Account.document()).unwrap();
        assert!(compiled.is_valid_action(EntityClass::Project, &["READ".to_string()]));
        assert!(compiled.is_valid_action(EntityClass::Dataset, &["DELETE".to_string()]));
    }

    #[test]
    fn application_branches_on_application_type() {
        let compiled = CompiledSchema::compile(SchemaScope::Account.document()).unwrap();
        assert_eq!(compiled.typenames(EntityClass::Application), ["applicationType"]);
        let tuples = compiled.typevalues(EntityClass::Application);
        assert_eq!(tuples.len(), 2);
        assert!(tuples.contains(&vec!["ingest".to_string()]));
        assert!(tuples.contains(&vec!["preprocess".to_string()]));
    }

    #[test]
    fn leaf_path_round_trips_for_non_branching_entity() {
        let compiled = CompiledSchema::compile(SchemaScope::Account.document()).unwrap();
        let path = compiled
            .leaf_path(&[EntityClass::Project], &[vec![]], &["READ".to_string()])
            .expect("Project READ path must compile");
        assert_eq!(path, &vec!["ENTITY_Project".to_string(), "ACTION_READ".to_string()]);
    }

    #[test]
    fn leaf_path_round_trips_for_branching_entity() {
        let compiled = CompiledSchema::compile(SchemaScope::Account.document()).unwrap();
        let path = compiled
            .leaf_path(
                &[EntityClass::Project, EntityClass::Application],
                &[vec![], vec!["ingest".to_string()]],
                &["READ".to_string()],
            )
            .expect("Application READ path must compile for the ingest type-value");
        assert_eq!(
            path,
            &vec![
                "ENTITY_Project".to_string(),
                "ENTITY_Application".to_string(),
                "TYPENAMES_applicationType".to_string(),
                "TYPEVALUES_ingest".to_string(),
                "ACTION_READ".to_string(),
            ]
        );
    }

    #[test]
    fn path_entities_includes_full_ancestry_chain() {
        let compiled = CompiledSchema::compile(SchemaScope::Account.document()).unwrap();
        let entities = compiled
            .path_entities(EntityClass::Configuration, &["READ".to_string()])
            .expect("Configuration READ must record its path entities");
        assert!(entities.contains(&EntityClass::Project));
        assert!(entities.contains(&EntityClass::Application));
        assert!(entities.contains(&EntityClass::Configuration));
    }

    #[test]
    fn project_and_apikey_scopes_also_compile() {
        CompiledSchema::compile(SchemaScope::Project.document()).unwrap();
        CompiledSchema::compile(SchemaScope::ApiKey.document()).unwrap();
    }

    #[test]
    fn unknown_entity_name_is_a_compile_error() {
        let bad = serde_json::json!({ "ENTITY_Nonsense": { "ACTION_READ": "Allow" } });
        let err = CompiledSchema::compile(&bad).unwrap_err();
        assert!(matches!(err, RbacError::SchemaCompile(_)));
    }
}
