//! Row shapes for the persistent entities of SPEC_FULL.md §3.1, and the
//! `ResolvedEntity` sum type the resolver (C3) and evaluator (C5) pass
//! around instead of re-querying by class string.
//!
//! These are deliberately thin — just the columns the engine's own logic
//! reads (association foreign keys, admin flags, branching-type columns,
//! permission documents). They are not the full CRUD row shape a
//! persistence layer for these resources would eventually need.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::{EntityClass, EntityId};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub parent_project_id: Option<Uuid>,
    pub name: String,
    pub creator_user_email: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub is_superadmin: bool,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserAccountRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub is_admin: bool,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserProjectRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub is_admin: bool,
    pub permission_overrides: Value,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RoleRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub permissions: Value,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RoleUserAccountRow {
    pub id: Uuid,
    pub role_id: Uuid,
    pub user_account_id: Uuid,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ApiKeyRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub permissions: Value,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ApplicationRow {
    pub id: i64,
    pub project_id: Uuid,
    pub application_type: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ConfigurationRow {
    pub id: Uuid,
    pub application_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct InstanceRow {
    pub id: Uuid,
    pub application_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct DatasetRow {
    pub id: Uuid,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CollectionRow {
    pub id: Uuid,
    pub project_id: Uuid,
}

/// One resolved instance of any entity class the RBAC engine can reason
/// about, in place of the original's untyped `model_class_to_instance` map
/// keyed by SQLAlchemy model class.
#[derive(Debug, Clone)]
pub enum ResolvedEntity {
    Account(AccountRow),
    Project(ProjectRow),
    User(UserRow),
    Application(ApplicationRow),
    Configuration(ConfigurationRow),
    Instance(InstanceRow),
    Dataset(DatasetRow),
    Collection(CollectionRow),
    ApiKey(ApiKeyRow),
}

impl ResolvedEntity {
    pub fn class(&self) -> EntityClass {
        match self {
            ResolvedEntity::Account(_) => EntityClass::Account,
            ResolvedEntity::Project(_) => EntityClass::Project,
            ResolvedEntity::User(_) => EntityClass::User,
            ResolvedEntity::Application(_) => EntityClass::Application,
            ResolvedEntity::Configuration(_) => EntityClass::Configuration,
            ResolvedEntity::Instance(_) => EntityClass::Instance,
            ResolvedEntity::Dataset(_) => EntityClass::Dataset,
            ResolvedEntity::Collection(_) => EntityClass::Collection,
            ResolvedEntity::ApiKey(_) => EntityClass::ApiKey,
        }
    }

    pub fn id(&self) -> EntityId {
        match self {
            ResolvedEntity::Account(r) => EntityId::Uuid(r.id),
            ResolvedEntity::Project(r) => EntityId::Uuid(r.id),
            ResolvedEntity::User(r) => EntityId::Uuid(r.id),
            ResolvedEntity::Application(r) => EntityId::Integer(r.id),
            ResolvedEntity::Configuration(r) => EntityId::Uuid(r.id),
            ResolvedEntity::Instance(r) => EntityId::Uuid(r.id),
            ResolvedEntity::Dataset(r) => EntityId::Uuid(r.id),
            ResolvedEntity::Collection(r) => EntityId::Uuid(r.id),
            ResolvedEntity::ApiKey(r) => EntityId::Uuid(r.id),
        }
    }

    /// The account this instance belongs to, when it has one directly
    /// (used by `derive_account_from_project` and error messages). Entities
    /// nested under Project only reach their account transitively through
    /// `project_id`, so this is `None` for them; callers that need the
    /// account for a Dataset/Collection/etc. go through the resolved
    /// Project instead.
    pub fn account_id(&self) -> Option<Uuid> {
        match self {
            ResolvedEntity::Account(r) => Some(r.id),
            ResolvedEntity::Project(r) => Some(r.account_id),
            _ => None,
        }
    }

    /// Foreign-key-shaped fields this instance carries, by the `*_id`
    /// request-parameter name they correspond to. Used by
    /// `validate_inter_model_associations` (C3) to cross-check params
    /// against resolved instances; mirrors the original's
    /// `hasattr(instance, attribute_name)` attribute walk but over a known,
    /// finite field set per entity instead of reflection.
    pub fn related_ids(&self) -> Vec<(&'static str, String)> {
        match self {
            ResolvedEntity::Account(_) => vec![],
            ResolvedEntity::Project(r) => {
                let mut ids = vec![("account_id", r.account_id.to_string())];
                if let Some(parent) = r.parent_project_id {
                    ids.push(("parent_project_id", parent.to_string()));
                }
                ids
            }
            ResolvedEntity::User(_) => vec![],
            ResolvedEntity::Application(r) => vec![("project_id", r.project_id.to_string())],
            ResolvedEntity::Configuration(r) => {
                vec![("application_id", r.application_id.to_string())]
            }
            ResolvedEntity::Instance(r) => vec![("application_id", r.application_id.to_string())],
            ResolvedEntity::Dataset(r) => vec![("project_id", r.project_id.to_string())],
            ResolvedEntity::Collection(r) => vec![("project_id", r.project_id.to_string())],
            ResolvedEntity::ApiKey(r) => vec![("project_id", r.project_id.to_string())],
        }
    }

    /// The branching-type-value tuple for this instance, in the column
    /// order `EntityClass::typename_columns` declares. Empty for entities
    /// with no branching types.
    pub fn typevalues(&self) -> Vec<String> {
        match self {
            ResolvedEntity::Application(r) => vec![r.application_type.clone()],
            _ => vec![],
        }
    }
}
