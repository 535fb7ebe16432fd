//! The closed vocabulary of entity classes the permission schema can name,
//! and the typed id each one is addressed by.
//!
//! Grounded on `model_classStr_to_class` in
//! `examples/original_source/.../validators/providers/config.py`: the RBAC
//! engine only ever needs to resolve the entities that participate in the
//! permission schema or its precedence chain (Account, Project, User plus
//! the six resource leaves) — Organization and Role are persistent entities
//! (§3.1) but never appear as `ENTITY_` nodes or `*_id` path parameters the
//! evaluator resolves.

use std::fmt;

/// Whether an entity's primary key is a UUID or an integer. Every entity is
/// UUID-keyed except Application (spec §6: "All id values are UUIDs except
/// Application id (integer)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Uuid,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityClass {
    Account,
    Project,
    User,
    Application,
    Configuration,
    Instance,
    Dataset,
    Collection,
    ApiKey,
}

impl EntityClass {
    /// All entity classes the resolver's `class_map` must enumerate.
    pub const ALL: [EntityClass; 9] = [
        EntityClass::Account,
        EntityClass::Project,
        EntityClass::User,
        EntityClass::Application,
        EntityClass::Configuration,
        EntityClass::Instance,
        EntityClass::Dataset,
        EntityClass::Collection,
        EntityClass::ApiKey,
    ];

    /// Canonical outer-to-inner precedence order for the READ chain
    /// (§4.4 Step 3, §6 Configuration). Project first, ApiKey last; callers
    /// may not reorder this.
    pub const VALIDATION_PRECEDENCE_ORDER: [EntityClass; 7] = [
        EntityClass::Project,
        EntityClass::Application,
        EntityClass::Configuration,
        EntityClass::Instance,
        EntityClass::Dataset,
        EntityClass::Collection,
        EntityClass::ApiKey,
    ];

    /// The name used in `ENTITY_<Name>` schema keys and in `<Name>_id`
    /// request parameters.
    pub fn schema_name(self) -> &'static str {
        match self {
            EntityClass::Account => "Account",
            EntityClass::Project => "Project",
            EntityClass::User => "User",
            EntityClass::Application => "Application",
            EntityClass::Configuration => "Configuration",
            EntityClass::Instance => "Instance",
            EntityClass::Dataset => "Dataset",
            EntityClass::Collection => "Collection",
            EntityClass::ApiKey => "ApiKey",
        }
    }

    /// Parse an `ENTITY_<name>` suffix (or an id-param stem, capitalized)
    /// into an `EntityClass`. `None` for anything not in the closed
    /// vocabulary — callers treat that as a fatal schema/config defect.
    pub fn from_schema_name(name: &str) -> Option<EntityClass> {
        EntityClass::ALL.into_iter().find(|c| c.schema_name() == name)
    }

    pub fn id_kind(self) -> IdKind {
        match self {
            EntityClass::Application => IdKind::Integer,
            _ => IdKind::Uuid,
        }
    }

    /// The `*_id` request-parameter name this entity is addressed by on the
    /// wire (path, header, or body field). Kept as an explicit table rather
    /// than derived by lowercasing `schema_name` so `ApiKey` can map to the
    /// `api_key_id` the handlers actually declare.
    pub fn param_name(self) -> &'static str {
        match self {
            EntityClass::Account => "account_id",
            EntityClass::Project => "project_id",
            EntityClass::User => "user_id",
            EntityClass::Application => "application_id",
            EntityClass::Configuration => "configuration_id",
            EntityClass::Instance => "instance_id",
            EntityClass::Dataset => "dataset_id",
            EntityClass::Collection => "collection_id",
            EntityClass::ApiKey => "api_key_id",
        }
    }

    /// Reverse of `param_name`; `None` for anything not in the closed
    /// vocabulary (§4.2: "unknown names are fatal").
    pub fn from_param_name(name: &str) -> Option<EntityClass> {
        EntityClass::ALL.into_iter().find(|c| c.param_name() == name)
    }

    /// The branching-type column names declared for this entity's rows,
    /// independent of which permission scope is compiled (the same
    /// resource row is branched on the same physical columns in every
    /// scope that mentions it). Only `Application` branches today
    /// (`applicationType`); this is data, not schema-derived, because the
    /// compiler needs *a* source of truth for typename columns that exist
    /// on rows the schema never visits (e.g. an entity absent from the
    /// api-key scope but still resolved for association checks).
    pub fn typename_columns(self) -> &'static [&'static str] {
        match self {
            EntityClass::Application => &["applicationType"],
            _ => &[],
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.schema_name())
    }
}

/// A resolved primary key value, typed per `EntityClass::id_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    Uuid(uuid::Uuid),
    Integer(i64),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Uuid(id) => write!(f, "{id}"),
            EntityId::Integer(id) => write!(f, "{id}"),
        }
    }
}
