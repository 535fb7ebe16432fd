//! The three permission-schema documents, embedded at compile time.
//!
//! Grounded on the example schemas sketched in
//! `examples/original_source/.../validators/providers/config.py` (the
//! `account_scoped_permissions` / `project_scoped_permissions` /
//! `apikey_scoped_permissions` comments there), reduced to the single
//! branching-type-column case. A deployment that needs the full resource
//! catalogue swaps these JSON files for its own; the grammar (§3.2) and the
//! compiler (`compiler.rs`) are indifferent to which entities/actions a
//! document declares.

use once_cell::sync::Lazy;
use serde_json::Value;

const ACCOUNT_SCOPED_JSON: &str = include_str!("../schemas/account_scoped.json");
const PROJECT_SCOPED_JSON: &str = include_str!("../schemas/project_scoped.json");
const APIKEY_SCOPED_JSON: &str = include_str!("../schemas/apikey_scoped.json");

static ACCOUNT_SCOPED: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(ACCOUNT_SCOPED_JSON).expect("embedded account_scoped.json is valid JSON")
});

static PROJECT_SCOPED: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(PROJECT_SCOPED_JSON).expect("embedded project_scoped.json is valid JSON")
});

static APIKEY_SCOPED: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(APIKEY_SCOPED_JSON).expect("embedded apikey_scoped.json is valid JSON")
});

/// Which of the three isomorphic-grammar, differently-leafed schema
/// documents a lookup applies to. `Account` is an allow-list; `Project` and
/// `ApiKey` are deny-lists (§3.2, §4.4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaScope {
    Account,
    Project,
    ApiKey,
}

impl SchemaScope {
    pub fn document(self) -> &'static Value {
        match self {
            SchemaScope::Account => &ACCOUNT_SCOPED,
            SchemaScope::Project => &PROJECT_SCOPED,
            SchemaScope::ApiKey => &APIKEY_SCOPED,
        }
    }

    /// The leaf string this scope's schema document declares for a granted
    /// permission. The account scope is allow-list (bare presence of
    /// `"Allow"` grants); the other two are deny-list (bare presence of
    /// `"Deny"` revokes what would otherwise be open).
    pub fn granted_leaf(self) -> &'static str {
        match self {
            SchemaScope::Account => "Allow",
            SchemaScope::Project | SchemaScope::ApiKey => "Deny",
        }
    }
}
