//! The two kinds of caller the evaluator has to reason about.

use uuid::Uuid;

use crate::rows::{ApiKeyRow, UserRow};

/// A resolved caller identity. Grounded on the original's `user` vs
/// `api_key` branch at the top of `validate_rbac_permissions` — every
/// downstream check either has a `User` arm and an `ApiKey` arm, or only
/// applies to one of the two (account-scope checks never apply to
/// `ApiKey`, since api keys have no `User_Account` row).
#[derive(Debug, Clone)]
pub enum Principal {
    User(UserRow),
    ApiKey(ApiKeyRow),
}

impl Principal {
    pub fn is_superadmin(&self) -> bool {
        matches!(self, Principal::User(u) if u.is_superadmin)
    }

    /// The project an api key is scoped to, if this principal is one. Used
    /// to assert the key is only ever used against the project it was
    /// issued for (§4.4 Step 2).
    pub fn api_key_project_id(&self) -> Option<Uuid> {
        match self {
            Principal::ApiKey(k) => Some(k.project_id),
            Principal::User(_) => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::User(u) => Some(u.id),
            Principal::ApiKey(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Principal::User(_) => "user",
            Principal::ApiKey(_) => "api_key",
        }
    }
}
