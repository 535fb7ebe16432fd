//! Strongly-typed identifiers for every persistent entity in SPEC_FULL.md §3.1.
//!
//! Each wraps a `Uuid` so that, for example, an `AccountId` can never be
//! passed where a `ProjectId` is expected without an explicit conversion.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(OrganizationId);
entity_id!(AccountId);
entity_id!(ProjectId);
entity_id!(UserId);
entity_id!(RoleId);
entity_id!(ApiKeyId);
entity_id!(ApplicationId);
entity_id!(ConfigurationId);
entity_id!(InstanceId);
entity_id!(DatasetId);
entity_id!(CollectionId);
