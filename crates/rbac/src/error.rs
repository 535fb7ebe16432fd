//! `RbacError` — one variant per error kind of SPEC_FULL.md §7, with a
//! `From<RbacError> for warden_core::Error` so handlers can use `?` and the
//! axum layer gets a single `IntoResponse` impl (via `warden_core::Error`)
//! to rely on.

use thiserror::Error;
use warden_core::{Error as CoreError, ErrorCode};

#[derive(Debug, Error, Clone)]
pub enum RbacError {
    /// No principal resolved for the request (§7 row 1).
    #[error("authentication required")]
    Unauthenticated,

    /// C3 `load_instances` found no row for a resolved id (§7 row 2, 404 case).
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// C3 `validate_inter_model_associations` found a foreign-key mismatch
    /// between two resolved entities (§7 row 3, 422).
    #[error("{0}")]
    CrossIdMismatch(String),

    /// §4.5 identity-level association check failed — missing User_Account
    /// or missing User_Project row for the target entity itself (§7 row 4,
    /// 403).
    #[error("{0}")]
    AssociationMissing(String),

    /// §4.5 ancestry walk (C4) found a project ancestor the principal has
    /// no `User_Project` row for (§7 row 4, 403). Kept distinct from
    /// `AssociationMissing` because it is raised by the ancestry check
    /// specifically, not the direct-association lookup.
    #[error("{0}")]
    AncestryGap(String),

    /// §4.4 permission math denied the request — account-scope allow
    /// missing, project/api-key-scope deny present, or api key out of its
    /// declared surface (§7 row 5, 403).
    #[error("{0}")]
    PermissionDenied(String),

    /// The compiled schema has no entry for a requested entity/action/scope
    /// combination — a deployment/schema defect, never a caller error
    /// (§7 row 6, 503).
    #[error("{0}")]
    SchemaLookupMiss(String),

    /// A User_Project.permission_overrides or ApiKey.permissions document
    /// does not match the shape the compiled schema expects (§7 row 7, 503).
    #[error("{0}")]
    MalformedOverride(String),

    /// The permission schema document itself failed to compile at process
    /// start (not one of the seven request-time kinds, but it shares the
    /// 503/"client-opaque, logged in full" treatment).
    #[error("schema compile error: {0}")]
    SchemaCompile(String),

    /// Any other storage error (§7 row 8, 503).
    #[error("internal error: {0}")]
    Infrastructure(String),

    /// Introspection (C6) probe parsing/scope validation failed: an unknown
    /// reserved field, an action tuple invalid for its entity, or a probe
    /// that needs account/project context the caller didn't supply. 422,
    /// not one of the `validate_rbac_permissions` request-time kinds.
    #[error("{0}")]
    ProbeValidation(String),
}

impl From<sqlx::Error> for RbacError {
    fn from(err: sqlx::Error) -> Self {
        RbacError::Infrastructure(err.to_string())
    }
}

impl From<RbacError> for CoreError {
    fn from(err: RbacError) -> Self {
        match &err {
            RbacError::Unauthenticated => {
                CoreError::new(ErrorCode::AuthenticationRequired, err.to_string())
            }
            RbacError::NotFound { .. } => CoreError::new(ErrorCode::ResourceNotFound, err.to_string()),
            RbacError::CrossIdMismatch(_) => {
                CoreError::new(ErrorCode::RbacCrossIdMismatch, err.to_string())
            }
            RbacError::AssociationMissing(_) => {
                CoreError::new(ErrorCode::RbacAssociationMissing, err.to_string())
            }
            RbacError::AncestryGap(_) => {
                CoreError::new(ErrorCode::RbacAncestryGap, err.to_string())
            }
            RbacError::PermissionDenied(_) => {
                CoreError::new(ErrorCode::PermissionDenied, err.to_string())
            }
            RbacError::SchemaLookupMiss(_) => {
                CoreError::new(ErrorCode::RbacSchemaLookupMiss, err.to_string())
            }
            RbacError::MalformedOverride(_) => {
                CoreError::new(ErrorCode::RbacMalformedOverride, err.to_string())
            }
            RbacError::SchemaCompile(_) => {
                CoreError::new(ErrorCode::ConfigurationError, err.to_string())
            }
            RbacError::Infrastructure(_) => {
                CoreError::new(ErrorCode::DatabaseQueryError, err.to_string())
            }
            RbacError::ProbeValidation(_) => {
                CoreError::new(ErrorCode::ValidationFailed, err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RbacError>;
