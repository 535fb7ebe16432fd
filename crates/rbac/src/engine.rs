//! `RbacEngine` — the explicit, `Arc`-shared service value that replaces
//! the source's `RBACProvider.get_instance()` process-wide singleton
//! (SPEC_FULL.md §9: "process-wide mutable singleton → explicit service
//! value"). Constructed once at process start from `(class_map,
//! validation_precedence_order, three compiled schemas)` — here, the class
//! map and precedence order are the compiled-in constants on `EntityClass`
//! (§10.4: not deployment configuration) — and held behind an `Arc` in the
//! adapter's `AppState`.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::compiler::CompiledSchema;
use crate::entity::EntityClass;
use crate::error::Result;
use crate::evaluator::{validate_rbac_permissions, Schemas, ValidationInfo};
use crate::filter::{get_filter_for_list_query, ListFilter};
use crate::introspection::{evaluate, IntrospectionResponse, ProbeParams};
use crate::principal::Principal;
use crate::repository::RbacRepository;
use crate::resolver::RequestParams;
use crate::schema::SchemaScope;

/// The three compiled schema tables, held together so `RbacEngine`
/// constructs its `Schemas<'_>` view without re-walking the documents.
pub struct CompiledSchemaSet {
    pub account: CompiledSchema,
    pub project: CompiledSchema,
    pub apikey: CompiledSchema,
}

impl CompiledSchemaSet {
    /// Compile all three embedded schema documents (`schema.rs`). Runs
    /// once at process start; a compile error here is fatal (process
    /// fails to start, per §4.1).
    pub fn compile() -> Result<Self> {
        Ok(Self {
            account: CompiledSchema::compile(SchemaScope::Account.document())?,
            project: CompiledSchema::compile(SchemaScope::Project.document())?,
            apikey: CompiledSchema::compile(SchemaScope::ApiKey.document())?,
        })
    }

    fn as_refs(&self) -> Schemas<'_> {
        Schemas { account: &self.account, project: &self.project, apikey: &self.apikey }
    }
}

/// The engine value itself: compiled schemas plus a repository handle.
/// Immutable after construction and safe to share across tokio tasks via
/// `Arc<RbacEngine>` — no interior mutability, no lock.
pub struct RbacEngine {
    schemas: CompiledSchemaSet,
    repo: Arc<dyn RbacRepository>,
}

impl RbacEngine {
    pub fn new(schemas: CompiledSchemaSet, repo: Arc<dyn RbacRepository>) -> Arc<Self> {
        Arc::new(Self { schemas, repo })
    }

    /// C1-C5: the full precedence-ordered permission check for one
    /// `(target_entity, target_action)` pair, per §4.4.
    #[tracing::instrument(skip(self, principal, params), fields(target_entity = %target_entity, target_action = ?target_action))]
    pub async fn validate_rbac_permissions(
        &self,
        params: &RequestParams,
        principal: &Principal,
        target_entity: EntityClass,
        target_action: &[String],
    ) -> Result<ValidationInfo> {
        validate_rbac_permissions(
            self.repo.as_ref(),
            &self.schemas.as_refs(),
            params,
            principal,
            target_entity,
            target_action,
        )
        .await
    }

    /// C6: batch permissions introspection, per §4.6.
    #[tracing::instrument(skip(self, principal, probes))]
    pub async fn evaluate_permissions(
        &self,
        principal: &Principal,
        account_id: Option<Uuid>,
        project_id: Option<Uuid>,
        probes: &HashMap<String, ProbeParams>,
    ) -> Result<IntrospectionResponse> {
        evaluate(
            self.repo.as_ref(),
            &self.schemas.as_refs(),
            principal,
            account_id,
            project_id,
            probes,
        )
        .await
    }

    /// C7: the list-query exclusion predicate for `target_entity`, built
    /// from the per-type-value denials a prior `validate_rbac_permissions`
    /// call recorded on `validation_info`.
    pub fn get_filter_for_list_query(&self, validation_info: &ValidationInfo) -> ListFilter {
        let target_entity = validation_info.target_entity;
        let columns: Vec<String> = self
            .schemas
            .account
            .typenames(target_entity)
            .to_vec();
        get_filter_for_list_query(target_entity, &columns, validation_info)
    }

    pub fn schemas(&self) -> &CompiledSchemaSet {
        &self.schemas
    }
}
