//! Filter Generator (C7).
//!
//! Grounded on `get_post_validation_types_filter_function_for_all_query` in
//! `examples/original_source/.../validators/providers/rbac.py` (lines
//! 1096-1128): for every type-value tuple the precedence evaluator recorded
//! as denied against the list target, exclude rows whose branching-type
//! columns equal that tuple. Expressed here as a small combinator value
//! that renders a parameterized SQL fragment, since there is no ORM query
//! object to mutate in this stack (SPEC_FULL.md §4.7).

use crate::entity::EntityClass;
use crate::evaluator::ValidationInfo;

/// A `(column, value)` pair excluded by one denied type-value tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeniedTuple {
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

/// The predicate C7 produces: zero or more denied tuples to exclude,
/// conjoined with AND across tuples and, within a tuple, across columns
/// (§4.7: `(c_1 ≠ v_1) AND (c_2 ≠ v_2) AND …`, conjoined across tuples).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub denied: Vec<DeniedTuple>,
}

impl ListFilter {
    /// `true` iff this filter excludes nothing — every type-value tuple
    /// was allowed (or the target has no branching types at all).
    pub fn is_empty(&self) -> bool {
        self.denied.is_empty()
    }

    /// Render as a standalone boolean SQL expression using `$n`-style
    /// placeholders starting at `start_index`, and the bind values in the
    /// order they appear. An empty filter renders `"TRUE"` (a no-op AND
    /// operand) rather than an empty string, so callers can always do
    /// `WHERE <other predicates> AND {filter.to_sql(..).0}`.
    pub fn to_sql(&self, start_index: usize) -> (String, Vec<String>) {
        if self.denied.is_empty() {
            return ("TRUE".to_string(), Vec::new());
        }
        let mut clauses = Vec::new();
        let mut binds = Vec::new();
        let mut index = start_index;
        for tuple in &self.denied {
            let mut per_column = Vec::new();
            for (column, value) in tuple.columns.iter().zip(tuple.values.iter()) {
                per_column.push(format!("{column} <> ${index}"));
                binds.push(value.clone());
                index += 1;
            }
            clauses.push(format!("({})", per_column.join(" AND ")));
        }
        (clauses.join(" AND "), binds)
    }
}

/// `get_filter_for_list_query` (§6, §4.7): build the exclusion predicate
/// for `target_entity` out of the per-type-value denials the evaluator
/// recorded on `validation_info` (populated only for targets that were
/// never resolved to a single instance and have branching types — i.e.
/// list/create-style requests; §4.4 Step 4).
pub fn get_filter_for_list_query(
    target_entity: EntityClass,
    typename_columns: &[String],
    validation_info: &ValidationInfo,
) -> ListFilter {
    debug_assert_eq!(validation_info.target_entity, target_entity);
    let denied = validation_info
        .target_typevalue_results
        .iter()
        .filter(|(_, allowed)| !**allowed)
        .map(|(values, _)| DeniedTuple {
            columns: typename_columns.to_vec(),
            values: values.clone(),
        })
        .collect();
    ListFilter { denied }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn info_with(results: HashMap<Vec<String>, bool>) -> ValidationInfo {
        ValidationInfo {
            account_id: Some(Uuid::new_v4()),
            project_id: None,
            resolved: HashMap::new(),
            target_entity: EntityClass::Application,
            target_action: vec!["READ".to_string()],
            target_typevalue_results: results,
        }
    }

    #[test]
    fn empty_denials_yield_true_predicate() {
        let info = info_with(HashMap::new());
        let filter = get_filter_for_list_query(
            EntityClass::Application,
            &["applicationType".to_string()],
            &info,
        );
        assert!(filter.is_empty());
        let (sql, binds) = filter.to_sql(1);
        assert_eq!(sql, "TRUE");
        assert!(binds.is_empty());
    }

    #[test]
    fn denied_tuple_excludes_its_own_row_and_no_others() {
        let mut results = HashMap::new();
        results.insert(vec!["ingest".to_string()], true);
        results.insert(vec!["preprocess".to_string()], false);
        let info = info_with(results);

        let filter = get_filter_for_list_query(
            EntityClass::Application,
            &["applicationType".to_string()],
            &info,
        );

        assert_eq!(filter.denied.len(), 1);
        assert_eq!(filter.denied[0].values, vec!["preprocess".to_string()]);

        let (sql, binds) = filter.to_sql(3);
        assert_eq!(sql, "(applicationType <> $3)");
        assert_eq!(binds, vec!["preprocess".to_string()]);
    }

    #[test]
    fn multiple_denied_tuples_conjoin_with_and() {
        let mut results = HashMap::new();
        results.insert(vec!["ingest".to_string()], false);
        results.insert(vec!["preprocess".to_string()], false);
        let info = info_with(results);

        let filter = get_filter_for_list_query(
            EntityClass::Application,
            &["applicationType".to_string()],
            &info,
        );

        assert_eq!(filter.denied.len(), 2);
        let (sql, binds) = filter.to_sql(1);
        assert!(sql.contains(" AND "));
        assert_eq!(binds.len(), 2);
    }
}
