//! Ancestry Check (C4).
//!
//! A thin, named wrapper around `RbacRepository::is_associated_up_to_root`
//! so callers in `evaluator.rs` read as "ancestry check", not "repository
//! call #6" — the recursive CTE itself lives behind the trait (§4.3: "the
//! engine treats it as an opaque predicate").

use uuid::Uuid;

use crate::error::Result;
use crate::repository::RbacRepository;

/// True iff `user_id` has a `User_Project` row for every project from
/// `starting_project_id` up to its top-level ancestor, inclusive.
pub async fn is_user_associated_up_to_root(
    repo: &dyn RbacRepository,
    user_id: Uuid,
    starting_project_id: Uuid,
) -> Result<bool> {
    repo.is_associated_up_to_root(user_id, starting_project_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::FakeRbacRepository;
    use crate::rows::{ProjectRow, UserProjectRow};

    fn project(id: Uuid, account_id: Uuid, parent: Option<Uuid>) -> ProjectRow {
        ProjectRow {
            id,
            account_id,
            parent_project_id: parent,
            name: "p".into(),
            creator_user_email: "a@example.com".into(),
        }
    }

    fn membership(user_id: Uuid, project_id: Uuid) -> UserProjectRow {
        UserProjectRow {
            id: Uuid::new_v4(),
            user_id,
            project_id,
            is_admin: false,
            permission_overrides: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn full_chain_membership_passes() {
        let account_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();

        let mut repo = FakeRbacRepository::default();
        repo.projects.insert(root, project(root, account_id, None));
        repo.projects.insert(child, project(child, account_id, Some(root)));
        repo.user_projects.insert((user_id, root), membership(user_id, root));
        repo.user_projects.insert((user_id, child), membership(user_id, child));

        assert!(is_user_associated_up_to_root(&repo, user_id, child).await.unwrap());
    }

    #[tokio::test]
    async fn missing_parent_membership_fails() {
        let account_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();

        let mut repo = FakeRbacRepository::default();
        repo.projects.insert(root, project(root, account_id, None));
        repo.projects.insert(child, project(child, account_id, Some(root)));
        // user is associated to the child but not to its root ancestor.
        repo.user_projects.insert((user_id, child), membership(user_id, child));

        assert!(!is_user_associated_up_to_root(&repo, user_id, child).await.unwrap());
    }
}
