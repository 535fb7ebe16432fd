use std::sync::Arc;

use warden_auth::AuthState;
use warden_core::{Config, DatabasePool};
use warden_rbac::RbacEngine;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DatabasePool,
    pub rbac: Arc<RbacEngine>,
    pub auth: AuthState,
}
