//! Principal resolution: turns the trusted identity headers an upstream
//! gateway attaches (after it has already verified a bearer token or an
//! api key) into a `warden_rbac::Principal` plus the request's account/
//! project context, carried in request extensions as `RequestContext`.
//!
//! Token issuance, refresh, revocation, password hashing, TOTP, and
//! identity-provider integration are out of scope (spec.md §1 Non-goals);
//! this crate exists solely so `warden-api` handlers have a typed
//! `Principal` to pass into `warden_rbac::RbacEngine`.

pub mod middleware;

pub use middleware::{principal_middleware, AuthState, RequestContext};
