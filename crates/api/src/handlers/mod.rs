//! API handlers for all routes
//!
//! This module contains the HTTP handlers for all API endpoints.

pub mod applications;
pub mod permissions;
pub mod projects;
pub mod roles;
