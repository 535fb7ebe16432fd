//! Structured error handling shared across the workspace.
//!
//! - [`ErrorCode`] — stable, categorized technical error codes
//! - [`Error`] — the error type every crate's `Result` resolves to
//! - [`ErrorContext`] / [`RequestContext`] — correlation ids and metadata
//!   carried alongside an error for logging and API responses

pub mod codes;
pub mod context;
pub mod framework;

pub use codes::ErrorCode;
pub use context::{ErrorContext, RequestContext};
pub use framework::{Error, ErrorCategory, ErrorSeverity, Result};
