use serde::{Deserialize, Serialize};
use std::fmt;

/// Standardized error codes, business-agnostic technical categories shared
/// across every crate in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General System Errors (1000-1999)
    InternalServerError = 1000,
    ConfigurationError = 1001,
    ServiceUnavailable = 1002,
    Timeout = 1003,
    ResourceExhausted = 1004,

    // Database Errors (2000-2999)
    DatabaseConnectionError = 2000,
    DatabaseConstraintViolation = 2001,
    DatabaseTransactionError = 2002,
    DatabaseQueryError = 2003,
    DatabaseMigrationError = 2004,

    // Network & Communication Errors (3000-3999)
    NetworkError = 3000,
    NetworkTimeout = 3001,
    NetworkConnectionRefused = 3002,
    ExternalServiceError = 3003,
    SerializationError = 3004,

    // Security & Authentication Errors (4000-4999)
    AuthenticationRequired = 4000,
    AuthenticationFailed = 4001,
    InvalidCredentials = 4002,
    TokenExpired = 4003,
    TokenInvalid = 4004,
    AuthorizationFailed = 4005,
    PermissionDenied = 4006,
    SecurityPolicyViolation = 4007,

    // Input Validation Errors (5000-5999)
    ValidationFailed = 5000,
    InvalidInput = 5001,
    MissingRequiredField = 5002,
    InvalidFormat = 5003,
    ValueOutOfRange = 5004,
    DuplicateValue = 5005,

    // Resource Management Errors (6000-6999)
    ResourceNotFound = 6000,
    ResourceAlreadyExists = 6001,
    ResourceLocked = 6002,
    ResourceInUse = 6003,
    ResourceQuotaExceeded = 6004,
    NotFound = 6005,
    NotImplemented = 6006,

    // Rate Limiting & Throttling Errors (7000-7999)
    RateLimitExceeded = 7000,
    TooManyRequests = 7001,
    ConcurrencyLimitExceeded = 7002,

    // Cache & Storage Errors (8000-8999)
    CacheError = 8000,
    CacheMiss = 8001,
    StorageError = 8002,
    EncryptionError = 8003,
    DecryptionError = 8004,

    // Authorization Engine Errors (10000-10999)
    /// A principal references an entity that exists but is not associated
    /// with the account/project it was scoped under (spec §7 row 3, 403).
    RbacAssociationMissing = 10000,
    /// A project's ancestry walk failed to reach an account the principal
    /// is associated with (spec §7 row 4, 403).
    RbacAncestryGap = 10001,
    /// Two resolved entities disagree about a shared foreign key supplied
    /// in the request (spec §7 row 2, 422).
    RbacCrossIdMismatch = 10002,
    /// The compiled permission schema has no entry for the requested
    /// entity/action/scope combination — a deployment/schema defect, not a
    /// caller error (spec §7 row 6, 503).
    RbacSchemaLookupMiss = 10003,
    /// A project- or api-key-scoped permission override document does not
    /// match the shape the compiled schema expects (spec §7 row 7, 503).
    RbacMalformedOverride = 10004,
}

impl ErrorCode {
    /// Get HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InternalServerError
            | ErrorCode::ConfigurationError
            | ErrorCode::DatabaseConnectionError
            | ErrorCode::DatabaseTransactionError
            | ErrorCode::DatabaseQueryError
            | ErrorCode::DatabaseMigrationError
            | ErrorCode::NetworkError
            | ErrorCode::ExternalServiceError
            | ErrorCode::SerializationError
            | ErrorCode::CacheError
            | ErrorCode::StorageError
            | ErrorCode::EncryptionError
            | ErrorCode::DecryptionError => 500,

            ErrorCode::ServiceUnavailable
            | ErrorCode::NetworkConnectionRefused
            | ErrorCode::RbacSchemaLookupMiss
            | ErrorCode::RbacMalformedOverride => 503,

            ErrorCode::Timeout | ErrorCode::NetworkTimeout => 408,

            ErrorCode::AuthenticationRequired
            | ErrorCode::AuthenticationFailed
            | ErrorCode::InvalidCredentials
            | ErrorCode::TokenExpired
            | ErrorCode::TokenInvalid => 401,

            ErrorCode::AuthorizationFailed
            | ErrorCode::PermissionDenied
            | ErrorCode::SecurityPolicyViolation
            | ErrorCode::RbacAssociationMissing
            | ErrorCode::RbacAncestryGap => 403,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFormat
            | ErrorCode::ValueOutOfRange
            | ErrorCode::RbacCrossIdMismatch => 422,

            ErrorCode::ResourceNotFound | ErrorCode::CacheMiss | ErrorCode::NotFound => 404,

            ErrorCode::ResourceAlreadyExists
            | ErrorCode::DuplicateValue
            | ErrorCode::DatabaseConstraintViolation => 409,

            ErrorCode::ResourceLocked => 423,

            ErrorCode::RateLimitExceeded
            | ErrorCode::TooManyRequests
            | ErrorCode::ConcurrencyLimitExceeded => 429,

            ErrorCode::ResourceExhausted | ErrorCode::ResourceQuotaExceeded => 507,

            ErrorCode::ResourceInUse => 422,

            ErrorCode::NotImplemented => 501,
        }
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InternalServerError
            | ErrorCode::ConfigurationError
            | ErrorCode::ServiceUnavailable
            | ErrorCode::Timeout
            | ErrorCode::ResourceExhausted => "system",

            ErrorCode::DatabaseConnectionError
            | ErrorCode::DatabaseConstraintViolation
            | ErrorCode::DatabaseTransactionError
            | ErrorCode::DatabaseQueryError
            | ErrorCode::DatabaseMigrationError => "database",

            ErrorCode::NetworkError
            | ErrorCode::NetworkTimeout
            | ErrorCode::NetworkConnectionRefused
            | ErrorCode::ExternalServiceError
            | ErrorCode::SerializationError => "network",

            ErrorCode::AuthenticationRequired
            | ErrorCode::AuthenticationFailed
            | ErrorCode::InvalidCredentials
            | ErrorCode::TokenExpired
            | ErrorCode::TokenInvalid
            | ErrorCode::AuthorizationFailed
            | ErrorCode::PermissionDenied
            | ErrorCode::SecurityPolicyViolation => "security",

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFormat
            | ErrorCode::ValueOutOfRange
            | ErrorCode::DuplicateValue => "validation",

            ErrorCode::ResourceNotFound
            | ErrorCode::ResourceAlreadyExists
            | ErrorCode::ResourceLocked
            | ErrorCode::ResourceInUse
            | ErrorCode::ResourceQuotaExceeded => "resource",

            ErrorCode::RateLimitExceeded
            | ErrorCode::TooManyRequests
            | ErrorCode::ConcurrencyLimitExceeded => "rate_limit",

            ErrorCode::CacheError
            | ErrorCode::CacheMiss
            | ErrorCode::StorageError
            | ErrorCode::EncryptionError
            | ErrorCode::DecryptionError => "storage",

            ErrorCode::NotFound => "resource",
            ErrorCode::NotImplemented => "system",

            ErrorCode::RbacAssociationMissing
            | ErrorCode::RbacAncestryGap
            | ErrorCode::RbacCrossIdMismatch
            | ErrorCode::RbacSchemaLookupMiss
            | ErrorCode::RbacMalformedOverride => "authorization",
        }
    }

    /// Check if error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NetworkTimeout
                | ErrorCode::NetworkConnectionRefused
                | ErrorCode::ServiceUnavailable
                | ErrorCode::DatabaseConnectionError
                | ErrorCode::CacheError
                | ErrorCode::ResourceExhausted
        )
    }

    /// Check if error should be logged at error level
    pub fn should_log_as_error(&self) -> bool {
        !matches!(
            self,
            ErrorCode::ValidationFailed
                | ErrorCode::InvalidInput
                | ErrorCode::MissingRequiredField
                | ErrorCode::InvalidFormat
                | ErrorCode::ValueOutOfRange
                | ErrorCode::ResourceNotFound
                | ErrorCode::AuthenticationFailed
                | ErrorCode::InvalidCredentials
                | ErrorCode::PermissionDenied
                | ErrorCode::RateLimitExceeded
                | ErrorCode::TooManyRequests
                | ErrorCode::RbacAssociationMissing
                | ErrorCode::RbacAncestryGap
                | ErrorCode::RbacCrossIdMismatch
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
