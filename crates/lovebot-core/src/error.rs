//! Error types for lovebot operations.
//!
//! Errors carry a structured [`ErrorCode`] so callers (the HTTP shell, logs)
//! can react programmatically. Nothing in the decision core treats an error
//! as fatal: scoring and decisions fail closed, storage failures are logged
//! and retried on the next save tick.

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for lovebot operations.
pub type LovebotResult<T> = Result<T, LovebotError>;

/// Main error type for all lovebot operations.
#[derive(Error, Debug)]
pub enum LovebotError {
    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Conversation not found.
    #[error("Conversation not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        conversation_id: Option<String>,
    },

    /// Completion call failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Durable context storage failed (load or save).
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        code: ErrorCode,
        key: Option<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network error.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// Archive could not be read.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValInvalidFormat,

    // Conversation (CONV_xxx)
    ConvNotFound,

    // LLM (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmInvalidResponse,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,

    // Storage (STORE_xxx)
    StoreLoadFailed,
    StoreSaveFailed,

    // Network (NET_xxx)
    NetTimeout,
    NetConnectionFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseInvalidTranscript,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValInvalidFormat => "VAL_003",
            ErrorCode::ConvNotFound => "CONV_001",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmInvalidResponse => "LLM_003",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::StoreLoadFailed => "STORE_001",
            ErrorCode::StoreSaveFailed => "STORE_002",
            ErrorCode::NetTimeout => "NET_001",
            ErrorCode::NetConnectionFailed => "NET_002",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseInvalidTranscript => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl LovebotError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create an error for a required field that is missing or blank.
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        let mut details = HashMap::new();
        details.insert("field".to_string(), field.clone());
        Self::Validation {
            message: format!("{} is required", field),
            code: ErrorCode::ValMissingField,
            details,
            suggestion: None,
        }
    }

    /// Create a not found error.
    pub fn not_found(conversation_id: impl Into<String>) -> Self {
        let id = conversation_id.into();
        Self::NotFound {
            message: format!("Conversation '{}' has no context", id),
            code: ErrorCode::ConvNotFound,
            conversation_id: Some(id),
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create an error for a completion provider that could not be reached.
    pub fn llm_connection(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmConnectionFailed,
            source: None,
        }
    }

    /// Create an error for a completion response that could not be decoded.
    pub fn llm_invalid_response(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmInvalidResponse,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Create a transcript parse error.
    pub fn transcript(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidTranscript,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create an error for a database that could not be opened.
    pub fn db_connection(err: rusqlite::Error) -> Self {
        Self::Database {
            message: format!("cannot open database: {}", err),
            code: ErrorCode::DbConnectionFailed,
            source: Some(Box::new(err)),
        }
    }

    /// Create a storage save error for the given key.
    pub fn storage_save(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoreSaveFailed,
            key: Some(key.into()),
        }
    }

    /// Create a storage error not tied to one record.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoreSaveFailed,
            key: None,
        }
    }

    /// Create a storage load error for the given key.
    pub fn storage_load(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoreLoadFailed,
            key: Some(key.into()),
        }
    }

    /// Create an API error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            source: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::Storage { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Configuration(_) | Self::UnsupportedProvider { .. } => ErrorCode::ValInvalidInput,
            Self::Archive(_) => ErrorCode::ValInvalidFormat,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::NotFound { .. } => Some("The conversation has not received any messages yet"),
            Self::Llm { .. } => Some("Please check your LLM provider configuration"),
            Self::Storage { .. } => Some("Please check that the storage path is writable"),
            Self::Archive(_) => Some("Upload a .zip chat export or a plain .txt transcript"),
            _ => None,
        }
    }

    /// Convert from an HTTP status code returned by a completion provider.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            400 | 422 => Self::Validation {
                message: body.to_string(),
                code: ErrorCode::ValInvalidInput,
                details: HashMap::new(),
                suggestion: Some("Please check the request parameters".to_string()),
            },
            408 | 504 => Self::Network {
                message: body.to_string(),
                code: ErrorCode::NetTimeout,
                source: None,
            },
            _ => Self::Llm {
                message: format!("HTTP {}: {}", status, body),
                code: ErrorCode::LlmGenerationFailed,
                source: None,
            },
        }
    }
}

impl From<rusqlite::Error> for LovebotError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}
