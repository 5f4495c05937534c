use serde::Serialize;
use std::fmt;

/// Status half of a [`RequestError`].
///
/// `Unknown` means no response was received at all (DNS failure, refused
/// connection, TLS handshake error, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Code(u16),
    Unknown,
}

impl ResponseStatus {
    /// Returns the numeric status code, if a response arrived.
    pub fn code(&self) -> Option<u16> {
        match self {
            ResponseStatus::Code(code) => Some(*code),
            ResponseStatus::Unknown => None,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Code(code) => write!(f, "{}", code),
            ResponseStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl Serialize for ResponseStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseStatus::Code(code) => serializer.serialize_u16(*code),
            ResponseStatus::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// Failure of a single outbound HTTP call.
///
/// Covers both transport failures (`status_code` is [`ResponseStatus::Unknown`])
/// and responses whose status differs from the expected one. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestError {
    pub error: Option<String>,
    #[serde(rename = "statusCode")]
    pub status_code: ResponseStatus,
}

impl RequestError {
    /// No response was received.
    pub fn transport(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            status_code: ResponseStatus::Unknown,
        }
    }

    /// A response arrived with an unexpected status.
    pub fn status_mismatch(actual: u16, expected: u16) -> Self {
        Self {
            error: Some(format!("expected status {}, got {}", expected, actual)),
            status_code: ResponseStatus::Code(actual),
        }
    }

    pub fn is_transport(&self) -> bool {
        self.status_code == ResponseStatus::Unknown
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "request failed (status {}): {}", self.status_code, error),
            None => write!(f, "request failed (status {})", self.status_code),
        }
    }
}

impl std::error::Error for RequestError {}

/// A required option that is missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Outbound HTTP call failed (transport or status mismatch).
    Request(RequestError),
    /// Lookup options did not pass validation.
    InvalidOptions(Vec<ValidationError>),
    /// The backend answered with a body we cannot interpret.
    InvalidResponse(String),
    /// Startup configuration is unusable (unreadable TLS files, bad proxy, ...).
    ConfigError(String),
    /// Internal failure, e.g. a lookup task panicked.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Strips any context layers and returns the underlying error.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// The request error at the bottom of the chain, if any.
    pub fn request_error(&self) -> Option<&RequestError> {
        match self.root() {
            AppError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Request(e) => write!(f, "{}", e),
            AppError::InvalidOptions(errors) => {
                let keys: Vec<&str> = errors.iter().map(|e| e.key.as_str()).collect();
                write!(f, "Invalid options: {}", keys.join(", "))
            }
            AppError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Request(e) => Some(e),
            AppError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        AppError::Request(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

impl<T> ResultExt<T> for Result<T, RequestError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Request(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Request(e)),
            context: f(),
        })
    }
}
