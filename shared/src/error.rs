use serde::{Deserialize, Serialize};

use crate::capabilities::{GeolocationError, StorageError};
use crate::config::ConfigError;
use crate::location::SearchError;
use crate::region::CoordinateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    RateLimited,
    Server,
    Storage,
    Serialization,
    Validation,
    Location,
    LocationPermissionDenied,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Location => "LOCATION_ERROR",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Nothing in the core is fatal: every failure degrades to a safe default.
    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network
            | Self::Timeout
            | Self::RateLimited
            | Self::Server
            | Self::Storage
            | Self::Location => ErrorSeverity::Transient,

            Self::Serialization
            | Self::Validation
            | Self::LocationPermissionDenied
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self.default_severity(), ErrorSeverity::Transient)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Search is unavailable right now. Check your connection and try again.".into()
            }
            ErrorKind::Timeout => "The search timed out. Please try again.".into(),
            ErrorKind::RateLimited => {
                "Too many searches. Please wait a moment and try again.".into()
            }
            ErrorKind::Server => "The location service had a problem. Please try again.".into(),
            ErrorKind::Storage => {
                "Saved locations could not be stored on this device. Changes last for this session only."
                    .into()
            }
            ErrorKind::Serialization => {
                "Saved locations could not be read. Starting with defaults.".into()
            }
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Location => {
                "Unable to determine your location. Showing the default city instead.".into()
            }
            ErrorKind::LocationPermissionDenied => {
                "Location access was denied. Showing the default city instead.".into()
            }
            ErrorKind::Unknown => "Something went wrong. Please try again.".into(),
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16) -> Self {
        let kind = match status {
            408 | 504 => ErrorKind::Timeout,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            400..=499 => ErrorKind::Validation,
            _ => ErrorKind::Unknown,
        };

        Self::new(kind, format!("HTTP error: {status}"))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Status(status) => AppError::from_http_status(status),
            SearchError::Transport(message) => {
                AppError::new(ErrorKind::Network, "Search request failed").with_internal(message)
            }
        }
    }
}

impl From<GeolocationError> for AppError {
    fn from(e: GeolocationError) -> Self {
        let kind = match e {
            GeolocationError::PermissionDenied => ErrorKind::LocationPermissionDenied,
            GeolocationError::Timeout => ErrorKind::Timeout,
            GeolocationError::PositionUnavailable | GeolocationError::Unsupported => {
                ErrorKind::Location
            }
        };
        AppError::new(kind, e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        let kind = match &e {
            StorageError::Read { .. } | StorageError::Write { .. } => ErrorKind::Storage,
            StorageError::Decode { .. } | StorageError::Encode { .. } => ErrorKind::Serialization,
        };
        AppError::new(kind, e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.user_facing_message(),
            retryable: e.is_retryable(),
        }
    }
}
