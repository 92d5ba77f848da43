use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    #[error("HTTP {status} returned by {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid session state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("No form found on page {url}")]
    FormNotFound { url: String },

    #[error("Form on page {url} has no field named '{field}'")]
    FieldNotFound { field: String, url: String },

    #[error("No pathway image reference found on page {url}")]
    ImageNotFound { url: String },

    #[error("No page loaded in browser history")]
    NoCurrentPage,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Remote,
    Session,
    Io,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MapperError {
    pub fn invalid_state(expected: impl ToString, actual: impl ToString) -> Self {
        Self::InvalidState {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) => ErrorCategory::Network,
            Self::HttpStatus { .. }
            | Self::FormNotFound { .. }
            | Self::FieldNotFound { .. }
            | Self::ImageNotFound { .. } => ErrorCategory::Remote,
            Self::InvalidState { .. } | Self::NoCurrentPage => ErrorCategory::Session,
            Self::IoError(_) => ErrorCategory::Io,
            Self::UrlError(_)
            | Self::PatternError(_)
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 遠端暫時性問題，稍後重跑可能成功
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Remote => match self {
                Self::HttpStatus { status, .. } if *status >= 500 => ErrorSeverity::Medium,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Io | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Session => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::HttpError(_) => "Check network connectivity and that the KEGG site is reachable",
            Self::HttpStatus { .. } => "The KEGG service rejected the request; retry later or check --base-url",
            Self::FormNotFound { .. } | Self::FieldNotFound { .. } | Self::ImageNotFound { .. } => {
                "The KEGG page layout may have changed; check form_path and link_prefix in the config"
            }
            Self::InvalidState { .. } | Self::NoCurrentPage => {
                "Submit the KO list before requesting a pathway image"
            }
            Self::IoError(_) => "Check that the KO file exists and the output directory is writable",
            Self::UrlError(_) => "Check the base_url and form_path settings",
            Self::PatternError(_) => "The image extraction pattern is invalid",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => "Review the command line arguments and TOML config",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::HttpError(_) => "Could not reach the KEGG mapper service".to_string(),
            Self::IoError(e) => format!("File operation failed: {}", e),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;
