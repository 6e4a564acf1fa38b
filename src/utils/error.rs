use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalityError {
    #[error("Upstream request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Upstream query failed after {attempts} attempts: {message}")]
    UpstreamError { attempts: u32, message: String },

    #[error("Text generation failed: {message}")]
    GenerationError { message: String },

    #[error("Area {area_id} not found")]
    AreaNotFound { area_id: u64 },

    #[error("Facility locations are not available for area {area_id}")]
    LocationsNotAllowed { area_id: u64 },

    #[error("Snapshot for area {area_id} already exists")]
    SnapshotExists { area_id: u64 },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Background task failed: {message}")]
    TaskError { message: String },

    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Configuration error in '{field}': {message}")]
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
    Upstream,
    Storage,
    Input,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LocalityError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LocalityError::HttpError(_) => ErrorCategory::Network,
            LocalityError::UpstreamError { .. }
            | LocalityError::GenerationError { .. } => ErrorCategory::Upstream,
            LocalityError::IoError(_)
            | LocalityError::SerializationError(_)
            | LocalityError::StorageError { .. }
            | LocalityError::SnapshotExists { .. }
            | LocalityError::TaskError { .. } => ErrorCategory::Storage,
            LocalityError::AreaNotFound { .. }
            | LocalityError::LocationsNotAllowed { .. }
            | LocalityError::InvalidInput { .. } => ErrorCategory::Input,
            LocalityError::ConfigValidationError { .. }
            | LocalityError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Upstream => {
                "The Overpass endpoints may be overloaded; wait a minute and retry, or add endpoints under [upstream]"
            }
            ErrorCategory::Storage => {
                "Check that the cache store path is writable and the file is valid JSON"
            }
            ErrorCategory::Input => "Check the area id or coordinates passed on the command line",
            ErrorCategory::Configuration => "Fix the highlighted field in the configuration file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LocalityError::AreaNotFound { area_id } => {
                format!("No area with id {} exists. Run `areas` to list known areas.", area_id)
            }
            LocalityError::LocationsNotAllowed { area_id } => {
                format!("Facility maps are not enabled for area {}.", area_id)
            }
            LocalityError::UpstreamError { attempts, .. } => format!(
                "The map data service did not answer after {} attempts.",
                attempts
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LocalityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = LocalityError::AreaNotFound { area_id: 9 };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = LocalityError::UpstreamError {
            attempts: 3,
            message: "504".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Upstream);
        assert!(err.user_friendly_message().contains("3 attempts"));
    }

    #[test]
    fn test_storage_errors_are_critical() {
        let err = LocalityError::StorageError {
            message: "disk full".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);

        let err = LocalityError::SnapshotExists { area_id: 4 };
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.to_string(), "Snapshot for area 4 already exists");
    }
}
