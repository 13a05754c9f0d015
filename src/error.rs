use std::fmt;

/// Error types for the state-backend import run
#[derive(Debug)]
pub enum ImportError {
    /// The current workspace could not be determined
    WorkspaceUnavailable(String),

    /// The cloud session for the profile could not be initialized
    Credentials { profile: String, message: String },

    /// The state tool ran but reported failure
    ToolFailed {
        command: String,
        message: String,
        exit_code: Option<i32>,
    },

    /// Configuration file parsing error
    ConfigParse(String),

    /// The run was interrupted by the operator
    Interrupted { completed: usize, remaining: usize },

    /// General I/O error
    Io(std::io::Error),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::WorkspaceUnavailable(msg) => {
                write!(f, "Could not get current Terraform workspace: {}", msg)
            }
            ImportError::Credentials { profile, message } => {
                write!(
                    f,
                    "Failed to initialize AWS session for profile '{}': {}",
                    profile, message
                )
            }
            ImportError::ToolFailed {
                command,
                message,
                exit_code,
            } => {
                write!(f, "Command '{}' failed", command)?;

                if let Some(code) = exit_code {
                    write!(f, " (exit code {})", code)?;
                }

                write!(f, ": {}", message)
            }
            ImportError::ConfigParse(msg) => {
                write!(f, "Failed to parse configuration: {}", msg)
            }
            ImportError::Interrupted {
                completed,
                remaining,
            } => {
                write!(
                    f,
                    "Import process interrupted by user ({} done, {} not attempted)",
                    completed, remaining
                )
            }
            ImportError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Io(err)
    }
}

impl From<serde_yaml::Error> for ImportError {
    fn from(err: serde_yaml::Error) -> Self {
        ImportError::ConfigParse(err.to_string())
    }
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
