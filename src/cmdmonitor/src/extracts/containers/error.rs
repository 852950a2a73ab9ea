use std::fmt;
use std::time::Duration;

/// Errors from talking to the container runtime
#[derive(Debug)]
pub enum ContainerError {
    /// Docker API request failed
    Api(bollard::errors::Error),

    /// The `docker` binary could not be spawned
    Io(std::io::Error),

    /// The operation did not finish within the command timeout
    Timeout { operation: String, timeout: Duration },

    /// An exec'd command exited unsuccessfully
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// Output could not be interpreted
    InvalidOutput(String),
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::Api(e) => write!(f, "Docker API request failed: {}", e),
            ContainerError::Io(e) => write!(f, "Failed to run docker: {}", e),
            ContainerError::Timeout { operation, timeout } => {
                write!(f, "{} timed out after {:?}", operation, timeout)
            }
            ContainerError::CommandFailed {
                command,
                status,
                stderr,
            } => match status {
                Some(code) => write!(f, "`{}` exited with {}: {}", command, code, stderr.trim()),
                None => write!(f, "`{}` was terminated: {}", command, stderr.trim()),
            },
            ContainerError::InvalidOutput(msg) => write!(f, "Unexpected output: {}", msg),
        }
    }
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContainerError::Api(e) => Some(e),
            ContainerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bollard::errors::Error> for ContainerError {
    fn from(err: bollard::errors::Error) -> Self {
        ContainerError::Api(err)
    }
}

impl From<std::io::Error> for ContainerError {
    fn from(err: std::io::Error) -> Self {
        ContainerError::Io(err)
    }
}

pub type ContainerResult<T> = Result<T, ContainerError>;
