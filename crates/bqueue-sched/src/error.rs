//! Error handling for the job queue.

use thiserror::Error;

/// Result type for queue and scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur while dispatching or tracking jobs.
#[derive(Error, Debug)]
pub enum SchedError {
    /// An external command exited with a nonzero status.
    #[error("Command `{command}` returned nonzero exit code {code}. Output:\n{output}")]
    CommandFailed {
        command: String,
        code: i32,
        output: String,
    },

    /// An external command could not be started.
    #[error("Failed to launch `{command}`: {message}")]
    CommandLaunch { command: String, message: String },

    /// bsub output did not contain a `Job <id> is submitted` acknowledgement.
    #[error("Unable to parse job id from output of `{command}`. Output was:\n{output}")]
    SubmissionParse { command: String, output: String },

    /// bjobs output does not line up with the ids that were requested.
    #[error("bjobs output out of sync for `{command}`: {message}")]
    ProtocolMismatch { command: String, message: String },

    /// bjobs reported a status token outside the known vocabulary.
    #[error("Unknown bjobs status string: {0}")]
    UnknownStatus(String),

    /// A job was rejected at enqueue time.
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// An external command did not finish in time.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SchedError {
    /// Whether this error came from malformed scheduler output rather than
    /// from a failed or missing process.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            SchedError::SubmissionParse { .. }
                | SchedError::ProtocolMismatch { .. }
                | SchedError::UnknownStatus(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedError::UnknownStatus("ZOMBI".to_string());
        assert_eq!(err.to_string(), "Unknown bjobs status string: ZOMBI");

        let err = SchedError::CommandFailed {
            command: "bjobs 12 13".to_string(),
            code: 255,
            output: "Job <13> is not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command `bjobs 12 13` returned nonzero exit code 255. Output:\nJob <13> is not found"
        );

        let err = SchedError::InvalidJob("slot count must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid job: slot count must be positive");
    }

    #[test]
    fn test_protocol_errors() {
        assert!(SchedError::UnknownStatus("X".into()).is_protocol_error());
        assert!(
            SchedError::SubmissionParse {
                command: "bsub".into(),
                output: String::new(),
            }
            .is_protocol_error()
        );
        assert!(!SchedError::Timeout("bjobs".into()).is_protocol_error());
    }
}
