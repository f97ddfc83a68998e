//! Error taxonomy for LagSwitch.
//!
//! `ConfigError` and `ExecError` are recovered locally (by interactive setup and
//! by the switch controller respectively). `AppError` is what reaches the top
//! level; it serializes as `{ "kind": "...", "message": "..." }` so a failure
//! report can be machine-read as well as printed.

use std::path::PathBuf;
use std::time::Duration;

use serde::ser::SerializeStruct;

/// A persisted configuration value could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file '{}' not found", .path.display())]
    Missing { path: PathBuf },

    #[error("configuration file '{}' is invalid: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The external release/renew command did not complete successfully.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

/// Application-level error returned to the top-level runner.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Persisted configuration could not be read or written.
    #[error("{0}")]
    Config(String),

    /// The hotkey listener failed or stopped delivering events.
    #[error("{0}")]
    Input(String),

    /// I/O and OS-level errors (console, filesystem, signals).
    #[error("{0}")]
    Io(String),

    /// Invalid user input during setup. Already acknowledged by the user.
    #[error("{0}")]
    InvalidInput(String),

    /// Anything else escaping the main loop.
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    /// Returns the error kind as a string matching the variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::Input(_) => "Input",
            AppError::Io(_) => "Io",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Unexpected(_) => "Unexpected",
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("AppError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

// ---- From implementations for ergonomic error conversion ----

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Unexpected(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_returns_correct_variant_name() {
        assert_eq!(AppError::Config("c".into()).kind(), "Config");
        assert_eq!(AppError::Input("i".into()).kind(), "Input");
        assert_eq!(AppError::Io("io".into()).kind(), "Io");
        assert_eq!(AppError::InvalidInput("bad".into()).kind(), "InvalidInput");
        assert_eq!(AppError::Unexpected("?".into()).kind(), "Unexpected");
    }

    #[test]
    fn test_error_serializes_as_kind_and_message() {
        let err = AppError::Input("hotkey listener stopped".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "Input");
        assert_eq!(json["message"], "hotkey listener stopped");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_config_error_mentions_path() {
        let err = ConfigError::Invalid {
            path: PathBuf::from("mode.txt"),
            reason: "expected '1' or '2'".into(),
        };
        let app: AppError = err.into();
        assert_eq!(app.kind(), "Config");
        assert!(app.to_string().contains("mode.txt"));
        assert!(app.to_string().contains("expected '1' or '2'"));
    }

    #[test]
    fn test_exec_error_messages() {
        let failed = ExecError::Failed {
            command: "ipconfig /release".into(),
            status: "exit code: 1".into(),
            stderr: "access denied".into(),
        };
        assert_eq!(
            failed.to_string(),
            "`ipconfig /release` exited with exit code: 1: access denied"
        );

        let timed_out = ExecError::TimedOut {
            command: "ipconfig /renew".into(),
            timeout: Duration::from_secs(30),
        };
        assert!(timed_out.to_string().contains("30s"));
    }

    #[test]
    fn test_from_io_error_produces_io_variant() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed");
        let app_err: AppError = io_err.into();
        assert_eq!(app_err.kind(), "Io");
        assert!(app_err.to_string().contains("stdin closed"));
    }

    #[test]
    fn test_from_anyhow_keeps_context_chain() {
        let err = anyhow::anyhow!("no devices").context("starting hotkey listener");
        let app_err: AppError = err.into();
        assert_eq!(app_err.kind(), "Unexpected");
        assert_eq!(app_err.to_string(), "starting hotkey listener: no devices");
    }
}
