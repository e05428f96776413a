use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataTuneError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Broker error ({status}): {message}")]
    Broker { status: u16, message: String },

    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("OAuth2 error: {0}")]
    OAuth2(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Command error: {0}")]
    Command(String),

    #[error("{0}")]
    Application(String),
}

pub type Result<T> = std::result::Result<T, DataTuneError>;

/// Logs a fatal error and exits the process with code 1.
///
/// Intended for unrecoverable errors during startup.
pub fn handle_fatal(err: DataTuneError) -> ! {
    tracing::error!("Fatal error: {}", err);
    std::process::exit(1)
}

/// Maps a `DataTuneError` to user-friendly CLI output with a hint where one helps.
pub fn handle_command_error(err: &DataTuneError) {
    use crate::output;

    match err {
        DataTuneError::Auth(msg) => {
            output::error(&format!("Authentication error: {}", msg));
            output::info("Sign in through the web app and connect the service first.");
        }
        DataTuneError::OAuth2(msg) => {
            output::error(&format!("OAuth2 error: {}", msg));
            output::info("Restart the connection from the connections page.");
        }
        DataTuneError::Broker { status, message } => {
            output::error(&format!("Token broker error ({}): {}", status, message));
            output::info("Check DESCOPE_PROJECT_ID and DESCOPE_MANAGEMENT_KEY.");
        }
        DataTuneError::Provider { provider, message } => {
            output::error(&format!("{} error: {}", provider, message));
        }
        DataTuneError::Http(e) => {
            output::error(&format!("Network error: {}", e));
            output::info("Check your internet connection.");
        }
        DataTuneError::Config(msg) => {
            output::error(&format!("Configuration error: {}", msg));
            output::info("Fix the config file or remove it to fall back to defaults.");
        }
        DataTuneError::Command(msg) => {
            output::error(&format!("Error: {}", msg));
        }
        _ => {
            output::error(&format!("{}", err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = DataTuneError::Provider {
            provider: "one-drive".into(),
            message: "quota exceeded".into(),
        };
        assert_eq!(err.to_string(), "Provider error (one-drive): quota exceeded");

        let err = DataTuneError::Broker {
            status: 503,
            message: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "Broker error (503): maintenance");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DataTuneError = io.into();
        assert!(matches!(err, DataTuneError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DataTuneError = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_handle_command_error_does_not_panic() {
        handle_command_error(&DataTuneError::Auth("no session".into()));
        handle_command_error(&DataTuneError::Config("bad timeout".into()));
        handle_command_error(&DataTuneError::Application("boom".into()));
    }
}
