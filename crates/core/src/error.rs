use std::time::Duration;

/// Failure taxonomy shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("external api error: HTTP {status}: {message}")]
    ExternalApi {
        status: u16,
        message: String,
        quota_exceeded: bool,
    },

    #[error("external api transport error: {0}")]
    Transport(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        Error::Persistence(err.to_string())
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            Error::ExternalApi {
                quota_exceeded: true,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_flag_detection() {
        let quota = Error::ExternalApi {
            status: 403,
            message: "quota".to_string(),
            quota_exceeded: true,
        };
        let other = Error::ExternalApi {
            status: 500,
            message: "boom".to_string(),
            quota_exceeded: false,
        };
        assert!(quota.is_quota_exceeded());
        assert!(!other.is_quota_exceeded());
        assert!(!Error::Transport("reset".to_string()).is_quota_exceeded());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::ExternalApi {
            status: 404,
            message: "Not Found".to_string(),
            quota_exceeded: false,
        };
        assert_eq!(err.to_string(), "external api error: HTTP 404: Not Found");
        assert_eq!(
            Error::persistence("connection refused").to_string(),
            "persistence error: connection refused"
        );
    }
}
