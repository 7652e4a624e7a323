use thiserror::Error;

/// Failure talking to the external routing provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("routing provider timed out after {0}s")]
    Timeout(u64),
    #[error("routing provider unreachable: {0}")]
    Unavailable(String),
    #[error("routing provider request failed: {0}")]
    Transport(String),
    #[error("routing provider returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed routing provider response: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Stable label carried in error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Timeout(_) => "provider_timeout",
            ProviderError::Unavailable(_) => "provider_unavailable",
            ProviderError::Transport(_) => "provider_transport",
            ProviderError::Status { .. } => "provider_status",
            ProviderError::Parse(_) => "provider_parse",
        }
    }
}

/// Failure reading the incident data source.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read incident data: {0}")]
    Io(#[from] std::io::Error),
    #[error("incident data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("incident data must be an object or an array, got {0}")]
    Shape(&'static str),
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route geometry: {0}")]
    Geometry(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_includes_provider_text() {
        let err = ProviderError::Status {
            status: 401,
            message: "Not Authorized - Invalid Token".to_string(),
        };
        assert_eq!(err.kind(), "provider_status");
        assert_eq!(
            err.to_string(),
            "routing provider returned 401: Not Authorized - Invalid Token"
        );
    }

    #[test]
    fn timeout_is_distinct_kind() {
        assert_eq!(ProviderError::Timeout(10).kind(), "provider_timeout");
        assert_ne!(
            ProviderError::Timeout(10).kind(),
            ProviderError::Unavailable("refused".into()).kind()
        );
    }
}
