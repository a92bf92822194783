use std::io;

#[derive(thiserror::Error, Debug)]
pub enum DashError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("http error: {endpoint} returned {status}")]
    Http { status: u16, endpoint: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("unknown error")]
    Unknown,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<reqwest::Error> for DashError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DashError::Timeout
        } else if err.is_connect() {
            DashError::Network(err.to_string())
        } else if err.is_status() {
            DashError::Http {
                status: err.status().map(|s| s.as_u16()).unwrap_or_default(),
                endpoint: err.url().map(|u| u.path().to_string()).unwrap_or_default(),
            }
        } else if err.is_decode() {
            DashError::Decode(err.to_string())
        } else if err.is_request() {
            DashError::Network(err.to_string())
        } else {
            DashError::Unknown
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::Decode(err.to_string())
    }
}

impl DashError {
    /// Transport-level failures leave the affected section stale instead of failing the cycle.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DashError::Network(_) | DashError::Timeout | DashError::Http { .. } | DashError::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_names_endpoint() {
        let err = DashError::Http {
            status: 503,
            endpoint: "/api/incidents/live".into(),
        };
        assert_eq!(err.to_string(), "http error: /api/incidents/live returned 503");
        assert!(err.is_transport());
        assert!(!DashError::Config("x".into()).is_transport());
    }

    #[test]
    fn malformed_json_maps_to_decode() {
        let err: DashError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, DashError::Decode(_)));
    }
}
