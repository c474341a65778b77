use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for querier operations
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Why the last outbound attempt failed before any response arrived
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportFailure {
    /// Connection failures and timeouts are transient; anything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportFailure::Timeout | TransportFailure::Connect(_))
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportFailure::Timeout
        } else if e.is_connect() {
            TransportFailure::Connect(e.to_string())
        } else {
            TransportFailure::Request(e.to_string())
        }
    }
}

/// Failure of one pipeline call.
///
/// Every variant is recovered at the pipeline boundary and turned into a
/// status code plus an [`ErrorBody`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("missing or empty bearer token")]
    AuthMissing,

    #[error("upstream {endpoint} unreachable after {attempts} attempt(s): {failure}")]
    Transport {
        endpoint: String,
        attempts: u32,
        failure: TransportFailure,
    },

    #[error("upstream returned status {code}")]
    UpstreamStatus { code: u16, snippet: String },

    #[error("upstream returned unexpected shape: {0}")]
    Transform(String),
}

impl GatewayError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::AuthMissing => "auth_missing",
            GatewayError::Transport { .. } => "transport_error",
            GatewayError::UpstreamStatus { .. } => "upstream_status_error",
            GatewayError::Transform(_) => "transform_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::AuthMissing => StatusCode::UNAUTHORIZED,
            GatewayError::Transport {
                failure: TransportFailure::Timeout,
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Transport { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamStatus { code, .. } => match StatusCode::from_u16(*code) {
                Ok(status) if status.is_client_error() || status.is_server_error() => status,
                _ => StatusCode::BAD_GATEWAY,
            },
            GatewayError::Transform(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Human-readable message safe to hand to callers.
    ///
    /// Never includes upstream bodies or transport internals.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::AuthMissing => "a bearer token is required".to_string(),
            GatewayError::Transport {
                failure: TransportFailure::Timeout,
                ..
            } => "upstream did not respond in time".to_string(),
            GatewayError::Transport { .. } => "upstream is unreachable".to_string(),
            GatewayError::UpstreamStatus { code, .. } => {
                format!("upstream returned status {code}")
            }
            GatewayError::Transform(_) => "upstream returned unexpected shape".to_string(),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.user_message(),
        }
    }
}

/// JSON body of every error response
#[derive(Serialize, Debug, PartialEq)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}
