use reqwest::StatusCode;
use sea_orm::error::DbErr;
use thiserror::Error;

/// Error taxonomy for the pipeline.
///
/// A precondition-skip (missing or empty input artifact) is deliberately NOT
/// an error; stages report it through [`crate::stages::StageOutcome`] so that
/// a day with no orders ends cleanly instead of alarming the orchestrator.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote API answered with a non-success status that survived the retry
    /// policy (non-retryable 4xx, or retries exhausted).
    #[error("Remote API returned {status} for {endpoint}")]
    ExternalApi { status: StatusCode, endpoint: String },

    /// A semi-structured field failed strict decoding after quote
    /// normalization. Always a hard failure: a corrupt day must fail the run.
    #[error("Malformed {field} field on record {record}: {source}")]
    MalformedField {
        field: &'static str,
        record: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    /// Whether the failure is worth retrying at the extractor boundary.
    /// Transport-level failures and server-side errors are transient;
    /// anything else (4xx, decode failures, local I/O) is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            EtlError::ExternalApi { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let err = EtlError::ExternalApi {
            status: StatusCode::BAD_GATEWAY,
            endpoint: "/orders".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let err = EtlError::ExternalApi {
            status: StatusCode::NOT_FOUND,
            endpoint: "/orders".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn rate_limiting_is_retryable() {
        let err = EtlError::ExternalApi {
            status: StatusCode::TOO_MANY_REQUESTS,
            endpoint: "/customers".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn data_integrity_is_not_retryable() {
        assert!(!EtlError::DataIntegrity("missing column".into()).is_retryable());
    }
}
