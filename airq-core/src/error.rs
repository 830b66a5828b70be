use thiserror::Error;

/// Failure talking to the prediction backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// HTTP status, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_mentions_code() {
        let err = ApiError::Status {
            url: "http://127.0.0.1:8000/api/predict".into(),
            status: 404,
            body: "station_id not found".into(),
        };

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("station_id not found"));
    }

    #[test]
    fn invalid_request_has_no_status() {
        let err = ApiError::invalid("horizon must be within 1..=168");
        assert_eq!(err.status(), None);
        assert!(err.to_string().starts_with("invalid request"));
    }
}
