use thiserror::Error;

/// Failure of a single call to the remote recipe API.
///
/// Variants carry strings rather than the transport's error types so that
/// controllers can keep the last failure in their state and hand out clones.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No response: connection refused, DNS failure, or timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered with a non-2xx status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Failed to decode API response: {0}")]
    Decode(String),

    /// Rejected locally before any request was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Message suitable for showing inline in place of results.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Network(_) => "An error occurred, try again.".to_string(),
            GatewayError::Api { status, message } => match status {
                401 => "The recipe API rejected the API key. Check `ladle key set`.".to_string(),
                402 => "The daily recipe API quota is used up. Try again tomorrow.".to_string(),
                404 => "Recipe not found.".to_string(),
                429 => "Too many requests. Slow down and try again.".to_string(),
                500..=599 => "The recipe service is unavailable right now.".to_string(),
                _ => format!("Request failed: {message}"),
            },
            GatewayError::Decode(_) => {
                "The recipe service returned something unexpected.".to_string()
            }
            GatewayError::InvalidRequest(reason) => reason.clone(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_by_status() {
        let api = |status| GatewayError::Api {
            status,
            message: "boom".to_string(),
        };
        assert_eq!(api(404).user_message(), "Recipe not found.");
        assert!(api(402).user_message().contains("quota"));
        assert!(api(503).user_message().contains("unavailable"));
        assert_eq!(api(400).user_message(), "Request failed: boom");
        assert_eq!(
            GatewayError::Network("timed out".to_string()).user_message(),
            "An error occurred, try again."
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(
            GatewayError::Api {
                status: 404,
                message: String::new()
            }
            .is_not_found()
        );
        assert!(!GatewayError::Network(String::new()).is_not_found());
    }

    #[test]
    fn test_display_includes_status() {
        let e = GatewayError::Api {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert_eq!(e.to_string(), "API error 401: Invalid API key");
    }
}
