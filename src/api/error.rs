//! Errors from external services (image host, language services)

use std::fmt;

/// Errors that can occur when calling an external service
///
/// None of these affect wizard state: the caller reports them and the
/// session keeps whatever fields were already accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401/403 - key invalid, expired, or lacking permissions
    Unauthorized { provider: String },
    /// 429 Rate Limited
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },
    /// Network or timeout error
    NetworkError { provider: String, message: String },
    /// Other HTTP errors
    HttpError {
        provider: String,
        status: u16,
        message: String,
    },
    /// Response arrived but could not be understood
    InvalidResponse { provider: String, message: String },
    /// Provider not configured (no API key)
    NotConfigured { provider: String },
    /// Capability is not ready on this host
    Unavailable { provider: String, reason: String },
    /// Request is well-formed but cannot be served
    Unsupported { provider: String, message: String },
}

impl ApiError {
    /// Whether retrying the same request later could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimited { .. } | ApiError::NetworkError { .. } => true,
            ApiError::HttpError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn unauthorized(provider: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            provider: provider.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, retry_after: Option<u64>) -> Self {
        ApiError::RateLimited {
            provider: provider.into(),
            retry_after_secs: retry_after,
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NetworkError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn http(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::HttpError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn not_configured(provider: impl Into<String>) -> Self {
        ApiError::NotConfigured {
            provider: provider.into(),
        }
    }

    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::Unavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Unsupported {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Map an HTTP status and body to an error
    pub fn from_status(
        provider: impl Into<String>,
        status: u16,
        retry_after: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        match status {
            401 | 403 => ApiError::unauthorized(provider),
            429 => ApiError::rate_limited(provider, retry_after),
            _ => ApiError::http(provider, status, message),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized { provider } => {
                write!(f, "{}: Unauthorized - check the API key", provider)
            }
            ApiError::RateLimited {
                provider,
                retry_after_secs,
            } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "{}: Rate limited - retry after {}s", provider, secs)
                } else {
                    write!(f, "{}: Rate limited", provider)
                }
            }
            ApiError::NetworkError { provider, message } => {
                write!(f, "{}: Network error - {}", provider, message)
            }
            ApiError::HttpError {
                provider,
                status,
                message,
            } => {
                write!(f, "{}: HTTP {} - {}", provider, status, message)
            }
            ApiError::InvalidResponse { provider, message } => {
                write!(f, "{}: Invalid response - {}", provider, message)
            }
            ApiError::NotConfigured { provider } => {
                write!(f, "{}: Not configured (no API key)", provider)
            }
            ApiError::Unavailable { provider, reason } => {
                write!(f, "{}: Unavailable - {}", provider, reason)
            }
            ApiError::Unsupported { provider, message } => {
                write!(f, "{}: {}", provider, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(
            ApiError::from_status("imgbb", 401, None, "bad key"),
            ApiError::unauthorized("imgbb")
        );
        assert_eq!(
            ApiError::from_status("imgbb", 429, Some(10), "slow down"),
            ApiError::rate_limited("imgbb", Some(10))
        );
        assert_eq!(
            ApiError::from_status("imgbb", 400, None, "Invalid base64"),
            ApiError::http("imgbb", 400, "Invalid base64")
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(ApiError::network("imgbb", "timeout").is_retryable());
        assert!(ApiError::rate_limited("imgbb", None).is_retryable());
        assert!(ApiError::http("imgbb", 503, "down").is_retryable());
        assert!(!ApiError::http("imgbb", 400, "bad").is_retryable());
        assert!(!ApiError::not_configured("imgbb").is_retryable());
    }

    #[test]
    fn test_display() {
        let err = ApiError::rate_limited("imgbb", Some(30));
        assert_eq!(err.to_string(), "imgbb: Rate limited - retry after 30s");

        let err = ApiError::not_configured("imgbb");
        assert_eq!(err.to_string(), "imgbb: Not configured (no API key)");
    }
}
