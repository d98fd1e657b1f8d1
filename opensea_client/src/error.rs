use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenSeaError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Authentication failed")]
    AuthError,

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Invalid network: {network}")]
    InvalidNetwork { network: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse classification used by callers deciding how to report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, timeout or non-2xx response
    Fetch,
    /// Response body could not be decoded
    Parse,
    /// Bad input before any request was sent
    Config,
}

impl OpenSeaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpenSeaError::HttpError(e) if e.is_decode() => ErrorKind::Parse,
            OpenSeaError::HttpError(_)
            | OpenSeaError::ApiError { .. }
            | OpenSeaError::RateLimit
            | OpenSeaError::AuthError => ErrorKind::Fetch,
            OpenSeaError::ParseError { .. } => ErrorKind::Parse,
            OpenSeaError::InvalidNetwork { .. } | OpenSeaError::InvalidUrl(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        OpenSeaError::ParseError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(OpenSeaError::RateLimit.kind(), ErrorKind::Fetch);
        assert_eq!(OpenSeaError::AuthError.kind(), ErrorKind::Fetch);
        assert_eq!(
            OpenSeaError::ApiError {
                status: 500,
                message: "boom".to_string()
            }
            .kind(),
            ErrorKind::Fetch
        );
        assert_eq!(OpenSeaError::parse("bad body").kind(), ErrorKind::Parse);
        assert_eq!(
            OpenSeaError::InvalidNetwork {
                network: "solana".to_string()
            }
            .kind(),
            ErrorKind::Config
        );
    }
}
