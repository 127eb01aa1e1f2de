use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZiaCliError {
    #[error("ZIA API error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("ZIA API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Rate limited by ZIA API")]
    RateLimited,

    #[error("{method} {url} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        method: String,
        url: String,
        attempts: u32,
        last: Box<ZiaCliError>,
    },

    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ZiaCliError {
    /// Status-based failures in the 4xx range, other than rate limiting
    pub fn is_client_error(&self) -> bool {
        matches!(self, ZiaCliError::Api { status, .. } if (400..500).contains(status) && *status != 429)
    }
}

pub type Result<T> = std::result::Result<T, ZiaCliError>;

/// Log a per-item failure and fall back to an empty value so the run continues.
pub fn degrade<T: Default>(result: Result<T>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("{what} unavailable, using empty value: {e}");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrade_keeps_success() {
        let value: Vec<u32> = degrade(Ok(vec![1, 2]), "numbers");
        assert_eq!(value, vec![1, 2]);
    }

    #[test]
    fn test_degrade_substitutes_default() {
        let value: Vec<u32> = degrade(Err(ZiaCliError::RateLimited), "numbers");
        assert!(value.is_empty());
    }

    #[test]
    fn test_client_error_classification() {
        let not_found = ZiaCliError::Api {
            status: 404,
            body: String::new(),
        };
        let server = ZiaCliError::Api {
            status: 503,
            body: String::new(),
        };
        let limited = ZiaCliError::Api {
            status: 429,
            body: String::new(),
        };
        assert!(not_found.is_client_error());
        assert!(!server.is_client_error());
        assert!(!limited.is_client_error());
        assert!(!ZiaCliError::Transport("reset".into()).is_client_error());
    }
}
