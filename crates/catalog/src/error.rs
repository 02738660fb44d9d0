use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request to external API at {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("external API error at {endpoint} (status={status})")]
    Status {
        endpoint: String,
        status: u16,
        body: Option<String>,
    },

    #[error("unexpected response format from external API at {endpoint}")]
    UnexpectedShape { endpoint: String },

    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl CatalogError {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::UnexpectedShape { endpoint }
            | Self::Decode { endpoint, .. } => endpoint,
        }
    }
}
