pub mod gemini;
pub mod perplexity;

pub use gemini::{Extraction, GeminiClient};
pub use perplexity::{PerplexityClient, SearchAnswer};

use thiserror::Error;

/// Failure modes shared by the upstream gateways.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} response did not match the expected shape: {detail}")]
    Format {
        service: &'static str,
        detail: String,
    },
}

impl GatewayError {
    pub fn transport(service: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { service, source }
    }

    pub fn upstream(service: &'static str, status: reqwest::StatusCode, body: String) -> Self {
        Self::Upstream {
            service,
            status: status.as_u16(),
            body,
        }
    }

    pub fn format(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Format {
            service,
            detail: detail.into(),
        }
    }
}
