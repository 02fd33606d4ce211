use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GatewayError;
use crate::config::PerplexityConfig;

const SERVICE: &str = "Perplexity";
const SYSTEM_PROMPT: &str = "Be precise and concise.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// What the search gateway hands back: the verbatim answer and the source
/// URLs in the engine's own ranking order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchAnswer {
    pub text: String,
    pub citations: Vec<String>,
}

#[derive(Clone)]
pub struct PerplexityClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl PerplexityClient {
    pub fn new(config: &PerplexityConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("aisov/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::with_shared_client(client, config)
    }

    /// Reuses an existing HTTP client for connection pooling.
    pub fn with_shared_client(client: Client, config: &PerplexityConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// One single-turn completion against the chat endpoint. No retry; the
    /// caller decides what to do with a failure.
    pub async fn search(&self, query: &str) -> Result<SearchAnswer, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: query,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GatewayError::transport(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::upstream(SERVICE, status, body));
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::transport(SERVICE, e))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GatewayError::format(SERVICE, "response carried no choices"))?;

        debug!(
            "Search answer: {} chars, {} citations",
            text.len(),
            response.citations.len()
        );

        Ok(SearchAnswer {
            text,
            citations: response.citations,
        })
    }
}
