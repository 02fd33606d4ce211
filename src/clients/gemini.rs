use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::GatewayError;
use crate::config::GeminiConfig;

const SERVICE: &str = "Gemini";

/// Structured facts extracted from a search answer.
///
/// `rank_position` uses `null` for "not mentioned" and `0` for "mentioned
/// without an explicit ranking"; positive values are explicit ranks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Extraction {
    pub is_visible: bool,
    pub competitors: Vec<String>,
    pub rank_position: Option<i32>,
}

impl Extraction {
    /// A record that is not visible can never carry a positive rank. Models
    /// occasionally emit one anyway; coerce it to the null sentinel before
    /// anything downstream sees it.
    fn normalized(mut self) -> Self {
        if !self.is_visible && self.rank_position.is_some_and(|rank| rank > 0) {
            self.rank_position = None;
        }
        self
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("aisov/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::with_shared_client(client, config)
    }

    /// Reuses an existing HTTP client for connection pooling.
    pub fn with_shared_client(client: Client, config: &GeminiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Asks the extraction model for a visibility verdict on `target`, given
    /// the original query and the search answer. The model output is
    /// constrained by [`response_schema`] and normalized before returning.
    pub async fn extract(
        &self,
        query: &str,
        answer_text: &str,
        target: &str,
    ) -> Result<Extraction, GatewayError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let prompt = build_extraction_prompt(query, answer_text, target);

        let request_body = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseJsonSchema": response_schema()
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GatewayError::transport(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::upstream(SERVICE, status, body));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::transport(SERVICE, e))?;

        let slot = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| GatewayError::format(SERVICE, "response carried no candidates"))?;

        debug!("Extraction output: {}", slot);

        parse_extraction(&slot)
    }
}

/// Parses the structured-output slot into an [`Extraction`].
fn parse_extraction(slot: &str) -> Result<Extraction, GatewayError> {
    serde_json::from_str::<Extraction>(slot)
        .map(Extraction::normalized)
        .map_err(|e| GatewayError::format(SERVICE, e.to_string()))
}

/// The fixed instructional prompt sent alongside the response schema.
fn build_extraction_prompt(query: &str, answer_text: &str, target: &str) -> String {
    format!(
        r#"You are an expert data extractor.

The following text delimited by triple asterisks is a user query sent to an AI search engine:

***
{query}
***

And the following text delimited by triple backticks is the search engine's answer to that query:

```
{answer_text}
```

Your task is to determine whether the target client '{target}' is mentioned in the answer, by following these steps:
Step 1. Check if the target client '{target}' is mentioned in the answer.
Step 2. Extract all the competitors named in the answer.
Step 3. If the target client '{target}' is mentioned, determine its rank position among the competitors extracted, using the following rules:
    - If the target client '{target}' is mentioned and a ranking is explicitly listed in the answer, such as "1. PayPal, 2. Stripe", return the listed position of the target client.
    - If the target client '{target}' is mentioned but no explicit ranking is given, return 0 for rank position.
    - If the target client '{target}' is not mentioned, return null for rank position.

Return your response as a single JSON object strictly following the JSON schema given in this request."#
    )
}

/// JSON schema constraining the structured output. All three fields are
/// required; `rank_position` is nullable.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "is_visible": {
                "type": "boolean",
                "description": "Whether the target client is mentioned in the answer"
            },
            "competitors": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of competitors extracted from the answer."
            },
            "rank_position": {
                "type": ["integer", "null"],
                "description": "Rank position of the target client among the competitors; 0 when mentioned without an explicit ranking, null when not mentioned."
            }
        },
        "required": ["is_visible", "competitors", "rank_position"]
    })
}
