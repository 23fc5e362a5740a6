//! Completion provider trait and the remote HTTP implementation.

use crate::config::CompletionSettings;
use crate::error::{Result, RetrieverError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for the remote completion capability: one prompt in, one answer
/// text out, taken verbatim.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model identifier of this provider.
    fn model_id(&self) -> &str;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Remote completion provider speaking the OpenAI-style chat-completions
/// protocol. Calls are blocking round-trips with no retry; failures surface
/// as labeled remote-service errors.
#[derive(Debug, Clone)]
pub struct HttpCompletionProvider {
    client: reqwest::Client,
    settings: CompletionSettings,
}

impl HttpCompletionProvider {
    /// Create a provider for the given endpoint, failing fast on invalid
    /// configuration.
    pub fn new(settings: CompletionSettings) -> Result<Self> {
        if settings.endpoint.trim().is_empty() || settings.model.trim().is_empty() {
            return Err(RetrieverError::config(
                "completion endpoint and model must not be empty",
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            settings,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionsRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut builder = self.client.post(self.completions_url()).json(&request);
        if let Some(api_key) = &self.settings.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RetrieverError::remote_service(format!("completion request failed: {e}")))?
            .error_for_status()
            .map_err(|e| {
                RetrieverError::remote_service(format!("completion service rejected request: {e}"))
            })?;

        let body: ChatCompletionsResponse = response.json().await.map_err(|e| {
            RetrieverError::remote_service(format!("unusable completion response: {e}"))
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RetrieverError::remote_service("completion response had no choices"))
    }

    fn model_id(&self) -> &str {
        &self.settings.model
    }
}
