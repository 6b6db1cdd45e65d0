//! OpenAI Chat Completions API generator.
//!
//! Posts a single non-streaming request to the provider's chat completions
//! endpoint and returns the first choice's message content.

use super::{AnswerGenerator, LlmError, LlmSettings, SYSTEM_PROMPT};

/// Generator backed by an OpenAI-compatible Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsGenerator {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsGenerator")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .field("provider", &self.settings.provider)
            .finish()
    }
}

impl ChatCompletionsGenerator {
    /// Create a new generator with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn url(&self) -> String {
        self.settings.provider.build_chat_url(&self.settings.base_url)
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for ChatCompletionsGenerator {
    async fn generate(&self, query: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": query },
            ],
        });

        let mut rb = self.http.post(self.url()).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let v: serde_json::Value = resp.json().await?;
        let text = v["choices"][0]["message"]["content"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        tracing::info!(
            name: "llm.answer.generated",
            model = %self.settings.model,
            query_len = query.len(),
            answer_len = text.len(),
            "Answer generated"
        );

        Ok(text.to_string())
    }
}
