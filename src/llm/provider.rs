//! Provider-specific configuration and detection.
//!
//! This module handles differences between OpenAI-compatible providers in how
//! the chat completions URL is built.

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// Google Gemini through its OpenAI-compatible endpoint
    Gemini,
    /// Generic OpenAI-compatible provider
    Generic,
}

impl Provider {
    /// Detect provider from base URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use guarded_qa::llm::Provider;
    ///
    /// let provider = Provider::detect_from_url("https://api.openai.com");
    /// assert_eq!(provider, Provider::OpenAI);
    /// ```
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let lower = base_url.to_lowercase();

        if lower.contains("generativelanguage.googleapis.com") {
            Self::Gemini
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Build the chat completions URL for this provider.
    #[must_use]
    pub fn build_chat_url(self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        match self {
            Self::Gemini if base.ends_with("/openai") => format!("{base}/chat/completions"),
            Self::Gemini => format!("{base}/v1beta/openai/chat/completions"),
            Self::OpenAI | Self::Generic if base.ends_with("/v1") => {
                format!("{base}/chat/completions")
            }
            Self::OpenAI | Self::Generic => format!("{base}/v1/chat/completions"),
        }
    }
}
