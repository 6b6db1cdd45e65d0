//! Network seam between the widget and the answer endpoint.

use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Path of the answer endpoint, relative to the configured origin.
pub const ANSWER_PATH: &str = "/api/answer";

/// Header carrying the client credential.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Why a send attempt did not produce an answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The endpoint answered with a non-2xx status.
    #[error("server rejected request ({status}): {body}")]
    ServerRejected {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The request (or reading its body) did not complete.
    #[error("{0}")]
    TransportFailure(String),
}

/// Posts a query to the answer endpoint and returns the response text.
#[async_trait::async_trait]
pub trait AnswerTransport: Send + Sync {
    async fn post_answer(&self, query: &str) -> Result<String, SendError>;
}

#[derive(Debug, Serialize)]
struct AnswerRequest<'a> {
    user_query: &'a str,
}

/// [`AnswerTransport`] over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    endpoint: Url,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for the server at `base_url` (e.g. `http://127.0.0.1:8000`).
    pub fn new(base_url: impl AsRef<str>, api_key: Option<String>) -> Result<Self, url::ParseError> {
        Self::with_client(base_url, api_key, reqwest::Client::new())
    }

    /// Create a transport with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        api_key: Option<String>,
        http: reqwest::Client,
    ) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(base_url.as_ref())?.join(ANSWER_PATH)?;
        Ok(Self {
            endpoint,
            api_key,
            http,
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl AnswerTransport for HttpTransport {
    async fn post_answer(&self, query: &str) -> Result<String, SendError> {
        // `.json()` sets `Content-Type: application/json`.
        let mut rb = self
            .http
            .post(self.endpoint.clone())
            .json(&AnswerRequest { user_query: query });
        if let Some(key) = &self.api_key {
            rb = rb.header(API_KEY_HEADER, key);
        }

        let response = rb.send().await.map_err(transport_failure)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(SendError::ServerRejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

fn transport_failure(err: reqwest::Error) -> SendError {
    SendError::TransportFailure(err.to_string())
}
