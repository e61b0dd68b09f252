use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{LlmConfig, DEFAULT_KEY_FILE, DEFAULT_MODEL};

use super::key::read_api_key;

const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// `KeyFileMissing`, `KeyRead` and `Invocation` are the failures callers
/// handle. `Client` only covers setting up the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key file '{}' not found; provide a valid API key", path.display())]
    KeyFileMissing { path: PathBuf },
    #[error("Failed to read API key from '{}': {source}", path.display())]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Failed to invoke model: {0}")]
    Invocation(#[source] InvocationError),
}

/// Underlying cause of an [`LlmError::Invocation`].
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Response contained no message content")]
    EmptyResponse,
}

/// Chat-completion client. Credentials belong to the instance; nothing
/// process-wide is configured.
pub struct LlmClient {
    api_key: String,
    base_url: Option<String>,
    model: String,
    client: Client,
}

impl fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl LlmClient {
    /// Use `api_key` if given and non-empty, otherwise read it from
    /// `openai_key.txt`. `model` defaults to `gpt-4`.
    pub fn new(api_key: Option<String>, model: Option<String>) -> Result<Self, LlmError> {
        match api_key {
            Some(key) if !key.is_empty() => Self::build(key, model, None, None),
            _ => Self::with_key_file(Path::new(DEFAULT_KEY_FILE), model),
        }
    }

    /// Read the API key from `key_file`.
    pub fn with_key_file(key_file: &Path, model: Option<String>) -> Result<Self, LlmError> {
        let api_key = read_api_key(key_file)?;
        Self::build(api_key, model, None, None)
    }

    /// Construct from config. A non-empty `api_key` wins over `key_file`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => read_api_key(&config.key_file)?,
        };

        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        Self::build(
            api_key,
            Some(config.model.clone()),
            base_url,
            config.timeout_ms.map(Duration::from_millis),
        )
    }

    fn build(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(LlmError::Client)?;

        Ok(Self {
            api_key,
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Switch the model used by later calls. The name is not validated.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Send `prompt` as a single user message and return the trimmed content
    /// of the first choice.
    pub async fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "Invoking chat completion"
        );

        self.call_openai(prompt)
            .await
            .inspect_err(|e| tracing::warn!("Model invocation failed: {e}"))
            .map_err(LlmError::Invocation)
    }

    async fn parse_api_response<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, InvocationError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InvocationError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    async fn call_openai(&self, prompt: &str) -> Result<String, InvocationError> {
        let body = OpenAIRequest {
            model: &self.model,
            messages: vec![OpenAIMessage {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .client
            .post(self.openai_chat_completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: OpenAIResponse = Self::parse_api_response(resp).await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or(InvocationError::EmptyResponse)
    }

    fn openai_chat_completions_url(&self) -> String {
        url_with_v1_path(
            self.base_url.as_deref().unwrap_or(OPENAI_BASE_URL),
            "chat/completions",
        )
    }
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
}

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
}

#[derive(Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
}

fn url_with_v1_path(base_url: &str, suffix: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/{suffix}")
    } else {
        format!("{base}/v1/{suffix}")
    }
}
