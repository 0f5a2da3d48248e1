//! LLM provider implementations

use std::sync::Arc;
use async_trait::async_trait;
use serde::Deserialize;
use log::{debug, error};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::prompt::Prompt;

pub mod gemini;
pub mod github;

// Re-export for convenience
pub use gemini::GeminiClient;
pub use github::GitHubModelsClient;

/// Text of the first generated candidate, if any
pub type Completion = Option<String>;

/// A text generation backend.
///
/// Implementations are shared read-only across concurrent requests.
#[async_trait]
pub trait CompletionProvider: Send + Sync
{   /// Make exactly one generation call for `prompt`
    async fn complete(&self, prompt: &Prompt)
      -> Result<Completion, Error>;

    /// Model the provider generates with, for logging
    fn model(&self) -> &str;
}

/// Build the configured provider.
///
/// Returns None when no credential is configured.
pub fn from_config(config: &ProviderConfig)
  -> Option<Arc<dyn CompletionProvider>>
{   let credential = config.credential.clone()?;
    debug!(
      "Creating {} provider for model {}",
      config.provider, config.model_name
    );
    let provider: Arc<dyn CompletionProvider> = match config.provider
    {   crate::Provider::GitHubModels => Arc::new(
          GitHubModelsClient::new(config, credential)
        )
      , crate::Provider::Gemini => Arc::new(
          GeminiClient::new(config, credential)
        )
    };
    Some(provider)
}

// Error envelope shared by both APIs:
// { "error": { "code": ..., "message": ..., "status": ... } }
// GitHub Models occasionally sends the message as a bare string.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope
{   error: ErrorBody
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody
{   Detailed
    {   #[serde(default)]
        code: Option<serde_json::Value>
      , #[serde(default)]
        message: Option<String>
      , #[serde(default)]
        status: Option<String>
    }
  , Message(String)
}

/// Turn a non-success response into `Error::Provider`
pub(crate) async fn provider_error(
  provider: crate::Provider
, response: reqwest::Response
) -> Error
{   let status = response.status().as_u16();
    let text = response.text().await
      .unwrap_or_else(|_| "Unknown error".to_string());
    error!("{} API error ({}): {}", provider, status, text);
    parse_error_body(status, &text)
}

pub(crate) fn parse_error_body(status: u16, text: &str) -> Error
{   let (message, code) = match serde_json::from_str::<ErrorEnvelope>(text)
    {   Ok(ErrorEnvelope { error: ErrorBody::Message(message) }) => {
          (Some(message), None)
        }
      , Ok(ErrorEnvelope
        {   error: ErrorBody::Detailed { code, message, status: label }
        }) => {
          let code = match code
          {   Some(serde_json::Value::String(s)) => Some(s)
            , Some(serde_json::Value::Null) | None => label
            , Some(other) => label.or_else(|| Some(other.to_string()))
          };
          (message, code)
        }
      , Err(_) => {
          let trimmed = text.trim();
          ((!trimmed.is_empty()).then(|| trimmed.to_string()), None)
        }
    };

    Error::Provider
    {   status
      , message: message
          .filter(|m| !m.trim().is_empty())
          .unwrap_or_else(|| format!("provider returned status {}", status))
      , code
    }
}
