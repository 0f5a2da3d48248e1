use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, trace, error};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::prompt::Prompt;
use super::{Completion, CompletionProvider};

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f32
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   #[serde(default)]
    pub message: Option<ResponseMessage>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage
{   #[serde(default)]
    pub content: Option<String>
}

impl ChatResponse
{   /// Content of the first choice
    pub fn first_content(self) -> Completion
    {   self.choices
          .into_iter()
          .next()
          .and_then(|c| c.message)
          .and_then(|m| m.content)
    }
}

// ===== GitHub Models Client =====

/// Client for the GitHub Models inference endpoint
#[derive(Debug, Clone)]
pub struct GitHubModelsClient
{   endpoint: String
  , token: String
  , model: String
  , temperature: f32
  , max_tokens: Option<u32>
  , http_client: reqwest::Client
}

impl GitHubModelsClient
{   pub fn new(config: &ProviderConfig, token: String) -> Self
    {   debug!("Creating GitHubModelsClient for {}", config.endpoint_url);
        GitHubModelsClient
        {   endpoint: config.endpoint_url.trim_end_matches('/').to_string()
          , token
          , model: config.model_name.clone()
          , temperature: config.temperature
          , max_tokens: config.max_tokens
          , http_client: reqwest::Client::new()
        }
    }

    /// System turn first, then one user turn per field
    pub fn build_request(&self, prompt: &Prompt) -> ChatRequest
    {   let mut messages = vec![
          ChatMessage
          {   role: "system".to_string()
            , content: prompt.system.clone()
          }
        ];
        messages.extend(prompt.fields.iter().map(|field| {
          ChatMessage
          {   role: "user".to_string()
            , content: field.render()
          }
        }));

        ChatRequest
        {   model: self.model.clone()
          , messages
          , temperature: self.temperature
          , max_tokens: self.max_tokens
        }
    }
}

#[async_trait]
impl CompletionProvider for GitHubModelsClient
{   async fn complete(&self, prompt: &Prompt)
      -> Result<Completion, Error>
    {   debug!("Sending grading prompt to GitHub Models: {}", self.model);

        let request = self.build_request(prompt);
        trace!("GitHub Models request: {:?}", request);

        let response = self.http_client
          .post(format!("{}/chat/completions", self.endpoint))
          .bearer_auth(&self.token)
          .json(&request)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        trace!("GitHub Models response status: {}", status);

        if !status.is_success()
        {   return Err(super::provider_error(
              crate::Provider::GitHubModels,
              response
            ).await);
        }

        let chat_response: ChatResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            Error::ParseError(e.to_string())
          })?;

        if chat_response.choices.is_empty()
        {   debug!("No choices in response");
        }
        Ok(chat_response.first_content())
    }

    fn model(&self) -> &str
    {   &self.model
    }
}
