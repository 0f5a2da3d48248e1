use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, trace, error};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::prompt::Prompt;
use super::{Completion, CompletionProvider};

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part
{   #[serde(default)]
    pub text: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>
  , #[serde(default)]
    pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub temperature: f32
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest
{   pub system_instruction: Content
  , pub contents: Vec<Content>
  , pub generation_config: GenerationConfig
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate
{   #[serde(default)]
    pub content: Option<Content>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

impl GenerateContentResponse
{   /// Text parts of the first candidate, joined
    pub fn first_text(self) -> Completion
    {   let content = self.candidates
          .into_iter()
          .next()
          .and_then(|c| c.content)?;
        let text: String = content.parts
          .into_iter()
          .filter_map(|p| p.text)
          .collect();
        Some(text)
    }
}

// ===== Gemini Client =====

/// Client for the Gemini generateContent API
#[derive(Debug, Clone)]
pub struct GeminiClient
{   endpoint: String
  , api_key: String
  , model: String
  , temperature: f32
  , max_tokens: Option<u32>
  , http_client: reqwest::Client
}

impl GeminiClient
{   pub fn new(config: &ProviderConfig, api_key: String) -> Self
    {   debug!("Creating GeminiClient for {}", config.endpoint_url);
        GeminiClient
        {   endpoint: config.endpoint_url.trim_end_matches('/').to_string()
          , api_key
          , model: config.model_name.clone()
          , temperature: config.temperature
          , max_tokens: config.max_tokens
          , http_client: reqwest::Client::new()
        }
    }

    /// One text part per field in a single user turn
    pub fn build_request(&self, prompt: &Prompt) -> GenerateContentRequest
    {   let parts = prompt.fields
          .iter()
          .map(|field| Part { text: Some(field.render()) })
          .collect();

        GenerateContentRequest
        {   system_instruction: Content
            {   role: None
              , parts: vec![Part { text: Some(prompt.system.clone()) }]
            }
          , contents: vec![
              Content
              {   role: Some("user".to_string())
                , parts
              }
            ]
          , generation_config: GenerationConfig
            {   temperature: self.temperature
              , max_output_tokens: self.max_tokens
            }
        }
    }

    fn url(&self) -> String
    {   // Model ids are sometimes configured as "models/<id>"
        let model = self.model.trim_start_matches("models/");
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient
{   async fn complete(&self, prompt: &Prompt)
      -> Result<Completion, Error>
    {   debug!("Sending grading prompt to Gemini: {}", self.model);

        let request = self.build_request(prompt);
        trace!("Gemini request: {:?}", request);

        let response = self.http_client
          .post(self.url())
          .header("x-goog-api-key", &self.api_key)
          .json(&request)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        trace!("Gemini response status: {}", status);

        if !status.is_success()
        {   return Err(super::provider_error(
              crate::Provider::Gemini,
              response
            ).await);
        }

        let generated: GenerateContentResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            Error::ParseError(e.to_string())
          })?;

        if let Some(reason) = generated.candidates
          .first()
          .and_then(|c| c.finish_reason.as_deref())
        {   debug!("Gemini finish reason: {}", reason);
        }
        Ok(generated.first_text())
    }

    fn model(&self) -> &str
    {   &self.model
    }
}
