use std::sync::Arc;
use log::{debug, error, warn};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::prompt::build_prompt;
use crate::providers::CompletionProvider;
use crate::request::{GradingRequest, GradingResponse};

/// Grades answers against one provider.
///
/// Built once at startup and shared by every request. Holds no
/// provider when the credential is missing, in which case every
/// grading call fails with `Error::MissingCredential`.
#[derive(Clone)]
pub struct Grader
{   provider: Option<Arc<dyn CompletionProvider>>
  , credential_var: &'static str
}

impl Grader
{   /// Create a grader from provider configuration
    pub fn new(config: &ProviderConfig) -> Self
    {   Grader
        {   provider: crate::providers::from_config(config)
          , credential_var: config.provider.credential_var()
        }
    }

    /// Create a grader around an existing provider
    pub fn with_provider(provider: Arc<dyn CompletionProvider>) -> Self
    {   Grader
        {   provider: Some(provider)
          , credential_var: "provider credential"
        }
    }

    /// Create a grader that rejects every request
    pub fn unconfigured(credential_var: &'static str) -> Self
    {   Grader
        {   provider: None
          , credential_var
        }
    }

    /// Fail with `Error::MissingCredential` when no provider is held
    pub fn ensure_configured(&self) -> Result<(), Error>
    {   self.provider().map(|_| ())
    }

    fn provider(&self) -> Result<&Arc<dyn CompletionProvider>, Error>
    {   self.provider.as_ref().ok_or_else(|| {
          error!("{} is not configured", self.credential_var);
          Error::MissingCredential(self.credential_var.to_string())
        })
    }

    /// Grade a raw JSON request body
    pub async fn grade_json(&self, body: &[u8])
      -> Result<GradingResponse, Error>
    {   self.ensure_configured()?;
        let request = GradingRequest::from_json(body).map_err(|e| {
          warn!("Rejected grading request: {}", e);
          e
        })?;
        self.grade(&request).await
    }

    /// Build the prompt, call the provider once, normalize the result
    pub async fn grade(&self, request: &GradingRequest)
      -> Result<GradingResponse, Error>
    {   let provider = self.provider()?;
        let prompt = build_prompt(request);
        debug!(
          "Grading answer ({} chars) with {}",
          request.user_answer.chars().count(),
          provider.model()
        );

        let completion = provider.complete(&prompt).await.map_err(|e| {
          error!("Grading failed: {}", e);
          e
        })?;

        let response = GradingResponse::from_completion(completion);
        if response.fallback
        {   warn!("Provider returned no text; sending fallback advice");
        }
        Ok(response)
    }
}
