//! Configuration for the grading service and its provider

use std::fmt;
use serde::{Deserialize, Serialize};
use log::{debug, warn};
use crate::error::Error;

/// Sampling temperature used when none is configured
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig
{   /// Interface to bind
    pub host: String
  , /// Port to bind
    pub port: u16
  , /// Path of the grading endpoint
    pub route: String
}

impl Default for ServerConfig
{   fn default() -> Self
    {   ServerConfig
        {   host: "0.0.0.0".to_string()
          , port: 3000
          , route: "/grade-ai".to_string()
        }
    }
}

impl ServerConfig
{   pub fn address(&self) -> String
    {   format!("{}:{}", self.host, self.port)
    }
}

/// Provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// Which provider to talk to
    pub provider: crate::Provider
  , /// API base URL
    pub endpoint_url: String
  , /// API key or token, None when not configured
    pub credential: Option<String>
  , /// Model name
    pub model_name: String
  , /// Temperature for sampling
    pub temperature: f32
  , /// Max tokens to generate
    pub max_tokens: Option<u32>
}

impl ProviderConfig
{   /// Defaults for a provider with no credential
    pub fn for_provider(provider: crate::Provider) -> Self
    {   ProviderConfig
        {   endpoint_url: provider.default_endpoint().to_string()
          , model_name: provider.default_model().to_string()
          , provider
          , credential: None
          , temperature: DEFAULT_TEMPERATURE
          , max_tokens: None
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>)
      -> Self
    {   self.credential = Some(credential.into());
        self
    }
}

impl Default for ProviderConfig
{   fn default() -> Self
    {   ProviderConfig::for_provider(crate::Provider::GitHubModels)
    }
}

// Keeps the credential out of log lines
impl fmt::Debug for ProviderConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ProviderConfig")
          .field("provider", &self.provider)
          .field("endpoint_url", &self.endpoint_url)
          .field(
            "credential",
            &self.credential.as_ref().map(|_| "<redacted>")
          )
          .field("model_name", &self.model_name)
          .field("temperature", &self.temperature)
          .field("max_tokens", &self.max_tokens)
          .finish()
    }
}

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraderConfig
{   pub server: ServerConfig
  , pub provider: ProviderConfig
}

impl GraderConfig
{   /// Load from the process environment, honouring a `.env` file
    pub fn from_env() -> Result<Self, Error>
    {   match dotenvy::dotenv()
        {   Ok(path) => debug!("Loaded environment from {}", path.display())
          , Err(e) if e.not_found() => debug!("No .env file found")
          , Err(e) => warn!("Ignoring unreadable .env file: {}", e)
        }
        GraderConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where F: Fn(&str) -> Option<String>
    {   let var = |key: &str| {
          lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        };

        let server_default = ServerConfig::default();
        let server = ServerConfig
        {   host: var("HOST").unwrap_or(server_default.host)
          , port: parse_var("PORT", var("PORT"))?
              .unwrap_or(server_default.port)
          , route: normalize_route(
              var("GRADE_ROUTE").unwrap_or(server_default.route)
            )?
        };

        let provider = match var("LLM_PROVIDER")
        {   Some(name) => name.parse::<crate::Provider>()?
          , None => crate::Provider::GitHubModels
        };

        let credential = var(provider.credential_var());
        if credential.is_none()
        {   warn!(
              "{} is not set; grading requests will fail until it is",
              provider.credential_var()
            );
        }

        let temperature = parse_var("LLM_TEMPERATURE", var("LLM_TEMPERATURE"))?
          .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature)
        {   return Err(Error::InvalidConfiguration(format!(
              "LLM_TEMPERATURE must be between 0 and 2, got {}",
              temperature
            )));
        }

        let provider = ProviderConfig
        {   endpoint_url: var("LLM_ENDPOINT")
              .unwrap_or_else(|| provider.default_endpoint().to_string())
              .trim_end_matches('/')
              .to_string()
          , model_name: var("LLM_MODEL")
              .unwrap_or_else(|| provider.default_model().to_string())
          , provider
          , credential
          , temperature
          , max_tokens: parse_var("LLM_MAX_TOKENS", var("LLM_MAX_TOKENS"))?
        };

        Ok(GraderConfig { server, provider })
    }
}

fn parse_var<T>(key: &str, value: Option<String>)
  -> Result<Option<T>, Error>
where T: std::str::FromStr
    , T::Err: fmt::Display
{   value
      .map(|v| {
        v.parse::<T>().map_err(|e| {
          Error::InvalidConfiguration(
            format!("{}={:?}: {}", key, v, e)
          )
        })
      })
      .transpose()
}

/// The route is served as a literal path, so router syntax is refused
fn normalize_route(route: String) -> Result<String, Error>
{   if route.chars().any(|c| {
      matches!(c, ':' | '*' | '{' | '}') || c.is_whitespace()
    })
    {   return Err(Error::InvalidConfiguration(format!(
          "GRADE_ROUTE={:?}: must be a literal path without ':', '*', braces or spaces",
          route
        )));
    }
    if route.starts_with('/')
    {   Ok(route)
    } else
    {   Ok(format!("/{}", route))
    }
}
