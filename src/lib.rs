pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod prompt;
pub mod client;
pub mod server;
use serde::{Deserialize, Serialize};

/*

grade-ai: a single-endpoint HTTP backend that grades a student's
free-text answer to a history quiz question by asking an LLM
for a verdict and explanation.

POST /grade-ai
  { "userAnswer": "...",
    "currentQuestion": { "question": "...", "answer": "..." } }
  -> 200 { "advice": "..." }

grade-ai/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and provider selection
│   ├── main.rs         # Process startup
│   ├── error.rs        # Error type and HTTP status mapping
│   ├── config.rs       # Environment configuration
│   ├── request.rs      # Wire types for the grading endpoint
│   ├── prompt.rs       # Grading instructions and content
│   ├── client.rs       # Grader: validate, prompt, call, normalize
│   ├── server.rs       # axum router, CORS, error responses
│   └── providers/      # Text generation backends
│       ├── mod.rs
│       ├── github.rs   # GitHub Models (chat completions)
│       └── gemini.rs   # Google Gemini (generateContent)
└── tests/

*/

pub use client::Grader;
pub use config::GraderConfig;
pub use error::Error;
pub use request::{GradingRequest, GradingResponse, Question};

/// Text generation providers the service can grade with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider
{   /// GitHub Models inference (OpenAI-compatible chat completions)
    #[serde(rename = "github")]
    GitHubModels
  , /// Google AI Studio (Gemini generateContent)
    Gemini
}

impl Provider
{   /// Environment variable holding this provider's credential
    pub fn credential_var(&self) -> &'static str
    {   match self
        {   Provider::GitHubModels => "GITHUB_TOKEN"
          , Provider::Gemini => "GEMINI_API_KEY"
        }
    }

    pub fn default_endpoint(&self) -> &'static str
    {   match self
        {   Provider::GitHubModels => "https://models.github.ai/inference"
          , Provider::Gemini
              => "https://generativelanguage.googleapis.com/v1beta"
        }
    }

    pub fn default_model(&self) -> &'static str
    {   match self
        {   Provider::GitHubModels => "microsoft/Phi-4"
          , Provider::Gemini => "gemini-1.5-flash"
        }
    }
}

impl std::fmt::Display for Provider
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   match self
        {   Provider::GitHubModels => write!(f, "github")
          , Provider::Gemini => write!(f, "gemini")
        }
    }
}

impl std::str::FromStr for Provider
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "github" | "github-models" => Ok(Provider::GitHubModels)
          , "gemini" | "google" => Ok(Provider::Gemini)
          , other => Err(Error::InvalidConfiguration(format!(
              "unknown LLM_PROVIDER: {}", other
            )))
        }
    }
}
