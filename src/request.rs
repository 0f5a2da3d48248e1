//! Wire types for the grading endpoint

use serde::{Deserialize, Serialize};
use crate::error::Error;

/// Advice returned when the provider produced no usable text
pub const FALLBACK_ADVICE: &str = "No response";

/// Quiz question being answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question
{   /// Question text shown to the student
    pub question: String
  , /// Expected correct answer
    pub answer: String
}

/// Validated grading request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingRequest
{   /// What the student typed, possibly empty
    pub user_answer: String
  , pub current_question: Question
}

// Everything optional so absence can be reported per field.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGradingRequest
{   #[serde(default)]
    user_answer: Option<String>
  , #[serde(default)]
    current_question: Option<RawQuestion>
}

#[derive(Deserialize)]
struct RawQuestion
{   #[serde(default)]
    question: Option<String>
  , #[serde(default)]
    answer: Option<String>
}

impl GradingRequest
{   pub fn new(
      user_answer: impl Into<String>
    , question: impl Into<String>
    , answer: impl Into<String>
    ) -> Self
    {   GradingRequest
        {   user_answer: user_answer.into()
          , current_question: Question
            {   question: question.into()
              , answer: answer.into()
            }
        }
    }

    /// Decode and validate a JSON request body.
    ///
    /// `userAnswer` may be empty; absent or null fields are rejected.
    pub fn from_json(body: &[u8]) -> Result<Self, Error>
    {   if body.iter().all(u8::is_ascii_whitespace)
        {   return Err(Error::InvalidBody("empty body".to_string()));
        }

        let raw: Option<RawGradingRequest> = serde_json::from_slice(body)
          .map_err(|e| Error::InvalidBody(e.to_string()))?;
        let raw = raw.ok_or(Error::MissingField("userAnswer"))?;

        let user_answer = raw.user_answer
          .ok_or(Error::MissingField("userAnswer"))?;
        let current = raw.current_question
          .ok_or(Error::MissingField("currentQuestion"))?;
        let question = current.question
          .ok_or(Error::MissingField("currentQuestion.question"))?;
        let answer = current.answer
          .ok_or(Error::MissingField("currentQuestion.answer"))?;

        Ok(GradingRequest::new(user_answer, question, answer))
    }
}

/// Successful grading result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingResponse
{   /// Generated explanation
    pub advice: String
  , /// Set when `advice` is the fixed fallback text
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool
}

impl GradingResponse
{   /// Wrap provider output, substituting the fallback for blank text
    pub fn from_completion(text: Option<String>) -> Self
    {   match text
        {   Some(advice) if !advice.trim().is_empty() => GradingResponse
            {   advice
              , fallback: false
            }
          , _ => GradingResponse
            {   advice: FALLBACK_ADVICE.to_string()
              , fallback: true
            }
        }
    }
}

/// Error body returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse
{   /// Human-readable message
    pub error: String
  , /// Extra detail safe to show the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>
}
