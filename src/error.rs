use std::fmt;

/// Error type for grading operations
/// Implements Clone so a fake provider can replay it in tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// A required request field is absent or null
    MissingField(&'static str)
  , /// Request body could not be decoded
    InvalidBody(String)
  , /// Request body exceeded the size limit
    PayloadTooLarge(String)
  , /// Provider credential is not configured
    MissingCredential(String)
  , /// Provider returned a structured failure
    Provider
    {   status: u16
      , message: String
      , code: Option<String>
    }
  , /// HTTP transport error
    HttpError(String)
  , /// Failed to parse provider response
    ParseError(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// HTTP status this error is reported with
    pub fn status(&self) -> u16
    {   match self
        {   Error::MissingField(_)
          | Error::InvalidBody(_) => 400
          , Error::PayloadTooLarge(_) => 413
          , Error::Provider { status, .. } => *status
          , _ => 500
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingField(field) => {
              write!(f, "Missing required field: {}", field)
            }
          , Error::InvalidBody(msg) => {
              write!(f, "Invalid request body: {}", msg)
            }
          , Error::PayloadTooLarge(msg) => {
              write!(f, "Request body too large: {}", msg)
            }
          , Error::MissingCredential(var) => {
              write!(f, "Provider credential not set: {}", var)
            }
          , Error::Provider { status, message, .. } => {
              write!(f, "Provider error ({}): {}", status, message)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn provider_status_passes_through()
    {   let err = Error::Provider
        {   status: 429
          , message: "Rate limit".to_string()
          , code: None
        };
        assert_eq!(err.status(), 429);
    }

    #[test]
    fn input_errors_are_bad_request()
    {   assert_eq!(Error::MissingField("userAnswer").status(), 400);
        assert_eq!(Error::InvalidBody("eof".into()).status(), 400);
        assert_eq!(Error::PayloadTooLarge("limit".into()).status(), 413);
        assert_eq!(
          Error::MissingCredential("GITHUB_TOKEN".into()).status(),
          500
        );
        assert_eq!(Error::HttpError("refused".into()).status(), 500);
    }
}
