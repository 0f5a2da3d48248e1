use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;

use grade_ai::config::ProviderConfig;
use grade_ai::error::Error;
use grade_ai::prompt::build_prompt;
use grade_ai::providers::{CompletionProvider, GeminiClient, GitHubModelsClient};
use grade_ai::{GradingRequest, Provider};

/// What the stub saw of one request
#[derive(Debug, Clone)]
struct Captured
{   path: String
  , headers: HeaderMap
  , body: Value
}

#[derive(Clone)]
struct Stub
{   status: StatusCode
  , reply: &'static str
  , seen: Arc<Mutex<Vec<Captured>>>
}

async fn stub_handler(
  State(stub): State<Stub>
, uri: Uri
, headers: HeaderMap
, body: Bytes
) -> Response
{   stub.seen.lock().unwrap().push(Captured
    {   path: uri.path().to_string()
      , headers
      , body: serde_json::from_slice(&body).unwrap_or(Value::Null)
    });
    (
      stub.status,
      [(header::CONTENT_TYPE, "application/json")],
      stub.reply
    ).into_response()
}

/// Serve a canned reply on an ephemeral port; returns its base URL
async fn spawn_stub(status: StatusCode, reply: &'static str)
  -> (String, Arc<Mutex<Vec<Captured>>>)
{   let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
      .fallback(stub_handler)
      .with_state(Stub { status, reply, seen: seen.clone() });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
      .await
      .unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/base", address), seen)
}

fn config(provider: Provider, endpoint: &str) -> ProviderConfig
{   let mut config = ProviderConfig::for_provider(provider);
    config.endpoint_url = endpoint.to_string();
    config
}

fn sample_prompt() -> grade_ai::prompt::Prompt
{   build_prompt(&GradingRequest::new("徳川幕府", "鎖国を行った幕府は？", "江戸幕府"))
}

// ===== GitHub Models =====

#[tokio::test]
async fn test_github_success_request_shape()
{   let (endpoint, seen) = spawn_stub(
      StatusCode::OK,
      r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"❌ 不正解"},"finish_reason":"stop"}]}"#
    ).await;
    let client = GitHubModelsClient::new(
      &config(Provider::GitHubModels, &endpoint),
      "ghp_test".to_string()
    );

    let text = tokio_test::assert_ok!(client.complete(&sample_prompt()).await);
    assert_eq!(text.as_deref(), Some("❌ 不正解"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let request = &seen[0];
    assert_eq!(request.path, "/base/chat/completions");
    assert_eq!(request.headers["authorization"], "Bearer ghp_test");
    assert_eq!(request.body["model"], "microsoft/Phi-4");
    assert_eq!(request.body["messages"][0]["role"], "system");
    let turns: Vec<&str> = request.body["messages"]
      .as_array()
      .unwrap()
      .iter()
      .skip(1)
      .map(|m| m["content"].as_str().unwrap())
      .collect();
    assert_eq!(turns.len(), 3);
    assert!(turns[0].ends_with("\n徳川幕府"));
    assert!(turns[1].ends_with("\n江戸幕府"));
    assert!(turns[2].ends_with("\n鎖国を行った幕府は？"));
}

#[tokio::test]
async fn test_github_error_maps_status_and_message()
{   let (endpoint, _) = spawn_stub(
      StatusCode::UNAUTHORIZED,
      r#"{"error":{"code":"unauthorized","message":"Bad credentials","details":"Bad credentials"}}"#
    ).await;
    let client = GitHubModelsClient::new(
      &config(Provider::GitHubModels, &endpoint),
      "bad".to_string()
    );

    let err = tokio_test::assert_err!(client.complete(&sample_prompt()).await);
    assert_eq!(err, Error::Provider
    {   status: 401
      , message: "Bad credentials".to_string()
      , code: Some("unauthorized".to_string())
    });
}

#[tokio::test]
async fn test_github_empty_choices_is_no_text()
{   let (endpoint, _) = spawn_stub(StatusCode::OK, r#"{"choices":[]}"#).await;
    let client = GitHubModelsClient::new(
      &config(Provider::GitHubModels, &endpoint),
      "t".to_string()
    );
    let text = tokio_test::assert_ok!(client.complete(&sample_prompt()).await);
    assert_eq!(text, None);
}

#[tokio::test]
async fn test_github_malformed_success_body_is_parse_error()
{   let (endpoint, _) = spawn_stub(StatusCode::OK, "<html>oops</html>").await;
    let client = GitHubModelsClient::new(
      &config(Provider::GitHubModels, &endpoint),
      "t".to_string()
    );
    let err = tokio_test::assert_err!(client.complete(&sample_prompt()).await);
    assert!(matches!(err, Error::ParseError(_)), "{:?}", err);
    assert_eq!(err.status(), 500);
}

#[tokio::test]
async fn test_connection_refused_is_http_error()
{   let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let client = GitHubModelsClient::new(
      &config(Provider::GitHubModels, &format!("http://{}", address)),
      "t".to_string()
    );
    let err = tokio_test::assert_err!(client.complete(&sample_prompt()).await);
    assert!(matches!(err, Error::HttpError(_)), "{:?}", err);
}

// ===== Gemini =====

#[tokio::test]
async fn test_gemini_success_request_shape()
{   let (endpoint, seen) = spawn_stub(
      StatusCode::OK,
      r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"✔ 正解！"},{"text":"江戸幕府です。"}]},"finishReason":"STOP"}]}"#
    ).await;
    let mut config = config(Provider::Gemini, &endpoint);
    config.max_tokens = Some(256);
    let client = GeminiClient::new(&config, "g-key".to_string());

    let text = tokio_test::assert_ok!(client.complete(&sample_prompt()).await);
    assert_eq!(text.as_deref(), Some("✔ 正解！江戸幕府です。"));

    let seen = seen.lock().unwrap();
    let request = &seen[0];
    assert_eq!(request.path, "/base/models/gemini-1.5-flash:generateContent");
    assert_eq!(request.headers["x-goog-api-key"], "g-key");
    assert_eq!(request.body["generationConfig"]["maxOutputTokens"], 256);
    let parts = request.body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert!(parts[0]["text"].as_str().unwrap().ends_with("\n徳川幕府"));
    assert!(request.body["systemInstruction"]["parts"][0]["text"]
      .as_str()
      .unwrap()
      .contains("歴史"));
}

#[tokio::test]
async fn test_gemini_error_maps_status_and_message()
{   let (endpoint, _) = spawn_stub(
      StatusCode::TOO_MANY_REQUESTS,
      r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#
    ).await;
    let client = GeminiClient::new(
      &config(Provider::Gemini, &endpoint),
      "g-key".to_string()
    );

    let err = tokio_test::assert_err!(client.complete(&sample_prompt()).await);
    assert_eq!(err.status(), 429);
    assert_eq!(err, Error::Provider
    {   status: 429
      , message: "Resource has been exhausted".to_string()
      , code: Some("RESOURCE_EXHAUSTED".to_string())
    });
}

#[tokio::test]
async fn test_gemini_blocked_candidate_is_no_text()
{   let (endpoint, _) = spawn_stub(
      StatusCode::OK,
      r#"{"candidates":[{"finishReason":"SAFETY"}]}"#
    ).await;
    let client = GeminiClient::new(
      &config(Provider::Gemini, &endpoint),
      "g-key".to_string()
    );
    let text = tokio_test::assert_ok!(client.complete(&sample_prompt()).await);
    assert_eq!(text, None);
}

// ===== Grader over a real provider =====

#[tokio::test]
async fn test_grader_falls_back_on_empty_provider_output()
{   let (endpoint, seen) = spawn_stub(
      StatusCode::OK,
      r#"{"choices":[{"message":{"content":""}}]}"#
    ).await;
    let config = config(Provider::GitHubModels, &endpoint)
      .with_credential("t");
    let grader = grade_ai::Grader::new(&config);

    let response = tokio_test::assert_ok!(
      grader.grade(&GradingRequest::new("", "q", "a")).await
    );
    assert!(response.fallback);
    assert_eq!(response.advice, "No response");
    assert_eq!(seen.lock().unwrap().len(), 1);
}
