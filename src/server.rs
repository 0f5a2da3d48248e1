//! HTTP surface: one grading route with permissive CORS

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use log::{debug, error, info, warn};

use crate::client::Grader;
use crate::config::ServerConfig;
use crate::error::Error;
use crate::request::{ErrorResponse, GradingResponse};

pub const ALLOWED_METHODS: &str = "POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type";

/// Message sent for failures whose detail stays in the server log
pub const GENERIC_FAILURE: &str = "An error occurred while grading the answer on the server";

/// Build the router serving the grading endpoint at `route`
pub fn router(grader: Grader, route: &str) -> Router
{   Router::new()
      .route(
        route,
        post(grade)
          .options(preflight)
          .fallback(method_not_allowed)
      )
      .fallback(not_found)
      .with_state(grader)
      .layer(middleware::from_fn(log_request))
      .layer(SetResponseHeaderLayer::overriding(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*")
      ))
      .layer(SetResponseHeaderLayer::overriding(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS)
      ))
      .layer(SetResponseHeaderLayer::overriding(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS)
      ))
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, grader: Grader)
  -> Result<(), Error>
{   let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
      .await
      .map_err(|e| {
        error!("Failed to bind {}: {}", address, e);
        Error::Other(format!("failed to bind {}: {}", address, e))
      })?;

    info!("Server listening on http://{}{}", address, config.route);

    axum::serve(listener, router(grader, &config.route))
      .with_graceful_shutdown(shutdown_signal())
      .await
      .map_err(|e| Error::Other(format!("server error: {}", e)))
}

async fn shutdown_signal()
{   match tokio::signal::ctrl_c().await
    {   Ok(()) => info!("Shutdown signal received")
      , Err(e) => error!("Failed to listen for shutdown signal: {}", e)
    }
}

async fn grade(
  State(grader): State<Grader>
, body: Result<Bytes, BytesRejection>
) -> Result<Json<GradingResponse>, Error>
{   // Credential first, so the body is never judged by a misconfigured server
    grader.ensure_configured()?;
    let body = body.map_err(|rejection| {
      warn!("Rejected grading body: {}", rejection.body_text());
      if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE
      {   Error::PayloadTooLarge(rejection.body_text())
      } else
      {   Error::InvalidBody(rejection.body_text())
      }
    })?;
    grader.grade_json(&body).await.map(Json)
}

async fn preflight() -> StatusCode
{   StatusCode::OK
}

async fn method_not_allowed() -> Response
{   (
      StatusCode::METHOD_NOT_ALLOWED,
      [(header::ALLOW, ALLOWED_METHODS)],
      Json(ErrorResponse
      {   error: "Method not allowed".to_string()
        , details: None
      })
    ).into_response()
}

async fn not_found() -> Response
{   (
      StatusCode::NOT_FOUND,
      Json(ErrorResponse
      {   error: "Not found".to_string()
        , details: None
      })
    ).into_response()
}

async fn log_request(request: Request, next: Next) -> Response
{   let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    let status = response.status();
    if status.is_server_error()
    {   warn!("{} {} -> {}", method, path, status);
    } else
    {   info!("{} {} -> {}", method, path, status);
    }
    response
}

impl IntoResponse for Error
{   fn into_response(self) -> Response
    {   let (status, body) = match self
        {   Error::MissingField(field) => (
              StatusCode::BAD_REQUEST,
              ErrorResponse
              {   error: "userAnswer and currentQuestion are required".to_string()
                , details: Some(format!("missing field: {}", field))
              }
            )
          , Error::InvalidBody(msg) => (
              StatusCode::BAD_REQUEST,
              ErrorResponse
              {   error: "Invalid request body".to_string()
                , details: Some(msg)
              }
            )
          , Error::PayloadTooLarge(msg) => (
              StatusCode::PAYLOAD_TOO_LARGE,
              ErrorResponse
              {   error: "Request body too large".to_string()
                , details: Some(msg)
              }
            )
          , Error::MissingCredential(_) => (
              StatusCode::INTERNAL_SERVER_ERROR,
              ErrorResponse
              {   error: "Server configuration error".to_string()
                , details: None
              }
            )
          , Error::Provider { status, message, code } => (
              StatusCode::from_u16(status)
                .unwrap_or(StatusCode::BAD_GATEWAY),
              ErrorResponse
              {   error: message
                , details: code
              }
            )
          , other => {
              debug!("Sanitizing error for response: {}", other);
              (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse
                {   error: GENERIC_FAILURE.to_string()
                  , details: None
                }
              )
            }
        };

        (status, Json(body)).into_response()
    }
}
