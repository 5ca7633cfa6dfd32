//! Response mapping shared by all handlers.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::audit::{AuditContext, AuditEntry, Sinks};

/// Body text of the mapped error response. Service error details are never
/// written to the client.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Record a successful call and write `body` as JSON.
///
/// A body that cannot be serialized is reported like a service failure,
/// with status 500.
pub async fn succeed<T: Serialize>(
  sinks: &Sinks,
  ctx: &AuditContext,
  resource: &str,
  action: &str,
  status: StatusCode,
  body: &T,
) -> Response {
  let body = match serde_json::to_value(body) {
    Ok(body) => body,
    Err(e) => {
      return handle_error(sinks, ctx, resource, action, StatusCode::INTERNAL_SERVER_ERROR, &e)
        .await;
    }
  };
  sinks
    .audit(ctx, AuditEntry {
      resource:    resource.to_owned(),
      action:      action.to_owned(),
      success:     true,
      description: String::new(),
    })
    .await;
  (status, Json(body)).into_response()
}

/// Report a failed service call and write the mapped error body.
pub async fn handle_error<E: std::error::Error>(
  sinks: &Sinks,
  ctx: &AuditContext,
  resource: &str,
  action: &str,
  status: StatusCode,
  err: &E,
) -> Response {
  let message = err.to_string();
  sinks.error.write(ctx, &message);
  sinks
    .audit(ctx, AuditEntry {
      resource:    resource.to_owned(),
      action:      action.to_owned(),
      success:     false,
      description: message,
    })
    .await;
  error_response(status)
}

/// 400 with `message` as a plain-text body.
pub fn bad_request(message: &str) -> Response {
  (StatusCode::BAD_REQUEST, message.to_owned()).into_response()
}

pub fn error_response(status: StatusCode) -> Response {
  (status, Json(json!({ "error": INTERNAL_SERVER_ERROR }))).into_response()
}
