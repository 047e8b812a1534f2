//! Middleware for logging requests and responses.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The most request-body bytes the middleware will buffer. Sits above the
/// CSV import upload limit so legitimate uploads pass through.
const MAX_BUFFERED_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level. Password fields in JSON
/// request bodies are redacted before logging. Request bodies over
/// [MAX_BUFFERED_BODY_BYTES] are rejected with a 413 instead of buffered.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) =
        match extract_header_and_body_text_from_request(request, MAX_BUFFERED_BODY_BYTES).await {
            Ok(parts) => parts,
            Err(response) => return response,
        };

    let is_json = headers
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        log_request(&headers, &redact_passwords(&body_text));
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &body_text);

    Response::from_parts(headers, body_text.into())
}

/// Replace the value of any top-level JSON field whose name mentions a
/// password or token with asterisks. Non-JSON text is returned unchanged.
fn redact_passwords(body_text: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(body_text) else {
        return body_text.to_owned();
    };

    if let Some(object) = value.as_object_mut() {
        for (key, field) in object.iter_mut() {
            let key = key.to_lowercase();
            if key.contains("password") || key.contains("token") || key.contains("otp") {
                *field = serde_json::Value::String("********".to_owned());
            }
        }
    }

    value.to_string()
}

async fn extract_header_and_body_text_from_request(
    request: Request,
    limit: usize,
) -> Result<(axum::http::request::Parts, String), Response> {
    let (headers, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let body = Json(json!({
                "success": false,
                "message": "Request body too large.",
            }));
            return Err((StatusCode::PAYLOAD_TOO_LARGE, body).into_response());
        }
    };

    Ok((headers, String::from_utf8_lossy(&body_bytes).to_string()))
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Truncate `body` to at most `limit` bytes, backing off to the nearest
/// character boundary so multibyte text never splits mid-character.
fn truncate_body(body: &str, limit: usize) -> &str {
    if body.len() <= limit {
        return body;
    }

    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {:}...",
            headers.method,
            headers.uri,
            truncate_body(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            headers.method,
            headers.uri
        );
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {:}...",
            headers.status,
            truncate_body(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", headers.status);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LOG_BODY_LENGTH_LIMIT, extract_header_and_body_text_from_request, redact_passwords,
        truncate_body,
    };

    #[test]
    fn password_fields_are_redacted() {
        let body = r#"{"email":"admin@college.edu","password":"hunter2"}"#;

        let redacted = redact_passwords(body);

        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains("admin@college.edu"));
        assert!(redacted.contains("********"));
    }

    #[test]
    fn camel_case_password_fields_are_redacted() {
        let body = r#"{"currentPassword":"old","newPassword":"new"}"#;

        let redacted = redact_passwords(body);

        assert!(!redacted.contains("old"));
        assert!(!redacted.contains("new\""));
    }

    #[test]
    fn non_json_bodies_pass_through() {
        assert_eq!(redact_passwords("plain text"), "plain text");
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        // The rupee sign starts one byte before the limit and is three bytes
        // long, so a naive byte slice would split it.
        let body = format!("{}₹extra", "a".repeat(LOG_BODY_LENGTH_LIMIT - 1));

        let truncated = truncate_body(&body, LOG_BODY_LENGTH_LIMIT);

        assert_eq!(truncated, "a".repeat(LOG_BODY_LENGTH_LIMIT - 1));
    }

    #[test]
    fn short_bodies_are_not_truncated() {
        assert_eq!(truncate_body("short", LOG_BODY_LENGTH_LIMIT), "short");
    }

    #[tokio::test]
    async fn oversized_request_bodies_are_rejected() {
        let request = axum::extract::Request::new(axum::body::Body::from("x".repeat(32)));

        let result = extract_header_and_body_text_from_request(request, 16).await;

        let response = result.err().unwrap();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn bodies_within_the_limit_pass_through() {
        let request = axum::extract::Request::new(axum::body::Body::from("hello"));

        let (_, body_text) = extract_header_and_body_text_from_request(request, 16)
            .await
            .unwrap();

        assert_eq!(body_text, "hello");
    }
}
