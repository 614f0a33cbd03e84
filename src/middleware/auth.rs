use axum::{
    extract::Request,
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::env;

/// Bearer-token gate for mutating admin routes.
///
/// Read-only requests (GET/HEAD) pass through. Everything else must carry
/// `Authorization: Bearer <token>` where the token appears in the
/// comma-separated `API_TOKENS` environment variable. Tokens must be at
/// least 32 characters of alphanumerics, hyphens, and underscores.
pub async fn require_api_token(headers: HeaderMap, request: Request, next: Next) -> Response {
    if matches!(*request.method(), Method::GET | Method::HEAD) {
        return next.run(request).await;
    }

    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(message) => return error_response(StatusCode::UNAUTHORIZED, message),
    };

    if token.len() < 32
        || !token
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid token format.");
    }

    let valid_tokens: Vec<String> = match env::var("API_TOKENS") {
        Ok(tokens) => tokens
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Err(_) => {
            tracing::error!("API_TOKENS environment variable not set");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication is not configured on the server.",
            );
        }
    };

    if !valid_tokens.iter().any(|t| t == token) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token.");
    }

    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header. Please provide a Bearer token.")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format.")?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or("Authorization header must use the Bearer scheme.")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message
        })
        .to_string(),
    )
        .into_response()
}
