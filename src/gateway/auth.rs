//! Gateway middleware chain: credential authentication, self-only
//! authorization for reads, and request logging.
//!
//! Transport authentication (mutual TLS) happens below this layer — a
//! handshake without a CA-signed client certificate never reaches dispatch.
//! The layers here run in order: credentials → authorization → logging →
//! handler.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use super::error::GatewayError;
use super::state::AppState;

pub const USERNAME_HEADER: &str = "x-username";
pub const PASSWORD_HEADER: &str = "x-password";

/// The principal proven by the credential layer, attached to the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// Check `x-username`/`x-password` against the registry. `/register` is the
/// one unauthenticated method (a user cannot have credentials before it).
pub async fn credential_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if request.uri().path() == "/register" {
        return Ok(next.run(request).await);
    }

    let username = header_value(&request, USERNAME_HEADER)?;
    let password = header_value(&request, PASSWORD_HEADER)?;

    let user = state
        .registry
        .get(&username)
        .ok_or(GatewayError::UserNotRegistered)?;
    if user.password != password {
        return Err(GatewayError::InvalidCredentials);
    }

    request.extensions_mut().insert(AuthenticatedUser(username));
    Ok(next.run(request).await)
}

fn header_value(request: &Request, name: &str) -> Result<String, GatewayError> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .ok_or(GatewayError::MissingCredentials)
}

/// For the read endpoints, the `username` query parameter must name the
/// authenticated principal. Cross-user reads never reach a handler, let
/// alone a bank.
pub async fn self_only_reads(request: Request, next: Next) -> Result<Response, GatewayError> {
    let path = request.uri().path();
    if path == "/balance" || path == "/history" {
        let principal = request
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(GatewayError::MissingCredentials)?;

        let targets = username_params(request.uri().query().unwrap_or(""));
        if targets.is_empty() {
            return Err(GatewayError::InvalidArgument(
                "username query parameter is required".to_string(),
            ));
        }
        for target in targets {
            if target != principal.0 {
                return Err(GatewayError::CrossUserAccess {
                    actor: principal.0,
                    target,
                });
            }
        }
    }
    Ok(next.run(request).await)
}

/// Every `username=` value in the query string. Checking all of them closes
/// the duplicate-parameter hole.
fn username_params(query: &str) -> Vec<String> {
    query
        .split('&')
        .filter_map(|kv| kv.strip_prefix("username="))
        .map(|v| v.to_string())
        .collect()
}

/// Innermost layer: records method, path, principal, status and latency for
/// every dispatched request.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let principal = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.0.clone());

    let start = Instant::now();
    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        user = principal.as_deref().unwrap_or("-"),
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_params_finds_all_values() {
        assert_eq!(username_params("username=alice"), vec!["alice"]);
        assert_eq!(
            username_params("username=alice&username=bob"),
            vec!["alice", "bob"]
        );
        assert_eq!(
            username_params("other=x&username=alice"),
            vec!["alice"]
        );
        assert!(username_params("").is_empty());
        assert!(username_params("other=x").is_empty());
    }
}
