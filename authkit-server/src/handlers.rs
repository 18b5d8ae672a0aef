//! HTTP request handlers for the authkit server
//!
//! All authentication failures collapse into one undifferentiated 401 body;
//! the precise failure kind goes to the log only. `InsufficientRole` is the
//! one distinction safe to expose (403: authenticated but not permitted).

use crate::server::{empty_response, simple_response};
use authkit_core::{
    authorize, AuthError, CredentialStore, MemoryCredentialStore, RevocationRegistry, Role,
    TokenIssuer, TokenKind,
    TokenVerifier, User,
};
use http_body_util::BodyExt;
use hyper::header::AUTHORIZATION;
use hyper::{HeaderMap, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

type BoxBody = http_body_util::Full<bytes::Bytes>;

/// Shared per-process auth state, injected at startup
pub struct AppState {
    pub issuer: TokenIssuer,
    pub verifier: TokenVerifier,
    pub users: Arc<MemoryCredentialStore>,
    pub revocations: Arc<RevocationRegistry>,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    first_name: String,
    last_name: String,
    login: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    login: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoutRequest {
    access_token: String,
    refresh_token: String,
}

/// Login response in the shape clients expect: user summary plus tokens
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    id: u64,
    first_name: String,
    last_name: String,
    login: String,
    role: Role,
    access_token: String,
    refresh_token: String,
}

impl SessionResponse {
    fn new(user: &User, pair: authkit_core::TokenPair) -> Self {
        SessionResponse {
            id: user.id.as_u64(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            login: user.login.clone(),
            role: user.role,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

/// Main request handler
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: SharedState,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    let result = match (method.as_str(), path.as_str()) {
        ("GET", "/health") => handle_health().await,

        ("POST", "/register") => {
            let body = req.collect().await?.to_bytes();
            let (status, body) = register_outcome(&state, &body);
            simple_response(status, body)
        }
        ("POST", "/login") => {
            let body = req.collect().await?.to_bytes();
            let (status, body) = login_outcome(&state, &body);
            simple_response(status, body)
        }
        ("POST", "/refresh") => {
            let body = req.collect().await?.to_bytes();
            let (status, body) = refresh_outcome(&state, &body);
            simple_response(status, body)
        }
        ("POST", "/logout") => {
            let body = req.collect().await?.to_bytes();
            match logout_outcome(&state, &body) {
                (status, Some(body)) => simple_response(status, body),
                (status, None) => empty_response(status),
            }
        }

        ("GET", "/me") => {
            let (status, body) = me_outcome(&state, req.headers());
            simple_response(status, body)
        }
        ("GET", "/admin/stats") => {
            let (status, body) = admin_stats_outcome(&state, req.headers());
            simple_response(status, body)
        }

        _ => simple_response(StatusCode::NOT_FOUND, json!({"error": "Not found"}).to_string()),
    };

    match result {
        Ok(response) => {
            info!("{} {} -> {}", method, path, response.status());
            Ok(response)
        }
        Err(e) => {
            warn!("Handler error for {} {}: {}", method, path, e);
            simple_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Internal server error"}).to_string(),
            )
        }
    }
}

/// Health check handler
async fn handle_health() -> Result<Response<BoxBody>, hyper::Error> {
    simple_response(
        StatusCode::OK,
        json!({
            "status": "healthy",
            "version": "0.1.0",
            "service": "authkit"
        })
        .to_string(),
    )
}

/// Map an auth failure onto its transport-level outcome.
///
/// Every `is_unauthorized` kind yields the same body so clients cannot tell
/// which check failed.
fn error_outcome(err: &AuthError) -> (StatusCode, String) {
    debug!("auth failure: {}", err);

    if err.is_unauthorized() {
        return (
            StatusCode::UNAUTHORIZED,
            json!({"error": "unauthorized"}).to_string(),
        );
    }

    match err {
        AuthError::InsufficientRole => (
            StatusCode::FORBIDDEN,
            json!({"error": "forbidden"}).to_string(),
        ),
        AuthError::StoreUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": "service unavailable"}).to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Internal server error"}).to_string(),
        ),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::Malformed("missing authorization header".to_string()))?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::Malformed("non-ascii authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
        .ok_or_else(|| AuthError::Malformed("expected bearer scheme".to_string()))
}

/// Authenticate a request's bearer token and enforce the required role
fn authenticated(
    state: &AppState,
    headers: &HeaderMap,
    required: Role,
) -> Result<authkit_core::Principal, AuthError> {
    let token = bearer_token(headers)?;
    let principal = state.verifier.verify(&token, TokenKind::Access)?;
    authorize(&principal, required)?;
    Ok(principal)
}

fn register_outcome(state: &AppState, body: &[u8]) -> (StatusCode, String) {
    let request: RegisterRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                json!({"error": "invalid request body"}).to_string(),
            )
        }
    };

    // Self-registration always produces a USER-level account
    match state.users.create(
        &request.first_name,
        &request.last_name,
        &request.login,
        &request.password,
        Role::User,
    ) {
        Ok(Some(user)) => {
            info!("registered user '{}' with id {}", user.login, user.id);
            (
                StatusCode::CREATED,
                json!({
                    "id": user.id.as_u64(),
                    "firstName": user.first_name,
                    "lastName": user.last_name,
                    "login": user.login,
                    "role": user.role,
                })
                .to_string(),
            )
        }
        Ok(None) => (
            StatusCode::CONFLICT,
            json!({"error": "login already taken"}).to_string(),
        ),
        Err(err) => error_outcome(&err),
    }
}

fn login_outcome(state: &AppState, body: &[u8]) -> (StatusCode, String) {
    let request: LoginRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                json!({"error": "invalid request body"}).to_string(),
            )
        }
    };

    let pair = match state.issuer.login(&request.login, &request.password) {
        Ok(pair) => pair,
        Err(err) => return error_outcome(&err),
    };

    // The user was just authenticated, so the lookup only fails if the store
    // went away between the two calls.
    let user = match state.users.find_by_login(&request.login) {
        Ok(Some(user)) => user,
        Ok(None) => return error_outcome(&AuthError::InvalidCredentials),
        Err(err) => return error_outcome(&err),
    };

    let response = SessionResponse::new(&user, pair);
    match serde_json::to_string(&response) {
        Ok(body) => (StatusCode::OK, body),
        Err(err) => error_outcome(&AuthError::from(err)),
    }
}

fn refresh_outcome(state: &AppState, body: &[u8]) -> (StatusCode, String) {
    let request: RefreshRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                json!({"error": "invalid request body"}).to_string(),
            )
        }
    };

    match state.issuer.refresh(&request.refresh_token) {
        Ok(pair) => (
            StatusCode::OK,
            json!({
                "accessToken": pair.access_token,
                "refreshToken": pair.refresh_token,
            })
            .to_string(),
        ),
        Err(err) => error_outcome(&err),
    }
}

fn logout_outcome(state: &AppState, body: &[u8]) -> (StatusCode, Option<String>) {
    let request: LogoutRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Some(json!({"error": "invalid request body"}).to_string()),
            )
        }
    };

    match state
        .issuer
        .logout(&request.access_token, &request.refresh_token)
    {
        Ok(()) => (StatusCode::NO_CONTENT, None),
        Err(err) => {
            let (status, body) = error_outcome(&err);
            (status, Some(body))
        }
    }
}

fn me_outcome(state: &AppState, headers: &HeaderMap) -> (StatusCode, String) {
    match authenticated(state, headers, Role::User) {
        Ok(principal) => (
            StatusCode::OK,
            json!({
                "id": principal.subject_id.as_u64(),
                "role": principal.role,
            })
            .to_string(),
        ),
        Err(err) => error_outcome(&err),
    }
}

fn admin_stats_outcome(state: &AppState, headers: &HeaderMap) -> (StatusCode, String) {
    match authenticated(state, headers, Role::Admin) {
        Ok(_) => (
            StatusCode::OK,
            json!({
                "users": state.users.len(),
                "revocations": state.revocations.len(),
            })
            .to_string(),
        ),
        Err(err) => error_outcome(&err),
    }
}
