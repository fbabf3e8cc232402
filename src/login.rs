use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;

/// Login form data from the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email to check against the configured admin account
    pub email: String,

    /// Password in plaintext (only transmitted, never stored)
    pub password: String,
}

/// An authenticated session.
///
/// Carries the caller's identity and role so data routes can scope their
/// output; the aggregation core itself never sees the session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Email the session was issued to
    pub email: String,

    /// Caller role used for scoping ("admin" for the configured account)
    pub role: String,

    /// Time when the session expires
    pub expires_at: SystemTime,
}

/// Global sessions storage
///
/// Stores all active sessions in a thread-safe map. Sessions are the only
/// state that outlives a request, and they never touch aggregation output.
lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
}

// Constants
const SESSION_COOKIE: &str = "session";
const SESSION_DURATION: u64 = 8 * 60 * 60; // 8 hours in seconds

/// Routes reachable without a session: login/logout themselves, and the cron
/// probe (it carries its own bearer secret).
const PUBLIC_PATHS: [&str; 3] = ["/api/login", "/api/logout", "/api/cron/refresh-data"];

/// Hash a password using Argon2
///
/// Creates a cryptographically secure Argon2id hash, suitable for the
/// `ADMIN_PASSWORD_HASH` configuration value.
///
/// # Arguments
/// * `password` - The plaintext password to hash
///
/// # Returns
/// * `Result<String, String>` - The PHC-format hash or an error
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err("Password hashing failed".to_string()),
    }
}

/// Verify a password against a stored hash
///
/// # Arguments
/// * `password` - The plaintext password to verify
/// * `hash` - The stored PHC-format hash to check against
///
/// # Returns
/// * `Result<bool, String>` - True if the password matches, false if not, or an error
fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err("Invalid password hash format".to_string()),
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

/// Check credentials against the configured admin account. Prefers the
/// Argon2 hash when configured; falls back to plain comparison otherwise.
pub fn verify_credentials(state: &AppState, email: &str, password: &str) -> Result<bool, String> {
    if email != state.config.admin_email {
        return Ok(false);
    }

    if let Some(hash) = &state.config.admin_password_hash {
        return verify_password(password, hash);
    }
    if let Some(expected) = &state.config.admin_password {
        return Ok(password == expected.as_str());
    }

    Err("No admin password configured".to_string())
}

/// Create a new session
///
/// # Arguments
/// * `email` - The email to create a session for
/// * `role` - The caller role recorded on the session
///
/// # Returns
/// * `String` - A unique session ID
pub fn create_session(email: &str, role: &str) -> String {
    let session_id = Uuid::new_v4().to_string();
    let expires_at = SystemTime::now() + Duration::from_secs(SESSION_DURATION);

    let session = Session {
        email: email.to_string(),
        role: role.to_string(),
        expires_at,
    };

    let mut sessions = SESSIONS.write().unwrap();
    sessions.insert(session_id.clone(), session);

    session_id
}

/// Validate a session
///
/// # Arguments
/// * `session_id` - The session ID to validate
///
/// # Returns
/// * `Option<Session>` - The session if valid and unexpired, None otherwise
pub fn validate_session(session_id: &str) -> Option<Session> {
    let sessions = SESSIONS.read().unwrap();

    if let Some(session) = sessions.get(session_id) {
        if session.expires_at > SystemTime::now() {
            return Some(session.clone());
        }
    }

    None
}

/// Remove a session from the store.
pub fn destroy_session(session_id: &str) {
    let mut sessions = SESSIONS.write().unwrap();
    sessions.remove(session_id);
}

/// Handle login requests
///
/// Validates the posted credentials against the configured admin account and
/// issues a session cookie when they match.
///
/// # Arguments
/// * `state` - Application state carrying the configuration
/// * `jar` - Cookie jar for storing the session cookie
/// * `credentials` - JSON body containing the email and password
///
/// # Returns
/// * `Response` - `{ok: true}` with the cookie set, or an error status
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<LoginRequest>,
) -> Response {
    match verify_credentials(&state, &credentials.email, &credentials.password) {
        Ok(true) => {
            let session_id = create_session(&credentials.email, "admin");
            let mut cookie = Cookie::new(SESSION_COOKIE, session_id);
            cookie.set_path("/");
            cookie.set_http_only(true);
            (jar.add(cookie), Json(serde_json::json!({ "ok": true }))).into_response()
        }
        Ok(false) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "ok": false, "error": "Invalid credentials" })),
        )
            .into_response(),
        Err(message) => {
            log::error!("login failed: {message}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "ok": false, "error": "Authentication error" })),
            )
                .into_response()
        }
    }
}

/// Handle logout
///
/// Destroys the caller's session and clears the cookie.
///
/// # Arguments
/// * `jar` - Cookie jar containing the session cookie
///
/// # Returns
/// * `Response` - `{ok: true}` with the cookie cleared
pub async fn handle_logout(jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        destroy_session(cookie.value());
    }

    let mut cleared = Cookie::new(SESSION_COOKIE, "");
    cleared.set_path("/");
    (jar.add(cleared), Json(serde_json::json!({ "ok": true }))).into_response()
}

/// Authentication middleware
///
/// Lets public paths through, validates the session cookie on everything
/// else, and attaches the session to the request for handlers that scope by
/// caller. Data routes answer 401 JSON when unauthenticated, so callers can
/// always tell "not allowed" from "no results".
///
/// # Arguments
/// * `jar` - Cookie jar containing session information
/// * `request` - The incoming request
/// * `next` - Next middleware in the chain
///
/// # Returns
/// * `Response` - Either passes the request through or rejects it
pub async fn require_auth(
    jar: CookieJar,
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let path = request.uri().path();
    if PUBLIC_PATHS.iter().any(|public| path.starts_with(public)) {
        return next.run(request).await;
    }

    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        if let Some(session) = validate_session(session_cookie.value()) {
            request.extensions_mut().insert(session);
            return next.run(request).await;
        }
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "ok": false, "error": "Unauthorized" })),
    )
        .into_response()
}
