//! Bearer-token verification.
//!
//! Tokens are issued by an external identity provider and signed with the
//! shared `JWT_SECRET` (HS256). This service only verifies them:
//! - When `DEV_MODE=false`, protected endpoints require `Authorization: Bearer <jwt>`
//! - When `DEV_MODE=true`, the caller is taken from `X-Dev-User` / `X-Dev-Email`
//!
//! Every authenticated request refreshes the caller's entry in the user
//! directory so that invitations can find them by email.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation};

use super::routes::AppState;
use crate::ledger::Actor;

pub const DEV_USER_HEADER: &str = "x-dev-user";
pub const DEV_EMAIL_HEADER: &str = "x-dev-email";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct Claims {
    /// Stable user id
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Platform role; `admin` grants the platform-admin bypasses.
    #[serde(default)]
    pub role: Option<String>,
    /// Issued-at unix seconds
    pub iat: i64,
    /// Expiration unix seconds
    pub exp: i64,
}

/// The verified caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            is_admin: self.is_admin,
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            is_admin: claims.role.as_deref() == Some("admin"),
            id: claims.sub,
            email: claims.email,
            name: claims.name.filter(|n| !n.trim().is_empty()),
        }
    }
}

pub(crate) fn verify_jwt(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let validation = Validation::default();
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn dev_user(headers: &HeaderMap) -> AuthUser {
    let id = header(headers, DEV_USER_HEADER).unwrap_or("dev").to_string();
    let email = header(headers, DEV_EMAIL_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}@localhost", id));
    AuthUser {
        id,
        email,
        name: None,
        is_admin: false,
    }
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user = if !state.config.auth.auth_required(state.config.dev_mode) {
        dev_user(req.headers())
    } else {
        // If auth isn't configured, fail closed in non-dev mode.
        let secret = match state.config.auth.jwt_secret.as_deref() {
            Some(s) => s,
            None => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "JWT_SECRET not configured",
                )
                    .into_response();
            }
        };

        let auth_header = req
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .unwrap_or("");

        if token.is_empty() {
            return (StatusCode::UNAUTHORIZED, "Missing Authorization header").into_response();
        }

        match verify_jwt(token, secret) {
            Ok(claims) if !claims.sub.trim().is_empty() => AuthUser::from(claims),
            Ok(_) => return (StatusCode::UNAUTHORIZED, "Token has no subject").into_response(),
            Err(e) => {
                tracing::warn!("Rejected bearer token: {}", e);
                return (StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response();
            }
        }
    };

    if let Err(e) = state.ledger.upsert_profile(&user.actor()).await {
        tracing::warn!("Failed to record profile for {}: {}", user.id, e);
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    req.extensions_mut().insert(user);
    next.run(req).await
}
