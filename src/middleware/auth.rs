use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::user::{User, ROLE_SUPER_ADMIN};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username (email local part); the storage key for everything per-student.
    pub sub: String,
    pub email: String,
    pub uid: u64,
    pub name: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_SUPER_ADMIN
    }
}

pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp();
    let claims = Claims {
        sub: user.username(),
        email: user.email.clone(),
        uid: user.id,
        name: user.display_name(),
        role: user.effective_role().to_string(),
        exp: exp.max(0) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Token signing failed: {}", e)))
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({"success": false, "error": code}))).into_response()
}

/// Bearer token from the `Authorization` header, decoded and checked for expiry.
pub fn claims_from_headers(
    headers: &HeaderMap,
    secret: &str,
) -> std::result::Result<Claims, Response> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"));
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid_token"))
}

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match claims_from_headers(req.headers(), &state.config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(response) => response,
    }
}

pub async fn require_admin(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match claims_from_headers(req.headers(), &state.config.jwt_secret) {
        Ok(claims) if claims.is_admin() => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Ok(_) => reject(StatusCode::FORBIDDEN, "forbidden"),
        Err(response) => response,
    }
}

/// For handlers behind `require_auth` that are admin-only.
pub fn ensure_admin(claims: &Claims) -> Result<()> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden("Admin access required".to_string()))
    }
}
