use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header::AUTHORIZATION, request::Parts, Method},
};
use crate::state::AppState;
use crate::config::Config;
use crate::domain::models::identity::{Claims, Identity};
use crate::error::AppError;
use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::{debug, Span};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const CSRF_HEADER: &str = "X-CSRF-Token";

pub struct AuthUser(pub Identity);

enum TokenSource {
    Cookie,
    Bearer,
}

fn find_token(parts: &Parts) -> Option<(String, TokenSource)> {
    if let Some(value) = parts.headers.get(AUTHORIZATION)
        && let Ok(value) = value.to_str()
        && let Some(token) = value.strip_prefix("Bearer ") {
        return Some((token.trim().to_string(), TokenSource::Bearer));
    }
    let cookies = parts.extensions.get::<Cookies>()?;
    let cookie = cookies.get(ACCESS_TOKEN_COOKIE)?;
    Some((cookie.value().to_string(), TokenSource::Cookie))
}

fn decode_claims(config: &Config, token: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key.as_bytes())
        .map_err(|e| AppError::InternalWithMsg(format!("Invalid identity provider key: {}", e)))?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_audience(&[config.auth_audience.as_str()]);
    validation.set_issuer(&[config.auth_issuer.as_str()]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Rejected access token: {}", e);
            AppError::Unauthorized
        })
}

/// Cookie sessions must echo the token's CSRF value on state-changing requests.
fn check_csrf(parts: &Parts, claims: &Claims) -> Result<(), AppError> {
    let method = &parts.method;
    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        return Ok(());
    }
    let header = parts.headers.get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Forbidden("Missing CSRF token".into()))?;
    match &claims.csrf_token {
        Some(expected) if constant_time_eq(expected.as_bytes(), header.as_bytes()) => Ok(()),
        _ => Err(AppError::Forbidden("Invalid CSRF token".into())),
    }
}

/// Resolves the caller, if the request carries any credentials at all.
pub(crate) fn resolve_identity(parts: &Parts, config: &Config) -> Result<Option<Identity>, AppError> {
    let Some((token, source)) = find_token(parts) else {
        return Ok(None);
    };
    let claims = decode_claims(config, &token)?;
    if let TokenSource::Cookie = source {
        check_csrf(parts, &claims)?;
    }
    Ok(Some(Identity { user_id: claims.sub, role: claims.role }))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let identity = resolve_identity(parts, &app_state.config)?
            .ok_or(AppError::Unauthorized)?;

        Span::current().record("user_id", identity.user_id.as_str());

        Ok(AuthUser(identity))
    }
}
