use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::state::AppState;
use crate::api::extractors::auth::resolve_identity;
use crate::domain::models::identity::Identity;
use crate::error::AppError;
use std::sync::Arc;
use tracing::{debug, Span};

/// Caller identity when present. Guest checkout passes through as `None`.
pub struct MaybeAuthUser(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        match resolve_identity(parts, &app_state.config) {
            Ok(Some(identity)) => {
                Span::current().record("user_id", identity.user_id.as_str());
                Ok(MaybeAuthUser(Some(identity)))
            }
            Ok(None) => Ok(MaybeAuthUser(None)),
            // A stale or malformed token on a public route is treated as a guest.
            Err(AppError::Unauthorized) => {
                debug!("MaybeAuth: invalid token, continuing as guest");
                Ok(MaybeAuthUser(None))
            }
            Err(e) => Err(e),
        }
    }
}
