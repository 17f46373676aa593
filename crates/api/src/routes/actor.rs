//! Acting user extraction.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::ActorId;

use crate::error::ApiError;

/// Header carrying the id of the authenticated back-office user.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The user performing a write, taken from the [`ACTOR_HEADER`] header.
#[derive(Debug, Clone)]
pub struct Actor(pub ActorId);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACTOR_HEADER} header")))?;
        let id = value
            .to_str()
            .map(str::trim)
            .map_err(|_| ApiError::Unauthorized(format!("invalid {ACTOR_HEADER} header")))?;

        if id.is_empty() {
            return Err(ApiError::Unauthorized(format!("empty {ACTOR_HEADER} header")));
        }
        Ok(Actor(ActorId::from(id)))
    }
}
