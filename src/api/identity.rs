use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;

/// Caller identity, read from the `X-User-ID` / `X-Admin` header pair.
/// Authentication proper lives outside this service; the headers are what
/// the gateway hands us.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Option<Uuid>,
    pub is_admin: bool,
}

impl Identity {
    pub fn require_user(&self) -> Result<Uuid, ApiError> {
        self.user_id
            .ok_or_else(|| ApiError::unauthorized("X-User-ID header is required"))
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("administrator access is required"))
        }
    }

    /// A user may only touch their own resources; admins may touch anyone's.
    pub fn authorize_user(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.is_admin || self.user_id == Some(user_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("cannot act on another user's resources"))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = match parts.headers.get("x-user-id") {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| ApiError::unauthorized("X-User-ID header is not valid text"))?;
                Some(
                    Uuid::parse_str(raw)
                        .map_err(|_| ApiError::unauthorized("X-User-ID header is not a uuid"))?,
                )
            }
            None => None,
        };

        let is_admin = parts
            .headers
            .get("x-admin")
            .and_then(|value| value.to_str().ok())
            .map(|raw| raw == "1" || raw.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Identity { user_id, is_admin })
    }
}
