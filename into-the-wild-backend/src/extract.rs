use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use into_the_wild_registration::model::UserId;

/// Authenticated subject forwarded by the gateway in `x-user-id`.
///
/// The extractor never rejects; whether an operation requires a user is
/// the workflow's decision, so absence travels as `None`.
pub struct CurrentUser(pub Option<UserId>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| UserId(value.to_owned()));
        Ok(Self(user))
    }
}
