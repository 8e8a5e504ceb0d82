use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use into_the_wild_registration::model::{TentKind, TentRequest};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::AppState;

#[derive(Deserialize)]
pub struct TentRequestPayload {
    pub tent_kind: String,
    pub quantity: i32,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(trek_id): Path<i32>,
    Json(payload): Json<TentRequestPayload>,
) -> Result<(StatusCode, Json<TentRequest>), ApiError> {
    if payload.tent_kind.trim().is_empty() {
        return Err(ApiError::Validation("tent_kind is required".to_owned()));
    }
    if payload.quantity < 1 {
        return Err(ApiError::Validation(
            "quantity must be at least 1".to_owned(),
        ));
    }
    let request = state
        .tents
        .request_tents(user, trek_id, TentKind(payload.tent_kind), payload.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(request_id): Path<i32>,
) -> Result<Json<TentRequest>, ApiError> {
    Ok(Json(state.tents.approve_tent_request(request_id).await?))
}
