use axum::extract::{Path, State};
use axum::Json;
use into_the_wild_registration::capacity::Availability;
use into_the_wild_registration::model::TrekEvent;

use crate::error::ApiError;
use crate::AppState;

pub async fn show(
    State(state): State<AppState>,
    Path(trek_id): Path<i32>,
) -> Result<Json<TrekEvent>, ApiError> {
    Ok(Json(state.registrations.trek(trek_id).await?))
}

pub async fn availability(
    State(state): State<AppState>,
    Path(trek_id): Path<i32>,
) -> Result<Json<Availability>, ApiError> {
    Ok(Json(state.registrations.availability(trek_id).await?))
}
