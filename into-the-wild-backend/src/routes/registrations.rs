use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use into_the_wild_registration::model::{Registration, RegistrationForm};
use into_the_wild_registration::payment::PaymentProofUpload;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub indemnity_accepted: bool,
    pub registrant_name: String,
    pub registrant_phone: String,
    #[serde(default)]
    pub is_driver: bool,
    #[serde(default)]
    pub offered_seats: Option<i32>,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(trek_id): Path<i32>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    if payload.offered_seats.is_some_and(|seats| seats < 0) {
        return Err(ApiError::Validation(
            "offered seats cannot be negative".to_owned(),
        ));
    }
    let form = RegistrationForm {
        indemnity_accepted: payload.indemnity_accepted,
        registrant_name: payload.registrant_name,
        registrant_phone: payload.registrant_phone,
        is_driver: payload.is_driver,
        offered_seats: payload.offered_seats,
    };
    let registration = state.registrations.register(user, trek_id, form).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(registration_id): Path<i32>,
) -> Result<Json<Registration>, ApiError> {
    Ok(Json(
        state.registrations.registration(user, registration_id).await?,
    ))
}

pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(registration_id): Path<i32>,
) -> Result<Json<Registration>, ApiError> {
    Ok(Json(
        state.registrations.cancel(user, registration_id).await?,
    ))
}

pub async fn upload_payment_proof(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(registration_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<Registration>, ApiError> {
    let mut file_name = None;
    let mut bytes = None;
    let mut payer_name = String::new();
    let mut payer_phone = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::Validation(format!("malformed multipart body: {error}")))?
    {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("file") => {
                file_name = field.file_name().map(ToOwned::to_owned);
                bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|error| {
                            ApiError::Validation(format!("failed to read file field: {error}"))
                        })?
                        .to_vec(),
                );
            }
            Some("payer_name") => {
                payer_name = field.text().await.map_err(|error| {
                    ApiError::Validation(format!("failed to read payer_name: {error}"))
                })?;
            }
            Some("payer_phone") => {
                payer_phone = field.text().await.map_err(|error| {
                    ApiError::Validation(format!("failed to read payer_phone: {error}"))
                })?;
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| ApiError::Validation("a file field is required".to_owned()))?;
    let upload = PaymentProofUpload {
        file_name: file_name.unwrap_or_else(|| "proof".to_owned()),
        bytes,
        payer_name,
        payer_phone,
    };
    Ok(Json(
        state
            .registrations
            .upload_payment_proof(user, registration_id, upload)
            .await?,
    ))
}
