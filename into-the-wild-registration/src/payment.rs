//! Payment-proof handler: store the file first, then move the row.

use chrono::Utc;
use tracing::warn;

use crate::error::RegistrationError;
use crate::model::{Registration, UserId};
use crate::registrar::RegistrationService;

#[derive(Debug, Clone)]
pub struct PaymentProofUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub payer_name: String,
    pub payer_phone: String,
}

/// Stored object paths keep only characters that are safe in URLs and on
/// every filesystem we deploy to.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "proof".to_owned()
    } else {
        cleaned
    }
}

impl RegistrationService {
    /// Attach a payment proof to a registration awaiting payment.
    ///
    /// The upload happens before any database mutation, so a failed upload
    /// leaves no dangling reference. The reverse failure (row update after
    /// a successful upload) can orphan the stored file; that is tolerated
    /// and logged. Re-uploading replaces the reference on the same row.
    pub async fn upload_payment_proof(
        &self,
        user: Option<UserId>,
        registration_id: i32,
        upload: PaymentProofUpload,
    ) -> Result<Registration, RegistrationError> {
        if upload.bytes.is_empty() {
            return Err(RegistrationError::UploadFailed(
                "no file attached".to_owned(),
            ));
        }
        if upload.payer_name.trim().is_empty() || upload.payer_phone.trim().is_empty() {
            return Err(RegistrationError::MissingContactDetails);
        }

        let registration = self.registration(user, registration_id).await?;
        if !registration.status.awaits_payment() {
            return Err(RegistrationError::UpdateFailed(
                "registration is no longer awaiting payment".to_owned(),
            ));
        }

        let path = format!(
            "{}/{}/{}-{}",
            registration.user_id,
            registration.trek_id,
            Utc::now().timestamp(),
            sanitize_file_name(&upload.file_name)
        );
        self.proofs
            .store(&path, &upload.bytes)
            .await
            .map_err(|error| RegistrationError::UploadFailed(error.to_string()))?;
        let reference = self.proofs.reference_for(&path);

        let updated = self
            .store
            .record_payment_proof(
                registration.id,
                &reference,
                upload.payer_name.trim(),
                upload.payer_phone.trim(),
            )
            .await
            .map_err(|error| {
                warn!(%path, "registration update failed after upload, stored proof is orphaned");
                error
            })?
            .ok_or_else(|| {
                warn!(%path, "registration no longer awaiting payment, stored proof is orphaned");
                RegistrationError::UpdateFailed(
                    "registration is no longer awaiting payment".to_owned(),
                )
            })?;

        self.notifier.payment_proof_received(&updated).await;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_file_name;

    #[test]
    fn file_names_keep_safe_characters() {
        assert_eq!(sanitize_file_name("upi-ref_001.png"), "upi-ref_001.png");
        assert_eq!(sanitize_file_name("my receipt (1).png"), "my-receipt--1-.png");
        assert_eq!(sanitize_file_name(""), "proof");
    }
}
