//! Registration writer and cancellation handler.

use std::sync::Arc;

use tracing::info;

use crate::capacity::{self, Availability};
use crate::eligibility;
use crate::error::RegistrationError;
use crate::model::{NewRegistration, Registration, RegistrationForm, TrekEvent, UserId};
use crate::notify::Notifier;
use crate::store::{ProofStorage, RegistrationStore, ReserveOutcome};

#[derive(Clone)]
pub struct RegistrationService {
    pub(crate) store: Arc<dyn RegistrationStore>,
    pub(crate) proofs: Arc<dyn ProofStorage>,
    pub(crate) notifier: Notifier,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        proofs: Arc<dyn ProofStorage>,
        notifier: Notifier,
    ) -> Self {
        Self {
            store,
            proofs,
            notifier,
        }
    }

    pub async fn trek(&self, trek_id: i32) -> Result<TrekEvent, RegistrationError> {
        self.store
            .trek(trek_id)
            .await?
            .ok_or(RegistrationError::TrekNotLoaded)
    }

    pub async fn availability(&self, trek_id: i32) -> Result<Availability, RegistrationError> {
        capacity::availability(self.store.as_ref(), trek_id).await
    }

    /// Create exactly one pending registration for (user, trek).
    ///
    /// The eligibility and capacity gates run first so callers get the
    /// specific refusal, then the write itself re-checks both conditions
    /// atomically at the store: the insert only happens while the
    /// non-cancelled count is below capacity and no live row exists for
    /// the pair, so concurrent attempts cannot oversubscribe the trek.
    pub async fn register(
        &self,
        user: Option<UserId>,
        trek_id: i32,
        form: RegistrationForm,
    ) -> Result<Registration, RegistrationError> {
        let trek = self.store.trek(trek_id).await?;
        let (user, trek) =
            eligibility::check(self.store.as_ref(), user.as_ref(), trek.as_ref(), &form).await?;

        let availability = capacity::for_trek(self.store.as_ref(), trek).await?;
        if !availability.has_space {
            return Err(RegistrationError::TrekFull);
        }

        if self
            .store
            .find_active_registration(trek.id, user)
            .await?
            .is_some()
        {
            return Err(RegistrationError::AlreadyRegistered);
        }

        let new = NewRegistration {
            trek_id: trek.id,
            user_id: user.clone(),
            is_driver: form.is_driver,
            offered_seats: form.offered_seats,
        };
        let outcome = self
            .store
            .reserve(new, capacity::effective_capacity(trek))
            .await?;
        match outcome {
            ReserveOutcome::Registered(registration) => {
                info!(
                    registration = registration.id,
                    trek = trek.id,
                    user = %registration.user_id,
                    "registration created"
                );
                self.notifier.registration_confirmed(user, trek).await;
                Ok(registration)
            }
            ReserveOutcome::Full => Err(RegistrationError::TrekFull),
            ReserveOutcome::Duplicate => Err(RegistrationError::AlreadyRegistered),
        }
    }

    /// Owner-scoped lookup. A registration someone else owns reads as
    /// absent rather than forbidden.
    pub async fn registration(
        &self,
        user: Option<UserId>,
        registration_id: i32,
    ) -> Result<Registration, RegistrationError> {
        let user = user.ok_or(RegistrationError::AuthRequired)?;
        self.store
            .registration(registration_id)
            .await?
            .filter(|registration| registration.user_id == user)
            .ok_or(RegistrationError::NotFound)
    }

    /// Move a live registration to `Cancelled`, releasing its slot. The
    /// slot is freed by exclusion: every capacity count filters cancelled
    /// rows out, nothing is decremented.
    pub async fn cancel(
        &self,
        user: Option<UserId>,
        registration_id: i32,
    ) -> Result<Registration, RegistrationError> {
        let registration = self.registration(user, registration_id).await?;
        let cancelled = self
            .store
            .cancel(registration.id)
            .await?
            .ok_or_else(|| RegistrationError::UpdateFailed("already cancelled".to_owned()))?;
        info!(
            registration = cancelled.id,
            trek = cancelled.trek_id,
            "registration cancelled"
        );
        self.notifier.registration_cancelled(&cancelled).await;
        Ok(cancelled)
    }
}
