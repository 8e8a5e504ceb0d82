//! Tent rental requests and the inventory-consuming approval.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::RegistrationError;
use crate::model::{NewTentRequest, TentKind, TentRequest, TentRequestStatus, UserId};
use crate::notify::Notifier;
use crate::store::{RegistrationStore, TentStore};

#[derive(Clone)]
pub struct TentService {
    store: Arc<dyn TentStore>,
    treks: Arc<dyn RegistrationStore>,
    notifier: Notifier,
}

impl TentService {
    pub fn new(
        store: Arc<dyn TentStore>,
        treks: Arc<dyn RegistrationStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            store,
            treks,
            notifier,
        }
    }

    /// File a pending tent request against a trek.
    pub async fn request_tents(
        &self,
        user: Option<UserId>,
        trek_id: i32,
        kind: TentKind,
        quantity: i32,
    ) -> Result<TentRequest, RegistrationError> {
        let user = user.ok_or(RegistrationError::AuthRequired)?;
        if quantity < 1 {
            return Err(RegistrationError::UpdateFailed(
                "quantity must be at least 1".to_owned(),
            ));
        }
        if self.treks.trek(trek_id).await?.is_none() {
            return Err(RegistrationError::TrekNotLoaded);
        }
        let request = self
            .store
            .insert_tent_request(NewTentRequest {
                trek_id,
                user_id: user,
                kind,
                quantity,
            })
            .await?;
        info!(
            request = request.id,
            trek = request.trek_id,
            quantity = request.quantity,
            "tent request filed"
        );
        Ok(request)
    }

    /// Approve a pending request by consuming inventory.
    ///
    /// The inventory take is a single conditional update, so two approvals
    /// racing for the last tents cannot both succeed; the loser fails
    /// visibly instead of drifting the counters.
    pub async fn approve_tent_request(
        &self,
        request_id: i32,
    ) -> Result<TentRequest, RegistrationError> {
        let request = self
            .store
            .tent_request(request_id)
            .await?
            .ok_or(RegistrationError::NotFound)?;
        if request.status != TentRequestStatus::Pending {
            return Err(RegistrationError::UpdateFailed(
                "tent request is already decided".to_owned(),
            ));
        }

        let reserved = self
            .store
            .reserve_tents(request.trek_id, &request.kind, request.quantity)
            .await?;
        if !reserved {
            return Err(RegistrationError::TentsUnavailable);
        }

        match self
            .store
            .mark_tent_request(request.id, TentRequestStatus::Approved)
            .await
        {
            Ok(Some(approved)) => {
                info!(request = approved.id, trek = approved.trek_id, "tent request approved");
                self.notifier.tent_request_approved(&approved).await;
                Ok(approved)
            }
            Ok(None) => {
                self.release(&request).await;
                Err(RegistrationError::UpdateFailed(
                    "tent request is already decided".to_owned(),
                ))
            }
            Err(store_error) => {
                self.release(&request).await;
                Err(store_error.into())
            }
        }
    }

    /// Compensate a reservation whose approval could not be recorded.
    async fn release(&self, request: &TentRequest) {
        if let Err(release_error) = self
            .store
            .release_tents(request.trek_id, &request.kind, request.quantity)
            .await
        {
            error!(
                request = request.id,
                %release_error,
                "failed to release tent reservation, inventory needs reconciling"
            );
        }
    }
}
