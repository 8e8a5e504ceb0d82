//! Capacity gate: non-cancelled headcount against the configured maximum.

use serde::Serialize;

use crate::error::RegistrationError;
use crate::model::TrekEvent;
use crate::store::RegistrationStore;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Availability {
    pub registered: i64,
    pub capacity: i64,
    pub has_space: bool,
}

/// A trek with no maximum set, or a non-positive one, takes no
/// registrations at all.
#[must_use]
pub fn effective_capacity(trek: &TrekEvent) -> i64 {
    trek.max_participants
        .filter(|max| *max > 0)
        .map_or(0, i64::from)
}

pub async fn for_trek(
    store: &dyn RegistrationStore,
    trek: &TrekEvent,
) -> Result<Availability, RegistrationError> {
    let registered = store.active_registration_count(trek.id).await?;
    let capacity = effective_capacity(trek);
    Ok(Availability {
        registered,
        capacity,
        has_space: registered < capacity,
    })
}

pub async fn availability(
    store: &dyn RegistrationStore,
    trek_id: i32,
) -> Result<Availability, RegistrationError> {
    let trek = store
        .trek(trek_id)
        .await?
        .ok_or(RegistrationError::TrekNotLoaded)?;
    for_trek(store, &trek).await
}
