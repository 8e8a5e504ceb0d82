//! Storage seams of the workflow. The Postgres implementations live in the
//! database crate; `memory` provides the in-memory duals the tests run on.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{
    IdKind, NewRegistration, NewTentRequest, Registration, TentInventoryLevel, TentKind,
    TentRequest, TentRequestStatus, TrekEvent, UserId,
};

/// Result of the atomic check-and-reserve insert.
#[derive(Debug)]
pub enum ReserveOutcome {
    /// The pending row was written while capacity held.
    Registered(Registration),
    /// The conditional insert matched no row because the trek is at capacity.
    Full,
    /// The user already holds a live registration for this trek.
    Duplicate,
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn trek(&self, trek_id: i32) -> Result<Option<TrekEvent>, StoreError>;

    /// Count of distinct users holding a non-cancelled registration.
    async fn active_registration_count(&self, trek_id: i32) -> Result<i64, StoreError>;

    async fn find_active_registration(
        &self,
        trek_id: i32,
        user: &UserId,
    ) -> Result<Option<Registration>, StoreError>;

    async fn registration(&self, id: i32) -> Result<Option<Registration>, StoreError>;

    async fn required_id_kinds(&self, trek_id: i32) -> Result<Vec<IdKind>, StoreError>;

    /// Kinds for which this user holds an *approved* proof.
    async fn approved_id_kinds(&self, user: &UserId) -> Result<Vec<IdKind>, StoreError>;

    /// Insert a pending registration only while the distinct non-cancelled
    /// count stays below `capacity`, rejecting a second live row for the
    /// same (trek, user) pair, all in one atomic operation.
    async fn reserve(
        &self,
        new: NewRegistration,
        capacity: i64,
    ) -> Result<ReserveOutcome, StoreError>;

    /// Attach a proof reference and payer details, moving the row to
    /// `ProofUploaded`. Returns `None` when the row is no longer awaiting
    /// payment (the update is conditional on the current status).
    async fn record_payment_proof(
        &self,
        id: i32,
        reference: &str,
        payer_name: &str,
        payer_phone: &str,
    ) -> Result<Option<Registration>, StoreError>;

    /// Move a live row to `Cancelled`, stamping `cancelled_at`. Returns
    /// `None` when the row was already cancelled.
    async fn cancel(&self, id: i32) -> Result<Option<Registration>, StoreError>;
}

#[async_trait]
pub trait TentStore: Send + Sync {
    async fn tent_inventory(
        &self,
        trek_id: i32,
        kind: &TentKind,
    ) -> Result<Option<TentInventoryLevel>, StoreError>;

    async fn insert_tent_request(&self, new: NewTentRequest) -> Result<TentRequest, StoreError>;

    async fn tent_request(&self, id: i32) -> Result<Option<TentRequest>, StoreError>;

    /// Conditionally take `quantity` tents: increments `reserved` only
    /// while `available - reserved >= quantity`, in one atomic operation.
    /// Returns `false` when inventory cannot cover the request.
    async fn reserve_tents(
        &self,
        trek_id: i32,
        kind: &TentKind,
        quantity: i32,
    ) -> Result<bool, StoreError>;

    /// Compensating release for a reservation whose approval could not be
    /// recorded.
    async fn release_tents(
        &self,
        trek_id: i32,
        kind: &TentKind,
        quantity: i32,
    ) -> Result<(), StoreError>;

    /// Conditionally move a request out of `Pending`. Returns `None` when
    /// the request was already decided.
    async fn mark_tent_request(
        &self,
        id: i32,
        status: TentRequestStatus,
    ) -> Result<Option<TentRequest>, StoreError>;
}

/// Blob storage for uploaded payment proofs.
#[async_trait]
pub trait ProofStorage: Send + Sync {
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Public reference handed back to the client for a stored path.
    fn reference_for(&self, path: &str) -> String;
}
