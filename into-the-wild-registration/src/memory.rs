//! In-memory store, proof storage and notification sinks. The test suites
//! run the whole workflow against these; they give the same atomic
//! semantics as the Postgres store by doing every check-and-reserve under
//! one lock.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{DeliveryError, StoreError};
use crate::model::{
    IdKind, NewRegistration, NewTentRequest, PaymentStatus, ProofStatus, Registration,
    TentInventoryLevel, TentKind, TentRequest, TentRequestStatus, TrekEvent, UserId,
};
use crate::notify::{Notification, NotificationSink};
use crate::store::{ProofStorage, RegistrationStore, ReserveOutcome, TentStore};

#[derive(Default)]
struct Inner {
    treks: HashMap<i32, TrekEvent>,
    registrations: HashMap<i32, Registration>,
    next_registration_id: i32,
    required_ids: HashMap<i32, Vec<IdKind>>,
    id_proofs: HashMap<(UserId, IdKind), ProofStatus>,
    tent_inventory: HashMap<(i32, TentKind), TentInventoryLevel>,
    tent_requests: HashMap<i32, TentRequest>,
    next_tent_request_id: i32,
}

impl Inner {
    fn live_pair_exists(&self, trek_id: i32, user: &UserId) -> bool {
        self.registrations.values().any(|registration| {
            registration.trek_id == trek_id
                && registration.user_id == *user
                && registration.status.is_live()
        })
    }

    fn distinct_live_users(&self, trek_id: i32) -> i64 {
        let users: HashSet<_> = self
            .registrations
            .values()
            .filter(|registration| registration.trek_id == trek_id && registration.status.is_live())
            .map(|registration| &registration.user_id)
            .collect();
        users.len() as i64
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError("store lock poisoned".to_owned()))
    }

    pub fn insert_trek(&self, trek: TrekEvent) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.treks.insert(trek.id, trek);
        }
    }

    pub fn require_id(&self, trek_id: i32, kind: IdKind) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.required_ids.entry(trek_id).or_default().push(kind);
        }
    }

    pub fn set_id_proof(&self, user: UserId, kind: IdKind, status: ProofStatus) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.id_proofs.insert((user, kind), status);
        }
    }

    pub fn set_tent_inventory(&self, trek_id: i32, kind: TentKind, available: i32) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.tent_inventory.insert(
                (trek_id, kind),
                TentInventoryLevel {
                    available,
                    reserved: 0,
                },
            );
        }
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn trek(&self, trek_id: i32) -> Result<Option<TrekEvent>, StoreError> {
        Ok(self.lock()?.treks.get(&trek_id).cloned())
    }

    async fn active_registration_count(&self, trek_id: i32) -> Result<i64, StoreError> {
        Ok(self.lock()?.distinct_live_users(trek_id))
    }

    async fn find_active_registration(
        &self,
        trek_id: i32,
        user: &UserId,
    ) -> Result<Option<Registration>, StoreError> {
        Ok(self
            .lock()?
            .registrations
            .values()
            .find(|registration| {
                registration.trek_id == trek_id
                    && registration.user_id == *user
                    && registration.status.is_live()
            })
            .cloned())
    }

    async fn registration(&self, id: i32) -> Result<Option<Registration>, StoreError> {
        Ok(self.lock()?.registrations.get(&id).cloned())
    }

    async fn required_id_kinds(&self, trek_id: i32) -> Result<Vec<IdKind>, StoreError> {
        Ok(self
            .lock()?
            .required_ids
            .get(&trek_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn approved_id_kinds(&self, user: &UserId) -> Result<Vec<IdKind>, StoreError> {
        Ok(self
            .lock()?
            .id_proofs
            .iter()
            .filter(|((owner, _), status)| owner == user && **status == ProofStatus::Approved)
            .map(|((_, kind), _)| kind.clone())
            .collect())
    }

    async fn reserve(
        &self,
        new: NewRegistration,
        capacity: i64,
    ) -> Result<ReserveOutcome, StoreError> {
        let mut inner = self.lock()?;
        if inner.live_pair_exists(new.trek_id, &new.user_id) {
            return Ok(ReserveOutcome::Duplicate);
        }
        if inner.distinct_live_users(new.trek_id) >= capacity {
            return Ok(ReserveOutcome::Full);
        }
        inner.next_registration_id += 1;
        let now = Utc::now();
        let registration = Registration {
            id: inner.next_registration_id,
            trek_id: new.trek_id,
            user_id: new.user_id,
            status: PaymentStatus::Pending,
            booked_at: now,
            indemnity_accepted_at: now,
            payer_name: None,
            payer_phone: None,
            proof_reference: None,
            cancelled_at: None,
            is_driver: new.is_driver,
            offered_seats: new.offered_seats,
        };
        inner
            .registrations
            .insert(registration.id, registration.clone());
        Ok(ReserveOutcome::Registered(registration))
    }

    async fn record_payment_proof(
        &self,
        id: i32,
        reference: &str,
        payer_name: &str,
        payer_phone: &str,
    ) -> Result<Option<Registration>, StoreError> {
        let mut inner = self.lock()?;
        let Some(registration) = inner.registrations.get_mut(&id) else {
            return Ok(None);
        };
        if !registration.status.awaits_payment() {
            return Ok(None);
        }
        registration.status = PaymentStatus::ProofUploaded;
        registration.proof_reference = Some(reference.to_owned());
        registration.payer_name = Some(payer_name.to_owned());
        registration.payer_phone = Some(payer_phone.to_owned());
        Ok(Some(registration.clone()))
    }

    async fn cancel(&self, id: i32) -> Result<Option<Registration>, StoreError> {
        let mut inner = self.lock()?;
        let Some(registration) = inner.registrations.get_mut(&id) else {
            return Ok(None);
        };
        if !registration.status.is_live() {
            return Ok(None);
        }
        registration.status = PaymentStatus::Cancelled;
        registration.cancelled_at = Some(Utc::now());
        Ok(Some(registration.clone()))
    }
}

#[async_trait]
impl TentStore for InMemoryStore {
    async fn tent_inventory(
        &self,
        trek_id: i32,
        kind: &TentKind,
    ) -> Result<Option<TentInventoryLevel>, StoreError> {
        Ok(self
            .lock()?
            .tent_inventory
            .get(&(trek_id, kind.clone()))
            .copied())
    }

    async fn insert_tent_request(&self, new: NewTentRequest) -> Result<TentRequest, StoreError> {
        let mut inner = self.lock()?;
        inner.next_tent_request_id += 1;
        let request = TentRequest {
            id: inner.next_tent_request_id,
            trek_id: new.trek_id,
            user_id: new.user_id,
            kind: new.kind,
            quantity: new.quantity,
            status: TentRequestStatus::Pending,
            requested_at: Utc::now(),
        };
        inner.tent_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn tent_request(&self, id: i32) -> Result<Option<TentRequest>, StoreError> {
        Ok(self.lock()?.tent_requests.get(&id).cloned())
    }

    async fn reserve_tents(
        &self,
        trek_id: i32,
        kind: &TentKind,
        quantity: i32,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let Some(level) = inner.tent_inventory.get_mut(&(trek_id, kind.clone())) else {
            return Ok(false);
        };
        if level.available - level.reserved < quantity {
            return Ok(false);
        }
        level.reserved += quantity;
        Ok(true)
    }

    async fn release_tents(
        &self,
        trek_id: i32,
        kind: &TentKind,
        quantity: i32,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if let Some(level) = inner.tent_inventory.get_mut(&(trek_id, kind.clone())) {
            level.reserved = (level.reserved - quantity).max(0);
        }
        Ok(())
    }

    async fn mark_tent_request(
        &self,
        id: i32,
        status: TentRequestStatus,
    ) -> Result<Option<TentRequest>, StoreError> {
        let mut inner = self.lock()?;
        let Some(request) = inner.tent_requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != TentRequestStatus::Pending {
            return Ok(None);
        }
        request.status = status;
        Ok(Some(request.clone()))
    }
}

/// Proof storage backed by a map, for tests that don't want a tempdir.
#[derive(Default)]
pub struct MemoryProofStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    public_base_url: String,
}

impl MemoryProofStore {
    #[must_use]
    pub fn new(public_base_url: &str) -> Self {
        Self {
            objects: Mutex::default(),
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(path).cloned())
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ProofStorage for MemoryProofStore {
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.objects
            .lock()
            .map_err(|_| StoreError("proof store lock poisoned".to_owned()))?
            .insert(path.to_owned(), bytes.to_vec());
        Ok(())
    }

    fn reference_for(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path)
    }
}

/// Sink that records what would have been sent.
#[derive(Default)]
pub struct CollectingSink {
    sent: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSink for CollectingSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .map_err(|_| DeliveryError("sink lock poisoned".to_owned()))?
            .push(notification.clone());
        Ok(())
    }
}

/// Sink that always fails, for asserting delivery is non-critical.
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn deliver(&self, _notification: &Notification) -> Result<(), DeliveryError> {
        Err(DeliveryError("sink unavailable".to_owned()))
    }
}
