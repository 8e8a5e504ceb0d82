use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::count_distinct;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Integer, Nullable, Text};
use diesel_async::RunQueryDsl;
use into_the_wild_registration::error::StoreError;
use into_the_wild_registration::model::{
    IdKind, NewRegistration, NewTentRequest, PaymentStatus, ProofStatus, Registration,
    TentInventoryLevel, TentKind, TentRequest, TentRequestStatus, TrekEvent, UserId,
};
use into_the_wild_registration::store::{
    RegistrationStore, ReserveOutcome, TentStore,
};

use crate::models::{NewTentRequestRow, RegistrationRow, TentRequestRow, TrekEventRow};
use crate::schema::{
    id_proofs, registrations, tent_inventory, tent_requests, trek_events, trek_id_requirements,
};
use crate::Pool;

/// The conditional insert behind [`RegistrationStore::reserve`]: the row is
/// only written while the distinct non-cancelled headcount stays below the
/// capacity bound, and the partial unique index on live (trek, user) pairs
/// swallows duplicate attempts. One statement, one round trip.
const RESERVE_SQL: &str = "\
INSERT INTO registrations \
    (trek_id, user_id, status, booked_at, indemnity_accepted_at, is_driver, offered_seats) \
SELECT $1, $2, 'pending', now(), now(), $3, $4 \
WHERE (SELECT count(DISTINCT user_id) FROM registrations \
       WHERE trek_id = $1 AND status <> 'cancelled') < $5 \
ON CONFLICT (trek_id, user_id) WHERE status <> 'cancelled' DO NOTHING \
RETURNING id";

#[derive(QueryableByName)]
struct ReservedRow {
    #[diesel(sql_type = Integer)]
    id: i32,
}

fn to_store(error: impl std::fmt::Display) -> StoreError {
    StoreError(error.to_string())
}

pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationStore for PgStore {
    async fn trek(&self, trek_id: i32) -> Result<Option<TrekEvent>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let row = trek_events::table
            .find(trek_id)
            .select(TrekEventRow::as_select())
            .first(&mut connection)
            .await
            .optional()
            .map_err(to_store)?;
        Ok(row.map(TrekEvent::from))
    }

    async fn active_registration_count(&self, trek_id: i32) -> Result<i64, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        registrations::table
            .filter(registrations::trek_id.eq(trek_id))
            .filter(registrations::status.ne(PaymentStatus::Cancelled.as_str()))
            .select(count_distinct(registrations::user_id))
            .get_result(&mut connection)
            .await
            .map_err(to_store)
    }

    async fn find_active_registration(
        &self,
        trek_id: i32,
        user: &UserId,
    ) -> Result<Option<Registration>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let row = registrations::table
            .filter(registrations::trek_id.eq(trek_id))
            .filter(registrations::user_id.eq(&user.0))
            .filter(registrations::status.ne(PaymentStatus::Cancelled.as_str()))
            .select(RegistrationRow::as_select())
            .first(&mut connection)
            .await
            .optional()
            .map_err(to_store)?;
        row.map(RegistrationRow::into_domain)
            .transpose()
            .map_err(to_store)
    }

    async fn registration(&self, id: i32) -> Result<Option<Registration>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let row = registrations::table
            .find(id)
            .select(RegistrationRow::as_select())
            .first(&mut connection)
            .await
            .optional()
            .map_err(to_store)?;
        row.map(RegistrationRow::into_domain)
            .transpose()
            .map_err(to_store)
    }

    async fn required_id_kinds(&self, trek_id: i32) -> Result<Vec<IdKind>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let kinds: Vec<String> = trek_id_requirements::table
            .filter(trek_id_requirements::trek_id.eq(trek_id))
            .select(trek_id_requirements::id_kind)
            .load(&mut connection)
            .await
            .map_err(to_store)?;
        Ok(kinds.into_iter().map(IdKind).collect())
    }

    async fn approved_id_kinds(&self, user: &UserId) -> Result<Vec<IdKind>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let kinds: Vec<String> = id_proofs::table
            .filter(id_proofs::user_id.eq(&user.0))
            .filter(id_proofs::status.eq(ProofStatus::Approved.as_str()))
            .select(id_proofs::id_kind)
            .load(&mut connection)
            .await
            .map_err(to_store)?;
        Ok(kinds.into_iter().map(IdKind).collect())
    }

    async fn reserve(
        &self,
        new: NewRegistration,
        capacity: i64,
    ) -> Result<ReserveOutcome, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let inserted = diesel::sql_query(RESERVE_SQL)
            .bind::<Integer, _>(new.trek_id)
            .bind::<Text, _>(&new.user_id.0)
            .bind::<Bool, _>(new.is_driver)
            .bind::<Nullable<Integer>, _>(new.offered_seats)
            .bind::<BigInt, _>(capacity)
            .get_result::<ReservedRow>(&mut connection)
            .await
            .optional()
            .map_err(to_store)?;

        match inserted {
            Some(row) => {
                let registration = self
                    .registration(row.id)
                    .await?
                    .ok_or_else(|| StoreError("reserved registration row missing".to_owned()))?;
                Ok(ReserveOutcome::Registered(registration))
            }
            None => {
                // The statement matched no row; tell a lost duplicate race
                // apart from an exhausted trek.
                if self
                    .find_active_registration(new.trek_id, &new.user_id)
                    .await?
                    .is_some()
                {
                    Ok(ReserveOutcome::Duplicate)
                } else {
                    Ok(ReserveOutcome::Full)
                }
            }
        }
    }

    async fn record_payment_proof(
        &self,
        id: i32,
        reference: &str,
        payer_name: &str,
        payer_phone: &str,
    ) -> Result<Option<Registration>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let row = diesel::update(
            registrations::table
                .filter(registrations::id.eq(id))
                .filter(registrations::status.eq_any([
                    PaymentStatus::Pending.as_str(),
                    PaymentStatus::ProofUploaded.as_str(),
                ])),
        )
        .set((
            registrations::status.eq(PaymentStatus::ProofUploaded.as_str()),
            registrations::proof_reference.eq(reference),
            registrations::payer_name.eq(payer_name),
            registrations::payer_phone.eq(payer_phone),
        ))
        .returning(RegistrationRow::as_returning())
        .get_result(&mut connection)
        .await
        .optional()
        .map_err(to_store)?;
        row.map(RegistrationRow::into_domain)
            .transpose()
            .map_err(to_store)
    }

    async fn cancel(&self, id: i32) -> Result<Option<Registration>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let row = diesel::update(
            registrations::table
                .filter(registrations::id.eq(id))
                .filter(registrations::status.ne(PaymentStatus::Cancelled.as_str())),
        )
        .set((
            registrations::status.eq(PaymentStatus::Cancelled.as_str()),
            registrations::cancelled_at.eq(Some(Utc::now())),
        ))
        .returning(RegistrationRow::as_returning())
        .get_result(&mut connection)
        .await
        .optional()
        .map_err(to_store)?;
        row.map(RegistrationRow::into_domain)
            .transpose()
            .map_err(to_store)
    }
}

#[async_trait]
impl TentStore for PgStore {
    async fn tent_inventory(
        &self,
        trek_id: i32,
        kind: &TentKind,
    ) -> Result<Option<TentInventoryLevel>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let level: Option<(i32, i32)> = tent_inventory::table
            .filter(tent_inventory::trek_id.eq(trek_id))
            .filter(tent_inventory::tent_kind.eq(&kind.0))
            .select((tent_inventory::available, tent_inventory::reserved))
            .first(&mut connection)
            .await
            .optional()
            .map_err(to_store)?;
        Ok(level.map(|(available, reserved)| TentInventoryLevel {
            available,
            reserved,
        }))
    }

    async fn insert_tent_request(&self, new: NewTentRequest) -> Result<TentRequest, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let row: TentRequestRow = diesel::insert_into(tent_requests::table)
            .values(NewTentRequestRow {
                trek_id: new.trek_id,
                user_id: new.user_id.0,
                tent_kind: new.kind.0,
                quantity: new.quantity,
                status: TentRequestStatus::Pending.as_str().to_owned(),
                requested_at: Utc::now(),
            })
            .returning(TentRequestRow::as_returning())
            .get_result(&mut connection)
            .await
            .map_err(to_store)?;
        row.into_domain().map_err(to_store)
    }

    async fn tent_request(&self, id: i32) -> Result<Option<TentRequest>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let row = tent_requests::table
            .find(id)
            .select(TentRequestRow::as_select())
            .first(&mut connection)
            .await
            .optional()
            .map_err(to_store)?;
        row.map(TentRequestRow::into_domain)
            .transpose()
            .map_err(to_store)
    }

    async fn reserve_tents(
        &self,
        trek_id: i32,
        kind: &TentKind,
        quantity: i32,
    ) -> Result<bool, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let affected = diesel::update(
            tent_inventory::table
                .filter(tent_inventory::trek_id.eq(trek_id))
                .filter(tent_inventory::tent_kind.eq(&kind.0))
                .filter(tent_inventory::available.ge(tent_inventory::reserved + quantity)),
        )
        .set(tent_inventory::reserved.eq(tent_inventory::reserved + quantity))
        .execute(&mut connection)
        .await
        .map_err(to_store)?;
        Ok(affected == 1)
    }

    async fn release_tents(
        &self,
        trek_id: i32,
        kind: &TentKind,
        quantity: i32,
    ) -> Result<(), StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        diesel::update(
            tent_inventory::table
                .filter(tent_inventory::trek_id.eq(trek_id))
                .filter(tent_inventory::tent_kind.eq(&kind.0))
                .filter(tent_inventory::reserved.ge(quantity)),
        )
        .set(tent_inventory::reserved.eq(tent_inventory::reserved - quantity))
        .execute(&mut connection)
        .await
        .map_err(to_store)?;
        Ok(())
    }

    async fn mark_tent_request(
        &self,
        id: i32,
        status: TentRequestStatus,
    ) -> Result<Option<TentRequest>, StoreError> {
        let mut connection = self.pool.get().await.map_err(to_store)?;
        let row = diesel::update(
            tent_requests::table
                .filter(tent_requests::id.eq(id))
                .filter(tent_requests::status.eq(TentRequestStatus::Pending.as_str())),
        )
        .set(tent_requests::status.eq(status.as_str()))
        .returning(TentRequestRow::as_returning())
        .get_result(&mut connection)
        .await
        .optional()
        .map_err(to_store)?;
        row.map(TentRequestRow::into_domain)
            .transpose()
            .map_err(to_store)
    }
}
