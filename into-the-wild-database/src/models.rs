use chrono::{DateTime, Utc};
use diesel::prelude::*;
use into_the_wild_registration::model::{
    PaymentStatus, Registration, TentKind, TentRequest, TentRequestStatus, TrekEvent, UserId,
};

use crate::error::DatabaseError;
use crate::schema::{registrations, tent_requests, trek_events};

#[derive(Queryable, Selectable)]
#[diesel(table_name = trek_events)]
pub struct TrekEventRow {
    pub id: i32,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub cost: f64,
    pub requires_id_proof: bool,
}

impl From<TrekEventRow> for TrekEvent {
    fn from(row: TrekEventRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            starts_at: row.starts_at,
            max_participants: row.max_participants,
            cost: row.cost,
            requires_id_proof: row.requires_id_proof,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = registrations)]
pub struct RegistrationRow {
    pub id: i32,
    pub trek_id: i32,
    pub user_id: String,
    pub status: String,
    pub booked_at: DateTime<Utc>,
    pub indemnity_accepted_at: DateTime<Utc>,
    pub payer_name: Option<String>,
    pub payer_phone: Option<String>,
    pub proof_reference: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub is_driver: bool,
    pub offered_seats: Option<i32>,
}

impl RegistrationRow {
    pub fn into_domain(self) -> Result<Registration, DatabaseError> {
        let status =
            PaymentStatus::parse(&self.status).ok_or_else(|| DatabaseError::Corrupt {
                column: "registrations.status",
                value: self.status.clone(),
            })?;
        Ok(Registration {
            id: self.id,
            trek_id: self.trek_id,
            user_id: UserId(self.user_id),
            status,
            booked_at: self.booked_at,
            indemnity_accepted_at: self.indemnity_accepted_at,
            payer_name: self.payer_name,
            payer_phone: self.payer_phone,
            proof_reference: self.proof_reference,
            cancelled_at: self.cancelled_at,
            is_driver: self.is_driver,
            offered_seats: self.offered_seats,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = tent_requests)]
pub struct TentRequestRow {
    pub id: i32,
    pub trek_id: i32,
    pub user_id: String,
    pub tent_kind: String,
    pub quantity: i32,
    pub status: String,
    pub requested_at: DateTime<Utc>,
}

impl TentRequestRow {
    pub fn into_domain(self) -> Result<TentRequest, DatabaseError> {
        let status =
            TentRequestStatus::parse(&self.status).ok_or_else(|| DatabaseError::Corrupt {
                column: "tent_requests.status",
                value: self.status.clone(),
            })?;
        Ok(TentRequest {
            id: self.id,
            trek_id: self.trek_id,
            user_id: UserId(self.user_id),
            kind: TentKind(self.tent_kind),
            quantity: self.quantity,
            status,
            requested_at: self.requested_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = tent_requests)]
pub struct NewTentRequestRow {
    pub trek_id: i32,
    pub user_id: String,
    pub tent_kind: String,
    pub quantity: i32,
    pub status: String,
    pub requested_at: DateTime<Utc>,
}
