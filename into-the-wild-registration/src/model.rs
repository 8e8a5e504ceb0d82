use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated subject, as handed over by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A kind of government-ID document a trek may require, e.g. "aadhaar".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdKind(pub String);

impl std::fmt::Display for IdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payment lifecycle of a registration. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    ProofUploaded,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ProofUploaded => "proof_uploaded",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "proof_uploaded" => Some(Self::ProofUploaded),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// A live registration occupies a capacity slot.
    #[must_use]
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether a payment proof may still be attached or replaced.
    #[must_use]
    pub const fn awaits_payment(self) -> bool {
        matches!(self, Self::Pending | Self::ProofUploaded)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrekEvent {
    pub id: i32,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    /// Unset or non-positive means the trek takes no registrations.
    pub max_participants: Option<i32>,
    pub cost: f64,
    pub requires_id_proof: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub id: i32,
    pub trek_id: i32,
    pub user_id: UserId,
    pub status: PaymentStatus,
    pub booked_at: DateTime<Utc>,
    pub indemnity_accepted_at: DateTime<Utc>,
    pub payer_name: Option<String>,
    pub payer_phone: Option<String>,
    pub proof_reference: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub is_driver: bool,
    pub offered_seats: Option<i32>,
}

/// What the registration writer hands the store; timestamps are set
/// store-side at insert.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub trek_id: i32,
    pub user_id: UserId,
    pub is_driver: bool,
    pub offered_seats: Option<i32>,
}

/// The submitted booking form the eligibility gate judges.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub indemnity_accepted: bool,
    pub registrant_name: String,
    pub registrant_phone: String,
    pub is_driver: bool,
    pub offered_seats: Option<i32>,
}

/// Review state of an uploaded ID document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProofStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TentKind(pub String);

impl std::fmt::Display for TentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TentRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl TentRequestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TentRequest {
    pub id: i32,
    pub trek_id: i32,
    pub user_id: UserId,
    pub kind: TentKind,
    pub quantity: i32,
    pub status: TentRequestStatus,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTentRequest {
    pub trek_id: i32,
    pub user_id: UserId,
    pub kind: TentKind,
    pub quantity: i32,
}

/// Counters for one (trek, tent kind) pair. `available - reserved` is what
/// approvals may still consume.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TentInventoryLevel {
    pub available: i32,
    pub reserved: i32,
}
