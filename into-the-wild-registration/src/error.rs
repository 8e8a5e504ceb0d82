use crate::model::IdKind;

/// Opaque failure from a storage backend. Concrete stores flatten their own
/// error types into this at the trait boundary.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Notification delivery failure. Always tolerated, never rolls back the
/// primary mutation.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DeliveryError(pub String);

fn join_kinds(kinds: &[IdKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.0.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything the registration workflow can refuse or fail with. Every
/// check fails closed; the user sees the display message, the logs see
/// [`RegistrationError::code`].
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("you must be signed in to register")]
    AuthRequired,
    #[error("the indemnity declaration must be accepted before registering")]
    IndemnityRequired,
    #[error("registrant name and phone number are required")]
    MissingContactDetails,
    #[error("this trek is not available")]
    TrekNotLoaded,
    #[error("an approved identity proof is required for: {}", join_kinds(.0))]
    MissingApprovedId(Vec<IdKind>),
    #[error("identity requirements could not be verified, please try again")]
    RequirementCheckFailed(#[source] StoreError),
    #[error("this trek is fully booked")]
    TrekFull,
    #[error("you are already registered for this trek")]
    AlreadyRegistered,
    #[error("the requested record does not exist")]
    NotFound,
    #[error("payment proof upload failed: {0}")]
    UploadFailed(String),
    #[error("the record could not be updated: {0}")]
    UpdateFailed(String),
    #[error("tent inventory cannot cover this request")]
    TentsUnavailable,
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl RegistrationError {
    /// Stable code for logs and metrics. Never shown to end users.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::IndemnityRequired => "INDEMNITY_REQUIRED",
            Self::MissingContactDetails => "MISSING_CONTACT_DETAILS",
            Self::TrekNotLoaded => "TREK_NOT_LOADED",
            Self::MissingApprovedId(_) => "MISSING_APPROVED_ID",
            Self::RequirementCheckFailed(_) => "REQUIREMENT_CHECK_FAILED",
            Self::TrekFull => "TREK_FULL",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::NotFound => "NOT_FOUND",
            Self::UploadFailed(_) => "UPLOAD_FAILED",
            Self::UpdateFailed(_) => "UPDATE_FAILED",
            Self::TentsUnavailable => "TENTS_UNAVAILABLE",
            Self::Store(_) => "UNKNOWN_STORE_ERROR",
        }
    }
}
