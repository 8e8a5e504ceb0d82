//! Trek registration workflow for the Into The Wild booking platform.
//!
//! Everything that decides whether a booking may happen lives here: the
//! capacity and eligibility gates, the registration writer, the
//! payment-proof and cancellation handlers, and the tent reservation that
//! shares their check-and-reserve discipline. Storage is reached through
//! the traits in [`store`], so the workflow runs identically against
//! Postgres and against the in-memory store the tests use.

pub mod capacity;
pub mod eligibility;
pub mod error;
pub mod memory;
pub mod model;
pub mod notify;
pub mod payment;
pub mod registrar;
pub mod store;
pub mod tents;

pub use error::{RegistrationError, StoreError};
pub use registrar::RegistrationService;
pub use tents::TentService;
