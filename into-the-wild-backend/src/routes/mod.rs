pub mod registrations;
pub mod tents;
pub mod treks;
