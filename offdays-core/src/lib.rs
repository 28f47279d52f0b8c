//! Core types and logic for the offdays vacation ledger.
//!
//! This crate provides the ledger subsystem shared by the offdays server:
//! - `Person` / `VacationRecord` state with identity and validation invariants
//! - business-day interval arithmetic
//! - date-indexed occupancy aggregation for the calendar view
//! - best-effort mirroring of bookings into an external calendar
//! - lenient delimited-text roster import

pub mod error;
pub mod heatmap;
pub mod import;
pub mod intervals;
pub mod ledger;
pub mod person;
pub mod remote;
pub mod store;

pub use error::{LedgerError, LedgerResult};
pub use ledger::VacationLedger;
pub use person::{Person, PersonDraft, PersonPatch, VacationBooking, VacationRecord};
