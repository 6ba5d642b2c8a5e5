//! Attendance recording gated by institution geofence policies.
//!
//! Institution context is passed explicitly through [`Actor`]; nothing here
//! reads ambient global state.

pub mod book;
pub mod error;
pub mod gate;
pub mod store;
pub mod types;

pub use book::{AttendanceBook, AttendanceEntry, AttendanceRecord, AttendanceStatus};
pub use error::{GateError, GateResult, StoreError};
pub use gate::{AttendanceGate, GateDecision, LocationStamp};
pub use store::{InMemoryPolicyStore, PolicyStore};
pub use types::{Actor, InstitutionId, Role, UserId};
