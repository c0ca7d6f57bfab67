//! Core business logic - framework-agnostic ledger operations.
//!
//! The engines own a store handle and run each operation as one database transaction; the
//! query facade only reads.

/// Products, technicians and clients
pub mod catalog;
/// Movement engine (inbound, outbound, transfers)
pub mod movement;
/// Read-only views and product code generation
pub mod query;
/// Stock primitives shared by the engines
pub mod stock;
/// Service visit engine
pub mod visit;

pub use movement::{MovementEngine, MovementPlan, MovementRequest};
pub use query::{CodeScheme, InventoryQueries, TechnicianStockLine};
pub use stock::{GENERAL_LOCATION, Location};
pub use visit::{VisitDetails, VisitEngine, VisitItemDetails, VisitLineRequest, VisitRequest};
