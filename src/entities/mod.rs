//! Entity module - Contains all SeaORM entity definitions for the ledger database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod client;
pub mod movement_record;
pub mod product;
pub mod service_visit;
pub mod technician;
pub mod technician_stock;
pub mod visit_line_item;

// Re-export specific types to avoid conflicts
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use movement_record::{
    Column as MovementRecordColumn, Entity as MovementRecord, Model as MovementRecordModel,
    MovementKind,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel, ProductStatus};
pub use service_visit::{
    Column as ServiceVisitColumn, Entity as ServiceVisit, Model as ServiceVisitModel, VisitStatus,
};
pub use technician::{Column as TechnicianColumn, Entity as Technician, Model as TechnicianModel};
pub use technician_stock::{
    Column as TechnicianStockColumn, Entity as TechnicianStock, Model as TechnicianStockModel,
};
pub use visit_line_item::{
    Column as VisitLineItemColumn, Entity as VisitLineItem, Model as VisitLineItemModel,
};
