//! Movement record entity - Immutable audit entry written once per accepted movement.
//!
//! `source` and `destination` hold location tokens: `"general"` for the warehouse or the
//! technician id in decimal. Inbound movements have no source, outbound ones no destination.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of stock movement
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock received into the general warehouse
    #[sea_orm(string_value = "inbound")]
    Inbound,
    /// Stock leaving the general warehouse
    #[sea_orm(string_value = "outbound")]
    Outbound,
    /// Stock moving between the warehouse and technicians, or between technicians
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

/// Movement record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movement_records")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product that moved
    pub product_id: i64,
    /// Quantity moved, always positive
    pub quantity: i64,
    /// Inbound, outbound or transfer
    pub kind: MovementKind,
    /// Location the stock left, if any
    pub source: Option<String>,
    /// Location the stock arrived at, if any
    pub destination: Option<String>,
    /// Free-form note supplied by the caller
    pub note: Option<String>,
    /// Opaque id of the user who requested the movement
    pub performed_by: Option<String>,
    /// When the movement was applied
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between `MovementRecord` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
