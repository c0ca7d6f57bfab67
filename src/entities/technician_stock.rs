//! Technician stock entity - Quantity of one product checked out to one technician.
//!
//! The composite primary key `(technician_id, product_id)` guarantees at most one row per pair.
//! Rows are removed when their quantity reaches zero, so a missing row means zero.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Technician stock database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "technician_stock")]
pub struct Model {
    /// Technician holding the stock
    #[sea_orm(primary_key, auto_increment = false)]
    pub technician_id: i64,
    /// Product being held
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
    /// Quantity held, always positive for persisted rows
    pub quantity: i64,
    /// When the quantity last changed
    pub updated_at: DateTime,
}

/// Defines relationships between `TechnicianStock` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to one technician
    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::TechnicianId",
        to = "super::technician::Column::Id"
    )]
    Technician,
    /// Each row belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
