//! Visit line item entity - One product consumed during a service visit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Visit line item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visit_line_items")]
pub struct Model {
    /// Unique identifier for the line item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Visit this item belongs to
    pub visit_id: i64,
    /// Product consumed
    pub product_id: i64,
    /// Quantity consumed, always positive
    pub quantity: i64,
}

/// Defines relationships between `VisitLineItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line item belongs to one visit
    #[sea_orm(
        belongs_to = "super::service_visit::Entity",
        from = "Column::VisitId",
        to = "super::service_visit::Column::Id"
    )]
    ServiceVisit,
    /// Each line item references one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::service_visit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceVisit.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
