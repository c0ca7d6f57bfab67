//! Product entity - A catalog item whose general (warehouse) stock is tracked.
//!
//! Products are soft-disabled through `status` and never hard-deleted while technician stock,
//! movement records or visit line items reference them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a product
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Product is in use and shows up in listings
    #[sea_orm(string_value = "active")]
    Active,
    /// Product is retired; its history is preserved
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-assigned unique code (e.g. `"ATM-001"`)
    #[sea_orm(unique)]
    pub code: String,
    /// Display name
    pub name: String,
    /// Catalog category, also drives the code prefix
    pub category: String,
    /// Active or inactive
    pub status: ProductStatus,
    /// Quantity held in the general warehouse, never negative
    pub general_stock_quantity: i64,
    /// Low-stock threshold for the general warehouse
    pub minimum_stock_threshold: i64,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Products are only referenced from other tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
