//! Technician entity - A field technician who can hold product stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Technician database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "technicians")]
pub struct Model {
    /// Unique identifier, also used as the technician's location token in movements
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Inactive technicians cannot receive stock or open visits
    pub is_active: bool,
    /// When the technician was registered
    pub created_at: DateTime,
}

/// Technicians are only referenced from other tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
