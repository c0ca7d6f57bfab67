//! Client entity - The customer a service visit is performed for.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier for the client
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique short code; the synthetic walk-in client uses the configured direct-service code
    #[sea_orm(unique)]
    pub code: String,
    /// Display name
    pub name: String,
    /// When the client was registered
    pub created_at: DateTime,
}

/// Clients are only referenced from other tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
