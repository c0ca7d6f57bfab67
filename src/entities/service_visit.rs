//! Service visit entity - A field-service event that consumes technician stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a visit
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    /// Scheduled, not started
    #[sea_orm(string_value = "open")]
    Open,
    /// Technician is on site
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Finished (terminal)
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Called off (terminal)
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl VisitStatus {
    /// Whether a visit in this status may move to `next`.
    ///
    /// Open → `InProgress` → Completed, with Cancelled reachable from Open or `InProgress`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::InProgress | Self::Cancelled)
                | (Self::InProgress, Self::Completed | Self::Cancelled)
        )
    }

    /// Completed and Cancelled visits accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Service visit database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_visits")]
pub struct Model {
    /// Unique identifier for the visit
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Technician performing the visit
    pub technician_id: i64,
    /// Client the visit is for
    pub client_id: i64,
    /// When the visit is scheduled
    pub scheduled_at: DateTimeUtc,
    /// Current lifecycle status
    pub status: VisitStatus,
    /// What the visit is about, never empty
    pub description: String,
    /// Optional technician notes
    pub notes: Option<String>,
    /// When the visit was created
    pub created_at: DateTime,
    /// When the visit was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between `ServiceVisit` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each visit is performed by one technician
    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::TechnicianId",
        to = "super::technician::Column::Id"
    )]
    Technician,
    /// Each visit is for one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// One visit has many line items
    #[sea_orm(has_many = "super::visit_line_item::Entity")]
    LineItems,
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::visit_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
