//! Inventory movement engine - Validates and applies one stock movement atomically.
//!
//! A request is first resolved into a [`MovementPlan`] (pure, no storage access). The plan is
//! then executed inside a single database transaction that re-reads the product and stock rows,
//! applies the debit and credit, and appends exactly one movement record. Any failure drops the
//! transaction, so no partial decrement or increment is ever persisted.

use crate::{
    core::stock::{self, Location},
    entities::{MovementKind, MovementRecord, Technician, movement_record, technician},
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// A request to move stock, as handed over by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    /// Product to move
    pub product_id: i64,
    /// Quantity to move, must be positive
    pub quantity: i64,
    /// Inbound, outbound or transfer
    pub kind: MovementKind,
    /// Source location token; only read for transfers
    #[serde(default)]
    pub source: Option<String>,
    /// Destination location token; only read for transfers
    #[serde(default)]
    pub destination: Option<String>,
    /// Free-form note for the audit trail
    #[serde(default)]
    pub note: Option<String>,
    /// Opaque id of the requesting user
    #[serde(default)]
    pub performed_by: Option<String>,
}

impl MovementRequest {
    /// Stock received into the general warehouse.
    #[must_use]
    pub const fn inbound(product_id: i64, quantity: i64) -> Self {
        Self::new(product_id, quantity, MovementKind::Inbound, None, None)
    }

    /// Stock leaving the general warehouse.
    #[must_use]
    pub const fn outbound(product_id: i64, quantity: i64) -> Self {
        Self::new(product_id, quantity, MovementKind::Outbound, None, None)
    }

    /// Stock moving from `source` to `destination`.
    #[must_use]
    pub fn transfer(
        product_id: i64,
        quantity: i64,
        source: Location,
        destination: Location,
    ) -> Self {
        Self::new(
            product_id,
            quantity,
            MovementKind::Transfer,
            Some(source.to_string()),
            Some(destination.to_string()),
        )
    }

    const fn new(
        product_id: i64,
        quantity: i64,
        kind: MovementKind,
        source: Option<String>,
        destination: Option<String>,
    ) -> Self {
        Self {
            product_id,
            quantity,
            kind,
            source,
            destination,
            note: None,
            performed_by: None,
        }
    }

    /// Attaches a note to the request.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Records who asked for the movement.
    #[must_use]
    pub fn performed_by(mut self, user_id: impl Into<String>) -> Self {
        self.performed_by = Some(user_id.into());
        self
    }
}

/// What a movement does to the ledger, resolved from kind + endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementPlan {
    /// General stock += quantity
    Inbound,
    /// General stock -= quantity
    Outbound,
    /// General stock -= quantity, technician stock += quantity
    GeneralToTechnician {
        /// Receiving technician
        technician_id: i64,
    },
    /// One technician's stock -= quantity, another's += quantity
    TechnicianToTechnician {
        /// Giving technician
        from: i64,
        /// Receiving technician
        to: i64,
    },
    /// Technician stock -= quantity, general stock += quantity
    TechnicianToGeneral {
        /// Returning technician
        technician_id: i64,
    },
}

impl MovementPlan {
    /// Resolves the plan for a movement. Endpoints are ignored for inbound and outbound.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for a transfer with a missing or unparseable endpoint,
    /// from the warehouse to itself, or from a technician to themself.
    pub fn resolve(
        kind: MovementKind,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> Result<Self> {
        match kind {
            MovementKind::Inbound => Ok(Self::Inbound),
            MovementKind::Outbound => Ok(Self::Outbound),
            MovementKind::Transfer => {
                let source: Location = source
                    .ok_or_else(|| Error::invalid("transfer requires a source"))?
                    .parse()?;
                let destination: Location = destination
                    .ok_or_else(|| Error::invalid("transfer requires a destination"))?
                    .parse()?;

                match (source, destination) {
                    (Location::General, Location::General) => Err(Error::invalid(
                        "transfer source and destination are both the general warehouse",
                    )),
                    (Location::General, Location::Technician(technician_id)) => {
                        Ok(Self::GeneralToTechnician { technician_id })
                    }
                    (Location::Technician(technician_id), Location::General) => {
                        Ok(Self::TechnicianToGeneral { technician_id })
                    }
                    (Location::Technician(from), Location::Technician(to)) if from == to => Err(
                        Error::invalid(format!("technician {from} cannot transfer to themself")),
                    ),
                    (Location::Technician(from), Location::Technician(to)) => {
                        Ok(Self::TechnicianToTechnician { from, to })
                    }
                }
            }
        }
    }

    /// Kind written to the movement record.
    #[must_use]
    pub const fn kind(self) -> MovementKind {
        match self {
            Self::Inbound => MovementKind::Inbound,
            Self::Outbound => MovementKind::Outbound,
            Self::GeneralToTechnician { .. }
            | Self::TechnicianToTechnician { .. }
            | Self::TechnicianToGeneral { .. } => MovementKind::Transfer,
        }
    }

    /// Location the stock leaves, if any.
    #[must_use]
    pub const fn source(self) -> Option<Location> {
        match self {
            Self::Inbound => None,
            Self::Outbound | Self::GeneralToTechnician { .. } => Some(Location::General),
            Self::TechnicianToTechnician { from: technician_id, .. }
            | Self::TechnicianToGeneral { technician_id } => {
                Some(Location::Technician(technician_id))
            }
        }
    }

    /// Location the stock arrives at, if any.
    #[must_use]
    pub const fn destination(self) -> Option<Location> {
        match self {
            Self::Outbound => None,
            Self::Inbound | Self::TechnicianToGeneral { .. } => Some(Location::General),
            Self::GeneralToTechnician { technician_id }
            | Self::TechnicianToTechnician { to: technician_id, .. } => {
                Some(Location::Technician(technician_id))
            }
        }
    }
}

/// Applies stock movements against the ledger store it was built with.
#[derive(Debug, Clone)]
pub struct MovementEngine {
    db: DatabaseConnection,
}

impl MovementEngine {
    /// Creates an engine over a store handle.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates and applies one movement, returning its audit record.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] for a non-positive quantity or a malformed transfer
    /// - [`Error::NotFound`] for an unknown product or technician
    /// - [`Error::InsufficientStock`] when the source location holds too little
    /// - [`Error::Database`] for storage failures; the transaction is rolled back
    #[instrument(
        skip(self, request),
        fields(product_id = request.product_id, kind = ?request.kind, quantity = request.quantity)
    )]
    pub async fn apply_movement(&self, request: MovementRequest) -> Result<movement_record::Model> {
        stock::ensure_positive(request.quantity)?;
        let plan = MovementPlan::resolve(
            request.kind,
            request.source.as_deref(),
            request.destination.as_deref(),
        )?;
        debug!(?plan, "Resolved movement plan");

        let txn = self.db.begin().await?;
        let record = apply_plan(&txn, plan, &request)
            .await
            .inspect_err(|e| warn!(error = %e, "Movement rejected"))?;
        txn.commit().await?;

        info!(
            record_id = record.id,
            source = ?record.source,
            destination = ?record.destination,
            "Movement applied"
        );
        Ok(record)
    }

    /// Audit trail of a product, newest first.
    pub async fn movements_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<movement_record::Model>> {
        MovementRecord::find()
            .filter(movement_record::Column::ProductId.eq(product_id))
            .order_by_desc(movement_record::Column::Timestamp)
            .order_by_desc(movement_record::Column::Id)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// The latest `limit` movements across all products, newest first.
    pub async fn recent_movements(&self, limit: u64) -> Result<Vec<movement_record::Model>> {
        MovementRecord::find()
            .order_by_desc(movement_record::Column::Timestamp)
            .order_by_desc(movement_record::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }
}

/// Loads a technician inside the transaction; receivers must be active.
async fn require_technician(
    txn: &DatabaseTransaction,
    technician_id: i64,
    must_be_active: bool,
) -> Result<technician::Model> {
    let technician = Technician::find_by_id(technician_id)
        .one(txn)
        .await?
        .ok_or_else(|| Error::not_found("technician", technician_id))?;

    if must_be_active && !technician.is_active {
        return Err(Error::invalid(format!(
            "technician {technician_id} is inactive and cannot receive stock"
        )));
    }
    Ok(technician)
}

async fn apply_plan(
    txn: &DatabaseTransaction,
    plan: MovementPlan,
    request: &MovementRequest,
) -> Result<movement_record::Model> {
    let quantity = request.quantity;
    let product = stock::lock_product(txn, request.product_id).await?;

    match plan {
        MovementPlan::Inbound => {
            stock::credit_general(txn, product.id, quantity).await?;
        }
        MovementPlan::Outbound => {
            stock::debit_general(txn, &product, quantity).await?;
        }
        MovementPlan::GeneralToTechnician { technician_id } => {
            require_technician(txn, technician_id, true).await?;
            stock::debit_general(txn, &product, quantity).await?;
            stock::credit_technician(txn, technician_id, product.id, quantity).await?;
        }
        MovementPlan::TechnicianToTechnician { from, to } => {
            require_technician(txn, from, false).await?;
            require_technician(txn, to, true).await?;
            stock::debit_technician(txn, from, &product, quantity).await?;
            stock::credit_technician(txn, to, product.id, quantity).await?;
        }
        MovementPlan::TechnicianToGeneral { technician_id } => {
            require_technician(txn, technician_id, false).await?;
            stock::debit_technician(txn, technician_id, &product, quantity).await?;
            stock::credit_general(txn, product.id, quantity).await?;
        }
    }

    let note = request
        .note
        .as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string);

    let record = movement_record::ActiveModel {
        product_id: Set(product.id),
        quantity: Set(quantity),
        kind: Set(plan.kind()),
        source: Set(plan.source().map(|l| l.to_string())),
        destination: Set(plan.destination().map(|l| l.to_string())),
        note: Set(note),
        performed_by: Set(request.performed_by.clone()),
        timestamp: Set(chrono::Utc::now()),
        ..Default::default()
    };
    record.insert(txn).await.map_err(Into::into)
}
