//! Service visit engine - Books field-service visits against technician stock.
//!
//! Creating a visit writes the visit, its line items and the technician stock decrements in one
//! transaction; deleting a visit credits the consumed stock back in one transaction.

use crate::{
    core::{catalog, stock},
    entities::{
        Client, Product, ServiceVisit, Technician, VisitLineItem, VisitStatus, client, product,
        service_visit, visit_line_item,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// One product the technician will consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitLineRequest {
    /// Product consumed
    pub product_id: i64,
    /// Quantity consumed, must be positive
    pub quantity: i64,
}

/// A request to book a service visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRequest {
    /// Technician performing the visit; must exist and be active
    pub technician_id: i64,
    /// Client served; `None` books the visit against the direct-service client
    #[serde(default)]
    pub client_id: Option<i64>,
    /// When the visit takes place
    pub scheduled_at: DateTime<Utc>,
    /// What the visit is about
    pub description: String,
    /// Initial status
    #[serde(default = "default_status")]
    pub status: VisitStatus,
    /// Optional notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Products consumed; at least one
    pub line_items: Vec<VisitLineRequest>,
}

const fn default_status() -> VisitStatus {
    VisitStatus::Open
}

/// A line item with its product resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitItemDetails {
    /// The stored line item
    pub line: visit_line_item::Model,
    /// Product the line item consumed
    pub product: product::Model,
}

/// A visit with its line items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitDetails {
    /// The stored visit
    pub visit: service_visit::Model,
    /// Line items in creation order
    pub items: Vec<VisitItemDetails>,
}

/// Creates, updates and deletes service visits against the ledger store it was built with.
#[derive(Debug, Clone)]
pub struct VisitEngine {
    db: DatabaseConnection,
    direct_service_client: String,
}

impl VisitEngine {
    /// Creates an engine; visits without a client are booked against `direct_service_client`.
    #[must_use]
    pub fn new(db: DatabaseConnection, direct_service_client: impl Into<String>) -> Self {
        Self {
            db,
            direct_service_client: direct_service_client.into(),
        }
    }

    /// Books a visit and debits the consumed stock from the technician.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] for an empty description, no line items, a non-positive
    ///   quantity or an inactive technician
    /// - [`Error::NotFound`] for an unknown technician, client or product
    /// - [`Error::InsufficientStock`] if the technician holds less than requested of any product;
    ///   nothing is written in that case
    #[instrument(
        skip(self, request),
        fields(technician_id = request.technician_id, lines = request.line_items.len())
    )]
    pub async fn create_visit(&self, request: VisitRequest) -> Result<VisitDetails> {
        validate_request(&request)?;

        let txn = self.db.begin().await?;
        let details = self
            .create_in(&txn, request)
            .await
            .inspect_err(|e| warn!(error = %e, "Visit rejected"))?;
        txn.commit().await?;

        info!(visit_id = details.visit.id, "Visit created");
        Ok(details)
    }

    async fn create_in(
        &self,
        txn: &DatabaseTransaction,
        request: VisitRequest,
    ) -> Result<VisitDetails> {
        let technician = Technician::find_by_id(request.technician_id)
            .one(txn)
            .await?
            .ok_or_else(|| Error::not_found("technician", request.technician_id))?;
        if !technician.is_active {
            return Err(Error::invalid(format!(
                "technician {} is inactive",
                technician.id
            )));
        }

        // Same product on several lines is checked and debited as one total
        let mut totals: BTreeMap<i64, i64> = BTreeMap::new();
        for line in &request.line_items {
            let total = totals.entry(line.product_id).or_insert(0);
            *total = stock::checked_quantity(*total, line.quantity)?;
        }

        let mut products: BTreeMap<i64, product::Model> = BTreeMap::new();
        for (&product_id, &requested) in &totals {
            let product = stock::lock_product(txn, product_id).await?;
            let available = stock::technician_quantity(txn, technician.id, product_id).await?;
            if available < requested {
                return Err(Error::InsufficientStock {
                    product: product.code,
                    location: stock::Location::Technician(technician.id).to_string(),
                    available,
                    requested,
                });
            }
            products.insert(product_id, product);
        }

        let client = self.resolve_client(txn, request.client_id).await?;

        let now = Utc::now().naive_utc();
        let visit = service_visit::ActiveModel {
            technician_id: Set(technician.id),
            client_id: Set(client.id),
            scheduled_at: Set(request.scheduled_at),
            status: Set(request.status),
            description: Set(request.description.trim().to_string()),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let mut items = Vec::with_capacity(request.line_items.len());
        for line in &request.line_items {
            let stored = visit_line_item::ActiveModel {
                visit_id: Set(visit.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            let product = products
                .get(&line.product_id)
                .cloned()
                .ok_or_else(|| Error::not_found("product", line.product_id))?;
            items.push(VisitItemDetails {
                line: stored,
                product,
            });
        }

        for (product_id, requested) in totals {
            if let Some(product) = products.get(&product_id) {
                stock::debit_technician(txn, technician.id, product, requested).await?;
            }
        }

        Ok(VisitDetails { visit, items })
    }

    async fn resolve_client(
        &self,
        txn: &DatabaseTransaction,
        client_id: Option<i64>,
    ) -> Result<client::Model> {
        match client_id {
            Some(id) => Client::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_else(|| Error::not_found("client", id)),
            None => catalog::direct_service_client(txn, &self.direct_service_client).await,
        }
    }

    /// Deletes a visit and credits every consumed quantity back to the technician.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if the visit does not exist or was deleted concurrently;
    /// nothing is credited in that case.
    #[instrument(skip(self))]
    pub async fn delete_visit(&self, visit_id: i64) -> Result<()> {
        let txn = self.db.begin().await?;

        let visit = ServiceVisit::find_by_id(visit_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| Error::not_found("visit", visit_id))?;

        let items = VisitLineItem::find()
            .filter(visit_line_item::Column::VisitId.eq(visit.id))
            .all(&txn)
            .await?;

        for item in &items {
            stock::credit_technician(&txn, visit.technician_id, item.product_id, item.quantity)
                .await?;
        }

        VisitLineItem::delete_many()
            .filter(visit_line_item::Column::VisitId.eq(visit.id))
            .exec(&txn)
            .await?;
        let deleted = ServiceVisit::delete_by_id(visit.id).exec(&txn).await?;
        if deleted.rows_affected != 1 {
            // Dropping the transaction undoes the credits above
            return Err(Error::not_found("visit", visit_id));
        }

        txn.commit().await?;
        info!(restored_lines = items.len(), "Visit deleted");
        Ok(())
    }

    /// Loads a visit with its line items and their products.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if the visit does not exist.
    pub async fn get_visit(&self, visit_id: i64) -> Result<VisitDetails> {
        let visit = ServiceVisit::find_by_id(visit_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::not_found("visit", visit_id))?;

        let items = VisitLineItem::find()
            .filter(visit_line_item::Column::VisitId.eq(visit.id))
            .find_also_related(Product)
            .order_by_asc(visit_line_item::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(line, product)| {
                product.map(|product| VisitItemDetails { line, product })
            })
            .collect();

        Ok(VisitDetails { visit, items })
    }

    /// A technician's visits, most recently scheduled first.
    pub async fn visits_for_technician(
        &self,
        technician_id: i64,
    ) -> Result<Vec<service_visit::Model>> {
        ServiceVisit::find()
            .filter(service_visit::Column::TechnicianId.eq(technician_id))
            .order_by_desc(service_visit::Column::ScheduledAt)
            .order_by_desc(service_visit::Column::Id)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Moves a visit to `status`. Setting the current status again is a no-op.
    ///
    /// Stock is not touched; consumed items stay consumed when a visit is cancelled.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if the visit does not exist
    /// - [`Error::InvalidArgument`] for a transition the lifecycle does not allow
    #[instrument(skip(self))]
    pub async fn update_visit_status(
        &self,
        visit_id: i64,
        status: VisitStatus,
    ) -> Result<service_visit::Model> {
        let visit = ServiceVisit::find_by_id(visit_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::not_found("visit", visit_id))?;

        if visit.status == status {
            return Ok(visit);
        }
        if !visit.status.can_transition_to(status) {
            return Err(Error::invalid(format!(
                "visit {visit_id} cannot move from {:?} to {status:?}",
                visit.status
            )));
        }

        let mut active: service_visit::ActiveModel = visit.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;
        info!(status = ?updated.status, "Visit status changed");
        Ok(updated)
    }
}

fn validate_request(request: &VisitRequest) -> Result<()> {
    if request.description.trim().is_empty() {
        return Err(Error::invalid("Visit description cannot be empty"));
    }
    if request.line_items.is_empty() {
        return Err(Error::invalid("A visit needs at least one line item"));
    }
    for line in &request.line_items {
        stock::ensure_positive(line.quantity)?;
    }
    Ok(())
}
