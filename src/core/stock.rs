//! Ledger store primitives - Reads and conditional writes on stock quantities.
//!
//! Every function here is generic over [`ConnectionTrait`] so the engines can run it on the
//! `DatabaseTransaction` of the operation in progress. Reads that precede a write take a row
//! lock (`SELECT ... FOR UPDATE` on backends that support it), and every decrement is a single
//! conditional `UPDATE ... WHERE quantity >= n` whose affected-row count is checked. Two
//! concurrent debits against the same row therefore cannot both succeed past available stock.
//!
//! Technician stock rows that reach zero are deleted; a missing row reads as zero.

use crate::{
    entities::{Product, TechnicianStock, product, technician_stock},
    errors::{Error, Result},
};
use sea_orm::{QuerySelect, Set, prelude::*, sea_query::Expr};
use std::fmt;
use std::str::FromStr;

/// Token naming the shared warehouse in movement requests and records.
pub const GENERAL_LOCATION: &str = "general";

/// Where a quantity of stock is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// The shared general warehouse
    General,
    /// Stock checked out to the technician with this id
    Technician(i64),
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case(GENERAL_LOCATION) {
            return Ok(Self::General);
        }
        match token.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self::Technician(id)),
            _ => Err(Error::invalid(format!(
                "location must be \"{GENERAL_LOCATION}\" or a technician id, got {token:?}"
            ))),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => f.write_str(GENERAL_LOCATION),
            Self::Technician(id) => write!(f, "{id}"),
        }
    }
}

/// Rejects zero and negative quantities.
pub fn ensure_positive(quantity: i64) -> Result<()> {
    if quantity <= 0 {
        return Err(Error::invalid(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

/// `current + quantity`, or [`Error::InvalidArgument`] when the sum does not fit a quantity.
pub fn checked_quantity(current: i64, quantity: i64) -> Result<i64> {
    current
        .checked_add(quantity)
        .ok_or_else(|| Error::invalid(format!("Quantity overflow: {current} + {quantity}")))
}

/// Loads a product and locks its row for the rest of the transaction.
pub async fn lock_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .lock_exclusive()
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))
}

/// Removes `quantity` from the product's general stock.
///
/// `product` must have been read inside the same transaction (see [`lock_product`]).
pub async fn debit_general<C>(db: &C, product: &product::Model, quantity: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    ensure_positive(quantity)?;
    let insufficient = |available| Error::InsufficientStock {
        product: product.code.clone(),
        location: Location::General.to_string(),
        available,
        requested: quantity,
    };

    if product.general_stock_quantity < quantity {
        return Err(insufficient(product.general_stock_quantity));
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::GeneralStockQuantity,
            Expr::col(product::Column::GeneralStockQuantity).sub(quantity),
        )
        .col_expr(
            product::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::GeneralStockQuantity.gte(quantity))
        .exec(db)
        .await?;

    // Another writer got there first
    if result.rows_affected == 0 {
        let available = Product::find_by_id(product.id)
            .one(db)
            .await?
            .map_or(0, |p| p.general_stock_quantity);
        return Err(insufficient(available));
    }

    Ok(())
}

/// Adds `quantity` to the product's general stock.
///
/// Fails with [`Error::InvalidArgument`] if the new quantity would not fit an `i64`.
pub async fn credit_general<C>(db: &C, product_id: i64, quantity: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    ensure_positive(quantity)?;
    let current = lock_product(db, product_id).await?;
    checked_quantity(current.general_stock_quantity, quantity)?;

    let result = Product::update_many()
        .col_expr(
            product::Column::GeneralStockQuantity,
            Expr::col(product::Column::GeneralStockQuantity).add(quantity),
        )
        .col_expr(
            product::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("product", product_id));
    }
    Ok(())
}

/// Quantity of a product held by a technician; zero when no row exists.
pub async fn technician_quantity<C>(db: &C, technician_id: i64, product_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(TechnicianStock::find_by_id((technician_id, product_id))
        .one(db)
        .await?
        .map_or(0, |row| row.quantity))
}

async fn lock_technician_row<C>(
    db: &C,
    technician_id: i64,
    product_id: i64,
) -> Result<Option<technician_stock::Model>>
where
    C: ConnectionTrait,
{
    TechnicianStock::find_by_id((technician_id, product_id))
        .lock_exclusive()
        .one(db)
        .await
        .map_err(Into::into)
}

/// Removes `quantity` of `product` from a technician's stock and returns what is left.
///
/// The row is deleted when the remaining quantity is zero.
pub async fn debit_technician<C>(
    db: &C,
    technician_id: i64,
    product: &product::Model,
    quantity: i64,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    ensure_positive(quantity)?;
    let available = lock_technician_row(db, technician_id, product.id)
        .await?
        .map_or(0, |row| row.quantity);

    let insufficient = |available| Error::InsufficientStock {
        product: product.code.clone(),
        location: Location::Technician(technician_id).to_string(),
        available,
        requested: quantity,
    };

    if available < quantity {
        return Err(insufficient(available));
    }

    let rows_affected = if available == quantity {
        TechnicianStock::delete_many()
            .filter(technician_stock::Column::TechnicianId.eq(technician_id))
            .filter(technician_stock::Column::ProductId.eq(product.id))
            .filter(technician_stock::Column::Quantity.eq(quantity))
            .exec(db)
            .await?
            .rows_affected
    } else {
        TechnicianStock::update_many()
            .col_expr(
                technician_stock::Column::Quantity,
                Expr::col(technician_stock::Column::Quantity).sub(quantity),
            )
            .col_expr(
                technician_stock::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(technician_stock::Column::TechnicianId.eq(technician_id))
            .filter(technician_stock::Column::ProductId.eq(product.id))
            .filter(technician_stock::Column::Quantity.gte(quantity))
            .exec(db)
            .await?
            .rows_affected
    };

    if rows_affected == 0 {
        let current = technician_quantity(db, technician_id, product.id).await?;
        return Err(insufficient(current));
    }

    Ok(available - quantity)
}

/// Adds `quantity` of a product to a technician's stock, creating the row when absent.
/// Returns the new quantity.
pub async fn credit_technician<C>(
    db: &C,
    technician_id: i64,
    product_id: i64,
    quantity: i64,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    ensure_positive(quantity)?;
    let now = chrono::Utc::now().naive_utc();

    match lock_technician_row(db, technician_id, product_id).await? {
        Some(row) => {
            let total = checked_quantity(row.quantity, quantity)?;
            TechnicianStock::update_many()
                .col_expr(
                    technician_stock::Column::Quantity,
                    Expr::col(technician_stock::Column::Quantity).add(quantity),
                )
                .col_expr(technician_stock::Column::UpdatedAt, Expr::value(now))
                .filter(technician_stock::Column::TechnicianId.eq(technician_id))
                .filter(technician_stock::Column::ProductId.eq(product_id))
                .exec(db)
                .await?;
            Ok(total)
        }
        None => {
            let row = technician_stock::ActiveModel {
                technician_id: Set(technician_id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                updated_at: Set(now),
            };
            TechnicianStock::insert(row)
                .exec_without_returning(db)
                .await?;
            Ok(quantity)
        }
    }
}
