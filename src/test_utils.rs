//! Shared test utilities for the stock ledger.
//!
//! This module provides helpers for setting up in-memory test databases and creating
//! catalog records with sensible defaults.

use crate::{
    core::{
        catalog::{self, NewProduct},
        query::CodeScheme,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a product with the given code and stock levels.
///
/// # Defaults
/// * `name`: the code
/// * `category`: "atm"
pub async fn create_test_product(
    db: &DatabaseConnection,
    code: &str,
    general_stock_quantity: i64,
    minimum_stock_threshold: i64,
) -> Result<entities::product::Model> {
    create_named_product(db, code, code, general_stock_quantity, minimum_stock_threshold).await
}

/// Creates a product with a custom display name.
pub async fn create_named_product(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    general_stock_quantity: i64,
    minimum_stock_threshold: i64,
) -> Result<entities::product::Model> {
    catalog::create_product(
        db,
        &CodeScheme::default(),
        NewProduct {
            code: Some(code.to_string()),
            name: name.to_string(),
            category: "atm".to_string(),
            general_stock_quantity,
            minimum_stock_threshold,
        },
    )
    .await
}

/// Creates an active technician.
pub async fn create_test_technician(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::technician::Model> {
    catalog::create_technician(db, name).await
}

/// Sets up a database with one product holding `general_stock_quantity` in the warehouse
/// and one active technician holding nothing.
/// Returns (db, product, technician).
pub async fn setup_with_stocked_product(
    general_stock_quantity: i64,
) -> Result<(
    DatabaseConnection,
    entities::product::Model,
    entities::technician::Model,
)> {
    let db = setup_test_db().await?;
    let product = create_test_product(&db, "ATM-001", general_stock_quantity, 0).await?;
    let technician = create_test_technician(&db, "Ana").await?;
    Ok((db, product, technician))
}
