//! Catalog business logic - Products, technicians and clients referenced by the engines.
//!
//! Catalog records are created and retired here; their stock quantities are only ever changed
//! by the movement and visit engines. Nothing in this module hard-deletes a record.

use crate::{
    core::query::CodeScheme,
    entities::{Client, Product, ProductStatus, Technician, client, product, technician},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use tracing::info;

/// Input for [`create_product`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Product code; generated from the category when `None`
    pub code: Option<String>,
    /// Display name
    pub name: String,
    /// Catalog category
    pub category: String,
    /// Opening general stock
    pub general_stock_quantity: i64,
    /// Low-stock threshold
    pub minimum_stock_threshold: i64,
}

/// Creates a product, generating its code when none is given.
///
/// # Errors
/// Returns an error if:
/// - The name or category is empty
/// - A quantity is negative
/// - The code is already taken ([`Error::Conflict`])
pub async fn create_product<C>(
    db: &C,
    scheme: &CodeScheme,
    new_product: NewProduct,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let name = new_product.name.trim();
    if name.is_empty() {
        return Err(Error::invalid("Product name cannot be empty"));
    }
    if new_product.category.trim().is_empty() {
        return Err(Error::invalid("Product category cannot be empty"));
    }
    if new_product.general_stock_quantity < 0 || new_product.minimum_stock_threshold < 0 {
        return Err(Error::invalid("Stock quantities cannot be negative"));
    }

    let code = match new_product.code.as_deref().map(str::trim) {
        Some("") => return Err(Error::invalid("Product code cannot be empty")),
        Some(code) => code.to_string(),
        None => scheme.next_code(db, &new_product.category).await?,
    };

    let now = chrono::Utc::now().naive_utc();
    let product = product::ActiveModel {
        code: Set(code.clone()),
        name: Set(name.to_string()),
        category: Set(new_product.category.trim().to_string()),
        status: Set(ProductStatus::Active),
        general_stock_quantity: Set(new_product.general_stock_quantity),
        minimum_stock_threshold: Set(new_product.minimum_stock_threshold),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = product.insert(db).await.map_err(|e| {
        Error::from_unique_violation(e, format!("Product code {code} already exists"))
    })?;
    info!(product_id = created.id, code = %created.code, "Product created");
    Ok(created)
}

/// Retrieves a product by id.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by its code.
pub async fn get_product_by_code<C>(db: &C, code: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Code.eq(code.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all active products, ordered by name.
pub async fn list_active_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Status.eq(ProductStatus::Active))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Activates or soft-disables a product.
pub async fn set_product_status<C>(
    db: &C,
    product_id: i64,
    status: ProductStatus,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?
        .into();

    product.status = Set(status);
    product.updated_at = Set(chrono::Utc::now().naive_utc());
    product.update(db).await.map_err(Into::into)
}

/// Changes the low-stock threshold of a product.
pub async fn update_minimum_threshold<C>(
    db: &C,
    product_id: i64,
    minimum_stock_threshold: i64,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    if minimum_stock_threshold < 0 {
        return Err(Error::invalid("Minimum stock threshold cannot be negative"));
    }

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?
        .into();

    product.minimum_stock_threshold = Set(minimum_stock_threshold);
    product.updated_at = Set(chrono::Utc::now().naive_utc());
    product.update(db).await.map_err(Into::into)
}

/// Registers an active technician.
pub async fn create_technician<C>(db: &C, name: &str) -> Result<technician::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::invalid("Technician name cannot be empty"));
    }

    let technician = technician::ActiveModel {
        name: Set(name.trim().to_string()),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    technician.insert(db).await.map_err(Into::into)
}

/// Retrieves a technician by id.
pub async fn get_technician<C>(db: &C, technician_id: i64) -> Result<Option<technician::Model>>
where
    C: ConnectionTrait,
{
    Technician::find_by_id(technician_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all active technicians, ordered by name.
pub async fn list_active_technicians<C>(db: &C) -> Result<Vec<technician::Model>>
where
    C: ConnectionTrait,
{
    Technician::find()
        .filter(technician::Column::IsActive.eq(true))
        .order_by_asc(technician::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Activates or deactivates a technician. Stock they hold is left untouched.
pub async fn set_technician_active<C>(
    db: &C,
    technician_id: i64,
    is_active: bool,
) -> Result<technician::Model>
where
    C: ConnectionTrait,
{
    let mut technician: technician::ActiveModel = Technician::find_by_id(technician_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("technician", technician_id))?
        .into();

    technician.is_active = Set(is_active);
    technician.update(db).await.map_err(Into::into)
}

/// Registers a client.
///
/// # Errors
/// Returns [`Error::Conflict`] if the code is already taken.
pub async fn create_client<C>(db: &C, code: &str, name: &str) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    let code = code.trim();
    if code.is_empty() || name.trim().is_empty() {
        return Err(Error::invalid("Client code and name cannot be empty"));
    }

    let client = client::ActiveModel {
        code: Set(code.to_string()),
        name: Set(name.trim().to_string()),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    client
        .insert(db)
        .await
        .map_err(|e| Error::from_unique_violation(e, format!("Client code {code} already exists")))
}

/// Retrieves a client by id.
pub async fn get_client<C>(db: &C, client_id: i64) -> Result<Option<client::Model>>
where
    C: ConnectionTrait,
{
    Client::find_by_id(client_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the synthetic client that visits without a client are booked against,
/// creating it on first use.
pub async fn direct_service_client<C>(db: &C, code: &str) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    match find_client_by_code(db, code).await? {
        Some(client) => Ok(client),
        None => insert_client_if_absent(db, code, "Direct service").await,
    }
}

async fn find_client_by_code<C>(db: &C, code: &str) -> Result<Option<client::Model>>
where
    C: ConnectionTrait,
{
    Client::find()
        .filter(client::Column::Code.eq(code))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts a client unless one with `code` already exists, then returns the stored row.
///
/// Two first visits racing on the insert both end up with the same client instead of one
/// failing with a conflict.
async fn insert_client_if_absent<C>(db: &C, code: &str, name: &str) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::invalid("Client code cannot be empty"));
    }

    let client = client::ActiveModel {
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let inserted = Client::insert(client)
        .on_conflict(OnConflict::column(client::Column::Code).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    if inserted > 0 {
        info!(code, "Client created");
    }

    find_client_by_code(db, code)
        .await?
        .ok_or_else(|| Error::not_found("client", code))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn new_product(code: Option<&str>, name: &str, category: &str) -> NewProduct {
        NewProduct {
            code: code.map(str::to_string),
            name: name.to_string(),
            category: category.to_string(),
            general_stock_quantity: 0,
            minimum_stock_threshold: 0,
        }
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let scheme = CodeScheme::default();

        let result = create_product(&db, &scheme, new_product(None, "  ", "atm")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidArgument { .. }));

        let result = create_product(&db, &scheme, new_product(None, "Card reader", "")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidArgument { .. }));

        let result =
            create_product(&db, &scheme, new_product(Some(" "), "Card reader", "atm")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidArgument { .. }));

        let mut negative = new_product(Some("ATM-001"), "Card reader", "atm");
        negative.general_stock_quantity = -1;
        let result = create_product(&db, &scheme, negative).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidArgument { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_generates_code() -> Result<()> {
        let db = setup_test_db().await?;
        let scheme = CodeScheme::default();

        let first = create_product(&db, &scheme, new_product(None, "Card reader", "ATM")).await?;
        let second = create_product(&db, &scheme, new_product(None, "Keypad", "ATM")).await?;

        assert_eq!(first.code, "ATM-001");
        assert_eq!(second.code, "ATM-002");
        assert_eq!(first.status, ProductStatus::Active);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_duplicate_code_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        let scheme = CodeScheme::default();

        create_product(
            &db,
            &scheme,
            new_product(Some("LFG-010"), "Lubricant", "lubricants"),
        )
        .await?;
        let err = create_product(&db, &scheme, new_product(Some("LFG-010"), "Other", "lubricants"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_product_lookup_and_status() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "ATM-001", 10, 2).await?;

        let found = get_product_by_code(&db, "ATM-001").await?.unwrap();
        assert_eq!(found.id, product.id);
        assert!(get_product_by_code(&db, "ATM-999").await?.is_none());

        let disabled = set_product_status(&db, product.id, ProductStatus::Inactive).await?;
        assert_eq!(disabled.status, ProductStatus::Inactive);
        assert!(list_active_products(&db).await?.is_empty());

        // Soft-disabled, not deleted
        assert!(get_product_by_id(&db, product.id).await?.is_some());

        let err = set_product_status(&db, 999, ProductStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "product", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_minimum_threshold() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "TLS-001", 10, 2).await?;

        let updated = update_minimum_threshold(&db, product.id, 12).await?;
        assert_eq!(updated.minimum_stock_threshold, 12);

        let err = update_minimum_threshold(&db, product.id, -1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_technician_lifecycle() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_technician(&db, "Ana").await?;
        let bruno = create_technician(&db, "Bruno").await?;
        assert!(ana.is_active);

        set_technician_active(&db, bruno.id, false).await?;
        let active = list_active_technicians(&db).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, ana.id);

        assert!(get_technician(&db, bruno.id).await?.is_some());
        assert!(matches!(
            create_technician(&db, " ").await.unwrap_err(),
            Error::InvalidArgument { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_direct_service_client_is_created_once() -> Result<()> {
        let db = setup_test_db().await?;

        let first = direct_service_client(&db, "direct-service").await?;
        let second = direct_service_client(&db, "direct-service").await?;
        assert_eq!(first.id, second.id);
        assert_eq!(first.code, "direct-service");

        let err = create_client(&db, "direct-service", "Duplicate")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_client_if_absent_keeps_existing_row() -> Result<()> {
        let db = setup_test_db().await?;

        // Another visit created the client between our lookup and our insert
        let winner = create_client(&db, "direct-service", "Direct service").await?;
        let loser = insert_client_if_absent(&db, "direct-service", "Direct service").await?;
        assert_eq!(loser, winner);

        assert!(matches!(
            insert_client_if_absent(&db, "  ", "Direct service")
                .await
                .unwrap_err(),
            Error::InvalidArgument { .. }
        ));
        Ok(())
    }
}
