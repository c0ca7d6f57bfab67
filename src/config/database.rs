//! Database configuration module for the stock ledger.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema (including the composite key on technician stock and the foreign keys
//! declared by `belongs_to` relations) always matches the Rust structs.

use crate::entities::{
    Client, MovementRecord, Product, ServiceVisit, Technician, TechnicianStock, VisitLineItem,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

/// Fallback used when neither `DATABASE_URL` nor the settings file name a database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/stock_ledger.sqlite?mode=rwc";

/// Resolves the database URL.
///
/// `DATABASE_URL` from the environment wins, then the URL from the settings file, then
/// [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn resolve_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
#[instrument(skip_all)]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every ledger table that does not exist yet.
///
/// Referenced tables are created before the tables that point at them.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    create_table(db, Product).await?;
    create_table(db, Technician).await?;
    create_table(db, Client).await?;
    create_table(db, TechnicianStock).await?;
    create_table(db, MovementRecord).await?;
    create_table(db, ServiceVisit).await?;
    create_table(db, VisitLineItem).await?;

    info!("Ledger tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        client::Model as ClientModel, movement_record::Model as MovementRecordModel,
        product::Model as ProductModel, service_visit::Model as ServiceVisitModel,
        technician::Model as TechnicianModel, technician_stock::Model as TechnicianStockModel,
        visit_line_item::Model as VisitLineItemModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<TechnicianModel> = Technician::find().limit(1).all(&db).await?;
        let _: Vec<ClientModel> = Client::find().limit(1).all(&db).await?;
        let _: Vec<TechnicianStockModel> = TechnicianStock::find().limit(1).all(&db).await?;
        let _: Vec<MovementRecordModel> = MovementRecord::find().limit(1).all(&db).await?;
        let _: Vec<ServiceVisitModel> = ServiceVisit::find().limit(1).all(&db).await?;
        let _: Vec<VisitLineItemModel> = VisitLineItem::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_resolve_database_url_prefers_configured_over_default() {
        // DATABASE_URL may be set in the environment running the tests
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(
                resolve_database_url(Some("sqlite::memory:")),
                "sqlite::memory:"
            );
            assert_eq!(resolve_database_url(None), DEFAULT_DATABASE_URL);
        }
    }
}
