use dotenvy::dotenv;
use stock_ledger::{
    CodeScheme, InventoryQueries, Result,
    config::{database, settings},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load settings (missing file means defaults)
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Connect and make sure the schema exists
    let database_url = database::resolve_database_url(settings.database_url.as_deref());
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {:?}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {:?}", e))?;

    // 5. Report products that need restocking
    let scheme = CodeScheme::with_overrides(&settings.category_prefixes);
    let queries = InventoryQueries::new(db, scheme);
    let low_stock = queries.list_low_stock().await?;
    if low_stock.is_empty() {
        info!("No active product is at or below its minimum stock");
    }
    for product in &low_stock {
        warn!(
            code = %product.code,
            name = %product.name,
            quantity = product.general_stock_quantity,
            minimum = product.minimum_stock_threshold,
            "Low stock"
        );
    }

    Ok(())
}
