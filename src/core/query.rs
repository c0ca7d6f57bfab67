//! Query facade - Read-only views over the ledger consumed by display layers.
//!
//! Nothing here writes, and nothing here runs inside a mutating transaction.

use crate::{
    core::stock,
    entities::{Product, ProductStatus, Technician, TechnicianStock, product, technician_stock},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, prelude::*, sea_query::Expr};
use serde::Serialize;
use std::collections::BTreeMap;

/// Category → prefix pairs every deployment knows about.
const BUILTIN_PREFIXES: [(&str, &str); 5] = [
    ("atm", "ATM"),
    ("spare parts", "SPR"),
    ("consumables", "CSM"),
    ("tools", "TLS"),
    ("cables", "CBL"),
];

/// Maps product categories to code prefixes and hands out the next free code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeScheme {
    prefixes: BTreeMap<String, String>,
}

impl Default for CodeScheme {
    fn default() -> Self {
        Self {
            prefixes: BUILTIN_PREFIXES
                .iter()
                .map(|(category, prefix)| ((*category).to_string(), (*prefix).to_string()))
                .collect(),
        }
    }
}

impl CodeScheme {
    /// Built-in prefixes extended (or overridden) by `overrides`, keyed by category.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut scheme = Self::default();
        for (category, prefix) in overrides {
            let prefix = prefix.trim().to_uppercase();
            if !prefix.is_empty() {
                scheme
                    .prefixes
                    .insert(category.trim().to_lowercase(), prefix);
            }
        }
        scheme
    }

    /// Prefix for a category: the configured one, else its first three letters uppercased.
    pub fn prefix_for(&self, category: &str) -> Result<String> {
        let key = category.trim().to_lowercase();
        if let Some(prefix) = self.prefixes.get(&key) {
            return Ok(prefix.clone());
        }

        let derived: String = key
            .chars()
            .filter(char::is_ascii_alphabetic)
            .take(3)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if derived.is_empty() {
            return Err(Error::invalid(format!(
                "cannot derive a code prefix from category {category:?}"
            )));
        }
        Ok(derived)
    }

    /// Next unused code for `category`, based on the codes currently in the catalog.
    pub async fn next_code<C>(&self, db: &C, category: &str) -> Result<String>
    where
        C: ConnectionTrait,
    {
        let prefix = self.prefix_for(category)?;
        let codes: Vec<String> = Product::find()
            .select_only()
            .column(product::Column::Code)
            .filter(product::Column::Code.starts_with(&format!("{prefix}-")))
            .into_tuple()
            .all(db)
            .await?;

        Ok(next_code_in_sequence(
            &prefix,
            codes.iter().map(String::as_str),
        ))
    }
}

/// `prefix-NNN` where NNN is one past the highest numeric suffix among `codes` with that
/// prefix, zero-padded to three digits. Codes with other prefixes or non-numeric suffixes are
/// ignored; no matching code yields sequence 1.
#[must_use]
pub fn next_code_in_sequence<'a>(
    prefix: &str,
    codes: impl IntoIterator<Item = &'a str>,
) -> String {
    let highest = codes
        .into_iter()
        .filter_map(|code| code.strip_prefix(prefix)?.strip_prefix('-'))
        .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    format!("{prefix}-{:03}", highest.saturating_add(1))
}

/// One product held by a technician, with the product fields a listing shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicianStockLine {
    /// Product id
    pub product_id: i64,
    /// Product code
    pub code: String,
    /// Product name
    pub name: String,
    /// Product category
    pub category: String,
    /// Quantity the technician holds
    pub quantity: i64,
}

/// Read-only queries over the ledger.
#[derive(Debug, Clone)]
pub struct InventoryQueries {
    db: DatabaseConnection,
    scheme: CodeScheme,
}

impl InventoryQueries {
    /// Creates the facade over a store handle.
    #[must_use]
    pub const fn new(db: DatabaseConnection, scheme: CodeScheme) -> Self {
        Self { db, scheme }
    }

    /// Active products whose general stock is at or below their threshold, lowest first.
    pub async fn list_low_stock(&self) -> Result<Vec<product::Model>> {
        Product::find()
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .filter(
                Expr::col(product::Column::GeneralStockQuantity)
                    .lte(Expr::col(product::Column::MinimumStockThreshold)),
            )
            .order_by_asc(product::Column::GeneralStockQuantity)
            .order_by_asc(product::Column::Name)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Everything a technician holds, ordered by product name.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if the technician does not exist.
    pub async fn list_technician_stock(
        &self,
        technician_id: i64,
    ) -> Result<Vec<TechnicianStockLine>> {
        if Technician::find_by_id(technician_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(Error::not_found("technician", technician_id));
        }

        let rows = TechnicianStock::find()
            .filter(technician_stock::Column::TechnicianId.eq(technician_id))
            .find_also_related(Product)
            .order_by_asc(product::Column::Name)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(row, product)| {
                product.map(|product| TechnicianStockLine {
                    product_id: product.id,
                    code: product.code,
                    name: product.name,
                    category: product.category,
                    quantity: row.quantity,
                })
            })
            .collect())
    }

    /// Next free product code for a category (e.g. `"ATM-006"`).
    pub async fn next_product_code(&self, category: &str) -> Result<String> {
        self.scheme.next_code(&self.db, category).await
    }

    /// Quantity of a product a technician holds; zero when none.
    pub async fn technician_quantity(&self, technician_id: i64, product_id: i64) -> Result<i64> {
        stock::technician_quantity(&self.db, technician_id, product_id).await
    }

    /// General stock plus every technician's holding of a product.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if the product does not exist
    /// - [`Error::InvalidArgument`] if the total does not fit an `i64`
    pub async fn total_quantity(&self, product_id: i64) -> Result<i64> {
        let product = Product::find_by_id(product_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::not_found("product", product_id))?;

        TechnicianStock::find()
            .filter(technician_stock::Column::ProductId.eq(product_id))
            .all(&self.db)
            .await?
            .iter()
            .try_fold(product.general_stock_quantity, |total, row| {
                stock::checked_quantity(total, row.quantity)
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::catalog, test_utils::*};

    #[test]
    fn test_next_code_on_empty_catalog() {
        assert_eq!(next_code_in_sequence("ATM", std::iter::empty()), "ATM-001");
    }

    #[test]
    fn test_next_code_skips_gaps() {
        let codes = ["ATM-001", "ATM-002", "ATM-005"];
        assert_eq!(next_code_in_sequence("ATM", codes), "ATM-006");
    }

    #[test]
    fn test_next_code_ignores_other_prefixes_and_junk() {
        let codes = ["ATMX-900", "ATM-", "ATM-12a", "SPR-050", "ATM-010", "ATM010"];
        assert_eq!(next_code_in_sequence("ATM", codes), "ATM-011");
        assert_eq!(next_code_in_sequence("SPR", codes), "SPR-051");
    }

    #[test]
    fn test_next_code_past_three_digits() {
        assert_eq!(next_code_in_sequence("CBL", ["CBL-999"]), "CBL-1000");
    }

    #[test]
    fn test_prefix_mapping() {
        let scheme = CodeScheme::default();
        assert_eq!(scheme.prefix_for("ATM").unwrap(), "ATM");
        assert_eq!(scheme.prefix_for("Spare Parts").unwrap(), "SPR");
        assert_eq!(scheme.prefix_for("lubricants").unwrap(), "LUB");
        assert_eq!(scheme.prefix_for("ok").unwrap(), "OK");
        // Only ASCII letters count
        assert_eq!(scheme.prefix_for("3M tapes").unwrap(), "MTA");
        assert_eq!(scheme.prefix_for("Straße").unwrap(), "STR");
        assert_eq!(scheme.prefix_for("ßpray").unwrap(), "PRA");
        assert!(matches!(
            scheme.prefix_for("ßß 42").unwrap_err(),
            Error::InvalidArgument { .. }
        ));
        assert!(matches!(
            scheme.prefix_for(" -- ").unwrap_err(),
            Error::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_prefix_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Power Supplies".to_string(), "psu".to_string());
        overrides.insert("atm".to_string(), "ATX".to_string());
        overrides.insert("blank".to_string(), " ".to_string());

        let scheme = CodeScheme::with_overrides(&overrides);
        assert_eq!(scheme.prefix_for("power supplies").unwrap(), "PSU");
        assert_eq!(scheme.prefix_for("ATM").unwrap(), "ATX");
        assert_eq!(scheme.prefix_for("blank").unwrap(), "BLA");
    }

    #[tokio::test]
    async fn test_next_product_code_reads_catalog() -> Result<()> {
        let db = setup_test_db().await?;
        let queries = InventoryQueries::new(db.clone(), CodeScheme::default());

        assert_eq!(queries.next_product_code("ATM").await?, "ATM-001");

        create_test_product(&db, "ATM-001", 0, 0).await?;
        create_test_product(&db, "ATM-002", 0, 0).await?;
        create_test_product(&db, "ATM-005", 0, 0).await?;
        create_test_product(&db, "SPR-040", 0, 0).await?;

        assert_eq!(queries.next_product_code("ATM").await?, "ATM-006");
        assert_eq!(queries.next_product_code("spare parts").await?, "SPR-041");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_low_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let queries = InventoryQueries::new(db.clone(), CodeScheme::default());

        let at_threshold = create_named_product(&db, "CSM-001", "Thermal paper", 5, 5).await?;
        let empty = create_named_product(&db, "CSM-002", "Cleaning card", 0, 3).await?;
        create_named_product(&db, "CSM-003", "Toner", 20, 5).await?;
        let retired = create_named_product(&db, "CSM-004", "Old ribbon", 1, 10).await?;
        catalog::set_product_status(&db, retired.id, ProductStatus::Inactive).await?;

        let low = queries.list_low_stock().await?;
        let ids: Vec<i64> = low.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![empty.id, at_threshold.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_technician_stock_ordered_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        let queries = InventoryQueries::new(db.clone(), CodeScheme::default());
        let technician = create_test_technician(&db, "Ana").await?;
        let other = create_test_technician(&db, "Bruno").await?;

        let keypad = create_named_product(&db, "ATM-002", "Keypad", 10, 0).await?;
        let cable = create_named_product(&db, "CBL-001", "Cable", 10, 0).await?;
        stock::credit_technician(&db, technician.id, keypad.id, 2).await?;
        stock::credit_technician(&db, technician.id, cable.id, 7).await?;
        stock::credit_technician(&db, other.id, cable.id, 1).await?;

        let lines = queries.list_technician_stock(technician.id).await?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Cable");
        assert_eq!(lines[0].quantity, 7);
        assert_eq!(lines[1].code, "ATM-002");
        assert_eq!(lines[1].quantity, 2);

        assert_eq!(queries.total_quantity(cable.id).await?, 18);
        assert_eq!(queries.technician_quantity(other.id, keypad.id).await?, 0);

        let err = queries.list_technician_stock(999).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "technician", .. }));
        Ok(())
    }
}
