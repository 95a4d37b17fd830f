//! Product store: keyed CRUD plus ordered/search reads over the `products` table.
//!
//! Ordering contract: ascending price with NULL prices last, ties broken by
//! ascending id (insertion order).

use crate::database_ops::db::Db;
use anyhow::Result;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// A catalog entry. `variants` is a semi-structured attachment (JSONB), not a
/// joined child table; when present it is non-empty and in feed order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub vendor: String,
    pub product_type: String,
    pub price: Option<BigDecimal>,
    pub variants: Option<Json<Vec<ProductVariant>>>,
}

/// A priced sub-option of a product. Price is kept as feed text inside the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub title: String,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// Insert shape: everything but the store-assigned id.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub vendor: String,
    pub product_type: String,
    pub price: Option<BigDecimal>,
    pub variants: Option<Vec<ProductVariant>>,
}

/// Full replace of the four scalar fields; update never touches variants.
#[derive(Debug, Clone)]
pub struct ProductPatch {
    pub title: String,
    pub vendor: String,
    pub product_type: String,
    pub price: Option<BigDecimal>,
}

const PRODUCT_COLUMNS: &str = "id, title, vendor, product_type, price, variants";

impl Db {
    /// Insert a product and return it with the assigned id. No content
    /// validation: empty strings are accepted at this boundary.
    pub async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query_as::<_, Product>(
            "INSERT INTO products (title, vendor, product_type, price, variants)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, title, vendor, product_type, price, variants",
        )
        .bind(&product.title)
        .bind(&product.vendor)
        .bind(&product.product_type)
        .bind(&product.price)
        .bind(product.variants.map(Json))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn all_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY price ASC NULLS LAST, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Point lookup; absent id is `None`, not an error.
    pub async fn product_by_id(&self, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Overwrite the scalar fields of an existing product. Returns false when
    /// the id does not exist (callers treat that as no visible effect).
    pub async fn update_product(&self, id: i64, patch: ProductPatch) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE products SET title = $1, vendor = $2, product_type = $3, price = $4
             WHERE id = $5",
        )
        .bind(&patch.title)
        .bind(&patch.vendor)
        .bind(&patch.product_type)
        .bind(&patch.price)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a product if present; deleting a missing id is not an error.
    pub async fn delete_product(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Case-insensitive substring match on title, price-ascending. An empty
    /// query yields nothing: an unfilled search box shows no rows, not all.
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE title ILIKE $1
             ORDER BY price ASC NULLS LAST, id ASC"
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_products(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_passes_plain_text_through() {
        assert_eq!(escape_like("hoodie"), "hoodie");
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100%_wool"), "100\\%\\_wool");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
