//! One-time catalog seeding from the remote product feed.
//!
//! The job is a startup hook, not a recurring schedule: it runs at most once
//! per store lifetime, guarded by a row-count check. Failures are logged by
//! the caller and never reach a user-facing request.

use crate::database_ops::db::Db;
use crate::database_ops::products::{NewProduct, ProductVariant};
use crate::util::env::{env_opt, env_parse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::Client;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const DEFAULT_FEED_URL: &str = "https://famme.no/products.json";
const DEFAULT_MAX_PRODUCTS: usize = 50;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Write side of the ingestion seam. The store implements it; tests swap in
/// an in-memory sink.
#[async_trait]
pub trait ProductSink: Send + Sync {
    async fn count(&self) -> Result<i64>;
    async fn create(&self, product: NewProduct) -> Result<()>;
}

#[async_trait]
impl ProductSink for Db {
    async fn count(&self) -> Result<i64> {
        self.count_products().await
    }

    async fn create(&self, product: NewProduct) -> Result<()> {
        self.create_product(product).await?;
        Ok(())
    }
}

pub struct FeedProvider {
    client: Client,
    feed_url: String,
    max_products: usize,
}

impl FeedProvider {
    pub fn new(feed_url: String, max_products: usize, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            feed_url,
            max_products,
        }
    }

    pub fn from_env() -> Self {
        let feed_url = env_opt("FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string());
        let max_products = env_parse("FEED_MAX_PRODUCTS", DEFAULT_MAX_PRODUCTS);
        let timeout_secs = env_parse("FEED_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self::new(feed_url, max_products, timeout_secs)
    }

    /// Populate the sink from the feed if, and only if, it is empty.
    /// Returns the number of products saved. Each save is its own unit: a
    /// mid-pass failure keeps whatever was already committed.
    pub async fn run_once(&self, sink: &impl ProductSink) -> Result<usize> {
        let existing = sink.count().await.context("feed: failed to count products")?;
        if existing > 0 {
            info!(existing, "feed: products already present, skipping fetch");
            return Ok(0);
        }

        info!(url = %self.feed_url, "feed: fetching product feed");
        let doc = self.fetch_feed().await?;
        let mapped = map_feed(&doc, self.max_products)?;
        if mapped.is_empty() {
            info!("feed: nothing to ingest");
            return Ok(0);
        }

        let mut saved = 0usize;
        for product in mapped {
            sink.create(product)
                .await
                .context("feed: failed to save product")?;
            saved += 1;
        }
        info!(saved, "feed: saved products");
        Ok(saved)
    }

    async fn fetch_feed(&self) -> Result<Value> {
        let response = self
            .client
            .get(&self.feed_url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("feed: request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("feed: upstream returned status {}", status);
        }

        response.json().await.context("feed: invalid JSON body")
    }
}

/// Map the feed document into insertable products, up to `cap` entries.
/// A missing or non-array `products` key means "nothing to ingest".
fn map_feed(doc: &Value, cap: usize) -> Result<Vec<NewProduct>> {
    let Some(entries) = doc.get("products").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(entries.len().min(cap));
    for entry in entries.iter().take(cap) {
        out.push(map_entry(entry)?);
    }
    Ok(out)
}

fn map_entry(entry: &Value) -> Result<NewProduct> {
    let title = field_text(entry, "title");
    let vendor = field_text(entry, "vendor");
    let product_type = field_text(entry, "product_type");

    let mut price = None;
    let mut variants = None;

    if let Some(raw_variants) = entry.get("variants").and_then(Value::as_array) {
        if let Some(first) = raw_variants.first() {
            // The product price mirrors the first variant's price at
            // ingestion time.
            let first_price = price_text(first)
                .with_context(|| format!("feed: variant without price for {title:?}"))?;
            price = Some(
                BigDecimal::from_str(&first_price)
                    .with_context(|| format!("feed: unparseable price {first_price:?}"))?,
            );

            let mapped: Vec<ProductVariant> = raw_variants
                .iter()
                .map(|v| ProductVariant {
                    title: field_text(v, "title"),
                    price: price_text(v).unwrap_or_default(),
                    sku: v.get("sku").and_then(Value::as_str).map(str::to_string),
                })
                .collect();
            variants = Some(mapped);
        }
    }

    Ok(NewProduct {
        title,
        vendor,
        product_type,
        price,
        variants,
    })
}

fn field_text(node: &Value, key: &str) -> String {
    node.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Variant prices arrive as strings in the feed, but tolerate bare numbers.
fn price_text(variant: &Value) -> Option<String> {
    match variant.get("price")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct MemorySink {
        existing: i64,
        created: Mutex<Vec<NewProduct>>,
    }

    impl MemorySink {
        fn new(existing: i64) -> Self {
            Self {
                existing,
                created: Mutex::new(Vec::new()),
            }
        }

        fn created_count(&self) -> usize {
            self.created.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProductSink for MemorySink {
        async fn count(&self) -> Result<i64> {
            Ok(self.existing + self.created.lock().unwrap().len() as i64)
        }

        async fn create(&self, product: NewProduct) -> Result<()> {
            self.created.lock().unwrap().push(product);
            Ok(())
        }
    }

    #[test]
    fn maps_price_from_first_variant_and_keeps_variant_order() {
        let doc = json!({
            "products": [
                {
                    "title": "A",
                    "vendor": "Acme",
                    "product_type": "Shirt",
                    "variants": [
                        { "title": "v1", "price": "10.00", "sku": "SKU-1" },
                        { "title": "v2", "price": "12.50" }
                    ]
                },
                { "title": "B", "vendor": "Acme", "product_type": "Shirt", "variants": [] }
            ]
        });

        let mapped = map_feed(&doc, 50).unwrap();
        assert_eq!(mapped.len(), 2);

        let a = &mapped[0];
        assert_eq!(a.title, "A");
        assert_eq!(a.price, Some(BigDecimal::from_str("10.00").unwrap()));
        let variants = a.variants.as_ref().unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].title, "v1");
        assert_eq!(variants[0].sku.as_deref(), Some("SKU-1"));
        assert_eq!(variants[1].title, "v2");
        assert_eq!(variants[1].price, "12.50");
        assert_eq!(variants[1].sku, None);

        // No variants means no ingestion-assigned price and no blob.
        let b = &mapped[1];
        assert_eq!(b.title, "B");
        assert!(b.price.is_none());
        assert!(b.variants.is_none());
    }

    #[test]
    fn caps_the_number_of_mapped_entries() {
        let entries: Vec<Value> = (0..60)
            .map(|i| json!({ "title": format!("p{i}"), "variants": [{ "title": "v", "price": "1.00" }] }))
            .collect();
        let doc = json!({ "products": entries });

        let mapped = map_feed(&doc, 50).unwrap();
        assert_eq!(mapped.len(), 50);
        assert_eq!(mapped[0].title, "p0");
        assert_eq!(mapped[49].title, "p49");
    }

    #[test]
    fn missing_or_malformed_products_key_yields_nothing() {
        assert!(map_feed(&json!({}), 50).unwrap().is_empty());
        assert!(map_feed(&json!({ "products": "nope" }), 50).unwrap().is_empty());
    }

    #[test]
    fn unparseable_first_variant_price_aborts_mapping() {
        let doc = json!({
            "products": [
                { "title": "A", "variants": [{ "title": "v", "price": "not-a-price" }] }
            ]
        });
        assert!(map_feed(&doc, 50).is_err());
    }

    #[test]
    fn absent_scalar_fields_become_empty_strings() {
        let doc = json!({ "products": [ {} ] });
        let mapped = map_feed(&doc, 50).unwrap();
        assert_eq!(mapped[0].title, "");
        assert_eq!(mapped[0].vendor, "");
        assert_eq!(mapped[0].product_type, "");
        assert!(mapped[0].price.is_none());
    }

    #[tokio::test]
    async fn run_once_skips_fetch_when_store_is_populated() {
        // The URL points at a closed port; the guard must return before any
        // request is attempted.
        let provider = FeedProvider::new("http://127.0.0.1:9/products.json".into(), 50, 1);
        let sink = MemorySink::new(3);

        let saved = provider.run_once(&sink).await.unwrap();
        assert_eq!(saved, 0);
        assert_eq!(sink.created_count(), 0);
    }

    #[tokio::test]
    async fn unreachable_feed_leaves_empty_sink_untouched() {
        let provider = FeedProvider::new("http://127.0.0.1:9/products.json".into(), 50, 1);
        let sink = MemorySink::new(0);

        let result = provider.run_once(&sink).await;
        assert!(result.is_err());
        assert_eq!(sink.created_count(), 0);
    }
}
