// API request/response models (DTOs)

use bigdecimal::{BigDecimal, ParseBigDecimalError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Standard API response wrapper for the JSON endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub uptime_seconds: u64,
}

/// Form payload for creating or replacing a product. Deliberately separate
/// from the stored entity: the price arrives as text and is validated here,
/// and variants are never writable through this shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub price: Option<String>,
}

impl ProductRequest {
    /// Parse the submitted price. Blank input means "no price".
    pub fn parsed_price(&self) -> Result<Option<BigDecimal>, ParseBigDecimalError> {
        match self.price.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => BigDecimal::from_str(raw).map(Some),
        }
    }
}

/// Query string for title search.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::ProductRequest;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn request(price: Option<&str>) -> ProductRequest {
        ProductRequest {
            title: "Hoodie".into(),
            vendor: "Acme".into(),
            product_type: "Apparel".into(),
            price: price.map(str::to_string),
        }
    }

    #[test]
    fn blank_price_parses_as_none() {
        assert_eq!(request(None).parsed_price().unwrap(), None);
        assert_eq!(request(Some("  ")).parsed_price().unwrap(), None);
    }

    #[test]
    fn decimal_price_parses_exactly() {
        assert_eq!(
            request(Some("19.99")).parsed_price().unwrap(),
            Some(BigDecimal::from_str("19.99").unwrap())
        );
    }

    #[test]
    fn junk_price_is_rejected() {
        assert!(request(Some("cheap")).parsed_price().is_err());
    }
}
