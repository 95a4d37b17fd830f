// HTTP request handlers: JSON health probe plus the server-rendered
// HTML fragments the catalog page swaps in.

use crate::api::models::{ApiResponse, HealthResponse, ProductRequest, SearchQuery};
use crate::database_ops::db::Db;
use crate::database_ops::products::{NewProduct, Product, ProductPatch};
use actix_web::{web, HttpResponse, Result};
use std::time::SystemTime;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> Result<HttpResponse> {
    // Quick database connectivity check
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let uptime = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
        uptime_seconds: uptime,
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Page shell; everything below `/products` renders fragments into it.
pub async fn index() -> Result<HttpResponse> {
    Ok(html(INDEX_HTML.to_string()))
}

/// Full product table, price-ascending.
pub async fn list_products(db: web::Data<Db>) -> Result<HttpResponse> {
    let products = db.all_products().await.map_err(store_error)?;
    Ok(html(build_product_table(&products)))
}

/// Create a product from the form payload and return the refreshed table.
pub async fn create_product(
    form: web::Form<ProductRequest>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let price = match form.parsed_price() {
        Ok(price) => price,
        Err(_) => return Ok(invalid_price()),
    };

    db.create_product(NewProduct {
        title: form.title.clone(),
        vendor: form.vendor.clone(),
        product_type: form.product_type.clone(),
        price,
        variants: None,
    })
    .await
    .map_err(store_error)?;

    let products = db.all_products().await.map_err(store_error)?;
    Ok(html(build_product_table(&products)))
}

/// Single product fragment, or 404 when the id is unknown.
pub async fn get_product(path: web::Path<i64>, db: web::Data<Db>) -> Result<HttpResponse> {
    let id = path.into_inner();
    match db.product_by_id(id).await.map_err(store_error)? {
        Some(product) => Ok(html(build_product_table(std::slice::from_ref(&product)))),
        None => Ok(HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body("<p>Product not found</p>")),
    }
}

/// Replace the scalar fields of a product. An unknown id has no visible
/// effect: the caller still gets the current table back.
pub async fn update_product(
    path: web::Path<i64>,
    form: web::Form<ProductRequest>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let price = match form.parsed_price() {
        Ok(price) => price,
        Err(_) => return Ok(invalid_price()),
    };

    let updated = db
        .update_product(
            id,
            ProductPatch {
                title: form.title.clone(),
                vendor: form.vendor.clone(),
                product_type: form.product_type.clone(),
                price,
            },
        )
        .await
        .map_err(store_error)?;
    if !updated {
        tracing::info!(id, "update requested for unknown product id");
    }

    let products = db.all_products().await.map_err(store_error)?;
    Ok(html(build_product_table(&products)))
}

/// Idempotent delete; returns the refreshed table either way.
pub async fn delete_product(path: web::Path<i64>, db: web::Data<Db>) -> Result<HttpResponse> {
    let id = path.into_inner();
    db.delete_product(id).await.map_err(store_error)?;

    let products = db.all_products().await.map_err(store_error)?;
    Ok(html(build_product_table(&products)))
}

/// Title search fragment. An empty query renders an empty table.
pub async fn search_products(
    query: web::Query<SearchQuery>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let products = db.search_products(&query.q).await.map_err(store_error)?;
    Ok(html(build_product_table(&products)))
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn invalid_price() -> HttpResponse {
    HttpResponse::BadRequest()
        .content_type("text/html; charset=utf-8")
        .body("<p>Price must be a decimal number</p>")
}

fn store_error(e: anyhow::Error) -> actix_web::Error {
    tracing::error!(error = %e, "store operation failed");
    actix_web::error::ErrorInternalServerError("store failure")
}

fn build_product_table(products: &[Product]) -> String {
    let mut html = String::from(
        "<table class=\"table\"><thead><tr>\
         <th>ID</th><th>Title</th><th>Vendor</th><th>Product Type</th><th>Price</th><th></th>\
         </tr></thead><tbody>",
    );

    for product in products {
        let price = product
            .price
            .as_ref()
            .map(|p| format!("${p}"))
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr><td>{id}</td><td>{title}</td><td>{vendor}</td><td>{ptype}</td><td>{price}</td>\
             <td><button hx-delete=\"/products/{id}\" hx-target=\"#product-table\">Delete</button></td></tr>",
            id = product.id,
            title = escape_html(&product.title),
            vendor = escape_html(&product.vendor),
            ptype = escape_html(&product.product_type),
            price = price,
        ));
    }

    html.push_str("</tbody></table>");
    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::{build_product_table, escape_html};
    use crate::database_ops::products::Product;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn product(id: i64, title: &str, price: Option<&str>) -> Product {
        Product {
            id,
            title: title.to_string(),
            vendor: "Acme".to_string(),
            product_type: "Apparel".to_string(),
            price: price.map(|p| BigDecimal::from_str(p).unwrap()),
            variants: None,
        }
    }

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(
            escape_html(r#"<b>&"fancy"'</b>"#),
            "&lt;b&gt;&amp;&quot;fancy&quot;&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn empty_table_renders_header_only() {
        let table = build_product_table(&[]);
        assert!(table.contains("<thead>"));
        assert!(table.contains("<tbody></tbody>"));
    }

    #[test]
    fn rows_render_escaped_title_and_formatted_price() {
        let table = build_product_table(&[product(7, "<Hoodie>", Some("19.99"))]);
        assert!(table.contains("<td>7</td>"));
        assert!(table.contains("&lt;Hoodie&gt;"));
        assert!(table.contains("<td>$19.99</td>"));
        assert!(table.contains("hx-delete=\"/products/7\""));
    }

    #[test]
    fn missing_price_renders_empty_cell() {
        let table = build_product_table(&[product(1, "Tee", None)]);
        assert!(table.contains("<td></td>"));
    }
}
