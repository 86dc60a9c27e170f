//! Catalog View, product pages and the product JSON API.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use wallposter_integration_tests::TestContext;
use wallposter_storefront::services::catalog::CatalogLoadError;

fn titles(body: &serde_json::Value) -> Vec<String> {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let mut ctx = TestContext::new();
    let resp = ctx.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");

    assert_eq!(ctx.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let mut ctx = TestContext::new();
    let resp = ctx.get("/health").await;
    assert!(resp.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_catalog_page_lists_all_posters() {
    let mut ctx = TestContext::new();
    let resp = ctx.get("/").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("3 posters"));
    assert!(resp.body.contains("Tiger at Dusk"));
    assert!(resp.body.contains("Lotus Grid"));
}

#[tokio::test]
async fn test_catalog_page_search_and_filters() {
    let mut ctx = TestContext::new();

    let resp = ctx.get("/?q=jodhpur").await;
    assert!(resp.body.contains("1 poster"));
    assert!(resp.body.contains("Blue City Rooftops"));
    assert!(!resp.body.contains("<h2>Tiger at Dusk</h2>"));

    let resp = ctx.get("/?q=nothing-matches").await;
    assert!(resp.body.contains("0 posters"));
    assert!(resp.body.contains("No posters match your search."));
}

#[tokio::test]
async fn test_api_products_sorting() {
    let mut ctx = TestContext::new();

    let body = ctx.get("/api/products").await.json();
    assert_eq!(body["count"], 3);
    assert_eq!(body["sort"], "popularity");
    assert_eq!(titles(&body), ["Tiger at Dusk", "Blue City Rooftops", "Lotus Grid"]);

    let body = ctx.get("/api/products?sort=price-asc").await.json();
    assert_eq!(titles(&body), ["Lotus Grid", "Blue City Rooftops", "Tiger at Dusk"]);

    let body = ctx.get("/api/products?sort=newest").await.json();
    assert_eq!(titles(&body), ["Blue City Rooftops", "Lotus Grid", "Tiger at Dusk"]);
}

#[tokio::test]
async fn test_api_products_filters() {
    let mut ctx = TestContext::new();

    let body = ctx.get("/api/products?size=A3").await.json();
    assert_eq!(body["label"], "2 posters");

    let body = ctx
        .get("/api/products?orientation=Portrait&orientation=Square")
        .await
        .json();
    assert_eq!(titles(&body), ["Tiger at Dusk", "Lotus Grid"]);

    let body = ctx
        .get("/api/products?category=Travel&orientation=Portrait")
        .await
        .json();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_api_product_detail() {
    let mut ctx = TestContext::new();

    let resp = ctx.get("/api/products/2").await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["title"], "Blue City Rooftops");
    assert_eq!(body["basePrice"], 44900);

    let resp = ctx.get("/api/products/42").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.json()["error"].is_string());
}

#[tokio::test]
async fn test_product_page() {
    let mut ctx = TestContext::new();

    let resp = ctx.get("/products/1").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"<option value="A3">"#));
    assert!(resp.body.contains(r#"name="product_id" value="1""#));

    let resp = ctx.get("/products/42").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.contains("Poster not found"));
}

#[tokio::test]
async fn test_catalog_load_failure_is_shown() {
    let mut ctx = TestContext::with_catalog_error(CatalogLoadError::Io {
        path: "missing.json".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    });

    let resp = ctx.get("/").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("The catalog is unavailable right now"));
    assert!(resp.body.contains("0 posters"));

    let body = ctx.get("/api/products").await.json();
    assert_eq!(body["count"], 0);
    assert!(body["catalogError"].as_str().unwrap().contains("missing.json"));
}
