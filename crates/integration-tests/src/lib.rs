//! Integration tests for the Wallposter storefront.
//!
//! Every test drives the complete router (sessions, request ids, error
//! rendering) in-process with `tower::ServiceExt::oneshot`. No database is
//! needed: orders and sessions use the in-memory stores. Remote order
//! services are stood in for by [`spawn_order_service`] on a loopback port.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p wallposter-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Catalog View and product JSON API
//! - `cart` - Cart mutations and persistence across requests
//! - `checkout` - Checkout submission, confirmation and failures
//! - `orders` - `POST /api/order`

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::routing::post;
use axum::{Json, Router};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use wallposter_core::{Catalog, Price};
use wallposter_storefront::config::{CatalogSource, StorefrontConfig};
use wallposter_storefront::routes;
use wallposter_storefront::services::catalog::{CatalogLoadError, LoadedCatalog};
use wallposter_storefront::state::AppState;

/// Three-poster catalog shared by the tests.
pub const FIXTURE_CATALOG: &str = r#"[
  {
    "id": 1,
    "title": "Tiger at Dusk",
    "artist": "Ravi Kulkarni",
    "category": "Nature & Wildlife",
    "orientation": "Portrait",
    "basePrice": 49900,
    "popularity": 95,
    "addedAt": "2024-03-02",
    "tags": ["tiger", "wildlife"],
    "images": [{"src": "https://img.example/tiger.jpg", "alt": "Tiger"}],
    "variants": [{"size": "A4", "price": 49900}, {"size": "A3", "price": 69900}]
  },
  {
    "id": 2,
    "title": "Blue City Rooftops",
    "artist": "Meera Shah",
    "category": "Travel",
    "orientation": "Landscape",
    "basePrice": 44900,
    "popularity": 64,
    "addedAt": "2024-08-20",
    "tags": ["jodhpur", "architecture"],
    "images": [{"src": "https://img.example/jodhpur.jpg", "alt": "Jodhpur"}],
    "variants": [{"size": "A4", "price": 44900}, {"size": "A3", "price": 64900}]
  },
  {
    "id": 3,
    "title": "Lotus Grid",
    "artist": "Kabir Das",
    "category": "Abstract",
    "orientation": "Square",
    "basePrice": 39900,
    "popularity": 45,
    "addedAt": "2024-07-14",
    "tags": ["lotus", "pattern"],
    "images": [],
    "variants": [{"size": "30x30", "price": 39900}]
  }
]"#;

/// Flat shipping fee used by the test configuration.
pub const SHIPPING_FEE: Price = Price::from_minor(9900);

/// A response with its body read into a string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }

    /// The `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// A storefront router plus the session cookie of one visitor.
pub struct TestContext {
    pub state: AppState,
    app: Router,
    cookie: Option<String>,
}

impl TestContext {
    /// Storefront with the fixture catalog and in-process order handling.
    pub fn new() -> Self {
        Self::with_config(test_config(), Catalog::from_json(FIXTURE_CATALOG).unwrap())
    }

    /// Storefront that forwards orders to a remote order service.
    pub fn with_order_service(url: &str) -> Self {
        let config = StorefrontConfig {
            order_service_url: Some(Url::parse(url).unwrap()),
            order_timeout: Duration::from_secs(2),
            ..test_config()
        };
        Self::with_config(config, Catalog::from_json(FIXTURE_CATALOG).unwrap())
    }

    /// Storefront whose catalog could not be loaded.
    pub fn with_catalog_error(error: CatalogLoadError) -> Self {
        let loaded = LoadedCatalog {
            catalog: Catalog::default(),
            error: Some(error),
        };
        Self::from_loaded(test_config(), loaded)
    }

    fn with_config(config: StorefrontConfig, catalog: Catalog) -> Self {
        Self::from_loaded(
            config,
            LoadedCatalog {
                catalog,
                error: None,
            },
        )
    }

    fn from_loaded(config: StorefrontConfig, catalog: LoadedCatalog) -> Self {
        let state = AppState::new(config, None, catalog).unwrap();
        Self {
            app: routes::app(state.clone()),
            state,
            cookie: None,
        }
    }

    /// Forget the session cookie, as a fresh visitor would.
    pub fn forget_session(&mut self) {
        self.cookie = None;
    }

    /// GET `uri` with the current session cookie.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, Vec::new(), Body::empty()).await
    }

    /// POST an urlencoded form built from `fields`.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.send(
            Method::POST,
            uri,
            vec![(
                header::CONTENT_TYPE.as_str(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            Body::from(body),
        )
        .await
    }

    /// POST a raw JSON body with extra headers.
    pub async fn post_json(
        &mut self,
        uri: &str,
        body: &str,
        headers: &[(&'static str, &str)],
    ) -> TestResponse {
        let mut all = vec![(header::CONTENT_TYPE.as_str(), "application/json".to_string())];
        all.extend(headers.iter().map(|(name, value)| (*name, (*value).to_string())));
        self.send(Method::POST, uri, all, Body::from(body.to_string()))
            .await
    }

    /// Add one unit of a variant to the cart.
    pub async fn add_to_cart(&mut self, product_id: u32, size: &str) -> TestResponse {
        let product_id = product_id.to_string();
        self.post_form("/cart/add", &[("product_id", &product_id), ("size", size)])
            .await
    }

    async fn send(
        &mut self,
        method: Method,
        uri: &str,
        headers: Vec<(&str, String)>,
        body: Body,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        if let Some(cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration with no database, no Sentry and the in-process order path.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: None,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        catalog: CatalogSource::File("products.json".into()),
        shipping_fee: SHIPPING_FEE,
        order_service_url: None,
        order_timeout: Duration::from_secs(5),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Shipping form fields for a complete address.
#[must_use]
pub fn shipping_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("name", "Asha Menon"),
        ("phone", "+91 98765 43210"),
        ("email", "asha@example.in"),
        ("country", "India"),
        ("address", "12 MG Road"),
        ("city", "Kochi"),
        ("state", "Kerala"),
        ("postal", "682001"),
    ]
}

/// Pull the hidden idempotency key out of a rendered checkout page.
#[must_use]
pub fn idempotency_key_in(html: &str) -> String {
    let marker = r#"name="idempotency_key" value=""#;
    let start = html.find(marker).unwrap() + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

/// Serve a fixed `POST /api/order` response on an ephemeral loopback port.
///
/// Returns the base URL to hand to [`TestContext::with_order_service`].
pub async fn spawn_order_service(status: StatusCode, body: Value) -> String {
    let app = Router::new().route("/api/order", post(move || async move { (status, Json(body)) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/")
}
