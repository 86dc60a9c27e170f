//! Cart mutations through the HTML routes, persisted in the session.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use wallposter_integration_tests::TestContext;

fn badge(count: u32) -> String {
    format!(r#"data-count="{count}""#)
}

#[tokio::test]
async fn test_adding_same_variant_twice_merges_lines() {
    let mut ctx = TestContext::new();

    let resp = ctx.add_to_cart(1, "A4").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/cart"));
    ctx.add_to_cart(1, "A4").await;

    let count = ctx.get("/cart/count").await;
    assert!(count.body.contains(&badge(2)));

    let cart = ctx.get("/cart").await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body.matches(r#"name="key" value="1:A4""#).count(), 3);
    assert!(cart.body.contains("\u{20b9}998.00"));
}

#[tokio::test]
async fn test_different_sizes_are_separate_lines() {
    let mut ctx = TestContext::new();
    ctx.add_to_cart(1, "A4").await;
    ctx.add_to_cart(1, "A3").await;

    let cart = ctx.get("/cart").await;
    assert!(cart.body.contains(r#"value="1:A4""#));
    assert!(cart.body.contains(r#"value="1:A3""#));
    // 499 + 699
    assert!(cart.body.contains("\u{20b9}1,198.00"));
}

#[tokio::test]
async fn test_increment_decrement_and_remove() {
    let mut ctx = TestContext::new();
    ctx.add_to_cart(2, "A3").await;

    ctx.post_form("/cart/increment", &[("key", "2:A3")]).await;
    assert!(ctx.get("/cart/count").await.body.contains(&badge(2)));

    ctx.post_form("/cart/decrement", &[("key", "2:A3")]).await;
    let resp = ctx.post_form("/cart/decrement", &[("key", "2:A3")]).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert!(ctx.get("/cart/count").await.body.contains(&badge(1)));

    ctx.post_form("/cart/remove", &[("key", "2:A3")]).await;
    assert!(ctx.get("/cart/count").await.body.contains(&badge(0)));
    assert!(ctx.get("/cart").await.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_cart_belongs_to_the_session() {
    let mut ctx = TestContext::new();
    ctx.add_to_cart(3, "30x30").await;
    assert!(ctx.get("/cart/count").await.body.contains(&badge(1)));

    ctx.forget_session();
    assert!(ctx.get("/cart/count").await.body.contains(&badge(0)));
}

#[tokio::test]
async fn test_unknown_size_is_rejected() {
    let mut ctx = TestContext::new();
    let resp = ctx.add_to_cart(1, "A0").await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["error"].is_string());
    assert!(ctx.get("/cart/count").await.body.contains(&badge(0)));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let mut ctx = TestContext::new();
    let resp = ctx.add_to_cart(99, "A4").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mutating_missing_line_is_not_found() {
    let mut ctx = TestContext::new();
    let resp = ctx.post_form("/cart/increment", &[("key", "1:A4")]).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = ctx.post_form("/cart/remove", &[("key", "not-a-key")]).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}
