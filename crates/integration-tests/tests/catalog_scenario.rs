//! The end-to-end walk through the catalog: an owner lists a product, a
//! second account reviews it, and ownership holds on the review.

use axum::http::{Method, StatusCode};
use integration_tests::{Part, TestApp};
use serde_json::json;

#[tokio::test]
async fn owner_lists_product_and_another_user_reviews_it() {
    let app = TestApp::new();

    let register = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "email": "a@x.com", "password": "pw123456" }),
        )
        .await;
    assert_eq!(register.status, StatusCode::CREATED);

    let login = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "email": "a@x.com", "password": "pw123456" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let owner = login.body["token"].as_str().unwrap().to_owned();

    let product = app
        .form(Method::POST, "/api/products", Some(&owner), &[Part::Text("name", "Chair")])
        .await;
    assert_eq!(product.status, StatusCode::CREATED);
    assert_eq!(product.body["description"], "");
    assert_eq!(product.body["imagePath"], "");
    let product_id = product.body["id"].as_str().unwrap().to_owned();

    let (reviewer, _) = app.register("b@x.com", "pw123456").await;
    let review = app
        .add_review(&reviewer, &product_id, json!({ "rating": 5, "text": "Great" }))
        .await;
    assert_eq!(review.status, StatusCode::CREATED);
    let review_id = review.body["id"].as_str().unwrap().to_owned();

    let hijack = app
        .json(
            Method::PUT,
            &format!("/api/products/{product_id}/reviews/{review_id}"),
            Some(&owner),
            json!({ "text": "Terrible" }),
        )
        .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let listed = app.products().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "Chair");
    let reviews = listed[0]["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["rating"], 5);
    assert_eq!(reviews[0]["text"], "Great");
}
