use serde_json::json;
use sprout::api::{ApiClient, ApiError};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn user_json() -> serde_json::Value {
    json!({
        "id": 12,
        "user_id": "TEST001",
        "name": "Asha",
        "role": "farmer",
        "created_at": "2024-01-01T00:00:00"
    })
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_success_returns_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .and(body_json(json!({"user_id": "TEST001"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "user": user_json()})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri());
    let user = client.login("TEST001").await.unwrap();

    assert_eq!(user.id, 12);
    assert_eq!(user.user_id, "TEST001");
    assert_eq!(user.display_name(), "Asha");
}

#[tokio::test]
async fn test_login_rejection_uses_server_error_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "User not found"})))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri());
    let err = client.login("TEST999").await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Http {
            status: 404,
            message: "User not found".into()
        }
    );
    assert_eq!(err.to_string(), "User not found");
}

#[tokio::test]
async fn test_login_rejection_without_body_says_login_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri());
    let err = client.login("TEST001").await.unwrap_err();

    assert_eq!(err.to_string(), "Login failed");
}

#[tokio::test]
async fn test_login_success_without_user_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri());
    let err = client.login("TEST001").await.unwrap_err();

    assert_eq!(err, ApiError::InvalidResponse);
}

#[tokio::test]
async fn test_login_network_error() {
    // Nothing listens on the discard port
    let client = ApiClient::new("http://127.0.0.1:9");
    let err = client.login("TEST001").await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_list_products() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Neem Oil 1L", "price": 12.5, "image": "neem.png"},
            {"id": 2, "name": "Urea 50kg", "price": 1199}
        ])))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri());
    let products = client.list_products().await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Neem Oil 1L");
    assert_eq!(products[1].price, 1199.0);
    assert!(products[1].image.is_empty());
}

#[tokio::test]
async fn test_get_product_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "Neem Oil 1L",
            "price": 12.5,
            "description": "Cold-pressed.",
            "rating": 4.5,
            "reviews": 1234,
            "sold": 12000
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri());
    let product = client.get_product(1).await.unwrap();

    assert_eq!(product.reviews, 1234);
    assert_eq!(product.sold, 12000);
    assert_eq!(product.image, None);
}

#[tokio::test]
async fn test_get_product_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/99"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "Product not found"})),
        )
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri());
    let err = client.get_product(99).await.unwrap_err();

    assert_eq!(err.to_string(), "Product not found");
}

#[tokio::test]
async fn test_malformed_product_list_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri());
    let err = client.list_products().await.unwrap_err();

    assert!(matches!(err, ApiError::Parse(_)));
}
