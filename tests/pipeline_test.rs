mod common;

use common::{date, TestPipeline};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use order_analysis_etl::artifacts::TRANSFORMED;
use order_analysis_etl::models::OrderLine;
use order_analysis_etl::stages::{self, StageOutcome};
use order_analysis_etl::{run_pipeline, ApiClient};

fn customers_body() -> serde_json::Value {
    json!([{
        "customer_id": "C1",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "address": "12 Analytical Way",
        "phone_number": "555-0100",
        "state": "CA",
        "city": "San Francisco",
        "zip_code": "94105"
    }])
}

fn products_body() -> serde_json::Value {
    json!([
        {
            "product_id": "P1",
            "product_name": "Widget",
            "product_description": "A widget",
            "product_price": "9.99"
        },
        {
            "product_id": "P2",
            "product_name": "Gadget",
            "product_description": "A gadget",
            "product_price": "4.50"
        }
    ])
}

fn orders_body() -> serde_json::Value {
    json!([{
        "order_id": "O1",
        "customer_id": "C1",
        "order_total": "23.48",
        "order_date": "2024-06-17",
        "product_quantities": "{'P1': 2, 'P2': 1}"
    }])
}

#[tokio::test]
async fn end_to_end_scenario_produces_two_denormalized_rows() {
    let app = TestPipeline::new().await;
    app.mock_collection("customers", customers_body()).await;
    app.mock_collection("products", products_body()).await;
    app.mock_collection("orders", orders_body()).await;

    let report = run_pipeline(&app.cfg, &app.db, date("2024-06-17"))
        .await
        .unwrap();

    assert!(!report.extract.is_skipped());
    assert_eq!(report.transform.rows(), 2);
    assert_eq!(report.load.rows(), 2);

    let rows = app.final_rows().await;
    assert_eq!(rows.len(), 2);

    let p1 = &rows[0];
    assert_eq!(
        (p1.order_id.as_str(), p1.customer_id.as_str(), p1.product_id.as_str()),
        ("O1", "C1", "P1")
    );
    assert_eq!(p1.quantity, 2);
    assert_eq!(p1.product_price, Some(dec!(9.99)));
    assert_eq!(p1.order_date, date("2024-06-17"));
    assert_eq!(p1.first_name.as_deref(), Some("Ada"));

    let p2 = &rows[1];
    assert_eq!(p2.product_id, "P2");
    assert_eq!(p2.quantity, 1);
    assert_eq!(p2.product_price, Some(dec!(4.50)));
    assert_eq!(p2.order_date, date("2024-06-17"));
}

#[tokio::test]
async fn pipeline_is_idempotent_across_reruns() {
    let app = TestPipeline::new().await;
    app.mock_collection("customers", customers_body()).await;
    app.mock_collection("products", products_body()).await;
    app.mock_collection("orders", orders_body()).await;

    run_pipeline(&app.cfg, &app.db, date("2024-06-17"))
        .await
        .unwrap();
    let first = app.final_rows().await;

    let report = run_pipeline(&app.cfg, &app.db, date("2024-06-17"))
        .await
        .unwrap();
    // Second extract is a no-op because the raw artifacts already exist
    assert!(report.extract.is_skipped());
    assert_eq!(report.load.rows(), 2);

    let second = app.final_rows().await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn upsert_overwrites_non_key_fields_for_an_existing_key() {
    let app = TestPipeline::new().await;
    let day = date("2024-06-17");

    let mut line = OrderLine {
        order_id: "O1".to_string(),
        customer_id: "C1".to_string(),
        product_id: "P1".to_string(),
        quantity: 2,
        order_total: dec!(23.48),
        order_date: day,
        first_name: None,
        last_name: None,
        email: None,
        address: None,
        phone_number: None,
        state: None,
        city: None,
        zip_code: None,
        product_name: Some("Widget".to_string()),
        product_description: None,
        product_price: Some(dec!(9.99)),
    };

    app.store
        .write_rows(TRANSFORMED, day, std::slice::from_ref(&line))
        .unwrap();
    stages::load::load(&app.db, &app.store, day, app.cfg.load_batch_size)
        .await
        .unwrap();

    line.quantity = 5;
    app.store
        .write_rows(TRANSFORMED, day, std::slice::from_ref(&line))
        .unwrap();
    stages::load::load(&app.db, &app.store, day, app.cfg.load_batch_size)
        .await
        .unwrap();

    let rows = app.final_rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 5);
}

#[tokio::test]
async fn empty_orders_day_skips_transform_and_load() {
    let app = TestPipeline::new().await;
    app.mock_collection("customers", customers_body()).await;
    app.mock_collection("products", products_body()).await;
    app.mock_collection("orders", json!([])).await;

    let report = run_pipeline(&app.cfg, &app.db, date("2024-06-18"))
        .await
        .unwrap();

    assert!(!report.extract.is_skipped());
    assert!(report.transform.is_skipped());
    assert!(report.load.is_skipped());
    assert!(!app.store.exists(TRANSFORMED, date("2024-06-18")));
    assert!(app.final_rows().await.is_empty());
}

#[tokio::test]
async fn extract_retries_through_transient_server_errors() {
    let app = TestPipeline::new().await;

    // Customers endpoint fails twice before recovering
    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&app.server)
        .await;
    app.mock_collection("customers", customers_body()).await;
    app.mock_collection("products", products_body()).await;
    app.mock_collection("orders", orders_body()).await;

    let client = ApiClient::from_config(&app.cfg).unwrap();
    let outcome = stages::extract::extract(&client, &app.store, date("2024-06-17"))
        .await
        .unwrap();

    assert!(matches!(outcome, StageOutcome::Completed { .. }));
}

#[tokio::test]
async fn extract_fails_fast_on_client_errors() {
    let app = TestPipeline::new().await;

    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&app.server)
        .await;

    let client = ApiClient::from_config(&app.cfg).unwrap();
    let result = stages::extract::extract(&client, &app.store, date("2024-06-17")).await;

    assert!(result.is_err());
}
