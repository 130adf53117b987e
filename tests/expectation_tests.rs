mod common;

use common::ControlPlaneStub;
use mockserver_client::prelude::*;
use serde_json::json;

#[test]
fn mock_any_response_sends_the_expectation_document() {
    let _ = env_logger::try_init();

    let stub = ControlPlaneStub::start(201, "");
    let client = MockServerClient::new(stub.url(), stub.url());

    client
        .mock_any_response(
            &Expectation::new()
                .when(
                    RequestMatcher::new(Method::GET, "/test")
                        .query_param("query", "metallica")
                        .header("Accept", "text/html")
                        .header("Accept", "application/json"),
                )
                .respond(ResponseTemplate::new(200).body("ohi"))
                .times(2),
        )
        .unwrap();

    let received = stub.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "PUT");
    assert_eq!(received[0].path, "/expectation");
    assert_eq!(
        received[0].content_type.as_deref(),
        Some("application/json; charset=utf-8")
    );

    let document: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(
        document,
        json!({
            "httpRequest": {
                "method": "GET",
                "path": "/test",
                "queryStringParameters": [{ "name": "query", "value": "metallica" }],
                "headers": [{ "name": "Accept", "values": ["text/html", "application/json"] }],
            },
            "httpResponse": { "statusCode": 200, "body": "ohi" },
            "times": { "remainingTimes": 2, "unlimited": false },
        })
    );
}

#[test]
fn reset_mocks_sends_an_empty_put() {
    let _ = env_logger::try_init();

    let stub = ControlPlaneStub::start(200, "");
    let client = MockServerClient::new(stub.url(), stub.url());

    client.reset_mocks().unwrap();

    let received = stub.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "PUT");
    assert_eq!(received[0].path, "/reset");
    assert!(received[0].body.is_empty());
}

#[test]
fn must_variants_pass_on_success() {
    let _ = env_logger::try_init();

    let stub = ControlPlaneStub::start(200, "");
    let client = MockServerClient::new(stub.url(), stub.url());

    client.must_mock_any_response(
        &Expectation::new()
            .when(RequestMatcher::new(Method::GET, "/hello"))
            .respond(ResponseTemplate::new(204)),
    );
    client.must_reset_mocks();

    assert_eq!(stub.received().len(), 2);
}

#[tokio::test]
async fn mock_any_response_async_sends_the_expectation_document() {
    let _ = env_logger::try_init();

    let stub = ControlPlaneStub::start(201, "");
    let client = MockServerClient::new(stub.url(), stub.url());

    client
        .mock_any_response_async(
            &Expectation::new()
                .when(RequestMatcher::new(Method::POST, "/orders").json_body("{\"id\":1}"))
                .respond(ResponseTemplate::new(201))
                .time_to_live("MINUTES", 2.0),
        )
        .await
        .unwrap();

    let received = stub.received();
    assert_eq!(received.len(), 1);

    let document: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(
        document,
        json!({
            "httpRequest": {
                "method": "POST",
                "path": "/orders",
                "body": { "type": "JSON", "value": "{\"id\":1}" },
            },
            "httpResponse": { "statusCode": 201 },
            "timeToLive": { "timeUnit": "MINUTES", "timeToLive": 2.0, "unlimited": false },
        })
    );
}
