//! End-to-end tests: real gateway on TCP, mock NetSuite on TCP.

mod common;

use std::time::Duration;

use common::{closed_addr, gateway_config, suiteql_body, MockNetSuite, TestGateway};
use netsuite_gateway::config::Environment;
use sdk_rust::GatewayClient;

#[tokio::test]
async fn test_no_match_is_success() {
    let netsuite = MockNetSuite::with_records(&[], &[]).await;
    let gateway = TestGateway::start(gateway_config(&netsuite.base_url())).await;
    let client = GatewayClient::new(&gateway.url());

    let verdict = client.check_customer("new@acme.com").await.unwrap();
    assert!(verdict.success);
    assert_eq!(verdict.message.as_deref(), Some("No existing customer or contact found"));
    let flags = verdict.data.unwrap();
    assert!(!flags.customer_exists);
    assert!(!flags.contact_exists);

    assert_eq!(netsuite.requests().len(), 2);
    gateway.stop().await;
}

#[tokio::test]
async fn test_outbound_requests_are_signed() {
    let netsuite = MockNetSuite::with_records(&[], &[]).await;
    let gateway = TestGateway::start(gateway_config(&netsuite.base_url())).await;

    GatewayClient::new(&gateway.url())
        .check_customer("new@acme.com")
        .await
        .unwrap();

    let requests = netsuite.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert!(request.head.starts_with("POST /services/rest/query/v1/suiteql "));
        assert_eq!(request.header("prefer").as_deref(), Some("transient"));

        let auth = request.header("authorization").unwrap();
        assert!(auth.starts_with("OAuth realm=\"1234567\""), "{auth}");
        assert!(auth.contains("oauth_signature_method=\"HMAC-SHA256\""));
        assert!(auth.contains("oauth_consumer_key=\"consumer-key\""));
        assert!(auth.contains("oauth_token=\"access-token\""));
        assert!(!auth.contains("consumer-secret"));
        assert!(!auth.contains("token-secret"));
    }

    let queries: Vec<String> = requests.iter().map(|r| r.query()).collect();
    assert!(queries.iter().any(|q| q.contains("FROM Customer") && q.contains("subsidiary = 2")));
    assert!(queries.iter().any(|q| q.contains("FROM Contact")));
    gateway.stop().await;
}

#[tokio::test]
async fn test_customer_match_wins_over_contact() {
    let netsuite = MockNetSuite::with_records(&["dup@acme.com"], &["dup@acme.com"]).await;
    let gateway = TestGateway::start(gateway_config(&netsuite.base_url())).await;

    let verdict = GatewayClient::new(&gateway.url())
        .check_customer("dup@acme.com")
        .await
        .unwrap();

    assert!(!verdict.success);
    assert!(verdict.error.unwrap().contains("Customer"));
    let flags = verdict.data.unwrap();
    assert!(flags.customer_exists);
    assert!(flags.contact_exists);
    gateway.stop().await;
}

#[tokio::test]
async fn test_contact_only_match() {
    let netsuite = MockNetSuite::with_records(&[], &["person@acme.com"]).await;
    let gateway = TestGateway::start(gateway_config(&netsuite.base_url())).await;
    let client = GatewayClient::new(&gateway.url());

    let verdict = client.check_customer("person@acme.com").await.unwrap();
    assert!(!verdict.success);
    assert_eq!(verdict.error.as_deref(), Some("Contact already exists in NetSuite"));

    let contact = client.contact_exists("person@acme.com").await.unwrap();
    assert!(contact.exists);
    assert_eq!(contact.email, "person@acme.com");

    let customer = client.customer_exists("person@acme.com").await.unwrap();
    assert!(!customer.exists);
    gateway.stop().await;
}

#[tokio::test]
async fn test_invalid_email_never_reaches_netsuite() {
    let netsuite = MockNetSuite::with_records(&[], &[]).await;
    let gateway = TestGateway::start(gateway_config(&netsuite.base_url())).await;
    let client = GatewayClient::new(&gateway.url());

    let resp = client.check_customer_raw("not-an-email").await.unwrap();
    assert_eq!(resp.status(), 400);

    for path in ["/customer/not-an-email/exists", "/contact/not-an-email/exists"] {
        let resp = client.get(path).await.unwrap();
        assert_eq!(resp.status(), 400, "{path}");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Invalid email format");
    }

    assert!(netsuite.requests().is_empty());
    gateway.stop().await;
}

#[tokio::test]
async fn test_single_quote_is_doubled_in_query() {
    let netsuite = MockNetSuite::with_records(&[], &[]).await;
    let gateway = TestGateway::start(gateway_config(&netsuite.base_url())).await;

    let resp = GatewayClient::new(&gateway.url())
        .get("/contact/o'brien@acme.com/exists")
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let requests = netsuite.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].query().contains("'o''brien@acme.com'"));
    gateway.stop().await;
}

#[tokio::test]
async fn test_connection_refused_is_bad_gateway() {
    let gateway = TestGateway::start(gateway_config(&format!("http://{}", closed_addr()))).await;
    let client = GatewayClient::new(&gateway.url());

    let resp = client.check_customer_raw("a@acme.com").await.unwrap();
    assert_eq!(resp.status(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "NetSuite service unavailable");
    assert_eq!(body["path"], "/api/netsuite/customer/check");
    assert_eq!(body["method"], "POST");

    let resp = client.get("/customer/a@acme.com/exists").await.unwrap();
    assert_eq!(resp.status(), 502);
    gateway.stop().await;
}

#[tokio::test]
async fn test_slow_netsuite_is_gateway_timeout() {
    let netsuite = MockNetSuite::start(|_| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, suiteql_body(0))
    })
    .await;
    let mut config = gateway_config(&netsuite.base_url());
    config.netsuite.timeout_secs = 1;
    let gateway = TestGateway::start(config).await;

    let resp = GatewayClient::new(&gateway.url())
        .check_customer_raw("a@acme.com")
        .await
        .unwrap();
    assert_eq!(resp.status(), 504);
    gateway.stop().await;
}

#[tokio::test]
async fn test_upstream_error_details_only_outside_production() {
    let netsuite = MockNetSuite::start(|_| async {
        (401, r#"{"error":"INVALID_LOGIN_ATTEMPT"}"#.to_string())
    })
    .await;

    let gateway = TestGateway::start(gateway_config(&netsuite.base_url())).await;
    let resp = GatewayClient::new(&gateway.url())
        .check_customer_raw("a@acme.com")
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["details"]["upstreamStatus"], 401);
    assert!(body["details"]["upstreamBody"]
        .as_str()
        .unwrap()
        .contains("INVALID_LOGIN_ATTEMPT"));
    gateway.stop().await;

    let mut config = gateway_config(&netsuite.base_url());
    config.environment = Environment::Production;
    let gateway = TestGateway::start(config).await;
    let resp = GatewayClient::new(&gateway.url())
        .check_customer_raw("a@acme.com")
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body.get("details").is_none());
    gateway.stop().await;
}

#[tokio::test]
async fn test_undecodable_response_is_failure_verdict() {
    let netsuite = MockNetSuite::start(|_| async { (200, "<html>maintenance</html>".to_string()) }).await;
    let gateway = TestGateway::start(gateway_config(&netsuite.base_url())).await;

    let verdict = GatewayClient::new(&gateway.url())
        .check_customer("a@acme.com")
        .await
        .unwrap();
    assert!(!verdict.success);
    assert!(verdict
        .error
        .unwrap()
        .starts_with("An error occurred while querying NetSuite"));
    assert!(verdict.data.is_none());
    gateway.stop().await;
}

#[tokio::test]
async fn test_response_headers() {
    let netsuite = MockNetSuite::with_records(&[], &[]).await;
    let gateway = TestGateway::start(gateway_config(&netsuite.base_url())).await;

    let resp = reqwest::Client::new()
        .get(format!("{}/api/netsuite/contact/a@acme.com/exists", gateway.url()))
        .header("x-correlation-id", "trace-123")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let headers = resp.headers();
    assert_eq!(headers["x-correlation-id"], "trace-123");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-ratelimit-limit"], "100");
    assert_eq!(headers["x-ratelimit-remaining"], "99");
    assert!(headers.get("x-powered-by").is_none());
    gateway.stop().await;
}

#[tokio::test]
async fn test_api_key_over_the_wire() {
    let netsuite = MockNetSuite::with_records(&[], &[]).await;
    let mut config = gateway_config(&netsuite.base_url());
    config.security.api_keys = vec!["secret-key-1".into()];
    let gateway = TestGateway::start(config).await;

    let anonymous = GatewayClient::new(&gateway.url());
    assert!(anonymous.health().await.is_ok());
    assert_eq!(anonymous.check_customer_raw("a@acme.com").await.unwrap().status(), 401);

    let wrong = GatewayClient::new(&gateway.url()).with_api_key("nope");
    assert_eq!(wrong.check_customer_raw("a@acme.com").await.unwrap().status(), 403);

    let authorized = GatewayClient::new(&gateway.url()).with_api_key("secret-key-1");
    assert!(authorized.check_customer("a@acme.com").await.unwrap().success);
    gateway.stop().await;
}
