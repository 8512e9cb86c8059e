//! Integration tests for the HTTP address probe
//!
//! These tests use wiremock to stand in for the address echo service.

use catalog_atlas::identity::{AddressProbe, HttpProbe, IdentityError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_http_probe_returns_trimmed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.23\n"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let probe = HttpProbe::new(&format!("{}/ip", mock_server.uri())).unwrap();

    assert_eq!(probe.current_address().await.unwrap(), "198.51.100.23");
    // Every call observes the network again
    assert_eq!(probe.current_address().await.unwrap(), "198.51.100.23");
}

#[tokio::test]
async fn test_http_probe_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let probe = HttpProbe::new(&mock_server.uri()).unwrap();

    assert!(matches!(
        probe.current_address().await,
        Err(IdentityError::Probe(_))
    ));
}

#[tokio::test]
async fn test_http_probe_empty_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
        .mount(&mock_server)
        .await;

    let probe = HttpProbe::new(&mock_server.uri()).unwrap();

    assert!(matches!(
        probe.current_address().await,
        Err(IdentityError::NoAddress)
    ));
}

#[tokio::test]
async fn test_http_probe_unreachable_service() {
    // Bind a server, then drop it so the port refuses connections
    let uri = {
        let mock_server = MockServer::start().await;
        mock_server.uri()
    };

    let probe = HttpProbe::new(&uri).unwrap();

    assert!(matches!(
        probe.current_address().await,
        Err(IdentityError::Probe(_))
    ));
}
