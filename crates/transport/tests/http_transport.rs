//! `HttpTransport` against a local mock Athena server.

use std::time::Duration;

use client::{IpamClient, JobPolicy};
use ipam::{IpamError, IpamReservation, PolicyId, ReservationId, ServiceConfig, WorkspaceId};
use serde_json::json;
use transport::HttpTransport;
use wiremock::matchers::{
    basic_auth, body_partial_json, header, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ServiceConfig {
    let address = server.address();
    ServiceConfig::new(address.ip().to_string(), address.port(), "admin", "s3cret").with_scheme("http")
}

fn client_for(server: &MockServer) -> IpamClient<HttpTransport> {
    let config = config_for(server);
    let transport = HttpTransport::new(&config).unwrap();
    IpamClient::new(transport, config).with_job_policy(JobPolicy {
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    })
}

#[tokio::test]
async fn sends_standard_headers_and_basic_auth() {
    let server = MockServer::start().await;
    let host = format!("{}:{}", server.address().ip(), server.address().port());
    Mock::given(method("GET"))
        .and(path("/api/v3/onefuse/workspaces/1/"))
        .and(basic_auth("admin", "s3cret"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "*/*"))
        .and(header("cache-control", "no-cache"))
        .and(header("SOURCE", "Terraform"))
        .and(header("host", host.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "name": "Default" })))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = client_for(&server)
        .get_workspace(WorkspaceId::new(1))
        .await
        .unwrap();

    assert_eq!(workspace.name, "Default");
}

#[tokio::test]
async fn advertises_gzip_and_deflate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/onefuse/ipamPolicies/42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42, "name": "prod" })))
        .mount(&server)
        .await;

    client_for(&server)
        .get_ipam_policy(PolicyId::new(42))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let encoding = requests[0].headers.get("accept-encoding").unwrap();
    let encoding = encoding.to_str().unwrap();
    assert!(encoding.contains("gzip"));
    assert!(encoding.contains("deflate"));
}

#[tokio::test]
async fn name_lookup_sends_filter_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/onefuse/ipamPolicies/"))
        .and(query_param("filter", "name:prod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": { "ipamPolicies": [{ "id": 42, "name": "prod" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let policy = client_for(&server)
        .find_ipam_policy_by_name("prod")
        .await
        .unwrap();

    assert_eq!(policy.id, PolicyId::new(42));
}

#[tokio::test]
async fn error_status_carries_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/onefuse/ipamReservations/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"detail\":\"Not found.\"}"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_reservation(ReservationId::new(99))
        .await
        .unwrap_err();

    match err {
        IpamError::Http { status, body, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "{\"detail\":\"Not found.\"}");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn create_submits_polls_and_resolves() {
    let server = MockServer::start().await;
    let job_links = json!({
        "self": { "href": "/api/v3/onefuse/jobStatus/7/" },
        "managedObject": { "href": "/api/v3/onefuse/ipamReservations/55/" }
    });

    Mock::given(method("GET"))
        .and(path("/api/v3/onefuse/workspaces/"))
        .and(query_param("filter", "name.exact:Default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": { "workspaces": [{ "id": 1, "name": "Default" }] }
        })))
        .mount(&server)
        .await;

    let base = format!("http://{}:{}/api/v3/onefuse", server.address().ip(), server.address().port());
    Mock::given(method("POST"))
        .and(path("/api/v3/onefuse/ipamReservations/"))
        .and(body_partial_json(json!({
            "hostname": "web-01",
            "policy": format!("{base}/ipamPolicies/42/"),
            "workspace": format!("{base}/workspaces/1/"),
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": 7, "jobState": "Pending", "_links": job_links
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/onefuse/jobStatus/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "jobState": "Running", "_links": job_links
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/onefuse/jobStatus/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "jobState": "Successful", "_links": job_links
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/onefuse/ipamReservations/55/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 55,
            "hostname": "web-01.corp.local",
            "ipAddress": "10.1.1.5",
            "template_properties": { "env": "prod" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reservation = IpamReservation {
        policy_id: Some(PolicyId::new(42)),
        ..IpamReservation::new("web-01")
    };
    let created = client_for(&server)
        .create_reservation(reservation)
        .await
        .unwrap();

    assert_eq!(created.object.id, Some(ReservationId::new(55)));
    assert_eq!(created.object.ip_address.as_deref(), Some("10.1.1.5"));
    assert_eq!(created.outcome.polls, 2);
}

#[tokio::test]
async fn failed_job_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v3/onefuse/ipamReservations/55/"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "id": 8, "jobState": "Pending" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/onefuse/jobStatus/8/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 8,
            "jobState": "Failed",
            "jobType": "Delete IPAM Reservation",
            "errorDetails": { "code": 409, "errors": [{ "message": "reservation is in use" }] }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_reservation(ReservationId::new(55))
        .await
        .unwrap_err();

    assert!(err.is_job_failure());
    assert!(err.to_string().contains("reservation is in use"));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    drop(server);

    let transport = HttpTransport::new(&config).unwrap();
    let err = IpamClient::new(transport, config)
        .get_workspace(WorkspaceId::new(1))
        .await
        .unwrap_err();

    assert!(matches!(err, IpamError::Transport { .. }));
}
