use std::collections::HashMap;

use shared::error::ErrorKind;
use tokio::net::TcpListener;

use super::*;
use crate::mock_service::{spawn_mock_service, TEST_TOKEN};

#[test]
fn forbidden_status_maps_to_permission_denied() {
    let err = error_for_status(StatusCode::FORBIDDEN, r#"{"message":"Admins only"}"#);
    assert!(matches!(
        err,
        ClientError::PermissionDenied { message: Some(ref m) } if m == "Admins only"
    ));
}

#[test]
fn other_statuses_carry_the_unwrapped_server_message() {
    let err = error_for_status(
        StatusCode::BAD_REQUEST,
        r#"{"title":"One or more validation errors occurred.","errors":{"Name":["The Name field is required."]}}"#,
    );
    let ClientError::Service { status, message } = err else {
        panic!("expected a service error");
    };
    assert_eq!(status, 400);
    assert!(message.is_some_and(|m| m.contains("The Name field is required.")));

    let err = error_for_status(StatusCode::BAD_GATEWAY, "");
    assert_eq!(err.user_message(), "Request failed with status 502");
}

#[test]
fn base_url_trailing_slash_is_tolerated() {
    let config = TransportConfig::parse("https://shop.example/api/").expect("config");
    let transport = HttpTransport::new(config).expect("transport");
    assert_eq!(transport.base_url(), "https://shop.example/api");
}

#[tokio::test]
async fn bearer_token_is_attached_when_present() {
    let service = spawn_mock_service().await.expect("spawn service");
    let transport = service.transport();
    let credential = Credential::bearer(TEST_TOKEN).expect("token");

    let body = transport
        .execute(ResourceRequest::get("order/all"), Some(&credential))
        .await
        .expect("authorized listing");
    assert!(body.contains("\"userName\":\"dana\""));

    let err = transport
        .execute(ResourceRequest::get("order/all"), None)
        .await
        .expect_err("anonymous listing");
    assert!(matches!(err, ClientError::Service { status: 401, .. }));
}

#[tokio::test]
async fn undecodable_success_bodies_are_decode_errors() {
    let service = spawn_mock_service().await.expect("spawn service");
    let err = service
        .transport()
        .fetch_json::<Vec<u32>>(ResourceRequest::get("Category/AllCategories"), None)
        .await
        .expect_err("categories are not numbers");
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let config = TransportConfig::parse(&format!("http://{addr}/api"))
        .expect("config")
        .with_timeout(Duration::from_secs(2));
    let err = HttpTransport::new(config)
        .expect("transport")
        .execute(ResourceRequest::get("Product"), None)
        .await
        .expect_err("nothing is listening");

    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(err.user_message(), "Network error, please try again later.");
}

#[test]
fn unencodable_payloads_are_validation_errors() {
    let payload: HashMap<(i32, i32), i32> = HashMap::from([((1, 2), 3)]);
    let err = ResourceRequest::post("Category/Add")
        .json(&payload)
        .expect_err("tuple keys have no json form");
    assert!(matches!(err, ClientError::Validation(ref v) if v.field == "payload"));
}

#[tokio::test]
async fn bad_attachment_types_are_refused_before_sending() {
    let service = spawn_mock_service().await.expect("spawn service");
    let credential = Credential::bearer(TEST_TOKEN).expect("token");
    let body = MultipartBody::default().text("Name", "Trail").file(
        "imageFile",
        ImageAttachment {
            filename: "trail.png".into(),
            mime_type: Some("not a type".into()),
            bytes: vec![1, 2, 3],
        },
    );

    let err = service
        .transport()
        .execute(ResourceRequest::post("Product").multipart(body), Some(&credential))
        .await
        .expect_err("invalid content type");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(service.hits("product.create").await, 0);
}
