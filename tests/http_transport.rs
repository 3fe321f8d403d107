//! Integration tests for the HTTP notification transport.

mod test_utils;

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use logrelay::{
    Ack, ChannelReporter, DeliveryError, ErrorKind, HttpConfig, HttpPublisherBuilder,
    HttpTransport, Level, LogRecord, PublisherBuilderTrait, Transport,
};
use rstest::{fixture, rstest};
use test_utils::mock_http::spawn_mock_server;

#[fixture]
fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

fn local_config(addr: SocketAddr, room: &str) -> HttpConfig {
    let mut config = HttpConfig::new(room, "secret-token");
    config.scheme = "http".into();
    config.api_host = addr.to_string();
    config.connect_timeout = Duration::from_secs(5);
    config.write_timeout = Duration::from_secs(5);
    config
}

#[rstest]
fn no_content_is_success(tcp_listener: TcpListener) {
    let (addr, rx) = spawn_mock_server(tcp_listener, vec![(204, "")]);
    let transport = HttpTransport::new(local_config(addr, "42"));

    let ack = transport.send(b"payload").expect("204 is accepted");
    assert_eq!(ack, Ack::Status(204));

    let request = rx.recv_timeout(Duration::from_secs(5)).expect("request");
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/v2/room/42/notification");
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.header("authorization"), Some("Bearer secret-token"));
    assert_eq!(request.header("host"), Some(addr.to_string().as_str()));
    assert_eq!(
        request.body,
        r#"{"notify":true,"message":"payload","message_format":"text"}"#
    );
}

#[rstest]
fn ok_is_an_unexpected_status(tcp_listener: TcpListener) {
    let (addr, _rx) = spawn_mock_server(tcp_listener, vec![(200, "fine")]);
    let transport = HttpTransport::new(local_config(addr, "42"));

    let err = transport.send(b"payload").expect_err("only 204 succeeds");
    assert_eq!(err.kind(), ErrorKind::UnexpectedStatus);
    assert!(matches!(
        err,
        DeliveryError::UnexpectedStatus { status: 200, ref body } if body == "fine"
    ));
}

#[rstest]
#[case(302, "moved")]
#[case(401, "bad token")]
#[case(500, "boom")]
fn other_statuses_capture_the_body(
    tcp_listener: TcpListener,
    #[case] status: u16,
    #[case] body: &'static str,
) {
    let (addr, _rx) = spawn_mock_server(tcp_listener, vec![(status, body)]);
    let transport = HttpTransport::new(local_config(addr, "42"));

    match transport.send(b"x") {
        Err(DeliveryError::UnexpectedStatus {
            status: got,
            body: got_body,
        }) => {
            assert_eq!(got, status);
            assert_eq!(got_body, body);
        }
        other => panic!("expected unexpected status, got {other:?}"),
    }
}

#[rstest]
fn envelope_escapes_the_encoded_record(tcp_listener: TcpListener) {
    let (addr, rx) = spawn_mock_server(tcp_listener, vec![(204, "")]);
    let publisher = HttpPublisherBuilder::new()
        .with_room("ops room")
        .with_scheme("http")
        .with_api_host(addr.to_string())
        .build()
        .expect("valid builder");

    let record = LogRecord::new("app", Level::Info, "say \"hi\"");
    publisher.publish(&record);

    let request = rx.recv_timeout(Duration::from_secs(5)).expect("request");
    assert_eq!(request.path, "/v2/room/ops%20room/notification");

    let envelope: serde_json::Value =
        serde_json::from_str(&request.body).expect("envelope is JSON");
    assert_eq!(envelope["notify"], true);
    assert_eq!(envelope["message_format"], "text");
    let inner = envelope["message"].as_str().expect("message is a string");
    assert!(inner.ends_with("\r\n"));
    let record_json: serde_json::Value =
        serde_json::from_str(inner.trim_end()).expect("inner payload is JSON");
    assert_eq!(record_json["message"], "say \"hi\"");
    assert_eq!(record_json["level"], "INFO");
}

#[rstest]
fn unreachable_endpoint_is_reported(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener address");
    drop(tcp_listener);
    let (reporter, rx) = ChannelReporter::new(4);
    let publisher = HttpPublisherBuilder::new()
        .with_room("1")
        .with_scheme("http")
        .with_api_host(addr.to_string())
        .with_connect_timeout_ms(500)
        .with_reporter(Arc::new(reporter))
        .build()
        .expect("valid builder");

    publisher.publish(&LogRecord::new("app", Level::Severe, "lost"));

    let report = rx.try_recv().expect("failure reported");
    assert_eq!(report.kind, ErrorKind::WriteFailure);
    assert!(report.context.contains("/v2/room/1/notification"));
}

#[rstest]
fn rejected_status_is_reported_not_raised(tcp_listener: TcpListener) {
    let (addr, _rx) = spawn_mock_server(tcp_listener, vec![(400, "invalid")]);
    let (reporter, rx) = ChannelReporter::new(4);
    let publisher = HttpPublisherBuilder::new()
        .with_room("1")
        .with_scheme("http")
        .with_api_host(addr.to_string())
        .with_reporter(Arc::new(reporter))
        .build()
        .expect("valid builder");

    publisher.publish(&LogRecord::new("app", Level::Info, "x"));

    let report = rx.try_recv().expect("failure reported");
    assert_eq!(report.kind, ErrorKind::UnexpectedStatus);
    assert!(report.message.contains("invalid"));
}
