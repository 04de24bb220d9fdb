use crate::support::{mock_session, serve_fixture_tree};
use serde_json::json;
use tapir_client::tooling::cli::{CliContext, Commands};
use tapir_client::transport::Method;
use tapir_client::ApiError;

#[test]
fn node_command_prints_document_json() {
    let (mock, session) = mock_session();
    serve_fixture_tree(&mock);
    let cli = CliContext::with_session(session);

    let output = cli
        .execute(&Commands::Node {
            path: None,
            id: Some("3:0".to_string()),
            with_path: true,
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["name"], json!("image1.jpg"));

    let sent = mock.requests_to("/node")[0].json().unwrap();
    assert_eq!(sent["option"]["path"], json!(true));
}

#[test]
fn bad_node_id_is_rejected_before_sending() {
    let (mock, session) = mock_session();
    let cli = CliContext::with_session(session);

    let err = cli
        .execute(&Commands::Path {
            id: "not-an-id".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidNodeId(_)));
    assert_eq!(mock.request_count(), 0);
}

#[test]
fn query_command_forwards_predicate_and_root() {
    let (mock, session) = mock_session();
    mock.respond_json(Method::Post, "/query", 200, json!([{ "name": "image1.jpg" }]));
    let cli = CliContext::with_session(session);

    let output = cli
        .execute(&Commands::Query {
            predicate: "name == w'*.jpg'".to_string(),
            root: Some("/root/test-data".to_string()),
        })
        .unwrap();
    assert!(output.contains("image1.jpg"));
    assert_eq!(
        mock.requests_to("/query")[0].json().unwrap(),
        json!({ "query": "name == w'*.jpg'", "root": "/root/test-data" })
    );
}

#[test]
fn read_command_renders_hex_dump() {
    let (mock, session) = mock_session();
    mock.respond_bytes(Method::Post, "/read", 200, b"MZ\x90\x00".to_vec());
    let cli = CliContext::with_session(session);

    let output = cli
        .execute(&Commands::Read {
            id: "3:0".to_string(),
            size: 4,
            offset: 0,
        })
        .unwrap();
    assert!(output.starts_with("00000000  4d5a9000"));
    assert!(output.trim_end().ends_with("MZ.."));
}

#[test]
fn attribute_command_sends_json_or_text_value() {
    let (mock, session) = mock_session();
    mock.respond_json(Method::Post, "/attribute", 200, json!(true));
    let cli = CliContext::with_session(session);

    cli.execute(&Commands::Attribute {
        id: "3:0".to_string(),
        name: "tag".to_string(),
        value: "suspicious".to_string(),
        description: Some("analyst note".to_string()),
    })
    .unwrap();
    cli.execute(&Commands::Attribute {
        id: "3:0".to_string(),
        name: "score".to_string(),
        value: "0.9".to_string(),
        description: None,
    })
    .unwrap();

    let sent = mock.requests_to("/attribute");
    assert_eq!(sent[0].json().unwrap()["value"], json!("suspicious"));
    assert_eq!(sent[0].json().unwrap()["description"], json!("analyst note"));
    assert_eq!(sent[1].json().unwrap()["value"], json!(0.9));
}
