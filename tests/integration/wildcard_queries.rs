use crate::support::{fixture_names, mock_session};
use glob::Pattern;
use serde_json::json;
use tapir_client::transport::{Method, Response};
use tapir_client::{Literal, Predicate};

/// Evaluate `name == w'...'` against the fixture names, as the server would.
fn serve_name_wildcards(mock: &tapir_client::transport::MockTransport) {
    let names = fixture_names();
    mock.on(Method::Post, "/query", move |req| {
        let query = req
            .json()
            .and_then(|body| body["query"].as_str().map(str::to_string))
            .unwrap_or_default();
        let pattern = query
            .strip_prefix("name == w'")
            .and_then(|rest| rest.strip_suffix('\''))
            .and_then(|p| Pattern::new(p).ok());
        match pattern {
            Some(pattern) => {
                let hits: Vec<_> = names
                    .iter()
                    .filter(|name| pattern.matches(name))
                    .map(|name| json!({ "name": name }))
                    .collect();
                Response::from_json(200, &json!(hits))
            }
            None => Response::from_bytes(400, "unsupported query"),
        }
    });
}

#[test]
fn star_wildcard_matches_both_images() {
    let (mock, session) = mock_session();
    serve_name_wildcards(&mock);

    let results = session.query("name == w'*.jpg'", None).unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn question_mark_matches_single_character() {
    let (mock, session) = mock_session();
    serve_name_wildcards(&mock);

    let results = session.query("name == w'image?.jpg'", Some("/root/test-data")).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], json!("image1.jpg"));
}

#[test]
fn typed_wildcard_predicate_reaches_server_intact() {
    let (mock, session) = mock_session();
    serve_name_wildcards(&mock);

    let predicate = Predicate::eq("name", Literal::wildcard("*.pdf").unwrap()).unwrap();
    let results = session.query_predicate(&predicate, None).unwrap();
    assert_eq!(results, vec![json!({ "name": "report.pdf" })]);
}

#[test]
fn unsupported_query_is_raised() {
    let (mock, session) = mock_session();
    serve_name_wildcards(&mock);
    assert!(session.query("size > 3", None).is_err());
}
