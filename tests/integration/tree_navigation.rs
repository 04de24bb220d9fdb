use crate::support::{mock_session, serve_fixture_tree};
use tapir_client::{NodeId, NodeOptions};

#[test]
fn walk_from_root_to_leaf_one_lookup_per_step() {
    let (mock, session) = mock_session();
    serve_fixture_tree(&mock);

    let root = session.lookup_by_path("/root").unwrap();
    assert_eq!(root.path(), Some("/root"));
    assert_eq!(mock.request_count(), 1);

    let test_data = root.child("test-data").unwrap();
    assert_eq!(mock.request_count(), 2);
    assert_eq!(
        test_data.children_names(),
        vec!["image1.jpg", "image2_unicode_é.jpg", "report.pdf"]
    );

    let image = test_data.child("image2_unicode_é.jpg").unwrap();
    assert_eq!(image.get("data.size").and_then(|v| v.as_u64()), Some(2048));
    assert!(!image.has_children());
    assert!(test_data.child("missing.jpg").is_none());
}

#[test]
fn iterating_children_resolves_each_in_order() {
    let (mock, session) = mock_session();
    serve_fixture_tree(&mock);

    let test_data = session.lookup_by_path("/root/test-data").unwrap();
    let names: Vec<String> = test_data
        .iter_children()
        .map(|child| child.unwrap().name().unwrap().to_string())
        .collect();
    assert_eq!(names, ["image1.jpg", "image2_unicode_é.jpg", "report.pdf"]);
    assert_eq!(mock.requests_to("/node").len(), 4);
}

#[test]
fn batch_lookup_preserves_input_order() {
    let (mock, session) = mock_session();
    serve_fixture_tree(&mock);

    let ids = [NodeId::new(5, 0), NodeId::new(3, 0), NodeId::new(4, 0)];
    let nodes = session
        .lookup_many_by_id(&ids, NodeOptions::attributes_only())
        .unwrap();
    let got: Vec<NodeId> = nodes.iter().map(|n| n.id()).collect();
    assert_eq!(got, ids);
    assert_eq!(mock.requests_to("/nodes").len(), 1);

    assert!(session
        .lookup_many_by_id(&[NodeId::new(3, 0), NodeId::new(99, 0)], NodeOptions::default())
        .is_none());
}

#[test]
fn nodes_outlive_their_session() {
    let (mock, session) = mock_session();
    serve_fixture_tree(&mock);

    let root = session.lookup_by_path("/root").unwrap();
    drop(session);
    assert_eq!(root.name(), Some("root"));
    assert!(root.child("test-data").is_none());
}
