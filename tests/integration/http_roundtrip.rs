use crate::support::{FixtureServer, FIXTURE_KEY};
use std::fs;
use tapir_client::NodeId;
use tempfile::TempDir;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[test]
fn upload_then_read_all_returns_same_bytes() {
    let server = FixtureServer::start();
    let session = server.session();
    let temp = TempDir::new().unwrap();

    // Larger than one range chunk so the stream is copied in several reads.
    let content = pattern(3 * 1024 * 1024 + 17);
    let local = temp.path().join("evidence.bin");
    fs::write(&local, &content).unwrap();

    let answer = session.upload(&local).unwrap().unwrap();
    assert_eq!(answer.as_u64(), Some(content.len() as u64));

    let data = session.read_all(NodeId::new(3, 0)).unwrap();
    assert_eq!(data.len(), content.len());
    assert!(data == content);

    let log = server.log.lock();
    assert!(log.urls[0].starts_with("/api/upload?name=evidence.bin"));
    assert!(log
        .api_keys
        .iter()
        .all(|key| key.as_deref() == Some(FIXTURE_KEY)));
}

#[test]
fn download_writes_file_and_read_returns_range() {
    let server = FixtureServer::start();
    let session = server.session();
    let temp = TempDir::new().unwrap();

    let content = pattern(64 * 1024);
    let local = temp.path().join("disk.raw");
    fs::write(&local, &content).unwrap();
    session.upload(&local).unwrap().unwrap();

    let target = temp.path().join("copy.raw");
    let written = session.download(NodeId::new(3, 0), &target).unwrap();
    assert_eq!(written, content.len() as u64);
    assert_eq!(fs::read(&target).unwrap(), content);

    let slice = session.read(NodeId::new(3, 0), 16, 100).unwrap();
    assert_eq!(slice, &content[100..116]);
}

#[test]
fn upload_of_missing_file_sends_nothing() {
    let server = FixtureServer::start();
    let session = server.session();
    let temp = TempDir::new().unwrap();

    let answer = session.upload(&temp.path().join("absent.bin")).unwrap();
    assert!(answer.is_none());
    assert!(server.log.lock().urls.is_empty());
}

#[test]
fn server_errors_are_raised_for_transfers_and_absent_for_lookups() {
    let server = FixtureServer::start();
    let session = server.session();

    assert!(session.lookup_by_path("/root").is_none());
    assert_eq!(session.node_count(), Some(3));
    assert!(session.query("name == 'x'", None).is_err());
}
