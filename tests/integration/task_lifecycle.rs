use crate::support::mock_session;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::mpsc;
use std::time::Duration;
use tapir_client::transport::{Method, Response};
use tapir_client::TaskHandle;

#[test]
fn run_blocks_until_server_answers_while_schedule_returns_at_once() {
    let (mock, session) = mock_session();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);

    mock.on(Method::Post, "/run", move |_| {
        let _ = release_rx.lock().recv();
        Response::from_json(200, &json!({ "hashes": ["deadbeef"] }))
    });
    mock.respond_json(Method::Post, "/schedule", 200, json!(7));

    let (done_tx, done_rx) = mpsc::channel();
    let runner = {
        let session = session.clone();
        std::thread::spawn(move || {
            let result = session.run("hash", &json!({ "files": ["/root/test-data"] }), false);
            let _ = done_tx.send(result);
        })
    };

    assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

    let handle = session.schedule("exif", &json!({}), false).unwrap();
    assert_eq!(handle, TaskHandle::new(json!(7)));
    assert!(done_rx.try_recv().is_err());

    release_tx.send(()).unwrap();
    let result = done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(result, Some(json!({ "hashes": ["deadbeef"] })));
    runner.join().unwrap();
}

#[test]
fn scheduled_task_is_polled_by_its_handle() {
    let (mock, session) = mock_session();
    mock.respond_json(Method::Post, "/schedule", 200, json!("task-42"));
    mock.on(Method::Post, "/task", |req| match req.query_value("task_id") {
        Some("task-42") => Response::from_json(200, &json!({ "state": "Finished" })),
        _ => Response::from_bytes(404, "unknown task"),
    });
    mock.respond_json(Method::Post, "/task_count", 200, json!(1));

    let handle = session
        .schedule("prefetch", &json!({ "depth": 2 }), true)
        .unwrap();
    assert_eq!(handle.task_id(), "task-42");

    let status = session.task(&handle).unwrap();
    assert_eq!(status["state"], json!("Finished"));
    assert_eq!(session.task_count(), 1);

    let body = mock.requests_to("/schedule")[0].json().unwrap();
    assert_eq!(body["name"], json!("prefetch"));
    assert_eq!(body["arguments"], json!("{\"depth\":2}"));
    assert_eq!(body["relaunch"], json!(true));

    assert!(session.task(&TaskHandle::new(json!("other"))).is_none());
}

#[test]
fn join_reports_acknowledgement() {
    let (mock, session) = mock_session();
    assert!(!session.join());
    mock.respond_json(Method::Post, "/join", 200, json!(true));
    assert!(session.join());
}
