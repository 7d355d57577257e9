use std::io::{BufReader, Cursor, Seek, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use packserve::http::assets::requested_name;
use packserve::http::pool::WorkerPool;
use packserve::http::request::{Request, RequestError, MAX_BODY};
use packserve::http::response::{Body, Response};

fn request(raw: &str) -> Option<Request<BufReader<Cursor<Vec<u8>>>>> {
    Request::read(BufReader::new(Cursor::new(raw.as_bytes().to_vec()))).unwrap()
}

fn written(resp: Response) -> String {
    let mut out = Vec::new();
    resp.write_to(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

// ── Request parsing ───────────────────────────────────────────────────────────

#[test]
fn parses_request_line_and_body() {
    let mut req = request("POST /api/config HTTP/1.1\r\nHost: x\r\ncontent-length: 5\r\n\r\nhello").unwrap();
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/api/config");
    assert_eq!(req.content_length().unwrap(), 5);
    assert_eq!(req.body().unwrap(), b"hello");
    assert!(req.body().unwrap().is_empty(), "body is only read once");
}

#[test]
fn missing_content_length_means_empty_body() {
    let mut req = request("GET /a.zip HTTP/1.0\r\n\r\n").unwrap();
    assert_eq!(req.content_length().unwrap(), 0);
    assert!(req.body().unwrap().is_empty());
}

#[test]
fn malformed_request_lines_yield_nothing() {
    assert!(request("").is_none());
    assert!(request("\r\n").is_none());
    assert!(request("GET\r\n\r\n").is_none());
    assert!(request(" /path HTTP/1.1\r\n\r\n").is_none());
}

#[test]
fn bad_content_length_is_an_error() {
    let mut req = request("POST /api/reload HTTP/1.1\r\nContent-Length: abc\r\n\r\n").unwrap();
    assert!(matches!(req.body(), Err(RequestError::InvalidContentLength(_))));
}

#[test]
fn oversized_body_is_refused() {
    let raw = format!("POST /api/config HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_BODY + 1);
    let mut req = request(&raw).unwrap();
    assert!(matches!(req.body(), Err(RequestError::BodyTooLarge(_))));
}

#[test]
fn short_body_is_an_io_error() {
    let mut req = request("POST /x HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc").unwrap();
    assert!(matches!(req.body(), Err(RequestError::Io(_))));
}

#[test]
fn requested_name_takes_last_segment() {
    assert_eq!(requested_name("/pack.zip"), "pack.zip");
    assert_eq!(requested_name("/a/b/pack.zip"), "pack.zip");
    assert_eq!(requested_name("/pack.zip?v=2#top"), "pack.zip");
    assert_eq!(requested_name("/dir/"), "");
}

// ── Response writing ──────────────────────────────────────────────────────────

#[test]
fn text_response_wire_format() {
    let text = written(Response::text(405, "Method Not Allowed"));
    assert!(text.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(text.contains("Content-Type: text/plain\r\n"));
    assert!(text.contains("Content-Length: 18\r\n"));
    assert!(text.contains("Connection: close\r\n"));
    assert!(text.ends_with("\r\n\r\nMethod Not Allowed"));
}

#[test]
fn api_response_is_json() {
    let resp = Response::api(404, false, "API endpoint not found");
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.header_value("content-type"), Some("application/json"));
    assert_eq!(resp.header_value("Cache-Control"), Some("no-cache"));

    let text = written(resp);
    let body = text.split("\r\n\r\n").nth(1).unwrap();
    let value: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(value["success"], false);
    assert_eq!(value["message"], "API endpoint not found");
}

#[test]
fn api_message_is_json_escaped() {
    let text = written(Response::api(500, false, "bad \"quote\"\nline"));
    let body = text.split("\r\n\r\n").nth(1).unwrap();
    let value: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(value["message"], "bad \"quote\"\nline");
}

#[test]
fn file_body_streams_declared_length() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"0123456789").unwrap();
    file.rewind().unwrap();

    let resp = Response::new(200, Body::File { file, len: 10 });
    assert_eq!(resp.body().len(), 10);
    let text = written(resp);
    assert!(text.contains("Content-Length: 10\r\n"));
    assert!(text.ends_with("\r\n\r\n0123456789"));
}

#[test]
fn file_that_shrank_is_an_error() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"abc").unwrap();
    file.rewind().unwrap();

    let resp = Response::new(200, Body::File { file, len: 10 });
    let mut out = Vec::new();
    assert!(resp.write_to(&mut out).is_err());
}

// ── Worker pool ───────────────────────────────────────────────────────────────

#[test]
fn pool_runs_every_job_before_join_returns() {
    let pool = WorkerPool::new(4, 8).unwrap();
    assert_eq!(pool.size(), 4);
    let done = Arc::new(AtomicUsize::new(0));
    for _ in 0..100 {
        let done = Arc::clone(&done);
        pool.execute(move || {
            done.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    pool.join();
    assert_eq!(done.load(Ordering::SeqCst), 100);
}

#[test]
fn pool_survives_panicking_job() {
    let pool = WorkerPool::new(1, 4).unwrap();
    let done = Arc::new(AtomicUsize::new(0));
    pool.execute(|| panic!("handler blew up")).unwrap();
    let counter = Arc::clone(&done);
    pool.execute(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    pool.join();
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn closed_pool_rejects_work() {
    let mut pool = WorkerPool::new(1, 1).unwrap();
    assert_eq!(WorkerPool::new(0, 1).unwrap().size(), 1);
    pool.shutdown();
    assert!(pool.execute(|| {}).is_err());
}
