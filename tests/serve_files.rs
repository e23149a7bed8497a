//! End-to-end tests: a real listener on an ephemeral port, raw HTTP/1.1 over TCP.

use clap::Parser;
use servetool::cli::Cli;
use servetool::config::{Config, DEFAULT_PORT};
use servetool::error::ServeError;
use servetool::server::Server;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct RawResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

struct TestServer {
    addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestServer {
    fn start(root: &Path, port: u16) -> Self {
        let root = root.to_string_lossy().into_owned();
        let port = port.to_string();
        let cli = Cli::parse_from(["servetool", "-b", "127.0.0.1", "-p", &port, "-d", &root]);
        let cfg = Config::load(&cli).unwrap();

        let server = Server::bind(&cfg).unwrap();
        let addr = server.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server.serve_until(async {
            let _ = stopped.await;
        }));

        Self {
            addr,
            stop: Some(stop),
            task,
        }
    }

    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        (&mut self.task).await.unwrap();
    }

    async fn request(&self, method: &str, path: &str, extra_headers: &[(&str, &str)]) -> RawResponse {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();

        let mut request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
        for (name, value) in extra_headers {
            request.push_str(&format!("{name}: {value}\r\n"));
        }
        request.push_str("\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        parse_response(&raw)
    }
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header terminator");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body,
    }
}

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>demo</h1>").unwrap();
    std::fs::create_dir(dir.path().join("pkg")).unwrap();
    std::fs::write(dir.path().join("pkg/demo_bg.wasm"), b"\0asm\x01\0\0\0payload").unwrap();
    std::fs::write(dir.path().join("pkg/README"), "no extension").unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/floor.png"), [0x89, b'P', b'N', b'G']).unwrap();
    dir
}

#[tokio::test]
async fn test_content_types_over_http() {
    let dir = site();
    let server = TestServer::start(dir.path(), 0);

    let resp = server.request("GET", "/index.html", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("text/html"));
    assert_eq!(resp.body, b"<h1>demo</h1>");

    let resp = server.request("GET", "/pkg/demo_bg.wasm", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("application/wasm"));
    assert_eq!(resp.header("content-length"), Some("15"));
    assert_eq!(resp.body, b"\0asm\x01\0\0\0payload");

    let resp = server.request("GET", "/pkg/README", &[]).await;
    assert_eq!(resp.header("content-type"), Some("application/octet-stream"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_errors_over_http() {
    let dir = site();
    let server = TestServer::start(dir.path(), 0);

    let resp = server.request("GET", "/missing.wasm", &[]).await;
    assert_eq!(resp.status, 404);

    let resp = server.request("GET", "/../secret.txt", &[]).await;
    assert!(resp.status == 403 || resp.status == 404);

    let resp = server.request("GET", "/pkg/%2e%2e/%2e%2e/etc/passwd", &[]).await;
    assert_eq!(resp.status, 403);

    let resp = server.request("DELETE", "/index.html", &[]).await;
    assert_eq!(resp.status, 405);

    server.shutdown().await;
}

#[tokio::test]
async fn test_head_over_http() {
    let dir = site();
    let server = TestServer::start(dir.path(), 0);

    let resp = server.request("HEAD", "/pkg/demo_bg.wasm", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-length"), Some("15"));
    assert_eq!(resp.header("content-type"), Some("application/wasm"));
    assert!(resp.body.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_head_on_listing_and_missing_file() {
    let dir = site();
    let server = TestServer::start(dir.path(), 0);

    let listing = server.request("GET", "/assets/", &[]).await;
    let resp = server.request("HEAD", "/assets/", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("text/html; charset=utf-8"));
    let expected = listing.body.len().to_string();
    assert_eq!(resp.header("content-length"), Some(expected.as_str()));
    assert!(resp.body.is_empty());

    let resp = server.request("HEAD", "/missing.wasm", &[]).await;
    assert_eq!(resp.status, 404);
    assert_eq!(resp.header("content-length"), Some("13"));
    assert!(resp.body.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_directories_over_http() {
    let dir = site();
    let server = TestServer::start(dir.path(), 0);

    let resp = server.request("GET", "/", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"<h1>demo</h1>");

    let resp = server.request("GET", "/assets", &[]).await;
    assert_eq!(resp.status, 301);
    assert_eq!(resp.header("location"), Some("/assets/"));

    let resp = server.request("GET", "/assets/", &[]).await;
    assert_eq!(resp.status, 200);
    let html = String::from_utf8(resp.body).unwrap();
    assert!(html.contains(r#"<a href="floor.png">floor.png</a>"#));

    server.shutdown().await;
}

#[tokio::test]
async fn test_range_over_http() {
    let dir = site();
    let server = TestServer::start(dir.path(), 0);

    let resp = server
        .request("GET", "/pkg/demo_bg.wasm", &[("Range", "bytes=0-3")])
        .await;
    assert_eq!(resp.status, 206);
    assert_eq!(resp.header("content-range"), Some("bytes 0-3/15"));
    assert_eq!(resp.body, b"\0asm");

    let resp = server
        .request("GET", "/pkg/demo_bg.wasm", &[("Range", "bytes=100-")])
        .await;
    assert_eq!(resp.status, 416);

    server.shutdown().await;
}

#[tokio::test]
async fn test_restart_on_same_port() {
    let dir = site();
    let first = TestServer::start(dir.path(), 0);
    let addr = first.addr;
    let resp = first.request("GET", "/index.html", &[]).await;
    assert_eq!(resp.status, 200);
    first.shutdown().await;

    let second = TestServer::start(dir.path(), addr.port());
    assert_eq!(second.addr, addr);
    let resp = second.request("GET", "/index.html", &[]).await;
    assert_eq!(resp.status, 200);
    second.shutdown().await;
}

#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let dir = site();
    let running = TestServer::start(dir.path(), 0);

    let root = dir.path().to_string_lossy().into_owned();
    let port = running.addr.port().to_string();
    let cli = Cli::parse_from(["servetool", "-b", "127.0.0.1", "-p", &port, "-d", &root]);
    let cfg = Config::load(&cli).unwrap();

    match Server::bind(&cfg) {
        Err(ServeError::Bind { addr, .. }) => assert_eq!(addr, running.addr),
        Err(other) => panic!("expected bind error, got {other}"),
        Ok(_) => panic!("second server bound an occupied port"),
    }

    running.shutdown().await;
}

#[test]
fn test_default_port() {
    let cfg = Config::load(&Cli::parse_from(["servetool"])).unwrap();
    assert_eq!(cfg.server.port, DEFAULT_PORT);
    assert_eq!(DEFAULT_PORT, 8000);
}
