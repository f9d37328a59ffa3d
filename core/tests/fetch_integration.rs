/*
 * fetch_integration.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration tests for the fetcher. Each test starts a local HTTP/1.0 server on
 * 127.0.0.1 that answers with canned responses, so the whole request/response cycle
 * (framing, parsing, redirects, connection lifecycle) runs without network access.
 *
 * Run with:
 *   cargo test -p luxe_core --test fetch_integration
 * The test against a public server is ignored by default:
 *   cargo test -p luxe_core --test fetch_integration -- --ignored --nocapture
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use luxe_core::{DisplayMode, FetchConfig, FetchError, Fetcher, ProtocolError, Scheme};

/// Local server: records request heads and counts accepted connections.
struct TestServer {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
    accepted: Arc<AtomicUsize>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

/// Read a request head (up to and including the blank line). None at end of stream.
async fn read_head(socket: &mut TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match socket.read(&mut byte).await {
            Ok(1) => head.push(byte[0]),
            _ => return None,
        }
    }
    Some(String::from_utf8_lossy(&head).into_owned())
}

/// Serve `route(path)` for each request. The connection stays open for another request
/// only when the client asked for keep-alive.
async fn serve<F>(route: F) -> TestServer
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let accepted = Arc::new(AtomicUsize::new(0));
    let route = Arc::new(route);
    {
        let requests = requests.clone();
        let accepted = accepted.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                let route = route.clone();
                let requests = requests.clone();
                tokio::spawn(async move {
                    while let Some(head) = read_head(&mut socket).await {
                        let path = head.split(' ').nth(1).unwrap_or("/").to_string();
                        let keep_alive = head.contains("Connection: keep-alive");
                        requests.lock().unwrap().push(head);
                        if socket.write_all(route(&path).as_bytes()).await.is_err() {
                            return;
                        }
                        if !keep_alive {
                            let _ = socket.shutdown().await;
                            return;
                        }
                    }
                });
            }
        });
    }
    TestServer {
        port,
        requests,
        accepted,
    }
}

fn ok(body: &str) -> String {
    format!(
        "HTTP/1.0 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
}

fn found(location: &str) -> String {
    format!(
        "HTTP/1.0 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\n\r\n",
        location
    )
}

#[tokio::test]
async fn get_sends_exact_request_and_returns_body() {
    let server = serve(|_| ok("<html>hi</html>")).await;
    let mut fetcher = Fetcher::default();
    let doc = fetcher.fetch(&server.url("/index.html")).await.unwrap();

    assert_eq!(doc.scheme, Scheme::Http);
    assert_eq!(doc.display, DisplayMode::Rendered);
    assert_eq!(doc.body, "<html>hi</html>");
    assert_eq!(
        server.requests(),
        vec![format!(
            "GET /index.html HTTP/1.0\r\n\
             Host: 127.0.0.1:{}\r\n\
             Connection: close\r\n\
             User-Agent: luxe-ashllxyy\r\n\
             \r\n",
            server.port
        )]
    );
}

#[tokio::test]
async fn missing_path_requests_root() {
    let server = serve(|path| ok(path)).await;
    let mut fetcher = Fetcher::default();
    let doc = fetcher
        .fetch(&format!("http://127.0.0.1:{}", server.port))
        .await
        .unwrap();
    assert_eq!(doc.body, "/");
}

#[tokio::test]
async fn content_length_bounds_the_body() {
    let server = serve(|_| {
        "HTTP/1.0 200 OK\r\nContent-Length: 11\r\n\r\nhello world and trailing garbage".to_string()
    })
    .await;
    let mut fetcher = Fetcher::default();
    let doc = fetcher.fetch(&server.url("/")).await.unwrap();
    assert_eq!(doc.body, "hello world");
}

#[tokio::test]
async fn body_without_length_reads_until_close() {
    let server = serve(|_| "HTTP/1.0 200 OK\r\nServer: test\r\n\r\nall of it".to_string()).await;
    let mut fetcher = Fetcher::default();
    let doc = fetcher.fetch(&server.url("/")).await.unwrap();
    assert_eq!(doc.body, "all of it");
}

#[tokio::test]
async fn zero_content_length_reads_until_close() {
    let server = serve(|_| "HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\nstill here".to_string()).await;
    let mut fetcher = Fetcher::default();
    let doc = fetcher.fetch(&server.url("/")).await.unwrap();
    assert_eq!(doc.body, "still here");
}

#[tokio::test]
async fn negative_content_length_reads_until_close() {
    let server = serve(|_| "HTTP/1.0 200 OK\r\nContent-Length: -1\r\n\r\nbody here".to_string()).await;
    let mut fetcher = Fetcher::default();
    let doc = fetcher.fetch(&server.url("/")).await.unwrap();
    assert_eq!(doc.body, "body here");
}

#[tokio::test]
async fn negative_content_length_is_empty_under_keep_alive() {
    let server = serve(|_| "HTTP/1.0 200 OK\r\nContent-Length: -5\r\n\r\n".to_string()).await;
    let mut fetcher = Fetcher::new(FetchConfig {
        keep_alive: true,
        ..FetchConfig::default()
    });
    let doc = fetcher.fetch(&server.url("/")).await.unwrap();
    assert_eq!(doc.body, "");
    assert!(fetcher.connection().unwrap().is_open());
}

#[tokio::test]
async fn chunked_response_fails() {
    let server = serve(|_| {
        "HTTP/1.0 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n".to_string()
    })
    .await;
    let mut fetcher = Fetcher::default();
    let err = fetcher.fetch(&server.url("/")).await.unwrap_err();
    assert!(
        matches!(err, FetchError::UnsupportedEncoding { header: "transfer-encoding", .. }),
        "{:?}",
        err
    );
    assert!(!fetcher.connection().unwrap().is_open());
}

#[tokio::test]
async fn compressed_response_fails() {
    let server = serve(|_| "HTTP/1.0 200 OK\r\nContent-Encoding: gzip\r\n\r\n\x1f".to_string()).await;
    let mut fetcher = Fetcher::default();
    let err = fetcher.fetch(&server.url("/")).await.unwrap_err();
    assert!(matches!(err, FetchError::UnsupportedEncoding { header: "content-encoding", .. }));
}

#[tokio::test]
async fn malformed_status_line_fails() {
    let server = serve(|_| "SPDY/9 ok\r\n\r\n".to_string()).await;
    let mut fetcher = Fetcher::default();
    let err = fetcher.fetch(&server.url("/")).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Protocol(ProtocolError::MalformedStatusLine(_))
    ));
}

#[tokio::test]
async fn relative_redirect_stays_on_host() {
    let server = serve(|path| match path {
        "/bar" => found("/foo"),
        "/foo" => ok("arrived"),
        _ => "HTTP/1.0 404 Not Found\r\n\r\n".to_string(),
    })
    .await;
    let mut fetcher = Fetcher::default();
    let doc = fetcher.fetch(&server.url("/bar")).await.unwrap();
    assert_eq!(doc.body, "arrived");
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].starts_with("GET /foo HTTP/1.0\r\n"));
}

#[tokio::test]
async fn absolute_redirect_moves_to_other_server() {
    let other = serve(|_| ok("other server")).await;
    let location = other.url("/x");
    let server = serve(move |_| found(&location)).await;
    let mut fetcher = Fetcher::default();
    let doc = fetcher.fetch(&server.url("/")).await.unwrap();
    assert_eq!(doc.body, "other server");
    assert_eq!(other.requests().len(), 1);
    assert_eq!(fetcher.connection().unwrap().key().port, other.port);
}

/// Server where /hop/N redirects to /hop/N+1 until N reaches `last`.
async fn hop_server(last: u32) -> TestServer {
    serve(move |path| {
        let n: u32 = path
            .trim_start_matches("/hop/")
            .parse()
            .unwrap_or(0);
        if n < last {
            found(&format!("/hop/{}", n + 1))
        } else {
            ok("end of chain")
        }
    })
    .await
}

#[tokio::test]
async fn five_redirects_succeed() {
    let server = hop_server(5).await;
    let mut fetcher = Fetcher::default();
    let doc = fetcher.fetch(&server.url("/hop/0")).await.unwrap();
    assert_eq!(doc.body, "end of chain");
    assert_eq!(server.requests().len(), 6);
}

#[tokio::test]
async fn six_redirects_fail_naming_limit() {
    let server = hop_server(6).await;
    let mut fetcher = Fetcher::default();
    let err = fetcher.fetch(&server.url("/hop/0")).await.unwrap_err();
    assert!(matches!(err, FetchError::TooManyRedirects { max: 5 }));
    assert!(err.to_string().contains('5'));
}

#[tokio::test]
async fn configured_redirect_limit() {
    let server = hop_server(2).await;
    let mut fetcher = Fetcher::new(FetchConfig {
        max_redirects: 1,
        ..FetchConfig::default()
    });
    let err = fetcher.fetch(&server.url("/hop/0")).await.unwrap_err();
    assert!(matches!(err, FetchError::TooManyRedirects { max: 1 }));
}

#[tokio::test]
async fn redirect_without_location_fails() {
    let server = serve(|_| "HTTP/1.0 301 Moved\r\n\r\n".to_string()).await;
    let mut fetcher = Fetcher::default();
    let err = fetcher.fetch(&server.url("/")).await.unwrap_err();
    assert!(matches!(err, FetchError::MissingLocation { status: 301 }));
}

#[tokio::test]
async fn view_source_returns_same_body_for_raw_display() {
    let server = serve(|_| ok("<b>bold</b> &amp; more")).await;
    let mut fetcher = Fetcher::default();
    let page = fetcher.fetch(&server.url("/")).await.unwrap();
    let source = fetcher
        .fetch(&format!("view-source:{}", server.url("/")))
        .await
        .unwrap();
    assert_eq!(source.body, page.body);
    assert_eq!(source.scheme, Scheme::ViewSource);
    assert_eq!(source.display, DisplayMode::Source);
    assert_eq!(page.display, DisplayMode::Rendered);
}

#[tokio::test]
async fn default_config_reconnects_for_every_request() {
    let server = serve(|_| ok("again")).await;
    let mut fetcher = Fetcher::default();
    fetcher.fetch(&server.url("/a")).await.unwrap();
    fetcher.fetch(&server.url("/b")).await.unwrap();
    let connection = fetcher.connection().unwrap();
    assert!(!connection.is_open());
    assert_eq!(connection.connect_count(), 2);
    assert_eq!(server.accepted(), 2);
}

#[tokio::test]
async fn keep_alive_reuses_connection() {
    let server = serve(|path| ok(path)).await;
    let mut fetcher = Fetcher::new(FetchConfig {
        keep_alive: true,
        ..FetchConfig::default()
    });
    assert_eq!(fetcher.fetch(&server.url("/one")).await.unwrap().body, "/one");
    assert_eq!(fetcher.fetch(&server.url("/two")).await.unwrap().body, "/two");
    let connection = fetcher.connection().unwrap();
    assert!(connection.is_open());
    assert_eq!(connection.connect_count(), 1);
    assert_eq!(server.accepted(), 1);
    assert!(server.requests()[0].contains("Connection: keep-alive\r\n"));
    fetcher.close().await;
    assert!(fetcher.connection().is_none());
}

#[tokio::test]
async fn keep_alive_honours_server_close() {
    let server = serve(|_| {
        "HTTP/1.0 200 OK\r\nConnection: close\r\nContent-Length: 2\r\n\r\nok".to_string()
    })
    .await;
    let mut fetcher = Fetcher::new(FetchConfig {
        keep_alive: true,
        ..FetchConfig::default()
    });
    fetcher.fetch(&server.url("/")).await.unwrap();
    assert!(!fetcher.connection().unwrap().is_open());
}

#[tokio::test]
async fn connection_refused_is_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let mut fetcher = Fetcher::default();
    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Connect { port: p, .. } if p == port), "{:?}", err);
}

#[tokio::test]
async fn silent_server_hits_read_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await {
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        }
    });
    let mut fetcher = Fetcher::new(FetchConfig {
        read_timeout: Some(Duration::from_millis(200)),
        ..FetchConfig::default()
    });
    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout { operation: "read", .. }), "{:?}", err);
}

#[tokio::test]
#[ignore] // requires network; run with: cargo test --test fetch_integration -- --ignored --nocapture
async fn fetch_example_org_over_https() {
    let mut fetcher = Fetcher::default();
    let doc = fetcher.fetch("https://example.org/").await.expect("fetch failed");
    println!("{} bytes", doc.body.len());
    assert!(doc.body.contains("Example Domain"));
}
