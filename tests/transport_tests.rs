//! `ReqwestTransport` against a one-shot HTTP stub on a local socket.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use azure_translator::translate::{HttpRequest, HttpTransport, ReqwestTransport};
use azure_translator::TranslateError;

/// Accept one connection, capture the raw request, answer with `status` and `body`.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            if request_complete(&raw) {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&raw).into_owned()
    });

    (base, handle)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(head_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..head_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    raw.len() >= head_end + 4 + content_length
}

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Duration::from_secs(2), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn get_sends_encoded_query() {
    let (base, server) = serve_once("200 OK", "<string>Hallo</string>").await;

    let request = HttpRequest::get(format!("{base}/v2/http.svc/Translate"))
        .query("appid", "Bearer PSEUDOTOKEN")
        .query("text", "Buy tomorrow & more")
        .query("from", "en");
    let response = transport().send(request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<string>Hallo</string>");

    let raw = server.await.unwrap();
    let request_line = raw.lines().next().unwrap();
    assert!(request_line.starts_with("GET /v2/http.svc/Translate?"));
    assert!(request_line.contains("appid=Bearer+PSEUDOTOKEN"));
    assert!(request_line.contains("text=Buy+tomorrow+%26+more"));
    assert!(request_line.contains("from=en"));
}

#[tokio::test]
async fn post_sends_headers_and_body() {
    let (base, server) = serve_once("200 OK", "[]").await;

    let request = HttpRequest::post(format!("{base}/translate"))
        .query("api-version", "3.0")
        .header("Content-Type", "application/json")
        .header("Ocp-Apim-Subscription-Key", "abcdefg")
        .body(r#"[{"text":"hi"}]"#);
    transport().send(request).await.unwrap();

    let raw = server.await.unwrap();
    let lower = raw.to_ascii_lowercase();
    assert!(raw.starts_with("POST /translate?api-version=3.0 "));
    assert!(lower.contains("ocp-apim-subscription-key: abcdefg"));
    assert!(lower.contains("content-type: application/json"));
    assert!(raw.ends_with(r#"[{"text":"hi"}]"#));
}

#[tokio::test]
async fn error_status_is_returned_not_raised() {
    let (base, server) = serve_once("400 Bad Request", "expired").await;

    let response = transport()
        .send(HttpRequest::get(format!("{base}/v2/http.svc/Translate")))
        .await
        .unwrap();
    assert_eq!(response.status, 400);
    assert_eq!(response.body, "expired");
    assert!(!response.is_success());
    server.await.unwrap();
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = transport()
        .send(HttpRequest::get(format!("http://{addr}/translate")))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TranslateError::Transport(_) | TranslateError::Timeout
    ));
}
