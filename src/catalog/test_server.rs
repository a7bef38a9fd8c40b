//! Scripted stand-in for the Spotify accounts and Web API endpoints.
//!
//! Speaks just enough HTTP/1.1 for reqwest: one request per connection,
//! `Connection: close` on every response.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl StubResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    /// 200 with one artist per name.
    pub fn artists(names: &[&str]) -> Self {
        let items: Vec<_> = names
            .iter()
            .map(|name| json!({ "id": format!("id-{}", name), "name": name, "popularity": 50 }))
            .collect();
        Self::json(200, json!({ "artists": { "items": items, "total": names.len() } }))
    }

    /// Web API error body.
    pub fn api_error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": { "status": status, "message": message } }))
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            self.body.len()
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }
}

#[derive(Default)]
struct State {
    /// Replayed in order; the last one repeats once the rest are used up
    search: Mutex<VecDeque<StubResponse>>,
    token_failure: Mutex<Option<StubResponse>>,
    search_hits: AtomicUsize,
    token_hits: AtomicUsize,
}

/// Local server answering `/api/token` and `/v1/search`.
pub struct CatalogStub {
    addr: SocketAddr,
    state: Arc<State>,
    task: JoinHandle<()>,
}

impl CatalogStub {
    pub async fn start(search: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(State {
            search: Mutex::new(search.into()),
            ..Default::default()
        });

        let worker = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = Arc::clone(&worker);
                tokio::spawn(async move {
                    let _ = handle(stream, &state).await;
                });
            }
        });

        Self { addr, state, task }
    }

    /// Make the token endpoint answer with `response` instead of a token.
    pub fn fail_token_requests(self, response: StubResponse) -> Self {
        *self.state.token_failure.lock().unwrap() = Some(response);
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn search_hits(&self) -> usize {
        self.state.search_hits.load(Ordering::SeqCst)
    }

    pub fn token_hits(&self) -> usize {
        self.state.token_hits.load(Ordering::SeqCst)
    }
}

impl Drop for CatalogStub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn handle(mut stream: TcpStream, state: &State) -> std::io::Result<()> {
    let path = read_request(&mut stream).await?;

    let response = if path.starts_with("/api/token") {
        let n = state.token_hits.fetch_add(1, Ordering::SeqCst) + 1;
        match state.token_failure.lock().unwrap().clone() {
            Some(failure) => failure,
            None => StubResponse::json(
                200,
                json!({ "access_token": format!("token-{}", n), "token_type": "Bearer", "expires_in": 3600 }),
            ),
        }
    } else if path.starts_with("/v1/search") {
        state.search_hits.fetch_add(1, Ordering::SeqCst);
        let mut queue = state.search.lock().unwrap();
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.unwrap_or_else(|| StubResponse::artists(&[]))
    } else {
        StubResponse::api_error(404, "no such endpoint")
    };

    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await
}

/// Read one request (head and body) and return its path.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    Ok(path)
}
