//! Minimal HTTP/1.1 server that answers by path, for integration tests.
//!
//! - `/ok/<name>`       -> 200 with body `page <name>`
//! - `/fail/<name>`     -> 503
//! - `/redirect/<name>` -> 302 with `Location: /ok/<name>`
//! - `/echo`            -> 200 with the `X-Echo` request header as body
//! - anything else      -> 404
//!
//! Every request path is counted so tests can check how often a URL was hit.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

pub struct StatusServer {
    base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl StatusServer {
    /// Absolute URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

/// Starts the server in a background thread. It runs until the process exits.
pub fn start() -> StatusServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(Mutex::new(HashMap::new()));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &counter));
        }
    });
    StatusServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, hits: &Mutex<HashMap<String, usize>>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (path, echo) = parse_request(request);
    *hits.lock().unwrap().entry(path.to_string()).or_insert(0) += 1;

    let (status, extra, body) = if let Some(name) = path.strip_prefix("/ok/") {
        ("200 OK", String::new(), format!("page {}", name))
    } else if path.starts_with("/fail/") {
        ("503 Service Unavailable", String::new(), String::new())
    } else if let Some(name) = path.strip_prefix("/redirect/") {
        ("302 Found", format!("Location: /ok/{}\r\n", name), String::new())
    } else if path == "/echo" {
        ("200 OK", String::new(), echo.unwrap_or_default().to_string())
    } else {
        ("404 Not Found", String::new(), String::new())
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        status,
        body.len(),
        extra,
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Returns (path, value of the X-Echo header).
fn parse_request(request: &str) -> (&str, Option<&str>) {
    let mut path = "";
    let mut echo = None;
    for (i, line) in request.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if i == 0 {
            path = line.split_whitespace().nth(1).unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("x-echo") {
                echo = Some(value.trim());
            }
        }
    }
    (path, echo)
}
