//! Minimal HTTP/1.1 server that emulates the GCS JSON API for integration
//! tests: paged object listing plus `alt=media` object fetch.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct BucketServerOptions {
    /// Objects per listing page; the listing paginates with `pageToken`.
    pub page_size: usize,
    /// If set, requests must carry `Authorization: Bearer <token>` or get 401.
    pub required_token: Option<String>,
}

impl Default for BucketServerOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            required_token: None,
        }
    }
}

/// Starts a server in a background thread serving `objects` as the bucket
/// contents. Returns the base endpoint URL (e.g. "http://127.0.0.1:12345").
/// The server runs until the process exits.
pub fn start(objects: Vec<(String, Vec<u8>)>) -> String {
    start_with_options(objects, BucketServerOptions::default())
}

/// Like `start` but with custom paging/auth behavior.
pub fn start_with_options(objects: Vec<(String, Vec<u8>)>, opts: BucketServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let objects: Arc<BTreeMap<String, Vec<u8>>> = Arc::new(objects.into_iter().collect());
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let objects = Arc::clone(&objects);
            let opts = Arc::clone(&opts);
            thread::spawn(move || handle(stream, &objects, &opts));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: TcpStream, objects: &BTreeMap<String, Vec<u8>>, opts: &BucketServerOptions) {
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

    let request_line = request.lines().next().unwrap_or("");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");
    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", "text/plain", b"");
        return;
    }

    if let Some(required) = &opts.required_token {
        let expected = format!("Bearer {required}");
        let authorized = request.lines().any(|line| {
            line.split_once(':').is_some_and(|(name, value)| {
                name.eq_ignore_ascii_case("authorization") && value.trim() == expected
            })
        });
        if !authorized {
            respond(
                &mut stream,
                "401 Unauthorized",
                "application/json",
                br#"{"error": "unauthorized"}"#,
            );
            return;
        }
    }

    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p, q),
        None => (target, ""),
    };

    if let Some(rest) = path.strip_prefix("/storage/v1/b/") {
        if let Some((_bucket, tail)) = rest.split_once("/o") {
            if tail.is_empty() {
                respond_listing(&mut stream, objects, opts, query);
                return;
            }
            if let Some(encoded) = tail.strip_prefix('/') {
                let name = percent_decode(encoded);
                match objects.get(&name) {
                    Some(body) => {
                        respond(&mut stream, "200 OK", "application/octet-stream", body)
                    }
                    None => respond(
                        &mut stream,
                        "404 Not Found",
                        "application/json",
                        br#"{"error": "not found"}"#,
                    ),
                }
                return;
            }
        }
    }
    respond(&mut stream, "404 Not Found", "text/plain", b"not found");
}

fn respond_listing(
    stream: &mut TcpStream,
    objects: &BTreeMap<String, Vec<u8>>,
    opts: &BucketServerOptions,
    query: &str,
) {
    let start: usize = query
        .split('&')
        .find_map(|kv| kv.strip_prefix("pageToken="))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let names: Vec<&String> = objects.keys().collect();
    let start = start.min(names.len());
    let end = (start + opts.page_size).min(names.len());

    let items: Vec<serde_json::Value> = names[start..end]
        .iter()
        .map(|name| {
            serde_json::json!({
                "kind": "storage#object",
                "name": name,
                "size": objects[*name].len().to_string(),
            })
        })
        .collect();
    let mut payload = serde_json::json!({
        "kind": "storage#objects",
        "items": items,
    });
    if end < names.len() {
        payload["nextPageToken"] = serde_json::Value::String(end.to_string());
    }
    let body = serde_json::to_vec(&payload).expect("encode listing");
    respond(stream, "200 OK", "application/json", &body);
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}

/// Decode %XX escapes; the client sends object names as one encoded segment.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&s[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
