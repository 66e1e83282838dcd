//! Firebase Realtime Database source over the streaming REST API.
//!
//! `GET {database_url}/{path}.json` with `Accept: text/event-stream` yields
//! server-sent events:
//!
//! ```text
//! event: put
//! data: {"path": "/", "data": {"temp": 21.4, "humidity": 40.2}}
//!
//! event: patch
//! data: {"path": "/", "data": {"temp": 21.5}}
//! ```
//!
//! `put` replaces the value at `path`, `patch` merges children into it. The
//! source mirrors the referenced tree locally and delivers the whole tree after
//! every change, so the dashboard always receives full snapshots.

use std::io::{self, BufRead, BufReader};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::sleep_cancellable;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::source::{
    DEFAULT_PATH, PushSource, SnapshotSink, SourceInfo, SourceKind, Subscription, spawn_worker,
};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Longest a blocking read or connect waits before the worker looks at its token.
const READ_POLL: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// SSE framing
// ---------------------------------------------------------------------------

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Line-oriented `text/event-stream` parser.
#[derive(Debug, Default)]
pub struct SseParser {
    event: String,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator). Returns an event when a blank
    /// line completes one.
    pub fn feed(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = value.to_string(),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.event.is_empty() && self.data.is_empty() {
            return None;
        }
        let event = if self.event.is_empty() {
            "message".to_string()
        } else {
            std::mem::take(&mut self.event)
        };
        let data = self.data.join("\n");
        self.data.clear();
        Some(SseEvent { event, data })
    }
}

// ---------------------------------------------------------------------------
// Mirrored tree
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChangePayload {
    path: String,
    data: Value,
}

/// What the worker should do after a line.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamAction {
    Continue,
    Deliver(Snapshot),
    /// The server cancelled the stream or revoked access.
    End(String),
}

/// Applies Firebase stream events to a locally mirrored JSON tree.
#[derive(Debug, Default)]
pub struct FirebaseStream {
    parser: SseParser,
    root: Value,
}

impl FirebaseStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn handle_line(&mut self, line: &str) -> StreamAction {
        match self.parser.feed(line) {
            Some(event) => self.handle_event(&event),
            None => StreamAction::Continue,
        }
    }

    pub fn handle_event(&mut self, event: &SseEvent) -> StreamAction {
        match event.event.as_str() {
            "put" | "patch" => {
                let change: ChangePayload = match serde_json::from_str(&event.data) {
                    Ok(c) => c,
                    Err(e) => {
                        log::warn!("firebase: malformed {} payload: {e}", event.event);
                        return StreamAction::Continue;
                    }
                };
                let segments = path_segments(&change.path);
                if event.event == "put" {
                    set_at(&mut self.root, &segments, change.data);
                } else if let Value::Object(children) = change.data {
                    for (key, value) in children {
                        let mut child_path = segments.clone();
                        child_path.push(key.as_str());
                        set_at(&mut self.root, &child_path, value);
                    }
                }
                self.current_snapshot()
            }
            "keep-alive" => StreamAction::Continue,
            "cancel" => StreamAction::End(format!("stream cancelled by server: {}", event.data)),
            "auth_revoked" => StreamAction::End("auth revoked".to_string()),
            other => {
                log::debug!("firebase: ignoring event '{other}'");
                StreamAction::Continue
            }
        }
    }

    fn current_snapshot(&self) -> StreamAction {
        if self.root.is_null() {
            return StreamAction::Continue;
        }
        match Snapshot::from_json(&self.root) {
            Ok(s) => StreamAction::Deliver(s),
            Err(e) => {
                log::warn!("firebase: value does not decode as a snapshot: {e}");
                StreamAction::Continue
            }
        }
    }
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Write `value` at `segments` under `node`. A null value deletes the key.
fn set_at(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let emptied = match node {
        Value::Object(map) => {
            if rest.is_empty() && value.is_null() {
                map.remove(*head);
            } else {
                let child = map.entry(head.to_string()).or_insert(Value::Null);
                set_at(child, rest, value);
                if child.is_null() {
                    map.remove(*head);
                }
            }
            map.is_empty()
        }
        _ => false,
    };
    if emptied {
        *node = Value::Null;
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct FirebaseSource {
    info: SourceInfo,
    url: String,
}

impl FirebaseSource {
    /// Subscribe to `path` under `database_url`
    /// (e.g. `https://my-project-default-rtdb.firebaseio.com`).
    pub fn new(database_url: &str, path: Option<&str>) -> Self {
        let path = path.unwrap_or(DEFAULT_PATH).trim_matches('/').to_string();
        let base = database_url.trim_end_matches('/');
        let url = format!("{base}/{path}.json");
        Self {
            info: SourceInfo {
                name: "firebase".to_string(),
                kind: SourceKind::Firebase,
                path,
                origin: base.to_string(),
            },
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PushSource for FirebaseSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn subscribe(&mut self, sink: SnapshotSink) -> Result<Subscription> {
        // Blocking reqwest applies this to each read of the body, so an idle
        // stream wakes the worker every READ_POLL to check for cancellation.
        let client = Client::builder().timeout(READ_POLL).build()?;
        let url = self.url.clone();
        let token = sink.token();
        let worker = spawn_worker("firebase", move || run_stream(&client, &url, &sink))?;
        Ok(Subscription::new(token).with_worker(worker))
    }
}

/// Connect, stream, and reconnect with backoff until cancelled.
fn run_stream(client: &Client, url: &str, sink: &SnapshotSink) {
    let token = sink.token();
    let mut backoff = INITIAL_BACKOFF;

    while !token.is_cancelled() {
        let response = client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .and_then(|r| r.error_for_status());

        match response {
            Ok(response) => {
                log::info!("firebase: connected to {url}");
                backoff = INITIAL_BACKOFF;
                if !read_events(response, sink) {
                    return;
                }
            }
            Err(e) => log::warn!("firebase: connect to {url} failed: {e}"),
        }

        if !sleep_cancellable(&token, backoff) {
            return;
        }
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// Feed one connection's lines through a fresh mirror. Returns `false` when
/// the worker should exit rather than reconnect.
fn read_events(response: Response, sink: &SnapshotSink) -> bool {
    let token = sink.token();
    let mut reader = BufReader::new(response);
    let mut stream = FirebaseStream::new();
    // Survives read timeouts, so a line split across them is not lost.
    let mut buf = Vec::new();

    loop {
        if token.is_cancelled() {
            return false;
        }
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                log::info!("firebase: stream closed by server");
                return true;
            }
            Ok(_) => {}
            Err(e) if is_read_timeout(&e) => continue,
            Err(e) => {
                log::warn!("firebase: stream read failed: {e}");
                return true;
            }
        }

        let action = {
            let line = String::from_utf8_lossy(&buf);
            stream.handle_line(line.trim_end_matches('\n'))
        };
        buf.clear();

        match action {
            StreamAction::Continue => {}
            StreamAction::Deliver(snapshot) => {
                if !sink.deliver(snapshot) {
                    return false;
                }
            }
            StreamAction::End(reason) => {
                log::warn!("firebase: {reason}");
                return false;
            }
        }
    }
}

fn is_read_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
        || e.get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout)
}
