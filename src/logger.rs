use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::diff::diff_json;

const REDACTED: &str = "***";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficLogMode {
    /// Every response body is written as-is.
    Full,
    /// First response per path in full, then only the changed fields.
    Diffed,
}

pub(crate) struct TrafficLog {
    mode: TrafficLogMode,
    file: File,
    previous: HashMap<String, Value>,
}

impl TrafficLog {
    pub fn new(mode: TrafficLogMode, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            mode,
            file,
            previous: HashMap::new(),
        })
    }

    pub fn log_request(&mut self, method: &str, path: &str, body: Option<&Value>) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
            "body": body.map(redact),
        });
        self.write_line(&entry);
    }

    pub fn log_response(&mut self, method: &str, path: &str, status: u16, body: &Value) {
        let entry = match self.mode {
            TrafficLogMode::Full => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "resp",
                "method": method,
                "path": path,
                "status": status,
                "body": body,
            }),
            TrafficLogMode::Diffed => match self.previous.get(path) {
                None => json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "resp",
                    "method": method,
                    "path": path,
                    "status": status,
                    "full": true,
                    "body": body,
                }),
                Some(prev) => {
                    let mut changes = Vec::new();
                    diff_json(prev, body, "", &mut changes);
                    let change_entries: Vec<Value> = changes
                        .iter()
                        .map(|(path, old, new)| json!({ "path": path, "old": old, "new": new }))
                        .collect();
                    json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "resp",
                        "method": method,
                        "path": path,
                        "status": status,
                        "changes": change_entries,
                    })
                }
            },
        };
        self.write_line(&entry);
        if self.mode == TrafficLogMode::Diffed {
            self.previous.insert(path.to_string(), body.clone());
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write traffic log entry: {e}");
        }
    }
}

fn redact(body: &Value) -> Value {
    let mut body = body.clone();
    if let Some(pass) = body.pointer_mut("/idpw/pass") {
        *pass = Value::String(REDACTED.to_string());
    }
    body
}
