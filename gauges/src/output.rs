//! Response rendering: plain text for people, JSON for scripts.

use gauges_lib::Response;
use serde_json::{json, Value};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Status line, then an indented outline of the body
    Plain,
    /// `{"status": ..., "body": ...}`, pretty-printed
    Json,
}

pub fn render(res: &Response, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Plain => Ok(render_plain(res)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&json!({"status": res.status, "body": res.body}))
        }
    }
}

fn render_plain(res: &Response) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "HTTP {}", res.status);
    if let Some(errors) = res.validation_errors() {
        for msg in &errors.full_messages {
            let _ = writeln!(out, "! {}", msg);
        }
    } else if let Some(failure) = res.failure() {
        let _ = writeln!(out, "! {}", failure.message);
        return out;
    }
    outline(&res.body, &mut out, 0);
    out
}

/// Scalars print inline; arrays of objects become numbered entries.
fn outline(v: &Value, out: &mut String, depth: usize) {
    let pad = "  ".repeat(depth);
    match v {
        Value::Object(map) => {
            for (k, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) if !is_empty(val) => {
                        let _ = writeln!(out, "{}{}:", pad, k);
                        outline(val, out, depth + 1);
                    }
                    _ => {
                        let _ = writeln!(out, "{}{}: {}", pad, k, scalar(val));
                    }
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if item.is_object() || item.is_array() {
                    let _ = writeln!(out, "{}#{}", pad, i + 1);
                    outline(item, out, depth + 1);
                } else {
                    let _ = writeln!(out, "{}- {}", pad, scalar(item));
                }
            }
        }
        _ => {
            let _ = writeln!(out, "{}{}", pad, scalar(v));
        }
    }
}

fn is_empty(v: &Value) -> bool {
    match v {
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.replace('\n', " "),
        Value::Null => "-".to_string(),
        Value::Array(a) if a.is_empty() => "[]".to_string(),
        Value::Object(m) if m.is_empty() => "{}".to_string(),
        other => other.to_string(),
    }
}
