//! Wire-level debugging via LOUD_WIRE environment variable.
//!
//! When `LOUD_WIRE` is set to any value, prints the JSON of API requests and
//! responses to stderr with pretty formatting and colors.
//!
//! ```bash
//! LOUD_WIRE=1 cargo test --test auth_tests -- --nocapture
//! ```
//!
//! - Green `>>>` for outgoing requests
//! - Red `<<<` for incoming responses
//! - Magenta for file transfers
//!
//! Credentials (`password`, tokens, two-factor codes) are always redacted.
//! Long document fields are truncated to keep output readable.

use colored::Colorize;
use serde_json::Value;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Request ID counter for correlating requests with responses
static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if LOUD_WIRE debugging is enabled.
///
/// Cached after the first check: `LOUD_WIRE` must be set before the first
/// request is made.
#[must_use]
pub fn is_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var("LOUD_WIRE").is_ok())
}

/// Get the next request ID for correlation.
#[must_use]
pub fn next_request_id() -> usize {
    REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed)
}

const REDACT_FIELDS: &[&str] = &[
    "password",
    "accessToken",
    "refreshToken",
    "twoFactorCode",
];

/// Fields holding contract bodies or signature blobs.
const TRUNCATE_FIELDS: &[&str] = &["content", "signature", "signatureData"];

const TRUNCATE_THRESHOLD: usize = 100;

const RAW_BODY_LIMIT: usize = 1000;

/// Redacts secrets and truncates long document fields, recursively.
fn scrub(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if REDACT_FIELDS.contains(&key.as_str()) {
                    if !val.is_null() {
                        *val = Value::String("[REDACTED]".to_string());
                    }
                } else if TRUNCATE_FIELDS.contains(&key.as_str()) && val.is_string() {
                    if let Value::String(s) = val
                        && s.len() > TRUNCATE_THRESHOLD
                    {
                        *s = super::error_helpers::truncate_for_context(s, TRUNCATE_THRESHOLD);
                    }
                } else {
                    scrub(val);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                scrub(item);
            }
        }
        _ => {}
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Log prefix with timestamp and request ID.
fn prefix(request_id: usize) -> String {
    format!(
        "{} {} {}",
        "[LOUD_WIRE]".bold(),
        timestamp().dimmed(),
        format!("[REQ#{request_id}]").cyan()
    )
}

fn print_json(prefix: &str, label: &str, body: &str) {
    match serde_json::from_str::<Value>(body) {
        Ok(mut parsed) => {
            scrub(&mut parsed);
            eprintln!("{prefix} {label}:");
            let rendered = colored_json::to_colored_json_auto(&parsed)
                .ok()
                .or_else(|| serde_json::to_string_pretty(&parsed).ok());
            if let Some(rendered) = rendered {
                for line in rendered.lines() {
                    eprintln!("{prefix} {line}");
                }
            }
        }
        Err(_) => {
            let truncated = super::error_helpers::truncate_for_context(body, RAW_BODY_LIMIT);
            eprintln!("{prefix} {label}: {truncated}");
        }
    }
}

/// Log an outgoing HTTP request.
pub fn log_request(request_id: usize, method: &str, url: &str, body: Option<&str>) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    let direction = ">>>".green().bold();
    eprintln!("{prefix} {direction} {method} {url}");

    if let Some(body) = body {
        print_json(&prefix, &"Body".green().to_string(), body);
    }
}

/// Log an incoming HTTP response status.
pub fn log_response_status(request_id: usize, status: u16) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    let direction = "<<<".red().bold();
    let status_text = if status < 300 {
        format!("{status} OK").green()
    } else {
        format!("{status} ERROR").red()
    };

    eprintln!("{prefix} {direction} {status_text}");
}

/// Log an incoming HTTP response body.
pub fn log_response_body(request_id: usize, body: &str) {
    if !is_enabled() {
        return;
    }
    print_json(&prefix(request_id), &"Response".red().to_string(), body);
}

/// Log the start of a multipart upload.
pub fn log_upload_start(request_id: usize, file_name: &str, size: u64) {
    if !is_enabled() {
        return;
    }

    let size_mb = size as f64 / 1_048_576.0;
    eprintln!(
        "{} {} {} \"{file_name}\" ({size_mb:.2} MB)",
        prefix(request_id),
        ">>>".green().bold(),
        "UPLOAD".magenta().bold()
    );
}

/// Log a completed streaming download.
pub fn log_download_complete(path: &str, bytes: u64) {
    if !is_enabled() {
        return;
    }

    eprintln!(
        "{} {} {} {path} ({bytes} bytes)",
        "[LOUD_WIRE]".bold(),
        timestamp().dimmed(),
        "DOWNLOADED".magenta().bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scrub_redacts_credentials() {
        let mut value = json!({
            "email": "a@b.com",
            "password": "hunter2",
            "twoFactorCode": "123456"
        });
        scrub(&mut value);
        assert_eq!(value["email"], "a@b.com");
        assert_eq!(value["password"], "[REDACTED]");
        assert_eq!(value["twoFactorCode"], "[REDACTED]");
    }

    #[test]
    fn test_scrub_redacts_nested_tokens() {
        let mut value = json!({
            "session": {"accessToken": "T1", "refreshToken": "R1"},
            "user": {"id": "u-1"}
        });
        scrub(&mut value);
        assert_eq!(value["session"]["accessToken"], "[REDACTED]");
        assert_eq!(value["session"]["refreshToken"], "[REDACTED]");
        assert_eq!(value["user"]["id"], "u-1");
    }

    #[test]
    fn test_scrub_keeps_null_tokens_null() {
        let mut value = json!({"refreshToken": null});
        scrub(&mut value);
        assert!(value["refreshToken"].is_null());
    }

    #[test]
    fn test_scrub_truncates_long_content() {
        let mut value = json!({
            "title": "NDA",
            "content": "Clause. ".repeat(40)
        });
        scrub(&mut value);
        assert_eq!(value["title"], "NDA");
        let content = value["content"].as_str().unwrap();
        assert!(content.ends_with("..."));
        assert_eq!(content.len(), 103);
    }

    #[test]
    fn test_scrub_walks_arrays() {
        let mut value = json!({"items": [{"password": "x"}, {"content": "short"}]});
        scrub(&mut value);
        assert_eq!(value["items"][0]["password"], "[REDACTED]");
        assert_eq!(value["items"][1]["content"], "short");
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert_eq!(ts.len(), 20, "Timestamp should be 20 chars: {ts}");
        assert!(ts.ends_with('Z'));
        assert!(ts.contains('T'));
    }

    #[test]
    fn test_request_id_increments() {
        let id1 = next_request_id();
        let id2 = next_request_id();
        assert!(id2 > id1, "Request IDs should increment");
    }
}
