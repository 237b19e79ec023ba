//! Frame classification for the MCP stdio reader task.

use serde_json::Value;

/// Classification of an incoming JSON-RPC frame.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A response to one of our requests (has `id`, no `method`).
    Response { id: Option<u64> },
    /// A request from the server (has `id` + `method`), e.g. `ping`.
    IncomingRequest { id: Value, method: String },
    /// A notification (has `method`, no `id`).
    Notification,
}

/// Classify a JSON-RPC frame by inspecting its `id` and `method` fields.
pub fn classify_message(json: &Value) -> MessageKind {
    let id = json.get("id").filter(|v| !v.is_null());
    let method = json.get("method").and_then(Value::as_str);

    match (id, method) {
        (Some(id), Some(method)) => MessageKind::IncomingRequest {
            id: id.clone(),
            method: method.to_string(),
        },
        (Some(id), None) => MessageKind::Response {
            id: response_id(id),
        },
        _ => MessageKind::Notification,
    }
}

/// Our request ids are numeric; some bridges echo them back as strings.
fn response_id(id: &Value) -> Option<u64> {
    id.as_u64()
        .or_else(|| id.as_str().and_then(|s| s.parse().ok()))
}

/// Whether a stdout line can be a JSON-RPC frame at all.
///
/// Bridges like `mcp-remote` occasionally print banners or ANSI-coloured
/// status lines on stdout; those are skipped.
pub fn is_candidate_frame(line: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.is_empty() && !trimmed.starts_with('\u{1b}') && trimmed.starts_with('{')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_response() {
        let json = json!({"id": 1, "result": {}});
        assert_eq!(
            classify_message(&json),
            MessageKind::Response { id: Some(1) }
        );
    }

    #[test]
    fn classify_response_with_string_id() {
        let json = json!({"id": "12", "result": {}});
        assert_eq!(
            classify_message(&json),
            MessageKind::Response { id: Some(12) }
        );
    }

    #[test]
    fn classify_incoming_request() {
        let json = json!({"id": "srv-1", "method": "ping"});
        assert_eq!(
            classify_message(&json),
            MessageKind::IncomingRequest {
                id: json!("srv-1"),
                method: "ping".into()
            }
        );
    }

    #[test]
    fn classify_notification() {
        let json = json!({"method": "notifications/tools/list_changed"});
        assert_eq!(classify_message(&json), MessageKind::Notification);

        let json = json!({"id": null, "method": "notifications/message"});
        assert_eq!(classify_message(&json), MessageKind::Notification);
    }

    #[test]
    fn candidate_frames() {
        assert!(is_candidate_frame(r#"{"jsonrpc":"2.0"}"#));
        assert!(!is_candidate_frame(""));
        assert!(!is_candidate_frame("[mcp-remote] Connected to remote server"));
        assert!(!is_candidate_frame("\u{1b}[32mready\u{1b}[0m"));
    }
}
