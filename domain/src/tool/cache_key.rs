//! Canonical cache keys for tool results.
//!
//! The model may emit the same arguments with object keys in any order
//! (`{"id":"bitcoin","vs":"usd"}` vs `{"vs":"usd","id":"bitcoin"}`). Both must
//! map to one cache entry, so arguments are serialized with object keys sorted
//! recursively and no insignificant whitespace.

use serde_json::Value;

/// Memoization key: tool name plus canonical argument text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    tool_name: String,
    arguments: String,
}

impl CacheKey {
    pub fn new(tool_name: impl Into<String>, arguments: &Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: canonical_json(arguments),
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn arguments(&self) -> &str {
        &self.arguments
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tool_name, self.arguments)
    }
}

/// Serialize a JSON value with object keys sorted at every depth.
///
/// `null` arguments and an empty object are the same call to the provider
/// and produce the same text (`{}`).
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Null => out.push_str("{}"),
        other => write_canonical(other, &mut out),
    }
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
