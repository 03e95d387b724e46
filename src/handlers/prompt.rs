//! Prompt extraction from Messages API request bodies

use serde_json::Value;

/// Text of the last user-authored message in `body`
///
/// - string content is returned as-is
/// - an array of content parts keeps only `type == "text"` parts, joined
///   with `\n`
/// - any other content shape is serialized as JSON text
///
/// A missing or malformed `messages` array, or no user message at all,
/// yields an empty string.
pub fn extract_prompt(body: &Value) -> String {
    let Some(messages) = body.get("messages").and_then(Value::as_array) else {
        return String::new();
    };

    let last_user = messages
        .iter()
        .rev()
        .find(|m| m.get("role").and_then(Value::as_str) == Some("user"));

    match last_user.and_then(|m| m.get("content")) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
