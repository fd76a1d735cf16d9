use serde_json::Value;

/// Parse the JSON payload out of a language-model reply.
///
/// Handles ```` ```json ```` fences, bare ```` ``` ```` fences and prose around a
/// single top-level object or array.
pub fn extract_json(response: &str) -> Result<Value, serde_json::Error> {
    let fenced = strip_fences(response);
    match serde_json::from_str(fenced) {
        Ok(v) => Ok(v),
        Err(first_err) => match outermost_json_span(fenced) {
            Some(span) => serde_json::from_str(span).map_err(|_| first_err),
            None => Err(first_err),
        },
    }
}

fn strip_fences(response: &str) -> &str {
    let text = response.trim();
    let (start, marker_len) = match text.find("```json") {
        Some(pos) => (pos, "```json".len()),
        None => match text.find("```") {
            Some(pos) => (pos, "```".len()),
            None => return text,
        },
    };
    let body_start = start + marker_len;
    match text.rfind("```") {
        Some(end) if end > body_start => text[body_start..end].trim(),
        _ => text[body_start..].trim(),
    }
}

fn outermost_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_fence() {
        let reply = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(extract_json(reply).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_bare_fence() {
        let reply = "```\n[1, 2]\n```";
        assert_eq!(extract_json(reply).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_prose_around_object() {
        let reply = "Sure! {\"scope\": {\"niche\": \"x\"}} hope it helps";
        assert_eq!(
            extract_json(reply).unwrap(),
            json!({"scope": {"niche": "x"}})
        );
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(extract_json("no json here").is_err());
        assert!(extract_json("```json\n{broken\n```").is_err());
    }
}
