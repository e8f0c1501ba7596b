/// Strip markdown code fences from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Extract a JSON value from model output that may wrap the payload in fences
/// or prose. Tries the fenced/trimmed text first, then the widest bracketed
/// span for arrays and objects.
pub fn extract_json(response: &str) -> Option<serde_json::Value> {
    let cleaned = strip_code_blocks(response);
    if let Ok(value) = serde_json::from_str(cleaned) {
        return Some(value);
    }

    for (open, close) in [('[', ']'), ('{', '}')] {
        let start = cleaned.find(open);
        let end = cleaned.rfind(close);
        if let (Some(start), Some(end)) = (start, end) {
            if end > start {
                if let Ok(value) = serde_json::from_str(&cleaned[start..=end]) {
                    return Some(value);
                }
            }
        }
    }

    None
}

/// Extract a JSON array of objects, dropping non-object entries.
pub fn extract_object_array(response: &str) -> Vec<serde_json::Map<String, serde_json::Value>> {
    match extract_json(response) {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_blocks("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_blocks("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_blocks("[1]"), "[1]");
    }

    #[test]
    fn extracts_bare_json() {
        assert_eq!(extract_json("[1, 2]"), Some(json!([1, 2])));
    }

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let text = "Here are the businesses I found:\n[{\"Name\": \"Tattva Spa\"}]\nLet me know!";
        let value = extract_json(text).unwrap();
        assert_eq!(value, json!([{"Name": "Tattva Spa"}]));
    }

    #[test]
    fn extracts_object_array_dropping_junk() {
        let text = "```json\n[{\"Name\": \"A\"}, \"stray\", {\"Name\": \"B\"}]\n```";
        let objects = extract_object_array(text);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].get("Name"), Some(&json!("A")));
    }

    #[test]
    fn unparseable_text_yields_none() {
        assert_eq!(extract_json("no json here"), None);
        assert!(extract_object_array("no json here").is_empty());
    }
}
