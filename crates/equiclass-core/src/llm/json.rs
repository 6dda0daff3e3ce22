//! Helpers for pulling JSON out of model output

/// Slice from the first `{` to the last `}`; handles markdown code fences
/// and chatter around the object. Returns `None` when no object is present.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_code_fence() {
        let response = "```json\n{\"manufacturer\": \"Titleist\"}\n```";
        assert_eq!(
            extract_json_object(response),
            Some("{\"manufacturer\": \"Titleist\"}")
        );
    }

    #[test]
    fn test_no_object() {
        assert_eq!(extract_json_object("I cannot see a ball"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }
}
