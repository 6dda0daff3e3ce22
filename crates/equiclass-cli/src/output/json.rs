//! JSON output formatter

use serde::Serialize;

pub fn format_value<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use equiclass_core::ClassificationResponse;

    #[test]
    fn test_classification_keys() {
        let response = ClassificationResponse {
            session_id: "s-1".into(),
            results: Vec::new(),
            nlp_query: "q".into(),
            filter: "colour eq 'white'".into(),
        };
        let parsed: serde_json::Value = serde_json::from_str(&format_value(&response)).unwrap();
        assert_eq!(parsed["sessionId"], "s-1");
        assert_eq!(parsed["aiSearchFilter"], "colour eq 'white'");
    }
}
