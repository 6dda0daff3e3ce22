//! Records passed between pipeline stages

use crate::search::SearchHit;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Manufacturer value meaning "no confident match"
pub const UNKNOWN_MANUFACTURER: &str = "unknown";

/// What one extraction pass read off the images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    #[serde(default = "unknown_manufacturer")]
    pub manufacturer: String,

    /// Primary colour, possibly compound (`red/white`)
    #[serde(default, alias = "color")]
    pub colour: String,

    /// Visible text and symbols, verbatim
    #[serde(default)]
    pub markings: String,

    /// Model's explanation; never used for querying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

fn unknown_manufacturer() -> String {
    UNKNOWN_MANUFACTURER.to_string()
}

impl Default for ExtractionRecord {
    fn default() -> Self {
        Self {
            manufacturer: unknown_manufacturer(),
            colour: String::new(),
            markings: String::new(),
            rationale: None,
        }
    }
}

impl ExtractionRecord {
    /// True when the manufacturer names a real maker rather than the sentinel
    pub fn has_known_manufacturer(&self) -> bool {
        let name = self.manufacturer.trim();
        !name.is_empty() && !name.eq_ignore_ascii_case(UNKNOWN_MANUFACTURER)
    }

    /// Replace any manufacturer not in `known` (exact match) with the sentinel
    pub fn constrain_manufacturer(&mut self, known: &[String]) {
        let name = self.manufacturer.trim();
        if known.iter().any(|k| k == name) {
            self.manufacturer = name.to_string();
        } else {
            if !name.is_empty() && name != UNKNOWN_MANUFACTURER {
                tracing::debug!("Manufacturer '{}' not in catalog, using sentinel", name);
            }
            self.manufacturer = unknown_manufacturer();
        }
    }

    /// Schema the model's output must conform to
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "manufacturer": { "type": "string" },
                "colour": { "type": "string" },
                "markings": { "type": "string" },
                "rationale": { "type": ["string", "null"] }
            },
            "required": ["manufacturer", "colour", "markings", "rationale"],
            "additionalProperties": false
        })
    }
}

/// Input to the search collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub nlp_query: String,
    pub filter: String,
}

/// Outcome of one classification request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResponse {
    pub session_id: String,
    pub results: Vec<SearchHit>,
    pub nlp_query: String,
    #[serde(rename = "aiSearchFilter")]
    pub filter: String,
}
