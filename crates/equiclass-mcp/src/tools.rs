//! MCP tool definitions and handlers

use crate::protocol::*;
use anyhow::{Context, Result};
use equiclass_core::classify::ImageUpload;
use equiclass_core::{Classifier, Database};
use serde_json::Value;

pub fn classify_images_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "classify_images".to_string(),
        description: "Identify a golf ball from one or more photographs and return matching catalog records"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "images": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Paths of image files showing the same ball"
                },
                "sessionId": {
                    "type": "string",
                    "description": "Existing session id (generated when omitted)"
                }
            },
            "required": ["images"]
        }),
    }
}

pub fn list_manufacturers_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_manufacturers".to_string(),
        description: "List manufacturers known to the equipment catalog".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn get_chat_history_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_chat_history".to_string(),
        description: "Show the stored prompts and model responses for a session".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "sessionId": {
                    "type": "string",
                    "description": "Session id returned by classify_images"
                }
            },
            "required": ["sessionId"]
        }),
    }
}

pub async fn handle_classify_images(
    classifier: Option<&Classifier>,
    args: Value,
) -> Result<ToolResult> {
    let classifier =
        classifier.context("Classification is not configured; check the llm, search and storage settings")?;

    let paths: Vec<String> = args
        .get("images")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    let session_id = args
        .get("sessionId")
        .and_then(|v| v.as_str())
        .map(String::from);

    let mut images = Vec::with_capacity(paths.len());
    for path in &paths {
        images.push(ImageUpload::from_path(path).await?);
    }

    let response = classifier.classify(session_id, images).await?;

    let mut summary = format!(
        "Session {}: {} match(es)\nQuery: {}\nFilter: {}\n",
        response.session_id,
        response.results.len(),
        response.nlp_query,
        response.filter
    );
    for hit in &response.results {
        summary.push_str(&format!(
            "- {} {} (reranker {:.2})\n",
            hit.manufacturer.as_deref().unwrap_or("?"),
            hit.pole_marking.as_deref().unwrap_or(""),
            hit.reranker_score.unwrap_or_default()
        ));
    }

    Ok(ToolResult::structured(
        summary,
        serde_json::to_value(&response)?,
    ))
}

pub async fn handle_list_manufacturers(db: &Database) -> Result<ToolResult> {
    let manufacturers = db.get_manufacturers()?;
    let text = if manufacturers.is_empty() {
        "No manufacturers in catalog".to_string()
    } else {
        manufacturers.join("\n")
    };

    Ok(ToolResult::structured(
        text,
        serde_json::json!({ "manufacturers": manufacturers }),
    ))
}

pub async fn handle_get_chat_history(db: &Database, args: Value) -> Result<ToolResult> {
    let session_id = args
        .get("sessionId")
        .and_then(|v| v.as_str())
        .context("sessionId is required")?;

    let session = db
        .get_chat_session(session_id)?
        .with_context(|| format!("Session not found: {}", session_id))?;

    let mut text = format!(
        "Session {} ({} messages)\n",
        session.session_id,
        session.messages.len()
    );
    for message in &session.messages {
        text.push_str(&format!("[{}] {}\n", message.sender, message.message_content));
    }

    Ok(ToolResult::structured(text, serde_json::to_value(&session)?))
}
