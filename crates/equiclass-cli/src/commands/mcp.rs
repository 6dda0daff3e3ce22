//! MCP server command

use anyhow::Result;
use equiclass_core::{Classifier, Config, Database};
use std::sync::Arc;

pub async fn run(config: &Config, db: Arc<Database>) -> Result<()> {
    // Catalog and history tools work without remote services
    let classifier = match Classifier::from_config(config, db.clone()) {
        Ok(classifier) => Some(classifier),
        Err(e) => {
            tracing::warn!("classify_images disabled: {}", e);
            None
        }
    };

    equiclass_mcp::start_server(&db, classifier.as_ref()).await
}
