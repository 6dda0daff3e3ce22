//! Search index management

use crate::app::{IndexAction, IndexArgs};
use anyhow::Result;
use equiclass_core::{AzureSearchIndex, Config, Database, HttpLLMClient, Indexer, SearchIndex};
use std::sync::Arc;

pub async fn run(args: IndexArgs, config: &Config, db: Arc<Database>) -> Result<()> {
    config.validate_search()?;
    let index = Arc::new(AzureSearchIndex::new(config.search.clone())?);

    match args.action {
        IndexAction::Create => {
            index.create_or_update_index().await?;
            println!("Index '{}' is up to date", config.search.index_name);
        }
        IndexAction::Delete => {
            index.delete_index().await?;
            println!("Deleted index '{}'", config.search.index_name);
        }
        IndexAction::Populate {
            batch_size,
            concurrency,
        } => {
            let llm = Arc::new(HttpLLMClient::new(config.llm.clone())?);
            let total = db.count_golf_balls()?;
            let accepted = Indexer::new(db, llm.clone(), index)
                .with_batch_size(batch_size)
                .with_concurrency(concurrency)
                .populate()
                .await?;

            let metrics = llm.metrics();
            println!(
                "Uploaded {}/{} records to '{}'",
                accepted, total, config.search.index_name
            );
            println!(
                "Embedding requests: {} ({} errors, {:.0}ms avg)",
                metrics.total_requests, metrics.total_errors, metrics.avg_latency_ms
            );
        }
    }
    Ok(())
}
