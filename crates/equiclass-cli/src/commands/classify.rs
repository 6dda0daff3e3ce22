//! Classify command

use crate::app::{ClassifyArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use equiclass_core::classify::ImageUpload;
use equiclass_core::{Classifier, Config, Database};
use std::sync::Arc;

pub async fn run(
    args: ClassifyArgs,
    config: &Config,
    db: Arc<Database>,
    format: OutputFormat,
) -> Result<()> {
    let classifier = Classifier::from_config(config, db)?;

    let mut images = Vec::with_capacity(args.images.len());
    for path in &args.images {
        images.push(ImageUpload::from_path(path).await?);
    }

    let response = classifier.classify(args.session_id, images).await?;
    print!("{}", output::format_classification(&response, format));
    Ok(())
}
