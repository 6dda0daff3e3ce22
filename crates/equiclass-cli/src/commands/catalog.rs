//! Equipment catalog commands

use crate::app::{CatalogAction, CatalogArgs, OutputFormat};
use anyhow::Result;
use equiclass_core::Database;

pub async fn run(args: CatalogArgs, db: &Database, format: OutputFormat) -> Result<()> {
    match args.action {
        CatalogAction::Import { path } => {
            let count = db.import_golf_balls_csv(&path)?;
            println!("Imported {} records from {}", count, path.display());
        }
        CatalogAction::Manufacturers => {
            let manufacturers = db.get_manufacturers()?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&manufacturers)?);
                }
                OutputFormat::Cli => {
                    if manufacturers.is_empty() {
                        println!("No manufacturers");
                    }
                    for name in manufacturers {
                        println!("{}", name);
                    }
                }
            }
        }
    }
    Ok(())
}
