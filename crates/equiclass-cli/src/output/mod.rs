//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use equiclass_core::{ChatSessionRecord, ClassificationResponse};

pub fn format_classification(response: &ClassificationResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(response),
        OutputFormat::Cli => terminal::format_classification(response),
    }
}

pub fn format_history(session: &ChatSessionRecord, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(session),
        OutputFormat::Cli => terminal::format_history(session),
    }
}
