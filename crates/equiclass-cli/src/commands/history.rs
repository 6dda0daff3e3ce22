//! Chat history command

use crate::app::{HistoryArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use equiclass_core::{Database, EquiclassError};

pub async fn run(args: HistoryArgs, db: &Database, format: OutputFormat) -> Result<()> {
    let session = db
        .get_chat_session(&args.session_id)?
        .ok_or(EquiclassError::SessionNotFound(args.session_id))?;

    print!("{}", output::format_history(&session, format));
    Ok(())
}
