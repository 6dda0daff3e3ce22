//! Configuration inspection

use crate::app::{ConfigAction, ConfigArgs};
use anyhow::Result;
use equiclass_core::Config;
use std::path::Path;

const MASK: &str = "********";

pub async fn run(args: ConfigArgs, config: &Config, explicit: Option<&Path>) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", serde_yaml::to_string(&masked(config))?);
            if let Err(e) = config.validate() {
                eprintln!("Warning: {}", e);
            }
        }
        ConfigAction::Path => {
            let path = explicit
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    let mask = |secret: &mut Option<String>| {
        if secret.is_some() {
            *secret = Some(MASK.to_string());
        }
    };
    mask(&mut config.llm.api_key);
    mask(&mut config.search.admin_key);
    mask(&mut config.search.vector.vectorizer_api_key);
    mask(&mut config.storage.account_key);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_masked() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-live".into());
        config.storage.account_key = Some("c2VjcmV0".into());
        config.search.admin_key = None;

        let shown = masked(&config);
        assert_eq!(shown.llm.api_key.as_deref(), Some(MASK));
        assert_eq!(shown.storage.account_key.as_deref(), Some(MASK));
        assert_eq!(shown.search.admin_key, None);
    }
}
