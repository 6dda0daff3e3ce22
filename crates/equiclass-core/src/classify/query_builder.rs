//! Search query and filter construction from an extraction record

use super::history::ChatHistory;
use super::prompts;
use super::record::{ExtractionRecord, SearchQuery};
use crate::llm::{ChatMessage, CompletionOptions, LLMClient};
use std::sync::Arc;

/// Query text used when there are no markings to search on
const MATCH_ALL: &str = "*";

pub struct QueryBuilder {
    llm: Arc<dyn LLMClient>,
    history: ChatHistory,
    options: CompletionOptions,
}

impl QueryBuilder {
    pub fn new(llm: Arc<dyn LLMClient>, history: ChatHistory, options: CompletionOptions) -> Self {
        Self {
            llm,
            history,
            options,
        }
    }

    pub async fn build_query(&self, session_id: &str, record: &ExtractionRecord) -> SearchQuery {
        SearchQuery {
            nlp_query: self.nlp_query(session_id, &record.markings).await,
            filter: build_filter(record),
        }
    }

    /// Ask the model for a search sentence. Falls back to the markings
    /// themselves if the call fails or comes back empty.
    async fn nlp_query(&self, session_id: &str, markings: &str) -> String {
        let markings = markings.trim();
        if markings.is_empty() {
            return MATCH_ALL.to_string();
        }

        let prompt = prompts::nlp_prompt(markings);
        let response = self
            .llm
            .chat_completion(vec![ChatMessage::user(prompt.clone())], &self.options)
            .await;

        let query = match response {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!("NLP query came back empty, searching on raw markings");
                markings.to_string()
            }
            Err(e) => {
                tracing::warn!("NLP query failed, searching on raw markings: {}", e);
                markings.to_string()
            }
        };

        tracing::info!("NLP query: {}", query);
        self.history.record_nlp(session_id, &prompt, &query).await;
        query
    }
}

/// Double embedded single quotes for use inside `'...'`
pub fn escape_filter_value(value: &str) -> String {
    value.replace('\'', "''")
}

/// Colour predicate, plus a manufacturer predicate when one is known.
///
/// A compound colour matches either order. When a manufacturer clause
/// follows, the colour alternatives are parenthesised so `and` applies to
/// both.
pub fn build_filter(record: &ExtractionRecord) -> String {
    let colour = record.colour.trim().to_lowercase();

    let colour_clause = match colour.split_once('/') {
        Some((first, second)) => {
            let first = escape_filter_value(first.trim());
            let second = escape_filter_value(second.trim());
            format!(
                "colour eq '{first}/{second}' or colour eq '{second}/{first}'",
                first = first,
                second = second
            )
        }
        None => format!("colour eq '{}'", escape_filter_value(&colour)),
    };

    if !record.has_known_manufacturer() {
        return colour_clause;
    }

    let manufacturer = escape_filter_value(record.manufacturer.trim());
    if colour.contains('/') {
        format!("({}) and manufacturer eq '{}'", colour_clause, manufacturer)
    } else {
        format!("{} and manufacturer eq '{}'", colour_clause, manufacturer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EquiclassError, Result};
    use crate::llm::MessageContent;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::Mutex;

    fn record(manufacturer: &str, colour: &str, markings: &str) -> ExtractionRecord {
        ExtractionRecord {
            manufacturer: manufacturer.into(),
            colour: colour.into(),
            markings: markings.into(),
            rationale: None,
        }
    }

    #[test]
    fn test_single_colour_with_manufacturer() {
        assert_eq!(
            build_filter(&record("Titleist", "Yellow", "<< Pro V1 >>")),
            "colour eq 'yellow' and manufacturer eq 'Titleist'"
        );
    }

    #[test]
    fn test_compound_colour_without_manufacturer() {
        assert_eq!(
            build_filter(&record("unknown", "red/white", "")),
            "colour eq 'red/white' or colour eq 'white/red'"
        );
    }

    #[test]
    fn test_compound_colour_with_manufacturer() {
        assert_eq!(
            build_filter(&record("Srixon", "Red / White", "")),
            "(colour eq 'red/white' or colour eq 'white/red') and manufacturer eq 'Srixon'"
        );
    }

    #[test]
    fn test_sentinel_any_case_is_omitted() {
        assert_eq!(build_filter(&record("UNKNOWN", "white", "")), "colour eq 'white'");
        assert_eq!(build_filter(&record("", "white", "")), "colour eq 'white'");
    }

    #[test]
    fn test_quotes_are_doubled() {
        assert_eq!(
            build_filter(&record("O'Brien's", "white", "")),
            "colour eq 'white' and manufacturer eq 'O''Brien''s'"
        );
    }

    proptest! {
        #[test]
        fn prop_single_colour_is_one_lowercase_predicate(colour in "[A-Za-z ]{1,12}") {
            let filter = build_filter(&record("unknown", &colour, ""));
            let expected = colour.trim().to_lowercase();
            prop_assert_eq!(filter, format!("colour eq '{}'", expected));
        }

        #[test]
        fn prop_compound_colour_is_or_of_both_orders(
            a in "[A-Za-z]{1,8}",
            b in "[A-Za-z]{1,8}",
        ) {
            let filter = build_filter(&record("unknown", &format!("{}/{}", a, b), ""));
            let (a, b) = (a.to_lowercase(), b.to_lowercase());
            prop_assert_eq!(
                filter,
                format!("colour eq '{a}/{b}' or colour eq '{b}/{a}'", a = a, b = b)
            );
        }

        #[test]
        fn prop_manufacturer_clause_iff_known(manufacturer in "[A-Za-z' ]{0,12}") {
            let filter = build_filter(&record(&manufacturer, "white", ""));
            let known = !manufacturer.trim().is_empty()
                && !manufacturer.trim().eq_ignore_ascii_case("unknown");
            prop_assert_eq!(filter.contains(" and manufacturer eq "), known);
            if known {
                let escaped = manufacturer.trim().replace('\'', "''");
                let expected_suffix = format!("manufacturer eq '{}'", escaped);
                prop_assert!(filter.ends_with(&expected_suffix));
            }
        }
    }

    struct EchoLLM {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LLMClient for EchoLLM {
        async fn chat_completion(
            &self,
            messages: Vec<ChatMessage>,
            _options: &CompletionOptions,
        ) -> Result<String> {
            if let MessageContent::Text(text) = &messages[0].content {
                self.prompts.lock().unwrap().push(text.clone());
            }
            self.reply
                .clone()
                .ok_or_else(|| EquiclassError::Llm("unavailable".into()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(Vec::new())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn builder(reply: Option<&str>) -> (QueryBuilder, Arc<EchoLLM>) {
        let llm = Arc::new(EchoLLM {
            reply: reply.map(String::from),
            prompts: Mutex::new(Vec::new()),
        });
        let builder = QueryBuilder::new(
            llm.clone(),
            ChatHistory::disabled(),
            CompletionOptions::default(),
        );
        (builder, llm)
    }

    #[tokio::test]
    async fn test_prompt_uses_markings_only() {
        let (builder, llm) = builder(Some("+\"<< Pro V1 >>\"\n"));
        let query = builder
            .build_query("s-1", &record("Titleist", "yellow", "<< Pro V1 >>"))
            .await;

        assert_eq!(query.nlp_query, "+\"<< Pro V1 >>\"");
        assert_eq!(query.filter, "colour eq 'yellow' and manufacturer eq 'Titleist'");

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("<< Pro V1 >>"));
        assert!(!prompts[0].contains("Titleist"));
        assert!(!prompts[0].contains("yellow"));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_markings() {
        let (builder, _) = builder(None);
        let query = builder
            .build_query("s-1", &record("unknown", "white", "  TOUR 2 "))
            .await;
        assert_eq!(query.nlp_query, "TOUR 2");
    }

    #[tokio::test]
    async fn test_empty_markings_skip_the_model() {
        let (builder, llm) = builder(Some("ignored"));
        let query = builder.build_query("s-1", &record("unknown", "white", "")).await;
        assert_eq!(query.nlp_query, "*");
        assert!(llm.prompts.lock().unwrap().is_empty());
    }
}
