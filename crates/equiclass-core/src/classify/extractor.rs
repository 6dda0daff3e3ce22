//! One vision-model call over a set of images

use super::history::ChatHistory;
use super::manufacturers::ManufacturerCache;
use super::prompts;
use super::record::ExtractionRecord;
use crate::llm::{
    extract_json_object, ChatMessage, CompletionOptions, ContentPart, ImageDetail,
    JsonSchemaFormat, LLMClient, ResponseFormat,
};
use std::sync::Arc;

pub struct ImageExtractor {
    llm: Arc<dyn LLMClient>,
    manufacturers: Arc<ManufacturerCache>,
    history: ChatHistory,
    options: CompletionOptions,
}

impl ImageExtractor {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        manufacturers: Arc<ManufacturerCache>,
        history: ChatHistory,
        options: CompletionOptions,
    ) -> Self {
        let options = options.with_response_format(ResponseFormat::JsonSchema {
            json_schema: JsonSchemaFormat {
                name: "golf_ball_extraction".to_string(),
                strict: true,
                schema: ExtractionRecord::json_schema(),
            },
        });

        Self {
            llm,
            manufacturers,
            history,
            options,
        }
    }

    /// Run one pass. With `prior` set, the model reconciles those records
    /// instead of reading the images from scratch.
    ///
    /// Never fails: any upstream or parse error is logged and yields
    /// `ExtractionRecord::default()`.
    pub async fn extract(
        &self,
        session_id: &str,
        image_urls: &[String],
        prior: Option<&[ExtractionRecord]>,
    ) -> ExtractionRecord {
        let manufacturers = match self.manufacturers.get_manufacturers().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("Manufacturer lookup failed, skipping extraction: {}", e);
                return ExtractionRecord::default();
            }
        };

        let system_prompt = match prior {
            None => prompts::extraction_prompt(&manufacturers),
            Some(records) => {
                let json_list = match serde_json::to_string_pretty(records) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!("Cannot serialize prior extractions: {}", e);
                        return ExtractionRecord::default();
                    }
                };
                prompts::consolidation_prompt(&manufacturers, &json_list)
            }
        };

        let mut parts = vec![ContentPart::text(prompts::IMAGE_INSTRUCTION)];
        parts.extend(
            image_urls
                .iter()
                .map(|url| ContentPart::image(url.clone(), ImageDetail::High)),
        );
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user_parts(parts),
        ];

        let response = match self
            .llm
            .chat_completion(messages.clone(), &self.options)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Extraction call failed: {}", e);
                return ExtractionRecord::default();
            }
        };
        tracing::debug!("Extraction response: {}", response);

        self.history
            .record_extraction(session_id, &messages, &response)
            .await;

        parse_extraction(&response, &manufacturers)
    }
}

/// Parse model output and pin the manufacturer to the known list
pub fn parse_extraction(response: &str, manufacturers: &[String]) -> ExtractionRecord {
    let Some(json) = extract_json_object(response) else {
        tracing::warn!("Extraction response contained no JSON object");
        return ExtractionRecord::default();
    };

    let mut record = match serde_json::from_str::<ExtractionRecord>(json) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Failed to parse extraction JSON: {}", e);
            return ExtractionRecord::default();
        }
    };

    record.constrain_manufacturer(manufacturers);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::manufacturers::ManufacturerSource;
    use crate::classify::record::UNKNOWN_MANUFACTURER;
    use crate::error::{EquiclassError, Result};
    use crate::llm::MessageContent;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    fn makers() -> Vec<String> {
        vec!["Titleist".into(), "Srixon".into()]
    }

    struct StaticMakers;

    #[async_trait]
    impl ManufacturerSource for StaticMakers {
        async fn fetch_manufacturers(&self) -> Result<Vec<String>> {
            Ok(makers())
        }
    }

    struct ScriptedLLM {
        reply: Result<String>,
        seen: Mutex<Vec<(Vec<ChatMessage>, bool)>>,
    }

    impl ScriptedLLM {
        fn new(reply: Result<String>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMClient for ScriptedLLM {
        async fn chat_completion(
            &self,
            messages: Vec<ChatMessage>,
            options: &CompletionOptions,
        ) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((messages, options.response_format.is_some()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(EquiclassError::Llm("scripted failure".into())),
            }
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(Vec::new())
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn extractor(llm: Arc<ScriptedLLM>) -> ImageExtractor {
        let cache = ManufacturerCache::new(Arc::new(StaticMakers), Duration::from_secs(60));
        ImageExtractor::new(
            llm,
            Arc::new(cache),
            ChatHistory::disabled(),
            CompletionOptions::default(),
        )
    }

    #[test]
    fn test_parse_unlisted_manufacturer() {
        let record = parse_extraction(
            r#"{"manufacturer":"Acme","colour":"white","markings":"A1"}"#,
            &makers(),
        );
        assert_eq!(record.manufacturer, UNKNOWN_MANUFACTURER);
        assert_eq!(record.markings, "A1");
    }

    #[test]
    fn test_parse_garbage_yields_default() {
        assert_eq!(parse_extraction("sorry, I can't", &makers()), ExtractionRecord::default());
        assert_eq!(parse_extraction("", &makers()), ExtractionRecord::default());
        assert_eq!(parse_extraction("{not json}", &makers()), ExtractionRecord::default());
    }

    #[test]
    fn test_parse_fenced_response() {
        let record = parse_extraction(
            "```json\n{\"manufacturer\":\"Srixon\",\"colour\":\"yellow\",\"markings\":\"Z-STAR\"}\n```",
            &makers(),
        );
        assert_eq!(record.manufacturer, "Srixon");
        assert_eq!(record.colour, "yellow");
    }

    #[tokio::test]
    async fn test_first_pass_sends_high_detail_images() {
        let llm = Arc::new(ScriptedLLM::new(Ok(
            r#"{"manufacturer":"Titleist","colour":"white","markings":"Pro V1","rationale":null}"#
                .to_string(),
        )));
        let urls = vec!["https://blob/a.jpg".to_string(), "https://blob/b.jpg".to_string()];

        let record = extractor(llm.clone()).extract("s-1", &urls, None).await;
        assert_eq!(record.manufacturer, "Titleist");

        let seen = llm.seen.lock().unwrap();
        let (messages, constrained) = &seen[0];
        assert!(*constrained);
        assert_eq!(messages[0].role, "system");
        let MessageContent::Parts(parts) = &messages[1].content else {
            panic!("expected multimodal user message");
        };
        let images: Vec<_> = parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::ImageUrl { image_url } => Some(image_url),
                _ => None,
            })
            .collect();
        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|i| i.detail == Some(ImageDetail::High)));
    }

    #[tokio::test]
    async fn test_consolidation_prompt_embeds_prior() {
        let llm = Arc::new(ScriptedLLM::new(Ok("{}".to_string())));
        let prior = vec![ExtractionRecord {
            markings: "<< TOUR >>".into(),
            ..Default::default()
        }];

        extractor(llm.clone())
            .extract("s-1", &["u".to_string()], Some(&prior))
            .await;

        let seen = llm.seen.lock().unwrap();
        let MessageContent::Text(system) = &seen[0].0[0].content else {
            panic!("expected text system prompt");
        };
        assert!(system.contains("<< TOUR >>"));
    }

    #[tokio::test]
    async fn test_llm_failure_yields_default() {
        let llm = Arc::new(ScriptedLLM::new(Err(EquiclassError::Llm("down".into()))));
        let record = extractor(llm).extract("s-1", &["u".to_string()], None).await;
        assert_eq!(record, ExtractionRecord::default());
    }
}
