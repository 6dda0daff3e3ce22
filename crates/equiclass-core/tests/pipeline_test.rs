//! End-to-end tests for the classification pipeline
//!
//! Every external service is replaced by an in-process double:
//! 1. Scripted LLM that tells extraction, consolidation and NLP calls apart
//! 2. Search index returning queued hit lists
//! 3. Blob store recording uploads
//! 4. In-memory SQLite for manufacturers and chat history

use async_trait::async_trait;
use equiclass_core::classify::{Collaborators, ImageUpload};
use equiclass_core::config::Config;
use equiclass_core::error::{EquiclassError, Result};
use equiclass_core::llm::{ChatMessage, CompletionOptions, LLMClient, MessageContent};
use equiclass_core::search::{IndexDocument, SearchHit, SearchIndex, SearchRequest};
use equiclass_core::storage::BlobStore;
use equiclass_core::{Classifier, Database, GolfBall};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const EXTRACTION: &str =
    r#"{"manufacturer":"Titleist","colour":"Yellow","markings":"<< Pro V1 >>","rationale":null}"#;

#[derive(Default)]
struct ScriptedLLM {
    extraction_calls: AtomicUsize,
    consolidation_calls: AtomicUsize,
    nlp_calls: AtomicUsize,
}

impl ScriptedLLM {
    fn total_extraction_calls(&self) -> usize {
        self.extraction_calls.load(Ordering::SeqCst) + self.consolidation_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<String> {
        if options.response_format.is_none() {
            self.nlp_calls.fetch_add(1, Ordering::SeqCst);
            return Ok("+\"<< Pro V1 >>\"".to_string());
        }

        let is_consolidation = matches!(
            &messages[0].content,
            MessageContent::Text(system) if system.contains("Readings:")
        );
        if is_consolidation {
            self.consolidation_calls.fetch_add(1, Ordering::SeqCst);
        } else {
            self.extraction_calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(EXTRACTION.to_string())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct QueuedSearch {
    responses: Mutex<VecDeque<Result<Vec<SearchHit>>>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl QueuedSearch {
    fn new(responses: Vec<Result<Vec<SearchHit>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SearchIndex for QueuedSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_or_update_index(&self) -> Result<()> {
        Ok(())
    }

    async fn delete_index(&self) -> Result<()> {
        Ok(())
    }

    async fn upload_documents(&self, documents: &[IndexDocument]) -> Result<usize> {
        Ok(documents.len())
    }
}

#[derive(Default)]
struct RecordingStore {
    uploads: Mutex<Vec<String>>,
    url_requests: AtomicUsize,
}

#[async_trait]
impl BlobStore for RecordingStore {
    async fn upload(&self, _bytes: &[u8], path: &str, _content_type: &str) -> Result<()> {
        self.uploads.lock().unwrap().push(path.to_string());
        Ok(())
    }

    async fn temporary_read_url(&self, path: &str, _ttl: Duration) -> Result<String> {
        self.url_requests.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://blob.test/{}?sig=x", path))
    }
}

fn hit(manufacturer: &str, reranker_score: f64) -> SearchHit {
    SearchHit {
        manufacturer: Some(manufacturer.to_string()),
        reranker_score: Some(reranker_score),
        ..Default::default()
    }
}

struct Harness {
    classifier: Classifier,
    llm: Arc<ScriptedLLM>,
    search: Arc<QueuedSearch>,
    storage: Arc<RecordingStore>,
    db: Arc<Database>,
}

fn harness(search_responses: Vec<Result<Vec<SearchHit>>>, history: bool) -> Harness {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    db.insert_golf_balls(&[GolfBall {
        id: "b-1".into(),
        manufacturer: "Titleist".into(),
        colour: "yellow".into(),
        ..Default::default()
    }])
    .unwrap();
    let db = Arc::new(db);

    let llm = Arc::new(ScriptedLLM::default());
    let search = Arc::new(QueuedSearch::new(search_responses));
    let storage = Arc::new(RecordingStore::default());

    let mut config = Config::default();
    config.pipeline.min_reranker_score = 2.0;
    config.pipeline.enable_chat_history = history;

    let classifier = Classifier::new(
        Collaborators {
            llm: llm.clone(),
            manufacturers: db.clone(),
            storage: storage.clone(),
            search: search.clone(),
            history: db.clone(),
        },
        &config,
    );

    Harness {
        classifier,
        llm,
        search,
        storage,
        db,
    }
}

fn images() -> Vec<ImageUpload> {
    vec![
        ImageUpload::new("front.jpg", vec![1, 2, 3]),
        ImageUpload::new("../side.png", vec![4, 5, 6]),
    ]
}

#[tokio::test]
async fn test_first_pass_hit_returns_without_retry() {
    let h = harness(vec![Ok(vec![hit("Titleist", 2.7)])], false);

    let response = h
        .classifier
        .classify(Some("session-1".into()), images())
        .await
        .unwrap();

    assert_eq!(response.session_id, "session-1");
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.nlp_query, "+\"<< Pro V1 >>\"");
    assert_eq!(
        response.filter,
        "colour eq 'yellow' and manufacturer eq 'Titleist'"
    );

    assert_eq!(h.llm.extraction_calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.llm.consolidation_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.llm.nlp_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.search.requests.lock().unwrap().len(), 1);

    let uploads = h.storage.uploads.lock().unwrap();
    assert_eq!(*uploads, vec!["session-1/front.jpg", "session-1/side.png"]);
}

#[tokio::test]
async fn test_empty_first_pass_retries_exactly_once() {
    let h = harness(vec![Ok(Vec::new()), Ok(Vec::new())], false);

    let response = h.classifier.classify(None, images()).await.unwrap();

    assert!(response.results.is_empty());
    assert_eq!(h.llm.total_extraction_calls(), 8);
    assert_eq!(h.llm.nlp_calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.search.requests.lock().unwrap().len(), 2);
    // images are uploaded and signed once per request, not per pass
    assert_eq!(h.storage.uploads.lock().unwrap().len(), 2);
    assert_eq!(h.storage.url_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retry_outcome_is_returned() {
    let h = harness(vec![Ok(Vec::new()), Ok(vec![hit("Titleist", 3.0)])], false);

    let response = h.classifier.classify(None, images()).await.unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(h.llm.total_extraction_calls(), 8);
}

#[tokio::test]
async fn test_threshold_filters_before_retry_decision() {
    let h = harness(
        vec![
            Ok(vec![hit("Titleist", 1.9)]),
            Ok(vec![hit("Titleist", 1.9), hit("Titleist", 2.0)]),
        ],
        false,
    );

    let response = h.classifier.classify(None, images()).await.unwrap();

    // 1.9 alone does not qualify, so the pipeline ran twice
    assert_eq!(h.search.requests.lock().unwrap().len(), 2);
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].reranker_score, Some(2.0));
}

#[tokio::test]
async fn test_no_images_rejected_before_any_call() {
    let h = harness(Vec::new(), false);

    let result = h.classifier.classify(Some("s".into()), Vec::new()).await;

    assert!(matches!(result, Err(EquiclassError::InvalidInput(_))));
    assert_eq!(h.llm.total_extraction_calls(), 0);
    assert_eq!(h.llm.nlp_calls.load(Ordering::SeqCst), 0);
    assert!(h.storage.uploads.lock().unwrap().is_empty());
    assert!(h.search.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_path_like_session_id_rejected_before_upload() {
    let h = harness(Vec::new(), false);

    let result = h.classifier.classify(Some("../x".into()), images()).await;

    assert!(matches!(result, Err(EquiclassError::InvalidInput(_))));
    assert_eq!(h.llm.total_extraction_calls(), 0);
    assert!(h.storage.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_failure_is_generic() {
    let h = harness(
        vec![Err(EquiclassError::ExternalError("HTTP 503: secret detail".into()))],
        false,
    );

    let result = h.classifier.classify(Some("s-9".into()), images()).await;

    match result {
        Err(EquiclassError::ClassificationFailed { session_id }) => {
            assert_eq!(session_id, "s-9");
        }
        other => panic!("expected ClassificationFailed, got {:?}", other.map(|r| r.results)),
    }
}

#[tokio::test]
async fn test_search_request_uses_pipeline_config() {
    let h = harness(vec![Ok(vec![hit("Titleist", 5.0)])], false);
    h.classifier.classify(None, images()).await.unwrap();

    let requests = h.search.requests.lock().unwrap();
    assert_eq!(requests[0].top_k, 5);
    assert_eq!(requests[0].k_nearest, 10);
    assert_eq!(requests[0].query_text, "+\"<< Pro V1 >>\"");
}

#[tokio::test]
async fn test_chat_history_written_when_enabled() {
    let h = harness(vec![Ok(vec![hit("Titleist", 2.5)])], true);
    h.classifier
        .classify(Some("audited".into()), images())
        .await
        .unwrap();

    let session = h.db.get_chat_session("audited").unwrap().unwrap();
    // 4 extraction exchanges of system + text + 2 images + response, then
    // the NLP prompt and query
    assert_eq!(session.messages.len(), 4 * 5 + 2);
    assert!(session
        .messages
        .iter()
        .any(|m| m.message_content.starts_with("https://blob.test/audited/front.jpg")));
}

#[tokio::test]
async fn test_chat_history_skipped_when_disabled() {
    let h = harness(vec![Ok(vec![hit("Titleist", 2.5)])], false);
    h.classifier
        .classify(Some("quiet".into()), images())
        .await
        .unwrap();

    assert!(h.db.get_chat_session("quiet").unwrap().is_none());
}
