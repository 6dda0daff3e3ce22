//! Azure AI Search REST client

use super::{index_definition, IndexDocument, SearchHit, SearchIndex, SearchRequest, SELECT_FIELDS};
use crate::config::SearchServiceConfig;
use crate::error::{EquiclassError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Documents per `docs/index` call; the service caps batches at 1000
const UPLOAD_BATCH_SIZE: usize = 500;

pub struct AzureSearchIndex {
    http_client: reqwest::Client,
    config: SearchServiceConfig,
}

impl AzureSearchIndex {
    pub fn new(config: SearchServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(EquiclassError::Http)?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn index_url(&self, suffix: &str) -> String {
        format!(
            "{}/indexes/{}{}?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.index_name,
            suffix,
            self.config.api_version
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.admin_key {
            Some(key) => req.header("api-key", key),
            None => req,
        }
    }

    /// Text vector queries need an index-side vectorizer
    fn vector_queries_enabled(&self) -> bool {
        self.config.vector.vectorizer_resource_uri.is_some()
    }

    pub(crate) fn search_body(&self, request: &SearchRequest) -> Value {
        let mut body = json!({
            "search": request.query_text,
            "top": request.top_k,
            "queryType": "semantic",
            "semanticConfiguration": self.config.semantic_configuration,
            "select": SELECT_FIELDS,
        });

        if !request.filter.is_empty() {
            body["filter"] = json!(request.filter);
        }

        if self.vector_queries_enabled() {
            body["vectorQueries"] = json!([{
                "kind": "text",
                "text": request.query_text,
                "fields": "vectorContent",
                "k": request.k_nearest
            }]);
        }

        body
    }
}

async fn error_for_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(what, status, &body))
}

fn status_error(what: &str, status: reqwest::StatusCode, body: &str) -> EquiclassError {
    EquiclassError::Search(format!("{} failed (HTTP {}): {}", what, status, body))
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "@search.score", default)]
    score: f64,
    #[serde(rename = "@search.rerankerScore", default)]
    reranker_score: Option<f64>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    manufacturer: Option<String>,
    #[serde(default)]
    usga_lot_num: Option<String>,
    #[serde(default)]
    pole_marking: Option<String>,
    #[serde(default)]
    colour: Option<String>,
    #[serde(rename = "constCode", default)]
    const_code: Option<String>,
    #[serde(rename = "ballSpecs", default)]
    ball_specs: Option<String>,
    #[serde(default)]
    dimples: Option<i64>,
    #[serde(default)]
    spin: Option<String>,
    #[serde(default)]
    pole_2: Option<String>,
    #[serde(default)]
    seam_marking: Option<String>,
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

impl From<RawHit> for SearchHit {
    fn from(raw: RawHit) -> Self {
        Self {
            id: raw.id,
            manufacturer: raw.manufacturer,
            usga_lot_num: raw.usga_lot_num,
            pole_marking: raw.pole_marking,
            colour: raw.colour,
            const_code: raw.const_code,
            ball_specs: raw.ball_specs,
            dimples: raw.dimples.map(|d| d.to_string()),
            spin: raw.spin,
            pole_2: raw.pole_2,
            seam_marking: raw.seam_marking,
            image_url: raw.image_url,
            score: raw.score,
            reranker_score: raw.reranker_score,
        }
    }
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    value: &'a [IndexDocument],
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    value: Vec<UploadStatus>,
}

#[derive(Deserialize)]
struct UploadStatus {
    key: String,
    status: bool,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

#[async_trait]
impl SearchIndex for AzureSearchIndex {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let body = self.search_body(request);
        tracing::debug!("Search request: {}", body);

        let response = self
            .authorize(self.http_client.post(self.index_url("/docs/search")))
            .json(&body)
            .send()
            .await?;
        let response = error_for_status(response, "Search query").await?;

        let parsed: SearchResponse = response.json().await?;
        let hits: Vec<SearchHit> = parsed.value.into_iter().map(SearchHit::from).collect();

        tracing::info!(
            "Search returned {} hits for filter '{}'",
            hits.len(),
            request.filter
        );
        Ok(hits)
    }

    async fn create_or_update_index(&self) -> Result<()> {
        let definition = index_definition(&self.config);
        tracing::info!("Creating or updating index {}", self.config.index_name);

        let response = self
            .authorize(self.http_client.put(self.index_url("")))
            .json(&definition)
            .send()
            .await?;
        error_for_status(response, "Index create/update").await?;
        Ok(())
    }

    async fn delete_index(&self) -> Result<()> {
        tracing::info!("Deleting index {}", self.config.index_name);
        let response = self
            .authorize(self.http_client.delete(self.index_url("")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!("Index {} does not exist", self.config.index_name);
            return Ok(());
        }
        error_for_status(response, "Index delete").await?;
        Ok(())
    }

    async fn upload_documents(&self, documents: &[IndexDocument]) -> Result<usize> {
        let mut accepted = 0;

        for batch in documents.chunks(UPLOAD_BATCH_SIZE) {
            let response = self
                .authorize(self.http_client.post(self.index_url("/docs/index")))
                .json(&UploadRequest { value: batch })
                .send()
                .await?;
            let response = error_for_status(response, "Document upload").await?;
            let parsed: UploadResponse = response.json().await?;

            for status in &parsed.value {
                if status.status {
                    accepted += 1;
                } else {
                    tracing::warn!(
                        "Document {} rejected: {}",
                        status.key,
                        status.error_message.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }

        Ok(accepted)
    }
}
