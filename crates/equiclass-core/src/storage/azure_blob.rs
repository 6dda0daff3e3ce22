//! Azure Blob Storage backend authorised with service SAS tokens

use super::BlobStore;
use crate::config::StorageConfig;
use crate::error::{EquiclassError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use ring::hmac;
use std::time::Duration;

const SAS_VERSION: &str = "2020-12-06";

/// Uploads are signed with a short-lived write SAS
const WRITE_SAS_TTL: Duration = Duration::from_secs(5 * 60);

/// Clock skew allowance applied to `st`
const SAS_START_SKEW: Duration = Duration::from_secs(5 * 60);

pub struct AzureBlobStore {
    http_client: reqwest::Client,
    endpoint: String,
    account: String,
    key: hmac::Key,
    container: String,
}

impl AzureBlobStore {
    pub fn new(
        endpoint: impl Into<String>,
        account: impl Into<String>,
        account_key: &str,
        container: impl Into<String>,
    ) -> Result<Self> {
        let key_bytes = STANDARD
            .decode(account_key.trim())
            .map_err(|e| EquiclassError::Config(format!("Invalid storage account key: {}", e)))?;

        Ok(Self {
            http_client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            account: account.into(),
            key: hmac::Key::new(hmac::HMAC_SHA256, &key_bytes),
            container: container.into(),
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let account = config
            .account
            .as_deref()
            .ok_or_else(|| EquiclassError::Config("storage.account is required".into()))?;
        let key = config
            .account_key
            .as_deref()
            .ok_or_else(|| EquiclassError::Config("storage.account_key is required".into()))?;
        let endpoint = config
            .blob_endpoint()
            .ok_or_else(|| EquiclassError::Config("storage endpoint is required".into()))?;

        Self::new(endpoint, account, key, config.container.clone())
    }

    fn blob_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}/{}", self.endpoint, self.container, encoded.join("/"))
    }

    fn allowed_protocols(&self) -> &'static str {
        if self.endpoint.starts_with("https://") {
            "https"
        } else {
            "https,http"
        }
    }

    /// Service SAS query string for a single blob
    pub(crate) fn sas_token(
        &self,
        path: &str,
        permissions: &str,
        start: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> String {
        let start = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let expiry = expiry.to_rfc3339_opts(SecondsFormat::Secs, true);
        let resource = format!("/blob/{}/{}/{}", self.account, self.container, path);
        let protocols = self.allowed_protocols();

        // permissions, start, expiry, resource, identifier, ip, protocol,
        // version, resource type, snapshot time, encryption scope, then the
        // five response header overrides
        let string_to_sign = [
            permissions,
            &start,
            &expiry,
            &resource,
            "",
            "",
            protocols,
            SAS_VERSION,
            "b",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ]
        .join("\n");

        let signature = STANDARD.encode(hmac::sign(&self.key, string_to_sign.as_bytes()).as_ref());

        format!(
            "sv={}&sr=b&sp={}&st={}&se={}&spr={}&sig={}",
            SAS_VERSION,
            permissions,
            urlencoding::encode(&start),
            urlencoding::encode(&expiry),
            urlencoding::encode(protocols),
            urlencoding::encode(&signature)
        )
    }

    fn signed_url(&self, path: &str, permissions: &str, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let skew = chrono::Duration::from_std(SAS_START_SKEW)
            .map_err(|e| EquiclassError::Storage(e.to_string()))?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| EquiclassError::Storage(format!("Invalid SAS lifetime: {}", e)))?;

        let expiry = now
            .checked_add_signed(ttl)
            .ok_or_else(|| EquiclassError::Storage("SAS lifetime out of range".into()))?;

        let token = self.sas_token(path, permissions, now - skew, expiry);
        Ok(format!("{}?{}", self.blob_url(path), token))
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn upload(&self, bytes: &[u8], path: &str, content_type: &str) -> Result<()> {
        let url = self.signed_url(path, "cw", WRITE_SAS_TTL)?;

        tracing::info!("Uploading blob {} ({} bytes)", path, bytes.len());
        let response = self
            .http_client
            .put(&url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-version", SAS_VERSION)
            .header("Content-Type", content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EquiclassError::ExternalError(format!(
                "Blob upload failed (HTTP {}): {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn temporary_read_url(&self, path: &str, ttl: Duration) -> Result<String> {
        self.signed_url(path, "r", ttl)
    }
}
