//! Multi-pass extraction followed by one reconciling pass

use super::extractor::ImageExtractor;
use super::record::ExtractionRecord;
use futures::future::join_all;

/// Independent passes per run. Fixed; no early exit when passes agree.
pub const FIRST_PASS_COUNT: usize = 3;

pub struct Consolidator {
    extractor: ImageExtractor,
}

impl Consolidator {
    pub fn new(extractor: ImageExtractor) -> Self {
        Self { extractor }
    }

    /// Run `FIRST_PASS_COUNT` passes concurrently, then reconcile them with
    /// one more call whose result is authoritative
    pub async fn extract_and_consolidate(
        &self,
        session_id: &str,
        image_urls: &[String],
    ) -> ExtractionRecord {
        let candidates: Vec<ExtractionRecord> = join_all(
            (0..FIRST_PASS_COUNT).map(|_| self.extractor.extract(session_id, image_urls, None)),
        )
        .await;

        tracing::debug!("First-pass candidates: {:?}", candidates);

        let record = self
            .extractor
            .extract(session_id, image_urls, Some(&candidates))
            .await;

        tracing::info!(
            "Consolidated extraction: manufacturer='{}' colour='{}'",
            record.manufacturer,
            record.colour
        );
        record
    }
}
