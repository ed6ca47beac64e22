use std::time::Duration;

/// Pipeline tunables. Thresholds are configuration defaults rather than
/// hard-coded literals; per-source tuning is deferred until a source
/// actually needs it.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Similarity at or above which two candidates are near-duplicates.
    pub near_dup_threshold: f64,
    /// Minimum classifier confidence for a review to survive validation.
    pub confidence_floor: f32,
    /// Confidence assigned when the classifier is unavailable and a batch
    /// is passed through instead of dropped.
    pub degraded_confidence: f32,
    /// Reviews fetched within this window are served without re-fetching.
    pub freshness_days: i64,
    /// Max pages escalated to the headless renderer per request.
    pub render_page_cap: usize,
    /// Items per classifier call.
    pub classifier_batch_size: usize,

    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub render_settle_wait: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            near_dup_threshold: 0.90,
            confidence_floor: 0.5,
            degraded_confidence: 0.5,
            freshness_days: 7,
            render_page_cap: 2,
            classifier_batch_size: classifier_client::MAX_BATCH_SIZE,
            fetch_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_secs(30),
            render_settle_wait: Duration::from_secs(5),
        }
    }
}
