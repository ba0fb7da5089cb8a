//! Orchestrator: fetch reviews, classify them, aggregate, persist.

use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::aggregate::{aggregate_with_limit, AnalysisSummary};
use crate::classifier::{CallPolicy, Classifier, SentimentDetector};
use crate::comprehend::ComprehendDetector;
use crate::config::{Config, DetectorBackend};
use crate::db::PgStore;
use crate::error::{AnalysisError, Result};
use crate::ml::{LexiconDetector, SidecarDetector};
use crate::store::{MemoryStore, ResultStore, ReviewStore};
use crate::worker;

pub struct ReviewAnalyzer {
    reviews: Arc<dyn ReviewStore>,
    results: Arc<dyn ResultStore>,
    classifier: Classifier,
    concurrency: usize,
    aspect_limit: Option<usize>,
}

impl ReviewAnalyzer {
    pub fn new(reviews: Arc<dyn ReviewStore>, results: Arc<dyn ResultStore>, classifier: Classifier) -> Self {
        Self {
            reviews,
            results,
            classifier,
            concurrency: 4,
            aspect_limit: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_aspect_limit(mut self, limit: Option<usize>) -> Self {
        self.aspect_limit = limit;
        self
    }

    pub fn result_store(&self) -> Arc<dyn ResultStore> {
        self.results.clone()
    }

    /// Runs one analysis for `product_id` and returns the summary.
    ///
    /// A failed write to the result store is logged but does not fail the call.
    pub async fn analyze(&self, product_id: &str) -> Result<AnalysisSummary> {
        if product_id.is_empty() {
            return Err(AnalysisError::InvalidInput);
        }

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("analysis", %run_id, product_id);
        self.run(product_id, run_id).instrument(span).await
    }

    async fn run(&self, product_id: &str, run_id: Uuid) -> Result<AnalysisSummary> {
        let reviews = match self.reviews.fetch_reviews(product_id).await {
            Ok(reviews) => reviews,
            Err(e) => {
                warn!("⚠️ Review store lookup failed, treating as empty: {:#}", e);
                Vec::new()
            }
        };

        if reviews.is_empty() {
            info!("No reviews found");
            return Err(AnalysisError::not_found(product_id));
        }

        info!("🚀 Analyzing {} reviews", reviews.len());
        let batch = worker::classify_all(&self.classifier, reviews, self.concurrency).await;
        if batch.failed > 0 {
            warn!(skipped = batch.failed, "Some reviews were excluded after detector failures");
        }

        let summary = aggregate_with_limit(&batch.results, self.aspect_limit).with_skipped(batch.failed as u64);

        if let Err(e) = self.results.store_summary(product_id, run_id, &summary).await {
            let err = AnalysisError::persistence(format!("{:#}", e));
            warn!("❌ {}", err);
        } else {
            info!("💾 Analysis stored");
        }

        info!(
            total = summary.total_reviews,
            skipped = summary.skipped_reviews,
            "✅ Analysis complete"
        );
        Ok(summary)
    }
}

/// Builds the detector selected by `config.detector_backend`.
pub async fn build_detector(config: &Config) -> anyhow::Result<Arc<dyn SentimentDetector>> {
    let detector: Arc<dyn SentimentDetector> = match config.detector_backend {
        DetectorBackend::Comprehend => Arc::new(ComprehendDetector::from_env().await),
        DetectorBackend::Sidecar => Arc::new(SidecarDetector::new(&config.sidecar_url, config.detector_timeout)?),
        DetectorBackend::Lexicon => Arc::new(LexiconDetector::new()),
    };
    info!("🧠 Using {:?} detector", config.detector_backend);
    Ok(detector)
}

/// Wires stores, detector and pool settings from configuration.
pub async fn build_analyzer(config: &Config) -> anyhow::Result<ReviewAnalyzer> {
    let detector = build_detector(config).await?;
    let classifier = Classifier::new(detector).with_policy(CallPolicy::from(config));

    let (reviews, results): (Arc<dyn ReviewStore>, Arc<dyn ResultStore>) = match &config.database_url {
        Some(url) => {
            let store = Arc::new(PgStore::connect(url).await?);
            (store.clone() as Arc<dyn ReviewStore>, store as Arc<dyn ResultStore>)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store");
            let store = Arc::new(MemoryStore::new());
            if let Some(path) = &config.reviews_seed_file {
                let loaded = store.seed_from_file(path)?;
                info!("🌱 Seeded {} reviews from {}", loaded, path);
            }
            (store.clone() as Arc<dyn ReviewStore>, store as Arc<dyn ResultStore>)
        }
    };

    Ok(ReviewAnalyzer::new(reviews, results, classifier)
        .with_concurrency(config.classify_concurrency)
        .with_aspect_limit(config.aspect_table_limit))
}
