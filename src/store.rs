//! Review and result store contracts plus an in-process implementation.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::RwLock;
use uuid::Uuid;

use crate::aggregate::AnalysisSummary;

/// Read side: raw review texts per product, in store order.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn fetch_reviews(&self, product_id: &str) -> anyhow::Result<Vec<String>>;
}

/// A persisted analysis as returned by [`ResultStore::load_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub product_id: String,
    pub run_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub review_analysis: AnalysisSummary,
}

/// Write side: one summary per product, last write wins.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn store_summary(&self, product_id: &str, run_id: Uuid, summary: &AnalysisSummary) -> anyhow::Result<()>;

    async fn load_analysis(&self, product_id: &str) -> anyhow::Result<Option<StoredAnalysis>>;
}

/// Both stores backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    reviews: RwLock<HashMap<String, Vec<String>>>,
    analyses: RwLock<HashMap<String, StoredAnalysis>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends reviews for a product, keeping insertion order.
    pub fn insert_reviews<I, S>(&self, product_id: &str, reviews: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut guard = self
            .reviews
            .write()
            .map_err(|_| anyhow::anyhow!("review store lock poisoned"))?;
        guard
            .entry(product_id.to_string())
            .or_default()
            .extend(reviews.into_iter().map(Into::into));
        Ok(())
    }

    /// Seeds reviews from a JSON object mapping product ids to review lists.
    /// Returns the number of reviews loaded.
    pub fn seed_from_json(&self, json: &str) -> anyhow::Result<usize> {
        let seed: BTreeMap<String, Vec<String>> =
            serde_json::from_str(json).context("Seed must map product ids to review lists")?;
        let mut loaded = 0;
        for (product_id, reviews) in seed {
            loaded += reviews.len();
            self.insert_reviews(&product_id, reviews)?;
        }
        Ok(loaded)
    }

    pub fn seed_from_file(&self, path: impl AsRef<Path>) -> anyhow::Result<usize> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        self.seed_from_json(&json)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn fetch_reviews(&self, product_id: &str) -> anyhow::Result<Vec<String>> {
        let guard = self
            .reviews
            .read()
            .map_err(|_| anyhow::anyhow!("review store lock poisoned"))?;
        Ok(guard.get(product_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn store_summary(&self, product_id: &str, run_id: Uuid, summary: &AnalysisSummary) -> anyhow::Result<()> {
        let mut guard = self
            .analyses
            .write()
            .map_err(|_| anyhow::anyhow!("result store lock poisoned"))?;
        guard.insert(
            product_id.to_string(),
            StoredAnalysis {
                product_id: product_id.to_string(),
                run_id,
                analyzed_at: Utc::now(),
                review_analysis: summary.clone(),
            },
        );
        Ok(())
    }

    async fn load_analysis(&self, product_id: &str) -> anyhow::Result<Option<StoredAnalysis>> {
        let guard = self
            .analyses
            .read()
            .map_err(|_| anyhow::anyhow!("result store lock poisoned"))?;
        Ok(guard.get(product_id).cloned())
    }
}
