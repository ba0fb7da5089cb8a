//! Aggregation engine: folds per-review results into an [`AnalysisSummary`].
//!
//! Counts, percentages and confidence averages are order independent. The
//! phrase list and the aspect table keep first-seen order, which is what the
//! rankings in [`crate::ranking`] break ties on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ranking::{self, AspectSentiment, TOP_K};
use crate::sentiment::{PerReviewResult, SentimentCounts, SentimentLabel, SentimentMap};

/// Reviews shorter than this many characters count as short.
pub const SHORT_REVIEW_THRESHOLD: usize = 50;
/// Reviews longer than this many characters count as long.
pub const LONG_REVIEW_THRESHOLD: usize = 200;

/// Final output of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_reviews: u64,
    pub sentiment_counts: SentimentCounts,
    pub sentiment_percentages: SentimentMap<f64>,
    pub average_sentiment_confidence: SentimentMap<f64>,
    pub short_reviews_count: u64,
    pub long_reviews_count: u64,
    pub top_key_phrases: Vec<String>,
    pub top_aspect_based_sentiments: Vec<AspectSentiment>,
    /// Reviews dropped because the detector failed on them.
    #[serde(default)]
    pub skipped_reviews: u64,
}

impl AnalysisSummary {
    pub fn with_skipped(mut self, skipped: u64) -> Self {
        self.skipped_reviews = skipped;
        self
    }
}

/// Phrase -> sentiment histogram, in order of first appearance.
#[derive(Debug, Default)]
struct AspectTable {
    entries: Vec<AspectSentiment>,
    index: HashMap<String, usize>,
}

impl AspectTable {
    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Credits `label` to `phrase`. A new phrase is only admitted while the
    /// table is below `limit`.
    fn credit(&mut self, phrase: &str, label: SentimentLabel, limit: Option<usize>) {
        if let Some(&slot) = self.index.get(phrase) {
            self.entries[slot].sentiments.increment(label);
            return;
        }
        if limit.is_some_and(|max| self.len() >= max) {
            return;
        }
        let mut sentiments = SentimentCounts::default();
        sentiments.increment(label);
        self.index.insert(phrase.to_string(), self.entries.len());
        self.entries.push(AspectSentiment {
            phrase: phrase.to_string(),
            sentiments,
        });
    }
}

/// Incremental accumulator for one product's reviews.
#[derive(Debug, Default)]
pub struct Aggregator {
    histogram: SentimentCounts,
    confidence_sums: SentimentMap<f64>,
    short_reviews: u64,
    long_reviews: u64,
    phrases: Vec<String>,
    aspects: AspectTable,
    aspect_limit: Option<usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of distinct phrases tracked in the aspect table.
    /// Phrases beyond the cap still land in the flat phrase list.
    pub fn with_aspect_limit(limit: Option<usize>) -> Self {
        Self {
            aspect_limit: limit,
            ..Self::default()
        }
    }

    pub fn push(&mut self, result: &PerReviewResult) {
        let label = result.sentiment;
        self.histogram.increment(label);

        match result.confidence_scores.max_confidence() {
            Some(confidence) => self.confidence_sums[label] += confidence,
            None => tracing::debug!("Skipping confidence contribution: unusable detector scores"),
        }

        if result.review_length < SHORT_REVIEW_THRESHOLD {
            self.short_reviews += 1;
        } else if result.review_length > LONG_REVIEW_THRESHOLD {
            self.long_reviews += 1;
        }

        for phrase in &result.phrases {
            self.phrases.push(phrase.clone());
            self.aspects.credit(phrase, label, self.aspect_limit);
        }
    }

    pub fn total(&self) -> u64 {
        self.histogram.total()
    }

    pub fn finish(self) -> AnalysisSummary {
        let total = self.total();
        let histogram = self.histogram;

        let sentiment_percentages = histogram.map(|_, count| {
            if total == 0 {
                0.0
            } else {
                (*count as f64 / total as f64) * 100.0
            }
        });

        let confidence_sums = self.confidence_sums;
        let average_sentiment_confidence = histogram.map(|label, count| {
            if *count > 0 {
                confidence_sums[label] / *count as f64
            } else {
                0.0
            }
        });

        AnalysisSummary {
            total_reviews: total,
            sentiment_counts: histogram,
            sentiment_percentages,
            average_sentiment_confidence,
            short_reviews_count: self.short_reviews,
            long_reviews_count: self.long_reviews,
            top_key_phrases: ranking::top_key_phrases(&self.phrases, TOP_K),
            top_aspect_based_sentiments: ranking::top_aspects(&self.aspects.entries, TOP_K),
            skipped_reviews: 0,
        }
    }
}

/// Aggregates a whole batch in input order.
pub fn aggregate(results: &[PerReviewResult]) -> AnalysisSummary {
    aggregate_with_limit(results, None)
}

pub fn aggregate_with_limit(results: &[PerReviewResult], aspect_limit: Option<usize>) -> AnalysisSummary {
    let mut aggregator = Aggregator::with_aspect_limit(aspect_limit);
    for result in results {
        aggregator.push(result);
    }
    aggregator.finish()
}
