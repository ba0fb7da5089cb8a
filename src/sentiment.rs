//! Sentiment labels and the fixed four-slot maps keyed by them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// The closed set of sentiment categories a detector may assign to a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 4] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
            SentimentLabel::Mixed => "MIXED",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Ok(SentimentLabel::Positive),
            "NEGATIVE" => Ok(SentimentLabel::Negative),
            "NEUTRAL" => Ok(SentimentLabel::Neutral),
            "MIXED" => Ok(SentimentLabel::Mixed),
            other => Err(format!("Unknown sentiment label: {}", other)),
        }
    }
}

/// One value per sentiment label. Always carries all four keys, so a
/// histogram or score vector can never be missing a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SentimentMap<T> {
    pub positive: T,
    pub negative: T,
    pub neutral: T,
    pub mixed: T,
}

/// Review count per label.
pub type SentimentCounts = SentimentMap<u64>;

/// Per-label confidence scores as returned by a detector.
pub type SentimentScores = SentimentMap<f64>;

impl<T> SentimentMap<T> {
    pub fn new(positive: T, negative: T, neutral: T, mixed: T) -> Self {
        Self {
            positive,
            negative,
            neutral,
            mixed,
        }
    }

    /// Iterates `(label, value)` in the fixed POSITIVE, NEGATIVE, NEUTRAL, MIXED order.
    pub fn iter(&self) -> impl Iterator<Item = (SentimentLabel, &T)> {
        SentimentLabel::ALL.into_iter().map(move |label| (label, &self[label]))
    }

    pub fn map<U>(&self, mut f: impl FnMut(SentimentLabel, &T) -> U) -> SentimentMap<U> {
        SentimentMap {
            positive: f(SentimentLabel::Positive, &self.positive),
            negative: f(SentimentLabel::Negative, &self.negative),
            neutral: f(SentimentLabel::Neutral, &self.neutral),
            mixed: f(SentimentLabel::Mixed, &self.mixed),
        }
    }
}

impl<T> Index<SentimentLabel> for SentimentMap<T> {
    type Output = T;

    fn index(&self, label: SentimentLabel) -> &T {
        match label {
            SentimentLabel::Positive => &self.positive,
            SentimentLabel::Negative => &self.negative,
            SentimentLabel::Neutral => &self.neutral,
            SentimentLabel::Mixed => &self.mixed,
        }
    }
}

impl<T> IndexMut<SentimentLabel> for SentimentMap<T> {
    fn index_mut(&mut self, label: SentimentLabel) -> &mut T {
        match label {
            SentimentLabel::Positive => &mut self.positive,
            SentimentLabel::Negative => &mut self.negative,
            SentimentLabel::Neutral => &mut self.neutral,
            SentimentLabel::Mixed => &mut self.mixed,
        }
    }
}

impl SentimentCounts {
    pub fn increment(&mut self, label: SentimentLabel) {
        self[label] += 1;
    }

    pub fn total(&self) -> u64 {
        self.positive + self.negative + self.neutral + self.mixed
    }
}

impl SentimentScores {
    /// Highest of the four scores, or `None` when any score is not a usable
    /// number (a missing score from the detector arrives as NaN).
    pub fn max_confidence(&self) -> Option<f64> {
        let mut max = f64::NEG_INFINITY;
        for (_, score) in self.iter() {
            if !score.is_finite() {
                return None;
            }
            max = max.max(*score);
        }
        Some(max)
    }
}

/// The analysis of a single review, as produced by the classifier adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerReviewResult {
    pub sentiment: SentimentLabel,
    pub confidence_scores: SentimentScores,
    /// Lower-cased key phrases in detector order; duplicates are kept.
    pub phrases: Vec<String>,
    /// Length of the source review in Unicode scalar values (`chars().count()`),
    /// not UTF-16 code units or bytes. Drives the short/long review split.
    pub review_length: usize,
}
