//! Local detector backends.
//!
//! [`LexiconDetector`] is a lightweight keyword-based analyzer that needs no
//! external service; it classifies text from positive/negative word lists and
//! pulls out phrases anchored on those words. [`SidecarDetector`] forwards
//! both calls to a Python ML sidecar over HTTP.

use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::classifier::{DetectedSentiment, SentimentDetector};
use crate::sentiment::{SentimentLabel, SentimentScores};

// Common positive words for sentiment detection
static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "good", "great", "excellent", "amazing", "wonderful", "fantastic", "superb",
        "outstanding", "brilliant", "love", "loved", "loving", "best", "better",
        "positive", "happy", "joy", "joyful", "beautiful", "perfect", "awesome",
        "incredible", "magnificent", "delightful", "pleasant", "satisfying", "satisfied",
        "recommend", "recommended", "impressive", "exceptional", "remarkable", "sturdy",
        "comfortable", "fast", "durable", "efficient", "effective", "helpful",
        "reliable", "quality", "valuable", "solid", "smooth", "bright", "crisp",
    ].into_iter().collect()
});

// Common negative words for sentiment detection
static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "bad", "terrible", "awful", "horrible", "poor", "worst", "worse", "hate",
        "hated", "hating", "dislike", "disappointing", "disappointed", "disappoints",
        "failure", "failed", "fail", "failing", "negative", "sad", "unhappy",
        "angry", "annoyed", "frustrated", "frustrating", "problem", "problems",
        "issue", "issues", "broken", "crash", "crashed", "defective", "flimsy",
        "wrong", "incorrect", "useless", "waste", "scam", "fake", "unreliable",
        "unstable", "slow", "difficult", "complicated", "confusing", "expensive",
        "overpriced", "worthless", "garbage", "trash", "cheap", "mediocre", "subpar",
    ].into_iter().collect()
});

// Words that never start or end a key phrase
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "the", "and", "but", "for", "this", "that", "with", "was", "are", "its",
        "very", "really", "too", "not", "have", "has", "had", "you", "they", "all",
        "just", "than", "then", "from", "ever", "after", "about", "would", "could",
    ].into_iter().collect()
});

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z'-]*").unwrap());

/// Keyword-lexicon detector.
#[derive(Debug, Clone, Default)]
pub struct LexiconDetector;

impl LexiconDetector {
    pub fn new() -> Self {
        Self
    }

    fn words(text: &str) -> Vec<String> {
        WORD_RE
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|w| w.len() > 2)
            .collect()
    }

    fn score(text: &str) -> DetectedSentiment {
        let words = Self::words(text);
        let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(w.as_str())).count();
        let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(w.as_str())).count();

        let total_sentiment_words = positive + negative;
        if total_sentiment_words == 0 {
            return DetectedSentiment {
                label: SentimentLabel::Neutral,
                scores: SentimentScores::new(0.05, 0.05, 0.85, 0.05),
            };
        }

        let positive_ratio = positive as f64 / total_sentiment_words as f64;
        let label = if positive_ratio > 0.6 {
            SentimentLabel::Positive
        } else if positive_ratio < 0.4 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Mixed
        };

        // Raw evidence per label, normalised so the four scores sum to 1.
        let mixed = if positive > 0 && negative > 0 {
            positive.min(negative) as f64
        } else {
            0.0
        };
        let raw = SentimentScores::new(positive as f64, negative as f64, 0.5, mixed);
        let sum = raw.positive + raw.negative + raw.neutral + raw.mixed;

        DetectedSentiment {
            label,
            scores: raw.map(|_, v| v / sum),
        }
    }

    /// Two-word phrases that start or end on a lexicon word, e.g. "great battery"
    /// or "battery failed". Original casing is kept.
    fn phrases(text: &str) -> Vec<String> {
        let tokens: Vec<&str> = WORD_RE.find_iter(text).map(|m| m.as_str()).collect();
        let is_sentiment = |w: &str| {
            let w = w.to_lowercase();
            POSITIVE_WORDS.contains(w.as_str()) || NEGATIVE_WORDS.contains(w.as_str())
        };
        let is_content = |w: &str| w.len() > 2 && !STOP_WORDS.contains(w.to_lowercase().as_str());

        tokens
            .windows(2)
            .filter(|pair| {
                is_content(pair[0])
                    && is_content(pair[1])
                    && (is_sentiment(pair[0]) ^ is_sentiment(pair[1]))
            })
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .collect()
    }
}

#[async_trait]
impl SentimentDetector for LexiconDetector {
    async fn detect_sentiment(&self, text: &str) -> anyhow::Result<DetectedSentiment> {
        let detected = Self::score(text);
        tracing::trace!(label = %detected.label, "🧠 Lexicon sentiment");
        Ok(detected)
    }

    async fn detect_key_phrases(&self, text: &str) -> anyhow::Result<Vec<String>> {
        Ok(Self::phrases(text))
    }
}

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SidecarScores {
    positive: Option<f64>,
    negative: Option<f64>,
    neutral: Option<f64>,
    mixed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    sentiment: String,
    scores: SidecarScores,
}

#[derive(Debug, Deserialize)]
struct KeyPhrasesResponse {
    key_phrases: Vec<String>,
}

/// Calls the Python ML sidecar (`/ml/sentiment`, `/ml/key_phrases`).
#[derive(Debug, Clone)]
pub struct SidecarDetector {
    client: reqwest::Client,
    base_url: String,
}

impl SidecarDetector {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build sidecar HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, path: &str, text: &str) -> anyhow::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(&TextRequest { text })
            .send()
            .await
            .with_context(|| format!("Sidecar connection failed: {}. Is the ML sidecar running?", url))?;

        let response = response
            .error_for_status()
            .with_context(|| format!("Sidecar request failed: {}", url))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Sidecar returned an unreadable body: {}", url))
    }
}

#[async_trait]
impl SentimentDetector for SidecarDetector {
    async fn detect_sentiment(&self, text: &str) -> anyhow::Result<DetectedSentiment> {
        let data: SentimentResponse = self.post("/ml/sentiment", text).await?;
        let label = data
            .sentiment
            .parse::<SentimentLabel>()
            .map_err(anyhow::Error::msg)?;
        let s = data.scores;
        Ok(DetectedSentiment {
            label,
            scores: SentimentScores::new(
                s.positive.unwrap_or(f64::NAN),
                s.negative.unwrap_or(f64::NAN),
                s.neutral.unwrap_or(f64::NAN),
                s.mixed.unwrap_or(f64::NAN),
            ),
        })
    }

    async fn detect_key_phrases(&self, text: &str) -> anyhow::Result<Vec<String>> {
        let data: KeyPhrasesResponse = self.post("/ml/key_phrases", text).await?;
        Ok(data.key_phrases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_positive_sentiment() {
        let text = "This product is amazing and wonderful. I love it so much. Best purchase ever!";
        let result = LexiconDetector::new().detect_sentiment(text).await.unwrap();
        assert_eq!(result.label, SentimentLabel::Positive);
        assert_eq!(result.scores.max_confidence(), Some(result.scores.positive));
    }

    #[tokio::test]
    async fn test_negative_sentiment() {
        let text = "This is terrible and horrible. I hate it. Worst experience ever, total failure.";
        let result = LexiconDetector::new().detect_sentiment(text).await.unwrap();
        assert_eq!(result.label, SentimentLabel::Negative);
    }

    #[tokio::test]
    async fn test_neutral_sentiment() {
        let text = "The item arrived on time. It works as described in the listing.";
        let result = LexiconDetector::new().detect_sentiment(text).await.unwrap();
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[tokio::test]
    async fn test_mixed_sentiment_scores_sum_to_one() {
        let text = "Great screen but the battery is terrible.";
        let result = LexiconDetector::new().detect_sentiment(text).await.unwrap();
        assert_eq!(result.label, SentimentLabel::Mixed);

        let sum: f64 = result.scores.iter().map(|(_, s)| *s).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_key_phrases_anchor_on_lexicon_words() {
        let text = "Great screen, but the battery failed after a week.";
        let phrases = LexiconDetector::new().detect_key_phrases(text).await.unwrap();
        assert_eq!(phrases, vec!["Great screen", "battery failed"]);
    }

    #[test]
    fn test_sidecar_base_url_is_normalized() {
        let detector = SidecarDetector::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(detector.base_url, "http://localhost:8000");
    }
}
