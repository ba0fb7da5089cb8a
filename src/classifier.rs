//! Adapter between raw review text and the external sentiment/phrase detector.

use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::config::Config;
use crate::error::{AnalysisError, Result};
use crate::sentiment::{PerReviewResult, SentimentLabel, SentimentScores};

/// Sentiment verdict for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedSentiment {
    pub label: SentimentLabel,
    pub scores: SentimentScores,
}

/// An external NLP service. Sentiment and key-phrase detection are separate
/// calls, as they are on most hosted NLP APIs.
#[async_trait]
pub trait SentimentDetector: Send + Sync {
    async fn detect_sentiment(&self, text: &str) -> anyhow::Result<DetectedSentiment>;

    async fn detect_key_phrases(&self, text: &str) -> anyhow::Result<Vec<String>>;
}

/// Timeout and retry budget applied to every detector call.
#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_base: Duration::from_millis(200),
        }
    }
}

impl From<&Config> for CallPolicy {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.detector_timeout,
            max_retries: config.detector_max_retries,
            retry_base: config.detector_retry_base,
        }
    }
}

impl CallPolicy {
    /// Exponential backoff with up to 50% jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let base = u64::try_from(self.retry_base.as_millis()).unwrap_or(u64::MAX);
        let delay = base.saturating_mul(1u64 << attempt.min(16));
        let jitter = rand::thread_rng().gen_range(0..=delay / 2);
        Duration::from_millis(delay.saturating_add(jitter))
    }
}

/// Turns one review text into one [`PerReviewResult`].
#[derive(Clone)]
pub struct Classifier {
    detector: Arc<dyn SentimentDetector>,
    policy: CallPolicy,
}

impl Classifier {
    pub fn new(detector: Arc<dyn SentimentDetector>) -> Self {
        Self {
            detector,
            policy: CallPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Calls the detector exactly once for sentiment and once for key phrases
    /// (plus retries on failure). Phrases come back lower-cased.
    pub async fn classify(&self, review: &str) -> Result<PerReviewResult> {
        let detector: &dyn SentimentDetector = self.detector.as_ref();

        let sentiment = self
            .call("detect_sentiment", move || detector.detect_sentiment(review))
            .await?;
        let phrases = self
            .call("detect_key_phrases", move || detector.detect_key_phrases(review))
            .await?;

        Ok(PerReviewResult {
            sentiment: sentiment.label,
            confidence_scores: sentiment.scores,
            phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
            review_length: review.chars().count(),
        })
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let reason = match timeout(self.policy.timeout, attempt_fn()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => format!("{:#}", e),
                Err(_) => format!("timed out after {:?}", self.policy.timeout),
            };

            if attempt >= self.policy.max_retries {
                return Err(AnalysisError::detector(format!(
                    "{} failed after {} attempt(s): {}",
                    operation,
                    attempt + 1,
                    reason
                )));
            }

            let delay = self.policy.backoff(attempt);
            tracing::debug!(operation, attempt, ?delay, "Detector call failed, retrying: {}", reason);
            sleep(delay).await;
            attempt += 1;
        }
    }
}
