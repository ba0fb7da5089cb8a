//! Bounded worker pool for per-review classification.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::classifier::Classifier;
use crate::sentiment::PerReviewResult;

/// Successful results in input order, plus how many reviews were dropped.
#[derive(Debug, Default)]
pub struct ClassifiedBatch {
    pub results: Vec<PerReviewResult>,
    pub failed: usize,
}

/// Classifies every review with at most `concurrency` detector calls in
/// flight. A failure only drops its own review.
pub async fn classify_all(classifier: &Classifier, reviews: Vec<String>, concurrency: usize) -> ClassifiedBatch {
    let total = reviews.len();
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, review) in reviews.into_iter().enumerate() {
        let classifier = classifier.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            (index, classifier.classify(&review).await)
        });
    }

    let mut slots: Vec<Option<PerReviewResult>> = (0..total).map(|_| None).collect();
    let mut failed = 0;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(result))) => slots[index] = Some(result),
            Ok((index, Err(e))) => {
                failed += 1;
                tracing::warn!(review_index = index, "⚠️ Review excluded from aggregation: {}", e);
            }
            Err(e) => {
                failed += 1;
                tracing::error!("❌ Classification task panicked or was cancelled: {}", e);
            }
        }
    }

    ClassifiedBatch {
        results: slots.into_iter().flatten().collect(),
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{CallPolicy, DetectedSentiment, SentimentDetector};
    use crate::sentiment::{SentimentLabel, SentimentScores};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Echoes the review text as its only phrase. Earlier reviews answer more
    /// slowly, so completion order is the reverse of input order. Texts
    /// starting with "fail" error out.
    struct EchoDetector {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl SentimentDetector for EchoDetector {
        async fn detect_sentiment(&self, text: &str) -> anyhow::Result<DetectedSentiment> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay: u64 = text.trim_start_matches(|c: char| !c.is_ascii_digit()).parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if text.starts_with("fail") {
                anyhow::bail!("detector rejected input");
            }
            Ok(DetectedSentiment {
                label: SentimentLabel::Neutral,
                scores: SentimentScores::new(0.1, 0.1, 0.7, 0.1),
            })
        }

        async fn detect_key_phrases(&self, text: &str) -> anyhow::Result<Vec<String>> {
            Ok(vec![text.to_string()])
        }
    }

    fn classifier(detector: Arc<EchoDetector>) -> Classifier {
        Classifier::new(detector).with_policy(CallPolicy {
            timeout: Duration::from_secs(5),
            max_retries: 0,
            retry_base: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn test_results_come_back_in_input_order() {
        let detector = Arc::new(EchoDetector {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let reviews = vec!["r60".to_string(), "r40".to_string(), "r20".to_string(), "r0".to_string()];

        let batch = classify_all(&classifier(detector), reviews, 4).await;

        let phrases: Vec<_> = batch.results.iter().map(|r| r.phrases[0].as_str()).collect();
        assert_eq!(phrases, vec!["r60", "r40", "r20", "r0"]);
        assert_eq!(batch.failed, 0);
    }

    #[tokio::test]
    async fn test_failures_drop_only_their_review() {
        let detector = Arc::new(EchoDetector {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let reviews = vec!["ok1".to_string(), "fail2".to_string(), "ok3".to_string()];

        let batch = classify_all(&classifier(detector), reviews, 2).await;

        let phrases: Vec<_> = batch.results.iter().map(|r| r.phrases[0].as_str()).collect();
        assert_eq!(phrases, vec!["ok1", "ok3"]);
        assert_eq!(batch.failed, 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let detector = Arc::new(EchoDetector {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let reviews: Vec<String> = (0..12).map(|_| "r15".to_string()).collect();

        let batch = classify_all(&classifier(detector.clone()), reviews, 3).await;

        assert_eq!(batch.results.len(), 12);
        assert!(detector.max_in_flight.load(Ordering::SeqCst) <= 3);
    }
}
