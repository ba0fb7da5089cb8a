//! AWS Comprehend backend (`DetectSentiment` / `DetectKeyPhrases`).

use anyhow::anyhow;
use async_trait::async_trait;
use aws_sdk_comprehend::error::DisplayErrorContext;
use aws_sdk_comprehend::types::{LanguageCode, SentimentScore, SentimentType};
use aws_sdk_comprehend::Client;

use crate::classifier::{DetectedSentiment, SentimentDetector};
use crate::sentiment::{SentimentLabel, SentimentScores};

pub struct ComprehendDetector {
    client: Client,
    language: LanguageCode,
}

impl ComprehendDetector {
    /// Uses the ambient AWS configuration (env vars, profile, instance role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }

    pub fn new(client: Client) -> Self {
        Self {
            client,
            language: LanguageCode::En,
        }
    }
}

fn label_from(sentiment: &SentimentType) -> anyhow::Result<SentimentLabel> {
    match sentiment {
        SentimentType::Positive => Ok(SentimentLabel::Positive),
        SentimentType::Negative => Ok(SentimentLabel::Negative),
        SentimentType::Neutral => Ok(SentimentLabel::Neutral),
        SentimentType::Mixed => Ok(SentimentLabel::Mixed),
        other => Err(anyhow!("Unsupported Comprehend sentiment: {}", other.as_str())),
    }
}

/// Missing scores become NaN so the aggregator skips their confidence.
fn scores_from(score: Option<&SentimentScore>) -> SentimentScores {
    let value = |v: Option<f32>| v.map(f64::from).unwrap_or(f64::NAN);
    match score {
        Some(s) => SentimentScores::new(
            value(s.positive()),
            value(s.negative()),
            value(s.neutral()),
            value(s.mixed()),
        ),
        None => SentimentScores::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN),
    }
}

#[async_trait]
impl SentimentDetector for ComprehendDetector {
    async fn detect_sentiment(&self, text: &str) -> anyhow::Result<DetectedSentiment> {
        let output = self
            .client
            .detect_sentiment()
            .text(text)
            .language_code(self.language.clone())
            .send()
            .await
            .map_err(|e| anyhow!("DetectSentiment failed: {}", DisplayErrorContext(&e)))?;

        let sentiment = output
            .sentiment()
            .ok_or_else(|| anyhow!("DetectSentiment returned no sentiment"))?;

        Ok(DetectedSentiment {
            label: label_from(sentiment)?,
            scores: scores_from(output.sentiment_score()),
        })
    }

    async fn detect_key_phrases(&self, text: &str) -> anyhow::Result<Vec<String>> {
        let output = self
            .client
            .detect_key_phrases()
            .text(text)
            .language_code(self.language.clone())
            .send()
            .await
            .map_err(|e| anyhow!("DetectKeyPhrases failed: {}", DisplayErrorContext(&e)))?;

        Ok(output
            .key_phrases()
            .iter()
            .filter_map(|phrase| phrase.text().map(str::to_string))
            .collect())
    }
}
