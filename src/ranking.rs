//! Top-K selection over the aggregated phrase list and aspect table.

use serde::{Deserialize, Serialize};

use crate::sentiment::{SentimentCounts, SentimentLabel};

/// Number of entries kept in each ranking.
pub const TOP_K: usize = 5;

/// A key phrase together with the sentiments of the reviews it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSentiment {
    pub phrase: String,
    pub sentiments: SentimentCounts,
}

/// First `k` phrases in first-seen order, duplicates included.
///
/// This is a prefix take, not a frequency ranking: the stored list is in
/// review order, so "top" here means "earliest".
pub fn top_key_phrases(phrases: &[String], k: usize) -> Vec<String> {
    phrases.iter().take(k).cloned().collect()
}

/// At most `k` aspects ordered by descending POSITIVE count.
///
/// `aspects` must be in first-appearance order; the sort is stable so equal
/// POSITIVE counts keep that order.
pub fn top_aspects(aspects: &[AspectSentiment], k: usize) -> Vec<AspectSentiment> {
    let mut ranked: Vec<&AspectSentiment> = aspects.iter().collect();
    ranked.sort_by(|a, b| {
        b.sentiments[SentimentLabel::Positive].cmp(&a.sentiments[SentimentLabel::Positive])
    });
    ranked.into_iter().take(k).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::SentimentMap;

    fn aspect(phrase: &str, positive: u64, negative: u64) -> AspectSentiment {
        AspectSentiment {
            phrase: phrase.to_string(),
            sentiments: SentimentMap::new(positive, negative, 0, 0),
        }
    }

    #[test]
    fn test_top_key_phrases_is_prefix_with_duplicates() {
        let phrases: Vec<String> = ["great", "great", "bad", "ok", "great", "cheap", "fast"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            top_key_phrases(&phrases, TOP_K),
            vec!["great", "great", "bad", "ok", "great"]
        );
    }

    #[test]
    fn test_top_key_phrases_short_list() {
        let phrases = vec!["battery".to_string(), "screen".to_string()];
        assert_eq!(top_key_phrases(&phrases, TOP_K), phrases);
        assert!(top_key_phrases(&[], TOP_K).is_empty());
    }

    #[test]
    fn test_top_aspects_sorted_by_positive_count() {
        let aspects = vec![
            aspect("price", 1, 4),
            aspect("battery", 3, 0),
            aspect("screen", 2, 1),
        ];

        let ranked: Vec<_> = top_aspects(&aspects, TOP_K)
            .into_iter()
            .map(|a| a.phrase)
            .collect();
        assert_eq!(ranked, vec!["battery", "screen", "price"]);
    }

    #[test]
    fn test_top_aspects_ties_keep_first_appearance_order() {
        let aspects = vec![
            aspect("a", 0, 2),
            aspect("b", 1, 0),
            aspect("c", 0, 0),
            aspect("d", 1, 5),
            aspect("e", 0, 1),
            aspect("f", 0, 0),
        ];

        let ranked: Vec<_> = top_aspects(&aspects, TOP_K)
            .into_iter()
            .map(|a| a.phrase)
            .collect();
        // Zero-positive aspects are ranked, not dropped; "f" falls off the end.
        assert_eq!(ranked, vec!["b", "d", "a", "c", "e"]);
    }
}
