//! Product review sentiment aggregation.
//!
//! Reviews for one product are fetched from a [`store::ReviewStore`], each one
//! is sent through a [`classifier::Classifier`] backed by an external NLP
//! detector, and the per-review results are folded by [`aggregate::Aggregator`]
//! into an [`aggregate::AnalysisSummary`] that is persisted for later reads.

pub mod aggregate;
pub mod api;
pub mod classifier;
pub mod comprehend;
pub mod config;
pub mod db;
pub mod error;
pub mod ml;
pub mod pipeline;
pub mod ranking;
pub mod sentiment;
pub mod store;
pub mod worker;

pub use aggregate::{aggregate, AnalysisSummary};
pub use error::{AnalysisError, Result};
pub use sentiment::{PerReviewResult, SentimentLabel};
