//! One-shot analysis: `analyze_product <product_id>`.
//!
//! Prints the summary as JSON, or `{"result": "<message>"}` on a defined error.

use tracing_subscriber::EnvFilter;

use review_sentiment::config::Config;
use review_sentiment::pipeline;
use review_sentiment::AnalysisError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let product_id = std::env::args().nth(1).unwrap_or_default();
    let analyzer = pipeline::build_analyzer(&config).await?;

    let output = match analyzer.analyze(&product_id).await {
        Ok(summary) => serde_json::to_value(&summary)?,
        Err(e @ (AnalysisError::InvalidInput | AnalysisError::NotFound { .. })) => {
            serde_json::json!({ "result": e.to_string() })
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
