use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use crate::aggregate::AnalysisSummary;
use crate::store::{ResultStore, ReviewStore, StoredAnalysis};

pub async fn init_db(pool: &PgPool) -> Result<()> {
    // Raw reviews, one row per review text
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_reviews (
            id BIGSERIAL PRIMARY KEY,
            product_id VARCHAR NOT NULL,
            review_text TEXT NOT NULL,
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS product_reviews_product_id_idx ON product_reviews (product_id);")
        .execute(pool)
        .await?;

    // Precomputed analysis, one row per product (upserted)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_review_analysis (
            product_id VARCHAR PRIMARY KEY,
            review_analysis JSONB NOT NULL,
            run_id VARCHAR NOT NULL,
            analyzed_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Postgres-backed review and result store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;

        init_db(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn fetch_reviews(&self, product_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT review_text FROM product_reviews WHERE product_id = $1 ORDER BY created_at, id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("review_text")).collect())
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn store_summary(&self, product_id: &str, run_id: Uuid, summary: &AnalysisSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_review_analysis (product_id, review_analysis, run_id, analyzed_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (product_id) DO UPDATE SET
                review_analysis = EXCLUDED.review_analysis,
                run_id = EXCLUDED.run_id,
                analyzed_at = EXCLUDED.analyzed_at
            "#,
        )
        .bind(product_id)
        .bind(Json(summary))
        .bind(run_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_analysis(&self, product_id: &str) -> Result<Option<StoredAnalysis>> {
        let row = sqlx::query(
            "SELECT review_analysis, run_id, analyzed_at FROM product_review_analysis WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let Json(review_analysis): Json<AnalysisSummary> = row.try_get("review_analysis")?;
        let run_id: String = row.try_get("run_id")?;
        let analyzed_at: DateTime<Utc> = row.try_get("analyzed_at")?;

        Ok(Some(StoredAnalysis {
            product_id: product_id.to_string(),
            run_id: Uuid::parse_str(&run_id).context("Stored run_id is not a UUID")?,
            analyzed_at,
            review_analysis,
        }))
    }
}
