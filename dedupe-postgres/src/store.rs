//! `PgClaimStore` — the single `ClaimStore` implementation, internally
//! branching on `VectorBackend` only where the native vs. JSON shape
//! actually differs: the embedding column's type and the neighbor-search
//! query. Everything else (claim lookup/insert, cluster bookkeeping) is one
//! SQL path shared by both backends.

use async_trait::async_trait;
use dedupe_core::error::{DedupeError, Result};
use dedupe_core::ports::ClaimStore;
use dedupe_core::similarity::cosine_similarity;
use dedupe_core::types::{ClaimRecord, NeighborMatch};
use pgvector::Vector;
use sqlx::PgPool;
use tracing::warn;

use crate::dialect::VectorBackend;
use crate::schema::ensure_schema;

pub struct PgClaimStore {
    pool: PgPool,
    backend: VectorBackend,
}

impl PgClaimStore {
    /// Detect the backend, bootstrap the schema for `dim`-dimensional
    /// embeddings, and return a ready-to-use store. Called once at process
    /// startup (§9: "eagerly constructing them during startup, fail fast on
    /// misconfiguration") — never lazily re-derived per request.
    pub async fn connect(pool: PgPool, dim: usize) -> anyhow::Result<Self> {
        let backend = VectorBackend::detect(&pool).await?;
        ensure_schema(&pool, backend, dim).await?;
        Ok(Self { pool, backend })
    }

    pub fn backend(&self) -> VectorBackend {
        self.backend
    }

    /// Postgres error code `23505` is `unique_violation`. Any other
    /// database error is a genuine `StorageFailure`, not a race to recover
    /// from locally.
    fn map_insert_error(err: sqlx::Error, race_key: &str) -> DedupeError {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some("23505") {
                return DedupeError::RaceLost(race_key.to_string());
            }
        }
        DedupeError::Storage(anyhow::anyhow!(err))
    }

    fn decode_embedding(&self, raw: EmbeddingColumn) -> Result<Vec<f32>> {
        match (self.backend, raw) {
            (VectorBackend::Native, EmbeddingColumn::Vector(v)) => Ok(v.to_vec()),
            (VectorBackend::JsonFallback, EmbeddingColumn::Json(text)) => {
                serde_json::from_str(&text).map_err(|e| {
                    DedupeError::Invariant(format!("corrupt JSON embedding column: {e}"))
                })
            }
            (backend, column) => Err(DedupeError::Invariant(format!(
                "embedding column shape ({column:?}) does not match detected backend ({backend:?})"
            ))),
        }
    }
}

/// The raw value read back from `claim_embedding.embedding`, before it is
/// reduced to a plain `Vec<f32>` by `decode_embedding` — mirrors
/// `app.db.decode_embedding`'s dialect branch in the original service.
#[derive(Debug)]
enum EmbeddingColumn {
    Vector(Vector),
    Json(String),
}

#[async_trait]
impl ClaimStore for PgClaimStore {
    async fn find_claim_by_hash(&self, content_hash: &str) -> Result<Option<ClaimRecord>> {
        let row: Option<(i64, String, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
            "SELECT claim_id, claim_text, content_hash, created_at FROM claim WHERE content_hash = $1",
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;

        Ok(row.map(|(claim_id, claim_text, content_hash, created_at)| ClaimRecord {
            claim_id,
            claim_text,
            content_hash,
            created_at,
        }))
    }

    async fn insert_claim_with_embedding(
        &self,
        claim_text: &str,
        content_hash: &str,
        embedding_model: &str,
        embedding: &[f32],
    ) -> Result<i64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;

        let inserted: std::result::Result<(i64,), sqlx::Error> = sqlx::query_as(
            "INSERT INTO claim (claim_text, content_hash) VALUES ($1, $2) RETURNING claim_id",
        )
        .bind(claim_text)
        .bind(content_hash)
        .fetch_one(&mut *tx)
        .await;

        let claim_id = match inserted {
            Ok((claim_id,)) => claim_id,
            // tx is dropped here without being committed, rolling back.
            Err(e) => return Err(Self::map_insert_error(e, content_hash)),
        };

        match self.backend {
            VectorBackend::Native => {
                let vector = Vector::from(embedding.to_vec());
                sqlx::query(
                    "INSERT INTO claim_embedding (claim_id, embedding_model, embedding) \
                     VALUES ($1, $2, $3)",
                )
                .bind(claim_id)
                .bind(embedding_model)
                .bind(vector)
                .execute(&mut *tx)
                .await
                .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
            }
            VectorBackend::JsonFallback => {
                let json = serde_json::to_string(embedding)
                    .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
                sqlx::query(
                    "INSERT INTO claim_embedding (claim_id, embedding_model, embedding) \
                     VALUES ($1, $2, $3)",
                )
                .bind(claim_id)
                .bind(embedding_model)
                .bind(json)
                .execute(&mut *tx)
                .await
                .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;

        Ok(claim_id)
    }

    async fn fetch_embedding(&self, claim_id: i64) -> Result<Vec<f32>> {
        match self.backend {
            VectorBackend::Native => {
                let row: Option<(Vector,)> =
                    sqlx::query_as("SELECT embedding FROM claim_embedding WHERE claim_id = $1")
                        .bind(claim_id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
                let (vector,) = row.ok_or_else(|| {
                    DedupeError::Invariant(format!("no embedding for claim {claim_id}"))
                })?;
                self.decode_embedding(EmbeddingColumn::Vector(vector))
            }
            VectorBackend::JsonFallback => {
                let row: Option<(String,)> =
                    sqlx::query_as("SELECT embedding FROM claim_embedding WHERE claim_id = $1")
                        .bind(claim_id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
                let (text,) = row.ok_or_else(|| {
                    DedupeError::Invariant(format!("no embedding for claim {claim_id}"))
                })?;
                self.decode_embedding(EmbeddingColumn::Json(text))
            }
        }
    }

    async fn top_k_neighbors(
        &self,
        claim_id: i64,
        embedding: &[f32],
        k: u32,
    ) -> Result<Vec<NeighborMatch>> {
        match self.backend {
            VectorBackend::Native => {
                let query_vec = Vector::from(embedding.to_vec());
                let rows: Vec<(i64, String, f64)> = sqlx::query_as(
                    "SELECT c.claim_id, c.claim_text, 1 - (e.embedding <=> $1) AS similarity \
                     FROM claim c JOIN claim_embedding e USING (claim_id) \
                     WHERE c.claim_id != $2 \
                     ORDER BY e.embedding <=> $1, c.claim_id ASC \
                     LIMIT $3",
                )
                .bind(query_vec)
                .bind(claim_id)
                .bind(k as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;

                Ok(rows
                    .into_iter()
                    .map(|(claim_id, text, similarity)| NeighborMatch {
                        claim_id,
                        text,
                        similarity,
                    })
                    .collect())
            }
            VectorBackend::JsonFallback => {
                // O(N*D) in-process scoring — intended only for test
                // databases without the `vector` extension (§4.E).
                let rows: Vec<(i64, String, String)> = sqlx::query_as(
                    "SELECT c.claim_id, c.claim_text, e.embedding \
                     FROM claim c JOIN claim_embedding e USING (claim_id) \
                     WHERE c.claim_id != $1",
                )
                .bind(claim_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;

                let mut scored = Vec::with_capacity(rows.len());
                for (other_id, other_text, raw_embedding) in rows {
                    let vec = match self.decode_embedding(EmbeddingColumn::Json(raw_embedding)) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!(claim_id = other_id, %e, "skipping candidate with corrupt embedding");
                            continue;
                        }
                    };
                    let similarity = cosine_similarity(embedding, &vec)?;
                    scored.push(NeighborMatch {
                        claim_id: other_id,
                        text: other_text,
                        similarity,
                    });
                }

                scored.sort_by(|a, b| {
                    b.similarity
                        .partial_cmp(&a.similarity)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.claim_id.cmp(&b.claim_id))
                });
                scored.truncate(k as usize);
                Ok(scored)
            }
        }
    }

    async fn fetch_claim_text(&self, claim_id: i64) -> Result<String> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT claim_text FROM claim WHERE claim_id = $1")
                .bind(claim_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
        row.map(|(text,)| text)
            .ok_or_else(|| DedupeError::Invariant(format!("no such claim {claim_id}")))
    }

    async fn existing_cluster_of(&self, claim_id: i64) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT cluster_id FROM claim_cluster_member WHERE claim_id = $1",
        )
        .bind(claim_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
        Ok(row.map(|(cluster_id,)| cluster_id))
    }

    async fn canonical_of(&self, cluster_id: i64) -> Result<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT canonical_claim_id FROM claim_cluster WHERE cluster_id = $1",
        )
        .bind(cluster_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
        row.map(|(canonical_claim_id,)| canonical_claim_id)
            .ok_or_else(|| DedupeError::Invariant(format!("no such cluster {cluster_id}")))
    }

    async fn ensure_cluster_with_canonical(&self, canonical_claim_id: i64) -> Result<i64> {
        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT cluster_id FROM claim_cluster WHERE canonical_claim_id = $1",
        )
        .bind(canonical_claim_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;

        let cluster_id = if let Some((cluster_id,)) = existing {
            cluster_id
        } else {
            let inserted: std::result::Result<(i64,), sqlx::Error> = sqlx::query_as(
                "INSERT INTO claim_cluster (canonical_claim_id) VALUES ($1) \
                 ON CONFLICT (canonical_claim_id) DO NOTHING RETURNING cluster_id",
            )
            .bind(canonical_claim_id)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok((cluster_id,)) => cluster_id,
                Err(_) => {
                    // Lost the race to create this cluster; the winner's row
                    // is now visible.
                    let (cluster_id,) = sqlx::query_as(
                        "SELECT cluster_id FROM claim_cluster WHERE canonical_claim_id = $1",
                    )
                    .bind(canonical_claim_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
                    cluster_id
                }
            }
        };

        self.add_cluster_member(cluster_id, canonical_claim_id, 1.0)
            .await?;
        Ok(cluster_id)
    }

    async fn add_cluster_member(
        &self,
        cluster_id: i64,
        claim_id: i64,
        similarity: f64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO claim_cluster_member (cluster_id, claim_id, similarity) \
             VALUES ($1, $2, $3) ON CONFLICT (claim_id) DO NOTHING",
        )
        .bind(cluster_id)
        .bind(claim_id)
        .bind(similarity)
        .execute(&self.pool)
        .await
        .map_err(|e| DedupeError::Storage(anyhow::anyhow!(e)))?;
        Ok(())
    }
}
