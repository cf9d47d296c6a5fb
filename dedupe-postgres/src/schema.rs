//! Schema bootstrap — embedded `CREATE TABLE IF NOT EXISTS` DDL, run once at
//! startup, the way `drift-storage::migrations` keeps each version's SQL as
//! a `const` string executed through the pool rather than shelling out to an
//! external migration tool. The dedupe engine's schema is small and stable
//! enough (§6 PERSISTED SCHEMA) that a single idempotent statement block is
//! clearer than a versioned ladder.

use sqlx::PgPool;

use crate::dialect::VectorBackend;

const COMMON_TABLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS claim (
    claim_id BIGSERIAL PRIMARY KEY,
    claim_text TEXT NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS claim_cluster (
    cluster_id BIGSERIAL PRIMARY KEY,
    canonical_claim_id BIGINT NOT NULL UNIQUE REFERENCES claim (claim_id)
);

CREATE TABLE IF NOT EXISTS claim_cluster_member (
    cluster_id BIGINT NOT NULL REFERENCES claim_cluster (cluster_id),
    claim_id BIGINT NOT NULL REFERENCES claim (claim_id),
    similarity DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (cluster_id, claim_id)
);

CREATE UNIQUE INDEX IF NOT EXISTS claim_cluster_member_claim_id_uq
    ON claim_cluster_member (claim_id);
"#;

/// `claim_embedding.embedding` as a native pgvector column. `dim` is baked
/// into the column type (`vector(dim)`) because pgvector enforces a fixed
/// dimension per column — matching invariant 6 (§3) that every stored
/// embedding in a deployment shares one dimension.
fn native_embedding_table_sql(dim: usize) -> String {
    format!(
        r#"
        CREATE EXTENSION IF NOT EXISTS vector;

        CREATE TABLE IF NOT EXISTS claim_embedding (
            claim_id BIGINT PRIMARY KEY REFERENCES claim (claim_id),
            embedding_model TEXT NOT NULL,
            embedding vector({dim}) NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE INDEX IF NOT EXISTS claim_embedding_cosine_idx
            ON claim_embedding USING ivfflat (embedding vector_cosine_ops);
        "#
    )
}

const JSON_EMBEDDING_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS claim_embedding (
    claim_id BIGINT PRIMARY KEY REFERENCES claim (claim_id),
    embedding_model TEXT NOT NULL,
    embedding TEXT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

/// Create the four tables from §6 if they don't already exist. Safe to call
/// on every startup (idempotent), the same contract `ensure_schema`-style
/// bootstraps carry across the teacher workspace.
pub async fn ensure_schema(pool: &PgPool, backend: VectorBackend, dim: usize) -> anyhow::Result<()> {
    sqlx::raw_sql(COMMON_TABLES_SQL).execute(pool).await?;

    match backend {
        VectorBackend::Native => {
            sqlx::raw_sql(&native_embedding_table_sql(dim))
                .execute(pool)
                .await?;
        }
        VectorBackend::JsonFallback => {
            sqlx::raw_sql(JSON_EMBEDDING_TABLE_SQL).execute(pool).await?;
        }
    }

    Ok(())
}
