//! Postgres `ClaimStore` adapter — implements `dedupe_core::ports::ClaimStore`
//! with `sqlx`, exactly as `sem_os_postgres::store` implements the core
//! ports of its own workspace: one newtype wrapping `PgPool`, runtime-checked
//! SQL (`sqlx::query`/`query_as`, never the `query!` compile-time macros, so
//! no `DATABASE_URL` is required at build time).
//!
//! The twist this crate adds over the teacher's single-shape adapter is the
//! backend duality called for in §4.D/§9 of the dedupe engine's storage
//! design: a deployment either has the `vector` extension (pgvector native
//! column, cosine distance pushed into SQL) or it doesn't (embeddings
//! round-trip as a JSON-encoded array of floats in a `TEXT` column, and
//! neighbor search falls back to in-process scoring). Which shape is in
//! play is decided once, at construction, by inspecting `pg_extension` —
//! never branched on at each query site.

mod dialect;
mod schema;
mod store;

pub use dialect::VectorBackend;
pub use store::PgClaimStore;
