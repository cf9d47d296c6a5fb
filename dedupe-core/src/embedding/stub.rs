use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};

use super::{Embedding, EmbeddingProvider};
use crate::error::Result;

const STUB_DIMENSIONS: usize = 3072;
const STUB_MODEL: &str = "stub-3072";

/// Deterministic, dependency-free stand-in for a real embedding model.
/// The vector is seeded from the SHA-256 of the input text, so the same
/// text always embeds to the same vector within a process and across
/// runs — useful for tests that assert on similarity without paying for
/// an API call or bundling model weights.
pub struct StubEmbeddingProvider;

impl StubEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let digest = Sha256::digest(text.as_bytes());
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        let mut rng = StdRng::from_seed(seed);

        let vector: Vec<f32> = (0..STUB_DIMENSIONS)
            .map(|_| rng.gen_range(-1.0f32..1.0f32))
            .collect();

        Ok(Embedding {
            vector,
            model: STUB_MODEL.to_string(),
            provider: "stub",
        })
    }

    fn dimensions(&self) -> usize {
        STUB_DIMENSIONS
    }

    fn model_name(&self) -> &str {
        STUB_MODEL
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let p = StubEmbeddingProvider::new();
        let a = p.embed("the earth orbits the sun").await.unwrap();
        let b = p.embed("the earth orbits the sun").await.unwrap();
        assert_eq!(a.vector, b.vector);
        assert_eq!(a.model, STUB_MODEL);
        assert_eq!(a.provider, "stub");
    }

    #[tokio::test]
    async fn distinct_text_embeds_differently() {
        let p = StubEmbeddingProvider::new();
        let a = p.embed("claim one").await.unwrap();
        let b = p.embed("claim two").await.unwrap();
        assert_ne!(a.vector, b.vector);
    }

    #[tokio::test]
    async fn vector_has_declared_dimensionality() {
        let p = StubEmbeddingProvider::new();
        let e = p.embed("anything").await.unwrap();
        assert_eq!(e.vector.len(), p.dimensions());
    }
}
