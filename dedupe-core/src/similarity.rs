//! Similarity Kernel (component C).

use crate::error::{DedupeError, Result};

/// Cosine similarity in `[-1.0, 1.0]`, computed in double precision
/// regardless of the caller's storage precision (`f32` embeddings are
/// widened before the dot product / norm).
///
/// Zero vectors return `0.0` rather than `NaN`. Mismatched lengths are a
/// caller bug, not a runtime condition — surfaced as `InvalidInput`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(DedupeError::InvalidInput(format!(
            "cosine_similarity: mismatched vector lengths ({} vs {})",
            a.len(),
            b.len()
        )));
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vector_is_unit_similarity() {
        let v = vec![1.0, 2.0, 3.0, -4.0];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-12, "got {sim}");
    }

    #[test]
    fn orthogonal_vectors_are_near_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-12, "got {sim}");
    }

    #[test]
    fn opposite_vectors_are_minus_one() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-9, "got {sim}");
    }

    #[test]
    fn zero_vector_yields_zero_not_nan() {
        let zero = vec![0.0, 0.0, 0.0];
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_lengths_error() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(cosine_similarity(&a, &b).is_err());
    }

    #[test]
    fn scale_invariant() {
        let a = vec![1.0, 2.0, 3.0];
        let scaled = vec![10.0, 20.0, 30.0];
        let sim = cosine_similarity(&a, &scaled).unwrap();
        assert!((sim - 1.0).abs() < 1e-9, "got {sim}");
    }
}
