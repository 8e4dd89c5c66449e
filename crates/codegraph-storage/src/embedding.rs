//! Embedding provider contract. The real model is out of scope; this
//! crate only specifies the interface and the deterministic fallback
//! vector callers use when an embed call fails and the pipeline must keep
//! moving (e.g. under `SECURITY_OSV_ENABLED`-style best-effort configs).

use async_trait::async_trait;
use codegraph_core::{sha256_hex, StorageError};

use crate::vector::VECTOR_DIMENSIONS;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, content: &str) -> Result<Vec<f32>, StorageError>;
}

/// A deterministic pseudo-random unit vector derived from `content`'s
/// sha256 digest: not semantically meaningful, but stable across runs so
/// repeated fallback embeddings of the same content compare identically.
pub fn deterministic_fallback_vector(content: &str) -> Vec<f32> {
    let digest = sha256_hex(content.as_bytes());
    let digest_bytes = digest.as_bytes();

    let mut vector = Vec::with_capacity(VECTOR_DIMENSIONS);
    let mut state: u64 = 0x9E3779B97F4A7C15;
    for i in 0..VECTOR_DIMENSIONS {
        let seed_byte = digest_bytes[i % digest_bytes.len()] as u64;
        state ^= seed_byte.wrapping_add(i as u64).wrapping_add(state << 6).wrapping_add(state >> 2);
        state = state.wrapping_mul(0x2545F4914F6CDD1D);
        let normalized = ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0;
        vector.push(normalized);
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_vector_is_deterministic_and_right_shape() {
        let a = deterministic_fallback_vector("fn foo() {}");
        let b = deterministic_fallback_vector("fn foo() {}");
        assert_eq!(a, b);
        assert_eq!(a.len(), VECTOR_DIMENSIONS);
    }

    #[test]
    fn fallback_vector_differs_by_content() {
        let a = deterministic_fallback_vector("a");
        let b = deterministic_fallback_vector("b");
        assert_ne!(a, b);
    }
}
