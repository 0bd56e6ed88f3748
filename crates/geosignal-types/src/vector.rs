use uuid::Uuid;

/// A content-addressed dense embedding, keyed by `entry_id` — not by
/// `(run_id, entry_id)`. Re-processing an entry in a later run must
/// reuse its prior vector rather than re-embed it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryVector {
    pub entry_id: Uuid,
    pub values: Vec<f32>,
}

impl EntryVector {
    pub fn new(entry_id: Uuid, values: Vec<f32>) -> Self {
        Self { entry_id, values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn l2_norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// All vectors in the store must be unit-L2; this checks within
    /// a small tolerance, matching the invariant in spec.md section 8.
    pub fn is_unit_normalized(&self) -> bool {
        (self.l2_norm() - 1.0).abs() <= 1e-6
    }

    pub fn dot(&self, other: &EntryVector) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Cosine similarity, which on unit vectors reduces to the dot
    /// product.
    pub fn cosine_similarity(&self, other: &EntryVector) -> f32 {
        self.dot(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_vector_passes_normalization_check() {
        let v = EntryVector::new(Uuid::nil(), vec![0.6, 0.8]);
        assert!(v.is_unit_normalized());
    }

    #[test]
    fn non_unit_vector_fails_normalization_check() {
        let v = EntryVector::new(Uuid::nil(), vec![1.0, 1.0]);
        assert!(!v.is_unit_normalized());
    }

    #[test]
    fn cosine_similarity_of_identical_unit_vectors_is_one() {
        let v = EntryVector::new(Uuid::nil(), vec![1.0, 0.0, 0.0]);
        assert!((v.cosine_similarity(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        let a = EntryVector::new(Uuid::nil(), vec![1.0, 0.0]);
        let b = EntryVector::new(Uuid::nil(), vec![0.0, 1.0]);
        assert!(a.cosine_similarity(&b).abs() < 1e-6);
    }
}
