use geosignal_types::EntryVector;

/// Brute-force k-nearest-neighbour edges over unit vectors, scored by
/// cosine similarity (= dot product). Per-run, per-flashpoint vector
/// counts are expected to be small (hundreds, not millions), so an ANN
/// index is not introduced — see SPEC_FULL.md §4.7.
///
/// Returns undirected edges `(i, j)` with `i < j`, deduplicated, for
/// every pair where at least one side has the other in its top-`k` by
/// similarity and the similarity clears `threshold`.
pub fn knn_edges(vectors: &[EntryVector], k: usize, threshold: f32) -> Vec<(usize, usize)> {
    let n = vectors.len();
    if n < 2 || k == 0 {
        return Vec::new();
    }

    let mut edges = std::collections::BTreeSet::new();
    for i in 0..n {
        let mut neighbours: Vec<(usize, f32)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, vectors[i].cosine_similarity(&vectors[j])))
            .filter(|&(_, sim)| sim >= threshold)
            .collect();

        // Sort by similarity desc, then by index asc for determinism
        // among ties.
        neighbours.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        neighbours.truncate(k);

        for (j, _) in neighbours {
            let edge = if i < j { (i, j) } else { (j, i) };
            edges.insert(edge);
        }
    }

    edges.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn v(values: Vec<f32>) -> EntryVector {
        EntryVector::new(Uuid::new_v4(), values)
    }

    #[test]
    fn identical_vectors_form_an_edge() {
        let vectors = vec![v(vec![1.0, 0.0]), v(vec![1.0, 0.0])];
        let edges = knn_edges(&vectors, 10, 0.65);
        assert_eq!(edges, vec![(0, 1)]);
    }

    #[test]
    fn orthogonal_vectors_form_no_edge() {
        let vectors = vec![v(vec![1.0, 0.0]), v(vec![0.0, 1.0])];
        let edges = knn_edges(&vectors, 10, 0.65);
        assert!(edges.is_empty());
    }

    #[test]
    fn k_limits_edges_per_node() {
        // three near-identical vectors, one far away -- k=1 should
        // still connect the close trio pairwise since each picks its
        // single nearest neighbour among the others.
        let vectors = vec![
            v(vec![1.0, 0.0]),
            v(vec![0.99, (1.0 - 0.99f32.powi(2)).sqrt()]),
            v(vec![0.0, 1.0]),
        ];
        let edges = knn_edges(&vectors, 1, 0.5);
        assert!(edges.contains(&(0, 1)));
    }

    #[test]
    fn no_self_edges() {
        let vectors = vec![v(vec![1.0, 0.0]), v(vec![0.0, 1.0])];
        let edges = knn_edges(&vectors, 10, -1.0);
        assert!(!edges.iter().any(|&(a, b)| a == b));
    }
}
