//! Per-flashpoint kNN graph + connected components, with deterministic
//! dense-rank assignment.
//!
//! Clustering is strictly partitioned by `flashpoint_id` — this crate
//! never sees vectors across flashpoints in the same call, so a
//! cross-flashpoint cluster is structurally impossible rather than
//! merely disallowed by convention (spec.md §4.7 invariant).

mod knn;
mod union_find;

use std::collections::{BTreeMap, HashMap};

use geosignal_types::EntryVector;
use uuid::Uuid;

use union_find::UnionFind;

/// One connected component, already dense-ranked within its
/// flashpoint. `members` is not order-significant beyond containing
/// exactly the component's entry ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub cluster_id: u32,
    pub members: Vec<Uuid>,
}

/// Runs the kNN + union-find clustering algorithm over one
/// flashpoint's non-duplicate embedded vectors.
///
/// A flashpoint with zero vectors produces zero clusters (not an
/// error). A flashpoint where every vector collapses into one
/// component still produces a single cluster covering all of them,
/// including the singleton case.
pub struct Clusterer {
    k: usize,
    cosine_threshold: f32,
}

impl Clusterer {
    pub fn new(k: usize, cosine_threshold: f32) -> Self {
        Self {
            k,
            cosine_threshold,
        }
    }

    /// Clusters one flashpoint's vectors. Order of `vectors` does not
    /// affect the result: components are sorted by size descending,
    /// then by smallest-member `entry_id` ascending, before dense
    /// ranks are assigned (spec.md §3/§4.7 — the secondary key is what
    /// makes the ranking deterministic across runs with the same
    /// input set).
    pub fn cluster_flashpoint(&self, vectors: &[EntryVector]) -> Vec<Cluster> {
        if vectors.is_empty() {
            return Vec::new();
        }

        let n = vectors.len();
        let edges = knn::knn_edges(vectors, self.k, self.cosine_threshold);

        let mut uf = UnionFind::new(n);
        for (i, j) in edges {
            uf.union(i, j);
        }

        let mut components: HashMap<usize, Vec<Uuid>> = HashMap::new();
        for (idx, vector) in vectors.iter().enumerate() {
            let root = uf.find(idx);
            components.entry(root).or_default().push(vector.entry_id);
        }

        let mut ordered: Vec<Vec<Uuid>> = components.into_values().collect();
        for members in ordered.iter_mut() {
            members.sort();
        }
        ordered.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then_with(|| a.first().cmp(&b.first()))
        });

        ordered
            .into_iter()
            .enumerate()
            .map(|(i, members)| Cluster {
                cluster_id: (i + 1) as u32,
                members,
            })
            .collect()
    }

    /// Convenience entry point for the run controller: clusters every
    /// flashpoint independently and returns a map keyed by
    /// `flashpoint_id`. Iteration order of the input map does not
    /// affect any single flashpoint's result since each is clustered
    /// in isolation.
    pub fn cluster_by_flashpoint(
        &self,
        vectors_by_flashpoint: &BTreeMap<Uuid, Vec<EntryVector>>,
    ) -> BTreeMap<Uuid, Vec<Cluster>> {
        vectors_by_flashpoint
            .iter()
            .map(|(flashpoint_id, vectors)| {
                (*flashpoint_id, self.cluster_flashpoint(vectors))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: u128, values: Vec<f32>) -> EntryVector {
        EntryVector::new(Uuid::from_u128(id), values)
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        let clusterer = Clusterer::new(10, 0.65);
        assert!(clusterer.cluster_flashpoint(&[]).is_empty());
    }

    #[test]
    fn singleton_with_no_neighbours_is_its_own_cluster() {
        let clusterer = Clusterer::new(10, 0.65);
        let vectors = vec![v(1, vec![1.0, 0.0]), v(2, vec![0.0, 1.0])];
        let clusters = clusterer.cluster_flashpoint(&vectors);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.members.len() == 1));
    }

    #[test]
    fn five_near_identical_vectors_form_one_cluster() {
        let clusterer = Clusterer::new(10, 0.65);
        let vectors: Vec<EntryVector> = (1..=5).map(|i| v(i, vec![1.0, 0.0001 * i as f32])).collect();
        let clusters = clusterer.cluster_flashpoint(&vectors);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 5);
        assert_eq!(clusters[0].cluster_id, 1);
    }

    #[test]
    fn components_are_ranked_by_size_desc_then_smallest_member_asc() {
        let clusterer = Clusterer::new(10, 0.65);
        let vectors = vec![
            // pair forms a 2-member component
            v(10, vec![1.0, 0.0]),
            v(20, vec![0.999, (1.0 - 0.999f32.powi(2)).sqrt()]),
            // singleton, smaller entry_id than the pair
            v(1, vec![0.0, 1.0]),
        ];
        let clusters = clusterer.cluster_flashpoint(&vectors);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].cluster_id, 1);
        assert_eq!(clusters[0].members.len(), 2);
        assert_eq!(clusters[1].cluster_id, 2);
        assert_eq!(clusters[1].members, vec![Uuid::from_u128(1)]);
    }

    #[test]
    fn cluster_ids_are_dense_with_no_gaps() {
        let clusterer = Clusterer::new(10, 0.65);
        let vectors = vec![
            v(1, vec![1.0, 0.0]),
            v(2, vec![0.0, 1.0]),
            v(3, vec![-1.0, 0.0]),
        ];
        let clusters = clusterer.cluster_flashpoint(&vectors);
        let mut ids: Vec<u32> = clusters.iter().map(|c| c.cluster_id).collect();
        ids.sort();
        assert_eq!(ids, (1..=ids.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn cluster_by_flashpoint_keeps_flashpoints_independent() {
        let clusterer = Clusterer::new(10, 0.65);
        let mut map = BTreeMap::new();
        map.insert(Uuid::from_u128(100), vec![v(1, vec![1.0, 0.0]), v(2, vec![1.0, 0.0])]);
        map.insert(Uuid::from_u128(200), vec![v(3, vec![0.0, 1.0])]);

        let result = clusterer.cluster_by_flashpoint(&map);
        assert_eq!(result[&Uuid::from_u128(100)].len(), 1);
        assert_eq!(result[&Uuid::from_u128(200)].len(), 1);
    }
}
