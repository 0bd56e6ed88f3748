use std::collections::HashSet;

use uuid::Uuid;

/// Selects the top `fraction` of clusters by pre-summarization member
/// count for the premium oracle pass. Ties at the cutoff are broken by
/// `(flashpoint_id, cluster_id)` ascending so the selection is
/// deterministic; at least one cluster is selected whenever the input
/// is non-empty and `fraction > 0`.
///
/// This spec adopts pre-summarization cluster size as the premium-pass
/// selection metric (SPEC_FULL.md §9 Open Question decision).
pub fn select_premium_clusters(
    cluster_sizes: &[(Uuid, u32, usize)],
    fraction: f64,
) -> HashSet<(Uuid, u32)> {
    if cluster_sizes.is_empty() || fraction <= 0.0 {
        return HashSet::new();
    }

    let mut ranked: Vec<&(Uuid, u32, usize)> = cluster_sizes.iter().collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)).then_with(|| a.1.cmp(&b.1)));

    let count = ((ranked.len() as f64 * fraction).ceil() as usize)
        .max(1)
        .min(ranked.len());

    ranked
        .into_iter()
        .take(count)
        .map(|(flashpoint_id, cluster_id, _)| (*flashpoint_id, *cluster_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_top_fraction_by_size() {
        let sizes: Vec<(Uuid, u32, usize)> = (1..=10)
            .map(|i| (Uuid::from_u128(1), i as u32, i))
            .collect();
        let selected = select_premium_clusters(&sizes, 0.1);
        assert_eq!(selected.len(), 1);
        assert!(selected.contains(&(Uuid::from_u128(1), 10)));
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert!(select_premium_clusters(&[], 0.1).is_empty());
    }

    #[test]
    fn at_least_one_cluster_selected_when_fraction_is_positive() {
        let sizes = vec![(Uuid::from_u128(1), 1, 3)];
        let selected = select_premium_clusters(&sizes, 0.1);
        assert_eq!(selected.len(), 1);
    }
}
