/// Weights for the four hotspot-score components. Defaults match
/// spec.md §4.10 (0.4 / 0.25 / 0.15 / 0.2) and are threaded in from
/// [`geosignal_config::PipelineConfig`] rather than hardcoded here, so
/// an operator can retune without a code change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub member_count: f64,
    pub domain_diversity: f64,
    pub language_diversity: f64,
    pub temporal_burstiness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            member_count: 0.4,
            domain_diversity: 0.25,
            language_diversity: 0.15,
            temporal_burstiness: 0.2,
        }
    }
}
