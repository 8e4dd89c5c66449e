//! Noise filtering and confidence scoring for inferred relationships.

use serde::{Deserialize, Serialize};

/// Tunable thresholds, read once from `Config` at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    pub min_name_length: usize,
    pub stoplist_extra: Vec<String>,
    pub min_inferred_confidence: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            min_name_length: 3,
            stoplist_extra: Vec::new(),
            min_inferred_confidence: 0.5,
        }
    }
}

/// Common short identifiers that are rarely meaningful call/reference targets.
const DEFAULT_STOPLIST: &[&str] = &[
    "if", "for", "let", "var", "new", "get", "set", "try", "and", "or", "not", "it", "is",
];

impl NoiseConfig {
    /// Whether `name` should be dropped before it ever becomes a relationship.
    pub fn is_noise(&self, name: &str) -> bool {
        if name.len() < self.min_name_length {
            return true;
        }
        let lower = name.to_ascii_lowercase();
        DEFAULT_STOPLIST.contains(&lower.as_str())
            || self.stoplist_extra.iter().any(|s| s.eq_ignore_ascii_case(name))
    }
}

/// Inputs to the confidence formula for one inferred relationship.
pub struct InferredEdgeInputs<'a> {
    pub used_type_checker: bool,
    pub target_is_resolved_symbol: bool,
    pub is_exported: bool,
    pub name_len: usize,
    pub import_depth: u32,
    pub from_file_rel: &'a str,
}

/// `score_inferred_edge`: start at 0.5, add/subtract per signal, clamp to
/// `[0, 1]`. Deterministic and pure — the same inputs always score the same.
pub fn score_inferred_edge(inputs: &InferredEdgeInputs) -> f32 {
    let mut score = 0.5_f32;

    if inputs.used_type_checker {
        score += 0.25;
    }
    if inputs.target_is_resolved_symbol {
        score += 0.1;
    }
    if inputs.is_exported {
        score += 0.1;
    }
    if inputs.import_depth > 1 {
        let extra = (inputs.import_depth - 1).min(3) as f32;
        score -= 0.1 * extra;
    }
    if inputs.name_len < 4 {
        score -= 0.15;
    }
    let _ = inputs.from_file_rel;

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stoplist_and_length_gate() {
        let cfg = NoiseConfig::default();
        assert!(cfg.is_noise("if"));
        assert!(cfg.is_noise("ab"));
        assert!(!cfg.is_noise("processRequest"));
    }

    #[test]
    fn scoring_rewards_resolution_strength() {
        let weak = score_inferred_edge(&InferredEdgeInputs {
            used_type_checker: false,
            target_is_resolved_symbol: false,
            is_exported: false,
            name_len: 3,
            import_depth: 3,
            from_file_rel: "a.ts",
        });
        let strong = score_inferred_edge(&InferredEdgeInputs {
            used_type_checker: true,
            target_is_resolved_symbol: true,
            is_exported: true,
            name_len: 12,
            import_depth: 1,
            from_file_rel: "a.ts",
        });
        assert!(strong > weak);
        assert_eq!(strong, 0.95);
    }

    #[test]
    fn scoring_clamps_to_unit_interval() {
        let s = score_inferred_edge(&InferredEdgeInputs {
            used_type_checker: false,
            target_is_resolved_symbol: false,
            is_exported: false,
            name_len: 1,
            import_depth: 10,
            from_file_rel: "a.ts",
        });
        assert!((0.0..=1.0).contains(&s));
        assert!(s < 0.2);
    }
}
