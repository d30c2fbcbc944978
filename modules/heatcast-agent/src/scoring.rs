// Composite scoring: min-max normalization of the raw popularity metrics,
// weighted blend with the judge's potential score, breakout flagging.

use std::collections::BTreeMap;

use tracing::{error, info};

use heatcast_common::{EnrichedTopic, QualityJudgment, RawTopic, ScoreStats, ScoreWeights};

/// Linear min-max scaling to [0, 100], order- and length-preserving.
///
/// Edge cases are fixed: empty in, empty out; an all-zero series stays all
/// zero; a constant non-zero series maps to 50.0 (no spread to rank on).
pub fn normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == 0.0 {
        return vec![0.0; values.len()];
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    if max == min {
        return vec![50.0; values.len()];
    }
    values
        .iter()
        .map(|v| (v - min) / (max - min) * 100.0)
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct ScoringEngine {
    weights: ScoreWeights,
    breakout_threshold: f64,
}

impl ScoringEngine {
    pub fn new(weights: ScoreWeights, breakout_threshold: f64) -> Self {
        Self {
            weights,
            breakout_threshold,
        }
    }

    /// Blend normalized heat, normalized discussion volume, and the judge's
    /// potential score (stretched from 1-10 to a 0-100 scale) under the
    /// configured weights. Returns the enriched list sorted by total score,
    /// highest first; `Vec::sort_by` is stable so ties keep input order.
    ///
    /// The slices must correspond by position. A length mismatch is a
    /// validation failure: logged, empty result, never a panic.
    pub fn calculate_scores(
        &self,
        topics: &[RawTopic],
        judgments: &[QualityJudgment],
    ) -> Vec<EnrichedTopic> {
        if topics.len() != judgments.len() {
            error!(
                topics = topics.len(),
                judgments = judgments.len(),
                "Topic/judgment count mismatch, refusing to score"
            );
            return Vec::new();
        }

        let heat: Vec<f64> = topics.iter().map(|t| t.heat_score as f64).collect();
        let discussion: Vec<f64> = topics
            .iter()
            .map(|t| t.discussion_volume.unwrap_or(0) as f64)
            .collect();
        let normalized_heat = normalize(&heat);
        let normalized_discussion = normalize(&discussion);

        let mut enriched: Vec<EnrichedTopic> = topics
            .iter()
            .zip(judgments)
            .enumerate()
            .map(|(i, (topic, judgment))| {
                let llm_component = judgment.potential_score as f64 * 10.0;
                let total_score = round2(
                    normalized_heat[i] * self.weights.heat
                        + normalized_discussion[i] * self.weights.discussion
                        + llm_component * self.weights.llm,
                );
                let is_breakout = total_score >= self.breakout_threshold;
                if is_breakout {
                    info!(
                        title = %topic.title,
                        score = total_score,
                        potential = judgment.potential_score,
                        "Breakout topic"
                    );
                }
                EnrichedTopic {
                    topic: topic.clone(),
                    judgment: judgment.clone(),
                    normalized_heat: round2(normalized_heat[i]),
                    normalized_discussion: round2(normalized_discussion[i]),
                    total_score,
                    is_breakout,
                }
            })
            .collect();

        enriched.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        enriched
    }
}

/// Aggregate counts and score spread over one scored batch. All aggregates
/// are `None` for an empty batch.
pub fn statistics(topics: &[EnrichedTopic]) -> ScoreStats {
    let mut platform_distribution = BTreeMap::new();
    let mut nature_distribution = BTreeMap::new();
    for item in topics {
        *platform_distribution
            .entry(item.topic.platform.to_string())
            .or_insert(0) += 1;
        *nature_distribution
            .entry(item.judgment.nature.clone())
            .or_insert(0) += 1;
    }
    let scores: Vec<f64> = topics.iter().map(|t| t.total_score).collect();
    ScoreStats {
        total_count: topics.len(),
        breakout_count: topics.iter().filter(|t| t.is_breakout).count(),
        avg_score: (!scores.is_empty())
            .then(|| round2(scores.iter().sum::<f64>() / scores.len() as f64)),
        max_score: scores.iter().copied().reduce(f64::max),
        min_score: scores.iter().copied().reduce(f64::min),
        platform_distribution,
        nature_distribution,
    }
}
