//! Score blending and relevance classification.

use serde::Serialize;

/// Blend a dense and a sparse similarity into one ranked score.
///
/// With both signals present the result is `weight * dense + (1 - weight) *
/// sparse`. A lone signal passes through unscaled: a degraded call must not
/// be dressed up (or watered down) to look like a full hybrid score. With
/// neither signal there is nothing to score.
pub fn blend(dense: Option<f32>, sparse: Option<f32>, weight: f32) -> Option<f32> {
    let weight = weight.clamp(0.0, 1.0);
    match (dense, sparse) {
        (Some(dense), Some(sparse)) => Some(weight * dense + (1.0 - weight) * sparse),
        (Some(dense), None) => Some(dense),
        (None, Some(sparse)) => Some(sparse),
        (None, None) => None,
    }
}

/// Relevance bucket derived from a result score.
///
/// Thresholds are fixed on the blended-score scale and shared by every
/// retrieval tier. Tiers that score on another scale (substring matching)
/// normalize into [0, 1] before classification so the shared thresholds
/// stay meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    High,
    Medium,
    Low,
    VeryLow,
}

impl Relevance {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            Self::High
        } else if score >= 0.6 {
            Self::Medium
        } else if score >= 0.4 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::VeryLow => "very_low",
        }
    }
}

impl std::fmt::Display for Relevance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
