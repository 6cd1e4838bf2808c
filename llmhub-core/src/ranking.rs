//! Weighted candidate ranking.
//!
//! Candidates carry a 0-10 score per [`Dimension`]; the ranking is the
//! weighted sum of those scores, highest first. Bad weights or scores are
//! rejected before anything is ranked.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::error::RankingError;

/// Inclusive bounds of a dimension score.
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;

/// A ranking dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Quality,
    Cost,
    Latency,
    Reliability,
    IntegrationFit,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Quality,
        Dimension::Cost,
        Dimension::Latency,
        Dimension::Reliability,
        Dimension::IntegrationFit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Quality => "quality",
            Dimension::Cost => "cost",
            Dimension::Latency => "latency",
            Dimension::Reliability => "reliability",
            Dimension::IntegrationFit => "integration_fit",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weight per dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub quality: f64,
    pub cost: f64,
    pub latency: f64,
    pub reliability: f64,
    pub integration_fit: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            quality: 0.35,
            cost: 0.20,
            latency: 0.20,
            reliability: 0.15,
            integration_fit: 0.10,
        }
    }
}

impl Weights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Quality => self.quality,
            Dimension::Cost => self.cost,
            Dimension::Latency => self.latency,
            Dimension::Reliability => self.reliability,
            Dimension::IntegrationFit => self.integration_fit,
        }
    }

    fn set(&mut self, dimension: Dimension, value: f64) {
        match dimension {
            Dimension::Quality => self.quality = value,
            Dimension::Cost => self.cost = value,
            Dimension::Latency => self.latency = value,
            Dimension::Reliability => self.reliability = value,
            Dimension::IntegrationFit => self.integration_fit = value,
        }
    }

    pub fn total(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.get(*d)).sum()
    }
}

/// A candidate as it appears in a ranking payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub name: String,
    /// Missing dimensions score 0.
    #[serde(default)]
    pub scores: BTreeMap<Dimension, f64>,
    #[serde(default)]
    pub notes: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_score(mut self, dimension: Dimension, score: f64) -> Self {
        self.scores.insert(dimension, score);
        self
    }
}

/// The input to [`rank_payload`]: optional raw weights plus candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingPayload {
    #[serde(default)]
    pub weights: Option<BTreeMap<Dimension, f64>>,
    #[serde(default, alias = "models")]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub name: String,
    pub score: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    /// The normalized weights that produced the scores.
    pub weights: Weights,
    pub ranking: Vec<RankedCandidate>,
}

/// Rescale raw weights so they sum to 1.
///
/// `None` or an empty map falls back to `defaults` unchanged. Otherwise any
/// dimension missing from `raw` counts as 0.
pub fn normalize_weights(
    raw: Option<&BTreeMap<Dimension, f64>>,
    defaults: &Weights,
) -> Result<Weights, RankingError> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Ok(*defaults);
    };

    let mut weights = Weights {
        quality: 0.0,
        cost: 0.0,
        latency: 0.0,
        reliability: 0.0,
        integration_fit: 0.0,
    };
    for dimension in Dimension::ALL {
        let value = raw.get(&dimension).copied().unwrap_or(0.0);
        if !value.is_finite() || value < 0.0 {
            return Err(RankingError::InvalidWeight {
                dimension: dimension.to_string(),
                value,
            });
        }
        weights.set(dimension, value);
    }

    let total = weights.total();
    if total <= 0.0 {
        return Err(RankingError::InvalidWeightTotal { total });
    }
    for dimension in Dimension::ALL {
        weights.set(dimension, weights.get(dimension) / total);
    }
    Ok(weights)
}

/// Weighted score of one candidate, rounded to 4 decimals.
pub fn score_candidate(candidate: &Candidate, weights: &Weights) -> Result<f64, RankingError> {
    let mut total = 0.0;
    for dimension in Dimension::ALL {
        let value = candidate.scores.get(&dimension).copied().unwrap_or(0.0);
        if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
            return Err(RankingError::ScoreOutOfRange {
                candidate: candidate.name.clone(),
                dimension: dimension.to_string(),
                value,
            });
        }
        total += value * weights.get(dimension);
    }
    Ok(round4(total))
}

/// Score every candidate and sort highest first. Ties keep input order.
///
/// `top_k` of `None` or `Some(0)` keeps the full list.
pub fn rank_candidates(
    candidates: &[Candidate],
    weights: &Weights,
    top_k: Option<usize>,
) -> Result<Vec<RankedCandidate>, RankingError> {
    if candidates.is_empty() {
        return Err(RankingError::NoCandidates);
    }

    let mut ranked = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.name.trim().is_empty() {
            return Err(RankingError::MissingName { index });
        }
        let score = score_candidate(candidate, weights)?;
        debug!(candidate = %candidate.name, score, "Scored candidate");
        ranked.push(RankedCandidate {
            name: candidate.name.clone(),
            score,
            notes: candidate.notes.clone(),
        });
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    if let Some(k) = top_k.filter(|k| *k > 0) {
        ranked.truncate(k);
    }
    Ok(ranked)
}

/// Normalize the payload's weights, then rank its candidates.
pub fn rank_payload(
    payload: &RankingPayload,
    defaults: &Weights,
    top_k: Option<usize>,
) -> Result<Ranking, RankingError> {
    let weights = normalize_weights(payload.weights.as_ref(), defaults)?;
    let ranking = rank_candidates(&payload.candidates, &weights, top_k)?;
    Ok(Ranking { weights, ranking })
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
