//! Optimal-k selection.
//!
//! Reduces each quality signal to one recommended count. The three answers
//! are reported side by side and never merged; the operator picks the final k.
//!
//! Ties always go to the smallest candidate.
//!
//! # The elbow rule
//!
//! [`ElbowRule::MaxInertia`] (the default) recommends the candidate with the
//! *largest* inertia. Since inertia falls as k grows, on a well-behaved sweep
//! this is simply the smallest candidate; it does not locate a bend in the
//! curve. Callers that want the bend can pass [`ElbowRule::MaxCurvature`].

use crate::error::{Error, Result};
use crate::evaluate::Evaluation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the inertia curve is reduced to a single count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElbowRule {
    /// Candidate with the largest inertia.
    #[default]
    MaxInertia,
    /// Candidate with the largest discrete second difference
    /// `I(k-1) - 2 I(k) + I(k+1)`. Needs three candidates; falls back to
    /// [`ElbowRule::MaxInertia`] otherwise.
    MaxCurvature,
}

/// One recommended count per signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptimalK {
    /// From the inertia curve.
    pub elbow: usize,
    /// Smallest Davies-Bouldin index.
    pub davies_bouldin: usize,
    /// Largest mean silhouette.
    pub silhouette: usize,
}

impl fmt::Display for OptimalK {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "elbow method:         k = {}", self.elbow)?;
        writeln!(f, "Davies-Bouldin index: k = {}", self.davies_bouldin)?;
        write!(f, "silhouette:           k = {}", self.silhouette)
    }
}

/// Index of the first maximum; NaN never wins.
fn argmax_by(values: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Reduces evaluation tables to per-signal recommendations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selector {
    elbow: ElbowRule,
}

impl Selector {
    /// Selector with the given elbow rule.
    pub fn new(elbow: ElbowRule) -> Self {
        Self { elbow }
    }

    /// Recommend a count per signal.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCandidateRange`] unless `evaluations` is strictly
    /// ascending in `k`, as the evaluator returns it. Position order is what
    /// breaks ties, so it must match candidate order.
    pub fn select(&self, evaluations: &[Evaluation]) -> Result<OptimalK> {
        if evaluations.is_empty() {
            return Err(Error::EmptyInput);
        }
        if let Some(w) = evaluations.windows(2).find(|w| w[1].k <= w[0].k) {
            return Err(Error::InvalidCandidateRange {
                reason: format!("evaluations out of order: k = {} follows k = {}", w[1].k, w[0].k),
            });
        }
        let at = |i: Option<usize>| i.map(|i| evaluations[i].k).ok_or(Error::EmptyInput);

        let elbow = match self.elbow {
            ElbowRule::MaxInertia => at(argmax_by(evaluations.iter().map(|e| e.inertia)))?,
            ElbowRule::MaxCurvature => self.max_curvature(evaluations)?,
        };
        let davies_bouldin = at(argmax_by(evaluations.iter().map(|e| -e.davies_bouldin)))?;
        let silhouette = at(argmax_by(evaluations.iter().map(|e| e.silhouette)))?;

        let optimal = OptimalK {
            elbow,
            davies_bouldin,
            silhouette,
        };
        tracing::info!(
            elbow = optimal.elbow,
            davies_bouldin = optimal.davies_bouldin,
            silhouette = optimal.silhouette,
            rule = ?self.elbow,
            "recommended cluster counts"
        );
        Ok(optimal)
    }

    fn max_curvature(&self, evaluations: &[Evaluation]) -> Result<usize> {
        if evaluations.len() < 3 {
            return Selector::new(ElbowRule::MaxInertia)
                .select(evaluations)
                .map(|o| o.elbow);
        }
        let bends = evaluations
            .windows(3)
            .map(|w| w[0].inertia - 2.0 * w[1].inertia + w[2].inertia);
        argmax_by(bends)
            .map(|i| evaluations[i + 1].k)
            .ok_or(Error::EmptyInput)
    }
}

/// [`Selector::select`] with the default elbow rule.
pub fn select(evaluations: &[Evaluation]) -> Result<OptimalK> {
    Selector::default().select(evaluations)
}
