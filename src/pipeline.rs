//! End-to-end cluster-count analysis.
//!
//! ```text
//! records → FeatureSelector → Evaluator → Selector → provider → ClusterAssigner
//! ```
//!
//! A failure at any stage aborts the run; nothing is written back to the
//! records unless the caller applies the returned assignment.

use crate::assign::{Assignment, ClusterAssigner};
use crate::config::Config;
use crate::dataset::Record;
use crate::error::Result;
use crate::evaluate::{CandidateRange, Evaluation, EvaluationCurves, Evaluator};
use crate::features::{FeatureMatrix, FeatureSelector};
use crate::prompt::{ClusterCountProvider, SelectionReport};
use crate::select::{OptimalK, Selector};

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Sweep results, ascending k.
    pub evaluations: Vec<Evaluation>,
    /// Per-signal recommendations.
    pub recommended: OptimalK,
    /// Count the provider chose.
    pub chosen_k: usize,
    /// Final labels, one per record.
    pub assignment: Assignment,
}

impl AnalysisOutcome {
    /// The three curves for plotting.
    pub fn curves(&self) -> EvaluationCurves {
        EvaluationCurves::from(self.evaluations.as_slice())
    }
}

/// Configured analysis: which features, which sweep, how to fit.
#[derive(Debug, Clone)]
pub struct Analysis {
    features: FeatureSelector,
    candidates: CandidateRange,
    evaluator: Evaluator,
    selector: Selector,
    assigner: ClusterAssigner,
}

impl Default for Analysis {
    /// Height and position, candidates 2..=5, seed 42.
    fn default() -> Self {
        Self {
            features: FeatureSelector::height_geo(),
            candidates: CandidateRange::default(),
            evaluator: Evaluator::default(),
            selector: Selector::default(),
            assigner: ClusterAssigner::default(),
        }
    }
}

impl Analysis {
    /// Build from configuration, with height-and-position features.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            features: FeatureSelector::height_geo(),
            candidates: config.evaluation.candidates()?,
            evaluator: Evaluator::new(config.kmeans),
            selector: Selector::new(config.evaluation.elbow_rule),
            assigner: ClusterAssigner::new(config.kmeans),
        })
    }

    /// Use a different feature selection.
    pub fn with_features(mut self, features: FeatureSelector) -> Self {
        self.features = features;
        self
    }

    /// Use a different candidate sweep.
    pub fn with_candidates(mut self, candidates: CandidateRange) -> Self {
        self.candidates = candidates;
        self
    }

    /// Use a different selector.
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Sweep and recommend without asking for a final count.
    pub fn recommend(&self, records: &[Record]) -> Result<(Vec<Evaluation>, OptimalK)> {
        let (_, evaluations, recommended) = self.sweep(records)?;
        Ok((evaluations, recommended))
    }

    fn sweep(&self, records: &[Record]) -> Result<(FeatureMatrix, Vec<Evaluation>, OptimalK)> {
        let data = self.features.select(records)?;
        let evaluations = self.evaluator.evaluate(&data, &self.candidates)?;
        let recommended = self.selector.select(&evaluations)?;
        Ok((data, evaluations, recommended))
    }

    /// Full run: recommend, ask `provider` for k, assign.
    pub fn run<P>(&self, records: &[Record], provider: &mut P) -> Result<AnalysisOutcome>
    where
        P: ClusterCountProvider + ?Sized,
    {
        let (data, evaluations, recommended) = self.sweep(records)?;

        let chosen_k = provider.choose(&SelectionReport {
            evaluations: &evaluations,
            recommended: &recommended,
        })?;
        tracing::info!(chosen_k, "operator chose cluster count");

        let assignment = self.assigner.assign(&data, chosen_k)?;

        Ok(AnalysisOutcome {
            evaluations,
            recommended,
            chosen_k,
            assignment,
        })
    }
}
