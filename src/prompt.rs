//! The operator decision between recommendation and assignment.
//!
//! The pipeline never reads a terminal directly; it asks a
//! [`ClusterCountProvider`], so tests can inject a fixed answer.

use crate::error::{Error, Result};
use crate::evaluate::Evaluation;
use crate::select::OptimalK;
use std::io::{BufRead, Write};

/// What the operator sees before choosing a count.
#[derive(Debug, Clone, Copy)]
pub struct SelectionReport<'a> {
    /// Sweep results, ascending k.
    pub evaluations: &'a [Evaluation],
    /// Per-signal recommendations.
    pub recommended: &'a OptimalK,
}

/// Supplies the final cluster count.
pub trait ClusterCountProvider {
    /// Choose k after seeing the recommendations.
    fn choose(&mut self, report: &SelectionReport<'_>) -> Result<usize>;
}

/// Always answers with the same count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCount(pub usize);

impl ClusterCountProvider for FixedCount {
    fn choose(&mut self, _report: &SelectionReport<'_>) -> Result<usize> {
        Ok(self.0)
    }
}

impl<F> ClusterCountProvider for F
where
    F: FnMut(&SelectionReport<'_>) -> Result<usize>,
{
    fn choose(&mut self, report: &SelectionReport<'_>) -> Result<usize> {
        self(report)
    }
}

/// Write the sweep as a `k / inertia / davies_bouldin / silhouette` table.
pub fn write_table<W: Write>(mut out: W, evaluations: &[Evaluation]) -> std::io::Result<()> {
    writeln!(out, "{:>4}  {:>14}  {:>14}  {:>10}", "k", "inertia", "davies_bouldin", "silhouette")?;
    for e in evaluations {
        writeln!(
            out,
            "{:>4}  {:>14.4}  {:>14.4}  {:>10.4}",
            e.k, e.inertia, e.davies_bouldin, e.silhouette
        )?;
    }
    Ok(())
}

/// Shows the sweep table and recommendations on a writer and reads one integer line from a reader.
///
/// Blocks until a line arrives. No retry: a bad answer is an error.
#[derive(Debug)]
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    /// Prompt over arbitrary streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompt on the terminal.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ClusterCountProvider for LinePrompt<R, W> {
    fn choose(&mut self, report: &SelectionReport<'_>) -> Result<usize> {
        write_table(&mut self.output, report.evaluations)?;
        writeln!(self.output, "{}", report.recommended)?;
        write!(self.output, "Number of clusters: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InvalidInput("no cluster count given".to_string()));
        }
        let answer = line.trim();
        answer
            .parse::<usize>()
            .map_err(|_| Error::InvalidInput(format!("'{answer}' is not a cluster count")))
    }
}
