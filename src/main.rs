//! canopy - pick a cluster count for a tree inventory and partition it.

use anyhow::{bail, Context};
use canopy::dataset::{self, Column, Record};
use canopy::{
    write_table, Analysis, Assignment, CandidateRange, ClusterAssigner, Config, Evaluation,
    FeatureSelector, FixedCount, LinePrompt, Partitioner,
};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Cluster-count selection for tree height, trunk diameter and position.
#[derive(Parser, Debug)]
#[command(name = "canopy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct Input {
    /// Inventory CSV (needs haut_tot, tronc_diam; longitude, latitude for geo features)
    #[arg(short, long)]
    input: PathBuf,

    /// Feature columns, comma separated (haut_tot, tronc_diam, longitude, latitude)
    #[arg(short, long, value_delimiter = ',')]
    features: Option<Vec<Column>>,

    /// Write labelled records to this CSV
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sweep candidate counts and print the three recommendations
    Evaluate {
        #[command(flatten)]
        input: Input,

        /// Smallest candidate count
        #[arg(long)]
        k_min: Option<usize>,

        /// Largest candidate count
        #[arg(long)]
        k_max: Option<usize>,

        /// Write the evaluation table to this CSV
        #[arg(long)]
        curves_out: Option<PathBuf>,
    },

    /// Sweep, ask for a count (unless --k is given), then partition with k-means
    Kmeans {
        #[command(flatten)]
        input: Input,

        /// Final cluster count; skips the prompt
        #[arg(short, long)]
        k: Option<usize>,

        /// Skip the sweep entirely (requires --k)
        #[arg(long, requires = "k")]
        no_sweep: bool,
    },

    /// Density-based partition; noise is labelled -1
    Dbscan {
        #[command(flatten)]
        input: Input,

        /// Neighborhood radius
        #[arg(long)]
        eps: Option<f64>,

        /// Points needed within eps, counting the point itself
        #[arg(long)]
        min_samples: Option<usize>,
    },

    /// Agglomerative partition into a fixed number of clusters
    Agglomerative {
        #[command(flatten)]
        input: Input,

        /// Number of clusters
        #[arg(short, long)]
        n_clusters: Option<usize>,

        /// Linkage: ward, single, complete, average
        #[arg(long)]
        linkage: Option<canopy::cluster::Linkage>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_or_default(cli.config.as_deref()).context("loading config")?;

    match cli.command {
        Commands::Evaluate {
            input,
            k_min,
            k_max,
            curves_out,
        } => run_evaluate(&input, k_min, k_max, curves_out.as_deref(), &config),
        Commands::Kmeans { input, k, no_sweep } => run_kmeans(&input, k, no_sweep, &config),
        Commands::Dbscan {
            input,
            eps,
            min_samples,
        } => {
            let mut partitioner = config.density;
            partitioner.eps = eps.unwrap_or(partitioner.eps);
            partitioner.min_samples = min_samples.unwrap_or(partitioner.min_samples);
            run_partition(&input, FeatureSelector::height_diameter(), &partitioner)
        }
        Commands::Agglomerative {
            input,
            n_clusters,
            linkage,
        } => {
            let mut partitioner = config.agglomerative;
            partitioner.n_clusters = n_clusters.unwrap_or(partitioner.n_clusters);
            partitioner.linkage = linkage.unwrap_or(partitioner.linkage);
            run_partition(&input, FeatureSelector::height_diameter(), &partitioner)
        }
    }
}

fn selector_for(input: &Input, default: FeatureSelector) -> FeatureSelector {
    input
        .features
        .clone()
        .map(FeatureSelector::new)
        .unwrap_or(default)
}

fn load(input: &Input) -> anyhow::Result<Vec<Record>> {
    dataset::load_csv(&input.input).with_context(|| format!("reading {}", input.input.display()))
}

fn candidates(k_min: Option<usize>, k_max: Option<usize>, config: &Config) -> anyhow::Result<CandidateRange> {
    let k_min = k_min.unwrap_or(config.evaluation.k_min);
    let k_max = k_max.unwrap_or(config.evaluation.k_max);
    Ok(CandidateRange::inclusive(k_min, k_max)?)
}

fn print_table(evaluations: &[Evaluation]) -> anyhow::Result<()> {
    write_table(std::io::stdout().lock(), evaluations)?;
    Ok(())
}

fn print_groups(title: &str, assignment: &Assignment) {
    println!("{title}: {} clusters, {} noise", assignment.n_clusters(), assignment.n_noise());
    for (label, members) in assignment.groups() {
        println!("  cluster {label:>3}: {} records", members.len());
    }
}

fn save(output: Option<&Path>, records: &mut [Record], assignment: &Assignment) -> anyhow::Result<()> {
    assignment.apply(records)?;
    if let Some(path) = output {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        dataset::write_records(file, records)?;
        info!(path = %path.display(), "wrote labelled records");
    }
    Ok(())
}

fn run_evaluate(
    input: &Input,
    k_min: Option<usize>,
    k_max: Option<usize>,
    curves_out: Option<&Path>,
    config: &Config,
) -> anyhow::Result<()> {
    let records = load(input)?;
    let analysis = Analysis::from_config(config)?
        .with_features(selector_for(input, FeatureSelector::height_geo()))
        .with_candidates(candidates(k_min, k_max, config)?);

    let (evaluations, recommended) = analysis.recommend(&records)?;
    print_table(&evaluations)?;
    println!("{recommended}");

    if let Some(path) = curves_out {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        dataset::write_curves(file, &evaluations)?;
        info!(path = %path.display(), "wrote evaluation curves");
    }
    Ok(())
}

/// The direct fixed-k run clusters on diameter then height; the sweep uses
/// height and position.
fn kmeans_features(input: &Input, no_sweep: bool) -> FeatureSelector {
    let default = if no_sweep {
        FeatureSelector::diameter_height()
    } else {
        FeatureSelector::height_geo()
    };
    selector_for(input, default)
}

fn run_kmeans(input: &Input, k: Option<usize>, no_sweep: bool, config: &Config) -> anyhow::Result<()> {
    let mut records = load(input)?;
    let features = kmeans_features(input, no_sweep);

    let assignment = if no_sweep {
        let Some(k) = k else {
            bail!("--no-sweep needs --k");
        };
        let data = features.select(&records)?;
        ClusterAssigner::new(config.kmeans).with_k(k).partition(&data)?
    } else {
        let analysis = Analysis::from_config(config)?.with_features(features);
        let outcome = match k {
            Some(k) => {
                let outcome = analysis.run(&records, &mut FixedCount(k))?;
                print_table(&outcome.evaluations)?;
                println!("{}", outcome.recommended);
                outcome
            }
            // The prompt shows the table and recommendations itself.
            None => analysis.run(&records, &mut LinePrompt::stdio())?,
        };
        outcome.assignment
    };

    print_groups("K-Means Clustering", &assignment);
    save(input.output.as_deref(), &mut records, &assignment)
}

fn run_partition<P: Partitioner>(input: &Input, default: FeatureSelector, partitioner: &P) -> anyhow::Result<()> {
    let mut records = load(input)?;
    let data = selector_for(input, default).select(&records)?;
    let assignment = partitioner.partition(&data)?;
    print_groups(partitioner.name(), &assignment);
    save(input.output.as_deref(), &mut records, &assignment)
}
