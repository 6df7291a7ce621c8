use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod enrich;
mod error;
mod models;
mod pipeline;
mod report;
mod scorer;
mod skills;
mod source;
mod summary;

use aggregate::StalenessReference;
use models::{RawEngagement, Status};
use pipeline::{PipelineConfig, PipelineStage};
use scorer::ScorerBackend;
use skills::GapOrder;

#[derive(Parser)]
#[command(name = "engagement-insights")]
#[command(about = "Customer engagement enrichment and analytics pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic engagement records
    Seed {
        #[arg(long, default_value = "data/raw/engagements_sample.json")]
        out: PathBuf,
        #[arg(long, default_value_t = 500)]
        count: usize,
    },
    /// Enrich and aggregate engagements, writing the dashboard document
    #[command(group(
        ArgGroup::new("scope")
            .args(["customer", "status"])
            .multiple(false)
    ))]
    Analyze {
        /// Raw engagements as a JSON array or CSV file
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "data/processed/analytics_results.json")]
        out: PathBuf,
        #[arg(long, default_value = "fallback")]
        backend: ScorerBackend,
        /// Optional {word: weight} JSON lexicon for the rich backend
        #[arg(long)]
        lexicon: Option<PathBuf>,
        /// Optional {technology: score} JSON table overriding the built-in
        /// team proficiency reference
        #[arg(long)]
        proficiency: Option<PathBuf>,
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long, default_value_t = 10)]
        top_topics: usize,
        #[arg(long, default_value_t = 10)]
        top_technologies: usize,
        /// Rank the skills gap with the largest training needs first
        #[arg(long)]
        descending_gap: bool,
        /// Measure staleness against today instead of the newest date in the set
        #[arg(long)]
        wall_clock: bool,
    },
    /// List the engagements that most need attention
    #[command(group(
        ArgGroup::new("scope")
            .args(["customer", "status"])
            .multiple(false)
    ))]
    Priority {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("scope")
            .args(["customer", "status"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Seed { out, count } => {
            let records = source::seed_records(count);
            source::write_records(&out, &records)
                .with_context(|| format!("failed to write seed data to {}", out.display()))?;
            println!("Wrote {count} engagement records to {}.", out.display());
        }
        Commands::Analyze {
            input,
            out,
            backend,
            lexicon,
            proficiency,
            customer,
            status,
            since_days,
            top_topics,
            top_technologies,
            descending_gap,
            wall_clock,
        } => {
            let records = load_records(&input, customer, status, since_days)?;
            let proficiency_table = match proficiency {
                Some(path) => source::read_proficiency(&path)
                    .with_context(|| format!("failed to read proficiency table {}", path.display()))?,
                None => skills::default_proficiency(),
            };
            let config = PipelineConfig {
                scorer_backend: backend,
                lexicon_path: lexicon,
                proficiency_table,
                top_n_topics: top_topics,
                top_n_technologies: top_technologies,
                staleness_reference: if wall_clock {
                    StalenessReference::WallClock
                } else {
                    StalenessReference::MaxDateInSet
                },
                gap_order: if descending_gap {
                    GapOrder::Descending
                } else {
                    GapOrder::Ascending
                },
            };

            let output = pipeline::run(&records, &config);
            source::write_output(&out, &output)
                .with_context(|| format!("failed to write results to {}", out.display()))?;
            println!("Analyzed {} engagements. Results written to {}.", records.len(), out.display());
            println!();
            println!("{}", output.weekly_summary);
        }
        Commands::Priority {
            input,
            customer,
            status,
            since_days,
            limit,
        } => {
            let records = load_records(&input, customer, status, since_days)?;
            let output = pipeline::run(&records, &PipelineConfig::default());

            if output.report.priority_ranking.is_empty() {
                println!("No engagements need attention in this selection.");
                return Ok(());
            }

            println!("Engagements needing attention:");
            for entry in output.report.priority_ranking.iter().take(limit) {
                println!(
                    "- {} ({}) priority {:.1}, sentiment {:.2}, {} day(s) stale",
                    entry.id,
                    entry.customer,
                    entry.priority_score,
                    entry.sentiment_score,
                    entry.days_stale
                );
            }
        }
        Commands::Report {
            input,
            customer,
            status,
            since_days,
            out,
        } => {
            let scope = customer
                .clone()
                .or_else(|| status.map(|s| format!("status {s}")));
            let records = load_records(&input, customer, status, since_days)?;
            let output = pipeline::run(&records, &PipelineConfig::default());
            let report = report::build_report(scope.as_deref(), &output);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn load_records(
    input: &std::path::Path,
    customer: Option<String>,
    status: Option<Status>,
    since_days: Option<i64>,
) -> anyhow::Result<Vec<RawEngagement>> {
    let records = match source::read_records(input) {
        Ok(records) => records,
        Err(err) => {
            error!(stage = %PipelineStage::Failed, error = %err, "could not read raw engagements");
            return Err(err).context("raw engagement source unavailable");
        }
    };

    let filter = source::RecordFilter {
        customer,
        status,
        since_days,
    };
    Ok(filter.apply(records))
}
