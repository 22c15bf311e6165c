use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use canvass::config::AnalysisConfig;
use canvass::corpus::Schema;
use canvass::input;
use canvass::report::terminal;

/// Canvass: open-text survey analytics.
///
/// Finds the topics respondents talk about, how they feel about them, and
/// which groups of respondents answer alike.
#[derive(Parser)]
#[command(name = "canvass", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis over a CSV file of survey responses
    Analyze {
        /// CSV file with a header row
        #[arg(long)]
        input: PathBuf,

        /// Free-text column(s); repeat for several
        #[arg(long = "text", required = true)]
        text: Vec<String>,

        /// Structured attribute column(s) to summarize per cluster
        #[arg(long = "attribute")]
        attributes: Vec<String>,

        /// Number of topics (default: CANVASS_TOPICS or 5)
        #[arg(long)]
        topics: Option<usize>,

        /// Number of clusters (default: CANVASS_CLUSTERS or 4)
        #[arg(long)]
        clusters: Option<usize>,

        /// Seed for topic and cluster fitting (default: CANVASS_SEED or 42)
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for report.json and corpus.json
        #[arg(long)]
        output: Option<PathBuf>,

        /// Hide progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// List the columns of a CSV file and what their values look like
    Schema {
        /// CSV file with a header row
        #[arg(long)]
        input: PathBuf,
    },

    /// Score the sentiment of a single text
    Sentiment {
        /// Text to score
        #[arg(long)]
        text: String,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("canvass=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            text,
            attributes,
            topics,
            clusters,
            seed,
            output,
            no_progress,
        } => {
            let mut config = AnalysisConfig::load()?;
            if let Some(n) = topics {
                config.topics.n_topics = n;
            }
            if let Some(k) = clusters {
                config.clusters.n_clusters = k;
            }
            if let Some(s) = seed {
                config.set_seed(s);
            }
            if no_progress {
                config.show_progress = false;
            }

            let table = input::read_csv(&input)?;
            info!(
                rows = table.records.len(),
                columns = table.columns.len(),
                "Loaded survey responses"
            );
            println!(
                "Analyzing {} responses from {}...",
                table.records.len(),
                input.display()
            );

            let schema = Schema::new(text).with_attributes(attributes);
            let analysis = config.build_analysis()?;
            let (corpus, result) = analysis
                .run_records(schema, &table.records)
                .context("analysis failed")?;

            terminal::display_report(&result.report);

            if let Some(dir) = output {
                write_outputs(&dir, &result.report, &result.corpus_table(&corpus))?;
                println!(
                    "\n{}",
                    format!("Wrote report.json and corpus.json to {}", dir.display()).bold()
                );
            }
        }

        Commands::Schema { input } => {
            let table = input::read_csv(&input)?;
            let profiles = input::profile_columns(&table);
            terminal::display_schema(&profiles);
            println!(
                "\n{}",
                "Pass text columns with --text and numeric ones with --attribute.".dimmed()
            );
        }

        Commands::Sentiment { text } => {
            let config = AnalysisConfig::load()?;
            let scorer = config.scorer()?;
            let result = scorer.score_document(&text);
            terminal::display_document_sentiment(&text, &result);
        }
    }

    Ok(())
}

fn write_outputs(
    dir: &Path,
    report: &canvass::report::AnalysisReport,
    table: &canvass::report::CorpusTable,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let report_path = dir.join("report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    let corpus_path = dir.join("corpus.json");
    std::fs::write(&corpus_path, serde_json::to_string_pretty(table)?)
        .with_context(|| format!("failed to write {}", corpus_path.display()))?;

    info!(dir = %dir.display(), "Wrote outputs");
    Ok(())
}
