//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use cosuju_core::dataset::{self, DATASET_INFO, ExportOptions};
use cosuju_core::pipeline::{ProgressReporter, ScrapeResult};
use cosuju_shared::{AppConfig, CosujuError, ScrapeConfig, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// CoSuJu: court summaries and judgements for text summarization.
#[derive(Parser)]
#[command(
    name = "cosuju",
    version,
    about = "Scrape Constitutional Court decisions from SAFLII into a summarization dataset.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.cosuju/cosuju.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape decisions, download their documents and write data.json.
    Scrape(ScrapeArgs),

    /// Convert data.json into a JSON-lines dataset.
    Export {
        /// Scrape output to read (defaults to the configured data file).
        #[arg(long)]
        input: Option<PathBuf>,

        /// Dataset file to write.
        #[arg(long, default_value = "train.jsonl")]
        output: PathBuf,

        /// Drop decisions missing a summary or a judgement.
        #[arg(long)]
        complete_only: bool,

        /// update_date for records without one (defaults to now).
        #[arg(long)]
        update_date: Option<String>,
    },

    /// Dataset inspection.
    Dataset {
        #[command(subcommand)]
        action: DatasetAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Overrides for a scrape run. Unset flags keep the config file values.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct ScrapeArgs {
    /// First year to scrape.
    #[arg(long)]
    pub from: Option<u16>,

    /// Last year to scrape (inclusive).
    #[arg(long)]
    pub to: Option<u16>,

    /// Process at most N decisions per year.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Directory for downloaded documents.
    #[arg(long)]
    pub docs_dir: Option<PathBuf>,

    /// Where to write data.json.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Milliseconds between requests.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Abort on the first failed decision.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Dataset subcommands.
#[derive(Subcommand)]
pub(crate) enum DatasetAction {
    /// Print dataset metadata and record counts.
    Inspect {
        /// JSON-lines dataset file.
        #[arg(long)]
        input: PathBuf,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "cosuju=info",
        1 => "cosuju=debug",
        _ => "cosuju=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Scrape(args) => cmd_scrape(config_path.as_deref(), args).await,
        Command::Export {
            input,
            output,
            complete_only,
            update_date,
        } => cmd_export(config_path.as_deref(), input, &output, complete_only, update_date),
        Command::Dataset { action } => match action {
            DatasetAction::Inspect { input } => cmd_dataset_inspect(&input),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Layer command-line flags over the file configuration.
fn apply_overrides(config: &mut ScrapeConfig, args: &ScrapeArgs) {
    if let Some(from) = args.from {
        config.first_year = from;
    }
    if let Some(to) = args.to {
        config.last_year = to;
    }
    if args.limit.is_some() {
        config.max_decisions_per_year = args.limit;
    }
    if let Some(dir) = &args.docs_dir {
        config.docs_dir = dir.clone();
    }
    if let Some(out) = &args.out {
        config.data_file = out.clone();
    }
    if let Some(delay) = args.delay_ms {
        config.request_delay_ms = delay;
    }
    if args.fail_fast {
        config.continue_on_error = false;
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(config_path: Option<&Path>, args: ScrapeArgs) -> Result<()> {
    let app_config = resolve_config(config_path)?;
    let mut config = ScrapeConfig::try_from(&app_config)?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    info!(
        from = config.first_year,
        to = config.last_year,
        limit = ?config.max_decisions_per_year,
        "scraping decisions"
    );

    let reporter = CliProgress::new();
    let result = cosuju_core::pipeline::scrape(&config, &reporter).await;
    reporter.spinner.finish_and_clear();
    let result = result?;

    let stats = &result.stats;
    println!();
    println!("  Scrape complete!");
    println!("  Years:      {} ({} failed)", stats.years, stats.failed_years);
    println!(
        "  Decisions:  {} ({} skipped)",
        stats.decisions, stats.failed_decisions
    );
    println!(
        "  Documents:  {} downloaded, {} cached, {} unreadable",
        stats.documents_downloaded, stats.documents_cached, stats.documents_unreadable
    );
    println!("  Output:     {}", result.data_file.display());
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_export(
    config_path: Option<&Path>,
    input: Option<PathBuf>,
    output: &Path,
    complete_only: bool,
    update_date: Option<String>,
) -> Result<()> {
    let input = match input {
        Some(p) => p,
        None => PathBuf::from(resolve_config(config_path)?.output.data_file),
    };
    if !input.exists() {
        return Err(eyre!(
            "no scrape output at '{}'; run `cosuju scrape` first",
            input.display()
        ));
    }

    let mut opts = ExportOptions {
        complete_only,
        ..ExportOptions::default()
    };
    if let Some(date) = update_date {
        opts.fallback_update_date = date;
    }

    let summary = dataset::export_jsonl(&input, output, &opts)?;

    println!();
    println!("  Dataset exported!");
    println!("  Records:  {}", summary.written);
    if complete_only {
        println!("  Dropped:  {} incomplete", summary.dropped_incomplete);
    }
    println!("  Path:     {}", output.display());
    println!();

    Ok(())
}

fn cmd_dataset_inspect(input: &Path) -> Result<()> {
    let examples = dataset::read_examples(input)?;
    let stats = dataset::dataset_stats(&examples);

    println!();
    println!("  {} ({}) v{}", DATASET_INFO.name, DATASET_INFO.config_name, DATASET_INFO.version);
    println!("  {}", DATASET_INFO.description);
    println!("  {}", DATASET_INFO.homepage);
    println!();
    println!("  Records:          {}", stats.total);
    println!("  With summary:     {}", stats.with_summary);
    println!("  With judgement:   {}", stats.with_judgement);
    for (year, count) in &stats.per_year {
        println!("    {year}: {count}");
    }
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn year_started(&self, year: u16, decisions: usize) {
        self.spinner
            .set_message(format!("{year}: {decisions} decisions"));
    }

    fn decision_done(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Scraping [{current}/{total}] {url}"));
    }

    fn decision_failed(&self, url: &str, error: &CosujuError) {
        self.spinner.suspend(|| warn!(url, error = %error, "decision skipped"));
    }

    fn done(&self, _result: &ScrapeResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ScrapeConfig {
        ScrapeConfig::try_from(&AppConfig::default()).unwrap()
    }

    #[test]
    fn no_flags_keep_file_values() {
        let mut config = base_config();
        let before = config.clone();
        apply_overrides(&mut config, &ScrapeArgs::default());
        assert_eq!(config.first_year, before.first_year);
        assert_eq!(config.data_file, before.data_file);
        assert!(config.continue_on_error);
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = base_config();
        let args = ScrapeArgs {
            from: Some(1996),
            to: Some(1996),
            limit: Some(3),
            docs_dir: Some(PathBuf::from("/tmp/docs")),
            out: Some(PathBuf::from("/tmp/out.json")),
            delay_ms: Some(0),
            fail_fast: true,
        };
        apply_overrides(&mut config, &args);

        assert_eq!(config.years().collect::<Vec<_>>(), vec![1996]);
        assert_eq!(config.max_decisions_per_year, Some(3));
        assert_eq!(config.docs_dir, PathBuf::from("/tmp/docs"));
        assert_eq!(config.data_file, PathBuf::from("/tmp/out.json"));
        assert_eq!(config.request_delay_ms, 0);
        assert!(!config.continue_on_error);
    }

    #[test]
    fn cli_parses_scrape_flags() {
        let cli = Cli::try_parse_from([
            "cosuju", "-vv", "scrape", "--from", "1995", "--to", "1996", "--fail-fast",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Scrape(args) => {
                assert_eq!(args.from, Some(1995));
                assert_eq!(args.to, Some(1996));
                assert!(args.fail_fast);
            }
            _ => panic!("expected scrape"),
        }
    }
}
