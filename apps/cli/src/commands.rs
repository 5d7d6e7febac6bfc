//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use bookmarkprep_core::pipeline::{
    self, DistillConfig, DistillResult, ProgressReporter, SplitConfig, SplitResult, WrittenBatch,
};
use bookmarkprep_core::stats::{CollectionStats, load_stats};
use bookmarkprep_shared::{AppConfig, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// bookmarkprep: prepare bookmark exports for categorization.
#[derive(Parser)]
#[command(
    name = "bookmarkprep",
    version,
    about = "Distill exported bookmarks to a minimal schema and split them into batches.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.bookmarkprep/bookmarkprep.toml).
    #[arg(long, global = true, env = "BOOKMARKPREP_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Distill a raw bookmark export into the canonical collection.
    Distill(DistillArgs),

    /// Split a distilled collection into numbered batch files.
    Split {
        /// Distilled collection to split.
        #[arg(short, long, env = "BOOKMARKPREP_DISTILLED_FILE")]
        input: Option<PathBuf>,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Distill, then split the distilled collection.
    Run {
        #[command(flatten)]
        distill: DistillArgs,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Summarize a distilled collection.
    Stats {
        /// Distilled collection to inspect.
        #[arg(short, long, env = "BOOKMARKPREP_DISTILLED_FILE")]
        input: Option<PathBuf>,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Distiller input/output overrides.
#[derive(Args)]
pub(crate) struct DistillArgs {
    /// Raw bookmark export.
    #[arg(short, long, env = "BOOKMARKPREP_EXPORT_FILE")]
    input: Option<PathBuf>,

    /// Destination of the distilled collection.
    #[arg(short, long, env = "BOOKMARKPREP_DISTILLED_FILE")]
    output: Option<PathBuf>,
}

/// Batcher overrides.
#[derive(Args)]
pub(crate) struct BatchArgs {
    /// Directory receiving batch files.
    #[arg(long, env = "BOOKMARKPREP_BATCH_DIR")]
    out_dir: Option<PathBuf>,

    /// Maximum records per batch.
    #[arg(short, long, env = "BOOKMARKPREP_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Batch file name prefix.
    #[arg(long, env = "BOOKMARKPREP_FILE_PREFIX")]
    prefix: Option<String>,

    /// Skip writing the batch manifest.
    #[arg(long)]
    no_manifest: bool,
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

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "bookmarkprep=info",
        1 => "bookmarkprep=debug",
        _ => "bookmarkprep=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
pub(crate) fn run(cli: Cli) -> Result<()> {
    let Cli {
        config, command, ..
    } = cli;
    let config_path = config.as_deref();

    match command {
        Command::Distill(args) => cmd_distill(&resolve_config(config_path)?, &args).map(|_| ()),
        Command::Split { input, batch } => cmd_split(&resolve_config(config_path)?, input, &batch),
        Command::Run { distill, batch } => {
            cmd_run(&resolve_config(config_path)?, &distill, &batch)
        }
        Command::Stats { input, json } => cmd_stats(&resolve_config(config_path)?, input, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config file named on the command line, or the default one.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn distill_config(config: &AppConfig, args: &DistillArgs) -> DistillConfig {
    DistillConfig {
        input: args
            .input
            .clone()
            .unwrap_or_else(|| config.paths.export_file.clone()),
        output: args
            .output
            .clone()
            .unwrap_or_else(|| config.paths.distilled_file.clone()),
    }
}

fn split_config(config: &AppConfig, input: PathBuf, args: &BatchArgs) -> SplitConfig {
    let mut batching = config.batching.clone();
    if let Some(size) = args.batch_size {
        batching.batch_size = size;
    }
    if let Some(prefix) = &args.prefix {
        batching.file_prefix = prefix.clone();
    }
    if args.no_manifest {
        batching.write_manifest = false;
    }

    SplitConfig {
        input,
        out_dir: args
            .out_dir
            .clone()
            .unwrap_or_else(|| config.paths.batch_dir.clone()),
        batching,
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_distill(config: &AppConfig, args: &DistillArgs) -> Result<DistillResult> {
    let distill = distill_config(config, args);
    info!(
        input = %distill.input.display(),
        output = %distill.output.display(),
        "distilling bookmark export"
    );

    let reporter = CliProgress::new();
    let result = pipeline::distill(&distill, &reporter)?;

    println!("Distilled {} tweets", result.record_count);
    println!("Original size: {} bytes", group_thousands(result.original_bytes));
    println!("Distilled size: {} bytes", group_thousands(result.distilled_bytes));
    println!("Reduction: {:.1}%", result.reduction_pct());
    println!("Output: {}", result.output.display());

    Ok(result)
}

fn cmd_split(config: &AppConfig, input: Option<PathBuf>, args: &BatchArgs) -> Result<()> {
    let input = input.unwrap_or_else(|| config.paths.distilled_file.clone());
    let split = split_config(config, input, args);
    info!(
        input = %split.input.display(),
        out_dir = %split.out_dir.display(),
        batch_size = split.batching.batch_size,
        "splitting distilled collection"
    );

    let reporter = CliProgress::new();
    let result = pipeline::split(&split, &reporter)?;
    print_split_summary(&result);

    Ok(())
}

fn cmd_run(config: &AppConfig, distill: &DistillArgs, batch: &BatchArgs) -> Result<()> {
    let distilled = cmd_distill(config, distill)?;
    println!();
    cmd_split(config, Some(distilled.output), batch)
}

fn cmd_stats(config: &AppConfig, input: Option<PathBuf>, json: bool) -> Result<()> {
    let input = input.unwrap_or_else(|| config.paths.distilled_file.clone());
    info!(input = %input.display(), "summarizing distilled collection");

    let stats = load_stats(&input)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&input, &stats);
    }

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_split_summary(result: &SplitResult) {
    println!(
        "Split {} tweets into batches of {}",
        result.total_records, result.batch_size
    );
    println!("Total batches: {}", result.batches.len());
    for batch in &result.batches {
        println!(
            "  Batch {:02}: {} tweets -> {}",
            batch.index,
            batch.records,
            batch.path.display()
        );
    }
    if !result.removed_stale.is_empty() {
        println!(
            "Removed {} batch files left over from an earlier run",
            result.removed_stale.len()
        );
    }
    if let Some(manifest) = &result.manifest {
        println!("Manifest: {}", manifest.display());
    }
    println!(
        "\nDone! Created {} batch files in {} ({:.1}s)",
        result.batches.len(),
        result.out_dir.display(),
        result.elapsed.as_secs_f64()
    );
}

fn print_stats(input: &Path, stats: &CollectionStats) {
    println!("Collection: {}", input.display());
    println!("  Total:        {}", stats.total);
    println!("  Images:       {}", stats.images);
    println!("  Videos:       {}", stats.videos);
    println!("  Text only:    {}", stats.text_only);
    println!("  With note:    {}", stats.with_note);
    println!("  Video URLs:   {}", stats.with_video_url);
    println!("  Categorized:  {}", stats.categorized);
    if let (Some(first), Some(last)) = (&stats.earliest_bookmark, &stats.latest_bookmark) {
        println!("  Bookmarked:   {first} .. {last}");
    }
}

/// Format `n` with `,` between groups of three digits.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
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
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn batch_written(&self, batch: &WrittenBatch, total: usize) {
        self.spinner.set_message(format!(
            "Writing [{}/{total}] {}",
            batch.index,
            batch.path.display()
        ));
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "bookmarkprep",
            "split",
            "--input",
            "in.json",
            "--out-dir",
            "out",
            "--batch-size",
            "10",
            "--prefix",
            "chunk",
            "--no-manifest",
        ]);
        let Command::Split { input, batch } = cli.command else {
            panic!("expected split");
        };

        let split = split_config(&AppConfig::default(), input.unwrap(), &batch);
        assert_eq!(split.input, PathBuf::from("in.json"));
        assert_eq!(split.out_dir, PathBuf::from("out"));
        assert_eq!(split.batching.batch_size, 10);
        assert_eq!(split.batching.file_prefix, "chunk");
        assert!(!split.batching.write_manifest);
    }

    #[test]
    fn config_fills_missing_flags() {
        let args = BatchArgs {
            out_dir: None,
            batch_size: None,
            prefix: None,
            no_manifest: false,
        };
        let split = split_config(&AppConfig::default(), PathBuf::from("d.json"), &args);
        assert_eq!(split.out_dir, PathBuf::from("data/distilled/batches"));
        assert_eq!(split.batching.batch_size, 50);
        assert!(split.batching.write_manifest);

        let distill = distill_config(
            &AppConfig::default(),
            &DistillArgs {
                input: None,
                output: Some(PathBuf::from("custom.json")),
            },
        );
        assert_eq!(distill.input, PathBuf::from("data/exports/bookmarks.json"));
        assert_eq!(distill.output, PathBuf::from("custom.json"));
    }
}
