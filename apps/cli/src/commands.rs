//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use pubwatch_core::dashboard::DashboardStats;
use pubwatch_core::{CrawlOutcome, CycleReport, Monitor, ProgressReporter, effective_rows};
use pubwatch_shared::{
    AppConfig, config_file_path, init_config, init_config_at, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pubwatch: know when the next report lands.
#[derive(Parser)]
#[command(
    name = "pubwatch",
    version,
    about = "Monitor institutional publication pages and render a release dashboard.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.pubwatch/pubwatch.toml).
    #[arg(long, global = true, env = "PUBWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
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
    /// Run one crawl cycle and regenerate the dashboard.
    Run,

    /// Run a cycle now, then every day at the scheduled time.
    Watch,

    /// Regenerate the dashboard from stored data without crawling.
    Render,

    /// Show monitored publications and their stored state.
    Status,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
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
        0 => "pubwatch=info",
        1 => "pubwatch=debug",
        _ => "pubwatch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run => cmd_run(config_path).await,
        Command::Watch => cmd_watch(config_path).await,
        Command::Render => cmd_render(config_path),
        Command::Status => cmd_status(config_path),
        Command::Config { action } => match action {
            ConfigAction::Init { force } => cmd_config_init(config_path, force),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load from `--config` if given, otherwise the default location.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: Option<&Path>) -> Result<()> {
    let mut monitor = Monitor::new(resolve_config(config_path)?)?;
    info!(
        institutions = monitor.config().institutions.len(),
        "running crawl cycle"
    );

    let report = monitor.run_cycle(&CliProgress::new()).await;
    print_report(&report);

    if report.dashboard.is_none() {
        return Err(eyre!("cycle finished but the dashboard was not rendered; see log"));
    }
    Ok(())
}

async fn cmd_watch(config_path: Option<&Path>) -> Result<()> {
    let mut monitor = Monitor::new(resolve_config(config_path)?)?;
    let schedule = &monitor.config().schedule;
    println!(
        "Watching {} publications, daily at {} ({}). Press Ctrl-C to stop.",
        monitor.config().institutions.len(),
        schedule.time,
        schedule.timezone
    );

    let progress = CliProgress::new();
    tokio::select! {
        result = monitor.watch(&progress) => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupted, stopping scheduler");
        }
    }
    Ok(())
}

fn cmd_render(config_path: Option<&Path>) -> Result<()> {
    let monitor = Monitor::new(resolve_config(config_path)?)?;
    let path = monitor.render_dashboard()?;
    println!("Dashboard written to {}", path.display());
    Ok(())
}

fn cmd_status(config_path: Option<&Path>) -> Result<()> {
    let monitor = Monitor::new(resolve_config(config_path)?)?;
    let config = monitor.config();
    let store = monitor.store();

    println!("  Data file: {} ({} records)", store.path().display(), store.len());
    println!();

    let rows = effective_rows(&config.institutions, store);
    for (inst, row) in config.institutions.iter().zip(&rows) {
        let crawled = store
            .get(&inst.key())
            .map(|r| r.last_crawled.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".into());
        println!("  {:>2}. {} / {}", inst.id, row.institution, row.publication);
        println!("      Next:      {}", or_dash(&row.predicted_next));
        println!("      Last:      {}", or_dash(&row.last_published));
        println!("      Title:     {}", or_dash(&row.last_title));
        println!("      Crawled:   {crawled}");
    }

    let stats = DashboardStats::from_rows(&rows);
    println!();
    println!(
        "  {} total, {} crawled, {} pending, {} irregular",
        stats.total, stats.crawled, stats.pending, stats.irregular
    );
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    if path.exists() && !force {
        return Err(eyre!(
            "config file already exists at '{}' (use --force to overwrite)",
            path.display()
        ));
    }

    match config_path {
        Some(p) => init_config_at(p)?,
        None => {
            init_config()?;
        }
    }
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn print_report(report: &CycleReport) {
    println!();
    println!("  Crawl cycle complete");
    println!("  Cycle:     {}", report.cycle_id);
    println!("  Found:     {}", report.succeeded);
    println!("  Not found: {}", report.not_found);
    println!("  Failed:    {}", report.failed);
    if let Some(path) = &report.dashboard {
        println!("  Dashboard: {}", path.display());
    }
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// CLI progress reporter using an indicatif bar, one per cycle.
struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                f(bar);
            }
        }
    }
}

impl ProgressReporter for CliProgress {
    fn cycle_started(&self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_strings(SPINNER_TICKS),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn institution_started(&self, key: &str, _current: usize, _total: usize) {
        self.with_bar(|bar| bar.set_message(format!("Crawling {key}")));
    }

    fn institution_finished(&self, key: &str, outcome: &CrawlOutcome) {
        self.with_bar(|bar| {
            match outcome {
                CrawlOutcome::Updated(record) => {
                    bar.println(format!("  ✓ {key}: {}", record.last_title));
                }
                CrawlOutcome::NotFound => bar.println(format!("  - {key}: no match")),
                CrawlOutcome::Failed(e) => bar.println(format!("  ✗ {key}: {e}")),
            }
            bar.inc(1);
        });
    }

    fn done(&self, _report: &CycleReport) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}
