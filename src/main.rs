//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `song_metrics` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use song_metrics::config::{CSV_BASE_DIR, DB_PATH, DEFAULT_WEBDRIVER_URL};
use song_metrics::export::export_csv;
use song_metrics::initialization::init_logger_with;
use song_metrics::storage::{init_db_pool_with_path, query_active_targets};
use song_metrics::{load_targets, run_crawl, Config, LogFormat, LogLevel, Platform};

#[derive(Debug, Parser)]
#[command(name = "song_metrics", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search every target and store today's metrics
    Crawl(CrawlArgs),
    /// Append stored records to a destination's CSV files
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct CrawlArgs {
    /// CSV file with columns song_identity,platform,artist,title,url
    #[arg(required_unless_present = "from_db", conflicts_with = "from_db")]
    targets: Option<PathBuf>,

    /// Read targets from the song catalog tables instead of a file
    #[arg(long)]
    from_db: bool,

    /// Date whose active crawling periods select catalog targets (default: today)
    #[arg(long, requires = "from_db")]
    date: Option<NaiveDate>,

    /// Only crawl this platform
    #[arg(long, value_enum)]
    platform: Option<Platform>,

    /// Independent browser sessions per platform
    #[arg(long, default_value_t = 1)]
    sessions: usize,

    /// Export destination (company / service); enables CSV export after the crawl
    #[arg(long)]
    export_destination: Option<String>,

    /// Base directory for CSV exports
    #[arg(long, default_value = CSV_BASE_DIR)]
    export_dir: PathBuf,

    /// W3C WebDriver endpoint
    #[arg(long, env = "WEBDRIVER_URL", default_value = DEFAULT_WEBDRIVER_URL)]
    webdriver_url: String,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Destination (company / service) folder name
    #[arg(long)]
    destination: String,

    /// Only export this platform (default: all)
    #[arg(long, value_enum)]
    platform: Option<Platform>,

    /// Only records extracted on or after this date
    #[arg(long)]
    since: Option<NaiveDate>,

    /// Base directory for CSV exports
    #[arg(long, default_value = CSV_BASE_DIR)]
    export_dir: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// SQLite database path
    #[arg(long, env = "SONG_METRICS_DB_PATH", default_value = DB_PATH)]
    db_path: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env from the current directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Crawl(args) => crawl(args).await,
        Command::Export(args) => export(args).await,
    };

    if let Err(e) = result {
        eprintln!("song_metrics error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn crawl(args: CrawlArgs) -> Result<()> {
    init_logger_with(args.common.log_level.clone().into(), args.common.log_format.clone())
        .context("Failed to initialize logger")?;

    let today = chrono::Local::now().date_naive();
    let mut targets = if args.from_db {
        let pool = init_db_pool_with_path(&args.common.db_path)
            .await
            .context("Failed to initialize database pool")?;
        song_metrics::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        let targets = query_active_targets(&pool, args.date.unwrap_or(today), args.platform)
            .await
            .context("Failed to read active songs")?;
        pool.close().await;
        targets
    } else {
        let Some(path) = args.targets.as_ref() else {
            bail!("a targets file or --from-db is required");
        };
        load_targets(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    if let Some(platform) = args.platform {
        targets.retain(|target| target.platform == platform);
    }
    if targets.is_empty() {
        println!("No targets to crawl");
        return Ok(());
    }

    let config = Config {
        log_level: args.common.log_level,
        log_format: args.common.log_format,
        db_path: args.common.db_path,
        webdriver_url: args.webdriver_url,
        headless: !args.headed,
        sessions: args.sessions.max(1),
        export_destination: args.export_destination,
        export_dir: args.export_dir,
        ..Default::default()
    };

    let report = run_crawl(&config, targets, today).await?;
    println!(
        "✅ Crawled {} target{} in {:.1}s: {} stored ({} new, {} updated), {} not found, {} rejected, {} failed",
        report.total,
        if report.total == 1 { "" } else { "s" },
        report.elapsed_seconds,
        report.persisted,
        report.created,
        report.updated,
        report.not_found,
        report.rejected,
        report.failed
    );
    println!("Results saved in {}", config.db_path.display());
    Ok(())
}

async fn export(args: ExportArgs) -> Result<()> {
    init_logger_with(args.common.log_level.clone().into(), args.common.log_format.clone())
        .context("Failed to initialize logger")?;

    let platforms = match args.platform {
        Some(platform) => vec![platform],
        None => vec![Platform::Genie, Platform::YoutubeMusic, Platform::Youtube],
    };
    let mut exported = 0;
    for platform in platforms {
        exported += export_csv(
            &args.common.db_path,
            &args.export_dir,
            &args.destination,
            platform,
            args.since,
        )
        .await
        .with_context(|| format!("Failed to export {platform} records"))?;
    }
    println!(
        "Exported {} record{} to {}",
        exported,
        if exported == 1 { "" } else { "s" },
        args.export_dir.display()
    );
    Ok(())
}
