//! CLI command definitions, routing, and tracing setup.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use blockscribe_client::HttpDocumentApi;
use blockscribe_crawler::{CrawlOptions, Crawler, StreamSummary};
use blockscribe_shared::{AppConfig, init_config, load_config, resolve_token};

use crate::output::{PageWriter, StopPolicy, spinner};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Blockscribe: export document workspace pages as Markdown.
#[derive(Parser)]
#[command(
    name = "blockscribe",
    version,
    about = "Stream pages from a document workspace and render them as Markdown.",
    long_about = None,
)]
pub(crate) struct Cli {
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

/// Flags shared by the streaming commands.
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct StreamArgs {
    /// Only pages edited at or after this instant (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,

    /// Stop after this many pages.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Stop at the first error instead of reporting it and moving on.
    #[arg(long)]
    pub fail_fast: bool,
}

impl StreamArgs {
    fn since(&self) -> DateTime<Utc> {
        self.since.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    fn policy(&self) -> StopPolicy {
        StopPolicy {
            limit: self.limit,
            fail_fast: self.fail_fast,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Stream the pages of a database edited since a cutoff.
    Query {
        /// Database ID.
        database_id: String,

        #[command(flatten)]
        stream: StreamArgs,
    },

    /// Walk a page and its child pages.
    Crawl {
        /// Root page ID.
        page_id: String,

        #[command(flatten)]
        stream: StreamArgs,

        /// Only the root page; do not follow child pages.
        #[arg(long)]
        no_recursive: bool,

        /// Deepest child-page level to visit (0 = unlimited).
        #[arg(long)]
        max_depth: Option<u32>,
    },

    /// Print metadata for a page or database.
    Info {
        #[command(subcommand)]
        target: InfoTarget,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Metadata lookups.
#[derive(Subcommand)]
pub(crate) enum InfoTarget {
    /// Page ID, title, and URL.
    Page { id: String },
    /// Database ID, title, and URL.
    Database { id: String },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

/// Accept a full RFC 3339 timestamp or a bare date (midnight UTC).
fn parse_since(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("'{raw}' is neither an RFC 3339 timestamp nor YYYY-MM-DD"))
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// the rendered Markdown.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "blockscribe=info",
        1 => "blockscribe=debug",
        _ => "blockscribe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Query {
            database_id,
            stream,
        } => cmd_query(&database_id, &stream).await,
        Command::Crawl {
            page_id,
            stream,
            no_recursive,
            max_depth,
        } => cmd_crawl(&page_id, &stream, no_recursive, max_depth).await,
        Command::Info { target } => match target {
            InfoTarget::Page { id } => cmd_info_page(&id).await,
            InfoTarget::Database { id } => cmd_info_database(&id).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Build a crawler over the HTTP adapter, cancelled on Ctrl-C.
fn connect(config: &AppConfig) -> Result<Crawler> {
    let token = resolve_token(&config.api)?;
    let api = HttpDocumentApi::new(&config.api, token)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling outstanding requests");
            on_signal.cancel();
        }
    });

    Ok(Crawler::new(Arc::new(api)).with_cancellation(cancel))
}

fn report<W: Write>(summary: &StreamSummary, writer: PageWriter<W>, fail_fast: bool) -> Result<()> {
    info!(
        pages = writer.written(),
        errors = writer.failed(),
        stopped = summary.stopped_by_consumer,
        "stream finished"
    );
    let failed = writer.failed();
    match writer.finish() {
        Err(e) => Err(eyre!(e).wrap_err("failed to write output")),
        Ok(Some(e)) if fail_fast => Err(eyre!(e).wrap_err("stopped at first error")),
        Ok(Some(_)) => {
            eprintln!("{failed} page(s) failed; see errors above");
            Ok(())
        }
        Ok(None) => Ok(()),
    }
}

async fn cmd_query(database_id: &str, args: &StreamArgs) -> Result<()> {
    let config = load_config()?;
    let crawler = connect(&config)?;
    let since = args.since();

    info!(database_id, since = %since, "querying database");

    let mut writer = PageWriter::new(io::stdout(), args.policy(), spinner("query"));
    let summary = crawler
        .query_database(database_id, since, |item| writer.accept(item))
        .await;

    match summary {
        Ok(summary) => report(&summary, writer, args.fail_fast),
        Err(e) => {
            let _ = writer.finish();
            Err(e.into())
        }
    }
}

async fn cmd_crawl(
    page_id: &str,
    args: &StreamArgs,
    no_recursive: bool,
    max_depth: Option<u32>,
) -> Result<()> {
    let config = load_config()?;
    let crawler = connect(&config)?;

    let mut options = CrawlOptions::from_defaults(args.since(), &config.crawl);
    if no_recursive {
        options = options.recursive(false);
    }
    if let Some(depth) = max_depth {
        options = options.max_depth(depth);
    }

    info!(
        page_id,
        since = %options.since,
        recursive = options.recursive,
        max_depth = options.max_depth,
        "crawling page graph"
    );

    let mut writer = PageWriter::new(io::stdout(), args.policy(), spinner("crawl"));
    let summary = crawler
        .crawl_pages(page_id, &options, |item| writer.accept(item))
        .await;

    match summary {
        Ok(summary) => report(&summary, writer, args.fail_fast),
        Err(e) => {
            let _ = writer.finish();
            Err(e.into())
        }
    }
}

async fn cmd_info_page(id: &str) -> Result<()> {
    let config = load_config()?;
    let crawler = connect(&config)?;
    let meta = crawler.page_metadata(id).await?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

async fn cmd_info_database(id: &str) -> Result<()> {
    let config = load_config()?;
    let crawler = connect(&config)?;
    let meta = crawler.database_metadata(id).await?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
