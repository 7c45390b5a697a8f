//! # Course Discovery CLI (`courses`)
//!
//! ## Usage
//!
//! ```bash
//! courses --config ./config/courses.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `courses init` | Create the SQLite database and run schema migrations |
//! | `courses seed` | Upsert the static dataset into the primary store |
//! | `courses sync` | Force a refresh of external catalogs |
//! | `courses sources` | List external providers and their status |
//! | `courses search [QUERY]` | Ranked search over the merged catalog |
//! | `courses get <slug>` | Show one course by slug or id |
//! | `courses serve` | Start the HTTP server |
//!
//! Logs go to stderr; set `RUST_LOG` (e.g. `RUST_LOG=course_discovery=debug`)
//! to change verbosity.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use course_discovery::config::{self, Config};
use course_discovery::search::SearchArgs;
use course_discovery::service::CourseService;
use course_discovery::{get, migrate, search, server, sources, sync};

/// Course discovery: merged in-house and third-party course catalogs with
/// fuzzy, ranked search.
#[derive(Parser)]
#[command(
    name = "courses",
    about = "Course discovery: merged course catalogs with fuzzy, ranked search",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/courses.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file with the `courses` and
    /// `external_cache` tables. Safe to run repeatedly.
    Init,

    /// Load the static dataset into the primary store.
    ///
    /// Requires `[store].enabled = true`. Courses are keyed by id, else slug;
    /// existing rows are replaced.
    Seed,

    /// Refresh external catalogs now, bypassing the cache TTL.
    Sync,

    /// List external providers and whether they are enabled.
    Sources,

    /// Search the merged catalog.
    ///
    /// Without a query, courses are ordered by rating and review volume.
    #[command(group(ArgGroup::new("pricing").args(["free", "paid"])))]
    Search {
        /// Search text. Supports extended syntax: `'exact`, `^prefix`,
        /// `suffix$`, `!exclude`, `a | b`.
        query: Option<String>,

        /// Only courses in this category (exact match).
        #[arg(long)]
        category: Option<String>,

        /// Only courses at this level (exact match).
        #[arg(long)]
        level: Option<String>,

        /// Only free courses.
        #[arg(long)]
        free: bool,

        /// Only paid courses.
        #[arg(long)]
        paid: bool,

        /// Page number, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Results per page. Defaults to `[search].default_per_page`.
        #[arg(long)]
        per_page: Option<usize>,

        /// Multiplier applied to free courses' scores.
        #[arg(long)]
        free_boost: Option<f64>,
    },

    /// Show one course by slug or id.
    Get {
        /// Course slug or id.
        slug: String,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 1)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg: Config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_default()?,
    };

    if let Commands::Init = cli.command {
        migrate::run_migrations(&cfg).await?;
        println!("Database initialized successfully.");
        return Ok(());
    }

    let service = Arc::new(CourseService::from_config(&cfg).await?);

    let result = match cli.command {
        Commands::Init => Ok(()),
        Commands::Seed => sync::run_seed(&service).await,
        Commands::Sync => sync::run_sync(&service).await,
        Commands::Sources => sources::list_sources(&service),
        Commands::Search {
            query,
            category,
            level,
            free,
            paid,
            page,
            per_page,
            free_boost,
        } => {
            let is_free = match (free, paid) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let args = SearchArgs {
                query: query.unwrap_or_default(),
                category,
                level,
                is_free,
                page,
                per_page: per_page.unwrap_or(0),
                free_boost,
            };
            search::run_search(&service, args).await
        }
        Commands::Get { slug } => get::run_get(&service, &slug).await,
        Commands::Serve => server::run_server(&cfg, service.clone()).await,
    };

    service.close().await;
    result
}
