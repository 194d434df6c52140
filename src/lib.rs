pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod search;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use catalog::{CatalogSource, HttpCatalog};
use config::EngineConfig;
use error::{FetchError, ResolveError};
use model::types::{Module, Resolution};
use render::{RenderOptions, SearchReport};
use search::{MatcherKind, Resolver};

pub const EXIT_FOUND: i32 = 0;
pub const EXIT_NOT_FOUND: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_FETCH: i32 = 3;
pub const EXIT_INTERNAL: i32 = 4;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "limoka",
    version,
    about = "Find the best-matching module in the Limoka catalog"
)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Where to read the catalog from.
#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// Read the catalog from a JSON file instead of the network
    #[arg(long, conflicts_with = "url")]
    pub catalog: Option<PathBuf>,

    /// Catalog API root
    #[arg(long)]
    pub url: Option<String>,

    /// Catalog request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a query to the best-matching module
    Search {
        /// Search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,

        /// Matching strategy
        #[arg(long, value_enum)]
        matcher: Option<MatcherKind>,

        /// Command prefix used when listing commands
        #[arg(long)]
        prefix: Option<String>,

        /// Emit a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the flattened search documents as JSON lines
    IndexDump {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Show version and build information
    Version {
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

impl Cli {
    pub fn color_enabled(&self) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                dotenvy::var("NO_COLOR").is_err() && std::io::stdout().is_terminal()
            }
        }
    }
}

/// Run the CLI and return the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    let color = cli.color_enabled();
    colored::control::set_override(color);

    match cli.command {
        Commands::Search {
            query,
            source,
            matcher,
            prefix,
            json,
        } => {
            let mut cfg = EngineConfig::load(cli.config.as_deref())?;
            if let Some(kind) = matcher {
                cfg.matcher = kind;
            }
            if let Some(prefix) = prefix {
                cfg.prefix = prefix;
            }
            run_search(cfg, query.join(" "), &source, json, color).await
        }
        Commands::IndexDump { source } => {
            let cfg = EngineConfig::load(cli.config.as_deref())?;
            let modules = fetch_catalog(&catalog_source(&cfg, &source)).await?;
            let mut out = std::io::stdout().lock();
            for doc in search::flatten(&modules) {
                writeln!(out, "{}", serde_json::to_string(&doc)?)?;
            }
            Ok(EXIT_FOUND)
        }
        Commands::Version { json } => {
            print_version(json)?;
            Ok(EXIT_FOUND)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "limoka", &mut std::io::stdout());
            Ok(EXIT_FOUND)
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(EXIT_FOUND)
        }
    }
}

fn catalog_source(cfg: &EngineConfig, args: &SourceArgs) -> CatalogSource {
    if let Some(path) = &args.catalog {
        return CatalogSource::File(path.clone());
    }
    let url = args.url.clone().unwrap_or_else(|| cfg.catalog_url.clone());
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| cfg.timeout());
    CatalogSource::Http(HttpCatalog::new(url, timeout))
}

async fn fetch_catalog(source: &CatalogSource) -> Result<Vec<Module>> {
    source
        .fetch_all()
        .await
        .with_context(|| format!("loading catalog from {}", source.describe()))
}

async fn run_search(
    cfg: EngineConfig,
    query: String,
    source: &SourceArgs,
    json: bool,
    color: bool,
) -> Result<i32> {
    let matcher = cfg.matcher.as_str();
    let opts = RenderOptions {
        prefix: cfg.prefix.clone(),
        color,
        download_base: match source.catalog {
            Some(_) => None,
            None => Some(source.url.clone().unwrap_or_else(|| cfg.catalog_url.clone())),
        },
        ..RenderOptions::default()
    };

    // A blank query never reaches the network.
    if search::canonicalize::is_blank(&query) {
        return report_resolve_error(&query, matcher, &ResolveError::EmptyQuery, json, &opts);
    }

    let catalog = catalog_source(&cfg, source);
    let modules = fetch_catalog(&catalog).await?;
    let resolver = Resolver::from_kind(cfg.matcher, cfg.staged.clone(), cfg.scored.clone());
    debug!(matcher, modules = modules.len(), "search_start");

    let (query, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = resolver.resolve(&query, &modules);
        (query, outcome)
    })
    .await
    .context("resolver task panicked")?;

    let resolution = match outcome {
        Ok(res) => res,
        Err(e) => return report_resolve_error(&query, matcher, &e, json, &opts),
    };

    // The listing is a summary; the winner is re-read in full by id.
    let module = match resolution.module_id() {
        Some(id) => Some(
            catalog
                .fetch_module(id)
                .await
                .with_context(|| format!("fetching module {id} from {}", catalog.describe()))?,
        ),
        None => None,
    };
    let module = module.as_ref();

    let mut out = std::io::stdout().lock();
    if json {
        let report = SearchReport::from_resolution(&query, matcher, &resolution, module);
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        match (&resolution, module) {
            (Resolution::Found(found), Some(module)) => {
                write!(out, "{}", render::render_found(module, &query, found, &opts))?;
            }
            _ => write!(out, "{}", render::render_not_found(&opts))?,
        }
    }

    Ok(if resolution.is_found() {
        EXIT_FOUND
    } else {
        EXIT_NOT_FOUND
    })
}

fn report_resolve_error(
    query: &str,
    matcher: &'static str,
    err: &ResolveError,
    json: bool,
    opts: &RenderOptions,
) -> Result<i32> {
    if json {
        let report = SearchReport::error(query, matcher, err.to_string());
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprint!("{}", render::render_resolve_error(err, opts));
    }
    Ok(exit_code_for_resolve(err))
}

fn exit_code_for_resolve(err: &ResolveError) -> i32 {
    match err {
        ResolveError::EmptyQuery | ResolveError::EmptyCatalog | ResolveError::MalformedQuery(_) => {
            EXIT_USAGE
        }
        ResolveError::IndexBuild(_) | ResolveError::Cancelled => EXIT_INTERNAL,
    }
}

/// Exit code for an error that escaped [`run`].
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<FetchError>().is_some() {
        EXIT_FETCH
    } else if let Some(e) = err.downcast_ref::<ResolveError>() {
        exit_code_for_resolve(e)
    } else if err.downcast_ref::<config::ConfigError>().is_some() {
        EXIT_USAGE
    } else {
        EXIT_INTERNAL
    }
}

fn print_version(json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let built = option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown");
    let target = option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown");
    if json {
        let value = serde_json::json!({
            "name": "limoka",
            "version": version,
            "build_timestamp": built,
            "target": target,
        });
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("limoka {version} ({target}, built {built})");
    }
    Ok(())
}
