//! Catalog-Atlas main entry point
//!
//! This is the command-line interface for the Catalog-Atlas catalog mapper.

use anyhow::{bail, Context};
use catalog_atlas::catalog::{write_genres, CatalogInputs};
use catalog_atlas::config::{load_config_with_hash, Config, ProbeKind};
use catalog_atlas::crawler::build_coordinator;
use catalog_atlas::output::{load_statistics, print_statistics};
use catalog_atlas::state::PassKind;
use catalog_atlas::store::open_store;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Atlas: a region-rotating catalog mapper
///
/// Catalog-Atlas visits a geo-restricted catalog from every configured
/// region, collecting item ids, title records and thumbnails into
/// resumable JSON state files.
#[derive(Parser, Debug)]
#[command(name = "catalog-atlas")]
#[command(version = "1.0.0")]
#[command(about = "A region-rotating catalog mapper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and inputs and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Acquire missing catalog data
    Acquire {
        /// What to acquire
        #[arg(value_enum)]
        target: AcquireTarget,

        /// Only visit this region (repeatable)
        #[arg(long = "region", value_name = "REGION")]
        regions: Vec<String>,
    },

    /// Discover the catalog's genres and write them to genres.json
    DiscoverGenres,

    /// Show statistics from the state files and exit
    Stats,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum AcquireTarget {
    Ids,
    Titles,
    Thumbnails,
    /// Ids, titles and thumbnails, in that order
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    match cli.command {
        Some(Command::Acquire { target, regions }) => {
            handle_acquire(&config, target, &regions).await
        }
        Some(Command::DiscoverGenres) => handle_discover_genres(&config).await,
        Some(Command::Stats) => handle_stats(&config),
        None => bail!("No command given, see --help"),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_atlas=info,warn"),
            1 => EnvFilter::new("catalog_atlas=debug,info"),
            2 => EnvFilter::new("catalog_atlas=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and inputs
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let inputs = CatalogInputs::load(&config.paths.input_dir)?;

    println!("=== Catalog-Atlas Dry Run ===\n");

    println!("Identity:");
    println!("  Home region: {}", config.identity.home_region);
    println!(
        "  Connect: {} (up to {} checks)",
        config.identity.connect_command.join(" "),
        config.identity.connect_attempts
    );
    println!(
        "  Disconnect: {} (up to {} checks)",
        config.identity.disconnect_command.join(" "),
        config.identity.disconnect_attempts
    );
    match config.identity.probe {
        ProbeKind::Interface => println!(
            "  Address probe: {}",
            config.identity.interface_command.join(" ")
        ),
        ProbeKind::Http => println!("  Address probe: {}", config.identity.probe_url),
    }
    println!(
        "  Known home addresses: {}",
        inputs.unaltered_addresses.len()
    );

    println!("\nBrowser:");
    println!("  Catalog: {}", config.browser.base_url);
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Window: {}x{}",
        config.browser.window_width, config.browser.window_height
    );
    println!("  Session cookies: {}", inputs.cookies.len());

    println!("\nPaths:");
    println!("  Input: {}", config.paths.input_dir.display());
    println!("  Output: {}", config.paths.output_dir.display());

    println!("\nRegions ({}):", inputs.regions.len());
    for region in &inputs.regions {
        println!("  - {}", region);
    }

    println!("\nGenres ({}):", inputs.genres.len());
    for genre in &inputs.genres {
        println!("  - {} ({})", genre.name, genre.id);
    }
    if inputs.genres.is_empty() {
        println!("  (none, run discover-genres before acquiring ids)");
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would visit {} genres in each of {} regions",
        inputs.genres.len(),
        inputs.regions.len()
    );

    Ok(())
}

/// Handles the stats command: shows statistics from the state files
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let inputs = CatalogInputs::load(&config.paths.input_dir)?;
    println!("State: {}\n", config.paths.output_dir.display());

    let store = open_store(&config.paths.output_dir)?;
    let stats = load_statistics(&store, &inputs.regions)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the discover-genres command: replaces genres.json
async fn handle_discover_genres(config: &Config) -> anyhow::Result<()> {
    let mut coordinator = build_coordinator(config)?;
    let genres = coordinator.discover_genres().await?;

    if genres.is_empty() {
        bail!("No genres found in the genre menus, genres.json left unchanged");
    }
    write_genres(&config.paths.input_dir, &genres)?;

    println!("Discovered {} genres:", genres.len());
    for genre in &genres {
        println!("  - {} ({})", genre.name, genre.id);
    }
    Ok(())
}

/// Handles the acquire command
async fn handle_acquire(
    config: &Config,
    target: AcquireTarget,
    regions: &[String],
) -> anyhow::Result<()> {
    let mut coordinator = build_coordinator(config)?.with_regions(regions)?;
    if !regions.is_empty() {
        tracing::info!("Restricted to regions: {}", regions.join(", "));
    }

    let result = match target {
        AcquireTarget::Ids => coordinator.run(PassKind::Ids).await.map(|r| vec![r]),
        AcquireTarget::Titles => coordinator.run(PassKind::Titles).await.map(|r| vec![r]),
        AcquireTarget::Thumbnails => coordinator
            .run(PassKind::Thumbnails)
            .await
            .map(|r| vec![r]),
        AcquireTarget::All => coordinator.run_all().await,
    };

    match result {
        Ok(reports) => {
            for report in &reports {
                tracing::info!("Finished {}", report);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Acquisition failed: {}", e);
            Err(e.into())
        }
    }
}
