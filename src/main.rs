use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use eyre::{eyre, WrapErr};
use log::*;
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};

use episodes_tracker::address::Router;
use episodes_tracker::aggregate::EpisodeAggregator;
use episodes_tracker::catalog::{self, Catalog};
use episodes_tracker::config::{Config, Preferences};
use episodes_tracker::db::Database;
use episodes_tracker::filter::{filter_shows, ShowsFilter};
use episodes_tracker::interface;

/// Track the TV shows you follow and the episodes you have seen
#[derive(Parser)]
#[command(name = "episodes-tracker", version)]
#[command(about = "Track TV shows and watched episodes", long_about = None)]
struct Cli {
    /// Log level written to the log file (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log: Option<LevelFilter>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse shows in the terminal (default)
    Tui,
    /// Import shows and episodes from a JSON catalog
    Import {
        /// Catalog file
        file: PathBuf,
    },
    /// Print the shows visible under a filter
    List {
        /// Filter to apply instead of the saved one
        #[arg(short, long, value_enum)]
        filter: Option<ShowsFilter>,
    },
    /// Show or change the saved filter
    Filter {
        #[arg(value_enum)]
        mode: Option<ShowsFilter>,
    },
    /// Star a show
    Star {
        id: i32,
        /// Remove the star instead
        #[arg(long)]
        off: bool,
    },
    /// Archive a show
    Archive {
        id: i32,
        /// Unarchive instead
        #[arg(long)]
        off: bool,
    },
    /// Mark an episode watched
    Watch {
        episode_id: i32,
        /// Mark unwatched instead
        #[arg(long)]
        off: bool,
    },
}

fn log_level(cli: Option<LevelFilter>) -> LevelFilter {
    cli.or_else(|| env::var("LOG_LEVEL").ok()?.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // init logging; the tui owns the terminal so logs go to a file
    WriteLogger::init(
        log_level(cli.log),
        LogConfig::default(),
        File::create(&config.log_file)
            .wrap_err_with(|| format!("creating log file {}", config.log_file.display()))?,
    )?;

    let router = Arc::new(Router::new(config.authority.clone())?);
    let db = Database::connect(&config.database_url, router)?;
    let prefs = Preferences::load(config.settings_path.clone())?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => interface::run(db, prefs).await?,
        Commands::Import { file } => {
            let catalog = Catalog::from_file(&file)
                .wrap_err_with(|| format!("loading catalog {}", file.display()))?;
            let report = catalog::import(&db, &catalog)?;
            println!(
                "shows: {} added, {} updated; episodes: {} added, {} updated; {} skipped",
                report.shows_added,
                report.shows_updated,
                report.episodes_added,
                report.episodes_updated,
                report.skipped
            );
        }
        Commands::List { filter } => {
            let mode = filter.unwrap_or_else(|| prefs.shows_filter());
            let now = Utc::now().naive_utc();
            let shows = db.list_shows()?;
            let counts = EpisodeAggregator::new(db.clone())?.all_counts(now)?;
            for position in filter_shows(&shows, mode, &counts) {
                let show = &shows[position];
                let c = counts.get(&show.id).copied().unwrap_or_default();
                println!(
                    "{:>5} {} {:<40} {:>4}/{:<4} {:>3} upcoming",
                    show.id,
                    if show.starred { '*' } else { ' ' },
                    show.name,
                    c.num_watched,
                    c.num_aired,
                    c.num_upcoming
                );
            }
        }
        Commands::Filter { mode } => match mode {
            Some(mode) => {
                prefs.set_shows_filter(mode)?;
                println!("filter set to {mode}");
            }
            None => println!("{}", prefs.shows_filter()),
        },
        Commands::Star { id, off } => require_match(db.set_starred(id, !off)?, "show", id)?,
        Commands::Archive { id, off } => require_match(db.set_archived(id, !off)?, "show", id)?,
        Commands::Watch { episode_id, off } => require_match(
            db.set_episode_watched(episode_id, !off)?,
            "episode",
            episode_id,
        )?,
    }

    info!("done");
    Ok(())
}

fn require_match(count: usize, what: &str, id: i32) -> eyre::Result<()> {
    if count == 0 {
        return Err(eyre!("no {what} with id {id}"));
    }
    Ok(())
}
