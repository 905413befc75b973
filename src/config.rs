//! Runtime configuration and persisted user preferences.
//!
//! Connection settings come from the environment (and `.env`, via dotenvy).
//! Preferences live in a small TOML file and are published on a watch
//! channel so that open views re-filter when the user switches mode.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dotenvy::dotenv;
use eyre::{eyre, WrapErr};
use log::*;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::address::DEFAULT_AUTHORITY;
use crate::filter::ShowsFilter;

const APP_DIR: &str = "episodes-tracker";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub settings_path: PathBuf,
    pub log_file: PathBuf,
    pub authority: String,
}

impl Config {
    /// Read `DATABASE_URL`, `SETTINGS_FILE`, `LOG_FILE` and
    /// `CONTENT_AUTHORITY`, falling back to the platform data/config dirs.
    pub fn from_env() -> eyre::Result<Self> {
        dotenv().ok();

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                let dir = data_dir()?;
                dir.join("episodes.db").to_string_lossy().into_owned()
            }
        };

        let settings_path = match env::var("SETTINGS_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => config_dir()?.join("settings.toml"),
        };

        let log_file = match env::var("LOG_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => data_dir()?.join("episodes.log"),
        };

        let authority =
            env::var("CONTENT_AUTHORITY").unwrap_or_else(|_| DEFAULT_AUTHORITY.to_string());

        Ok(Config {
            database_url,
            settings_path,
            log_file,
            authority,
        })
    }
}

fn data_dir() -> eyre::Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| eyre!("could not find a data directory"))?
        .join(APP_DIR);
    fs::create_dir_all(&dir).wrap_err_with(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

fn config_dir() -> eyre::Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| eyre!("could not find a config directory"))?
        .join(APP_DIR))
}

/// On-disk shape of the preferences file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub shows_filter: ShowsFilter,
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content =
            fs::read_to_string(path).wrap_err_with(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).wrap_err_with(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> eyre::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).wrap_err_with(|| format!("writing {}", path.display()))
    }
}

/// Shared, observable preferences.
pub struct Preferences {
    path: Option<PathBuf>,
    shows_filter: watch::Sender<ShowsFilter>,
}

impl Preferences {
    pub fn load(path: PathBuf) -> eyre::Result<Self> {
        let settings = Settings::load(&path)?;
        info!(
            "loaded preferences from {} (filter: {})",
            path.display(),
            settings.shows_filter
        );

        let (shows_filter, _) = watch::channel(settings.shows_filter);
        Ok(Preferences {
            path: Some(path),
            shows_filter,
        })
    }

    /// Preferences that are never written to disk.
    pub fn ephemeral(shows_filter: ShowsFilter) -> Self {
        let (shows_filter, _) = watch::channel(shows_filter);
        Preferences {
            path: None,
            shows_filter,
        }
    }

    pub fn shows_filter(&self) -> ShowsFilter {
        *self.shows_filter.borrow()
    }

    /// Persist a new filter mode and notify watchers if it differs from the
    /// current one.
    pub fn set_shows_filter(&self, mode: ShowsFilter) -> eyre::Result<()> {
        if let Some(path) = &self.path {
            Settings { shows_filter: mode }.save(path)?;
        }

        let changed = self.shows_filter.send_if_modified(|current| {
            let changed = *current != mode;
            *current = mode;
            changed
        });
        if changed {
            debug!("shows filter set to {}", mode);
        }
        Ok(())
    }

    pub fn watch_shows_filter(&self) -> watch::Receiver<ShowsFilter> {
        self.shows_filter.subscribe()
    }
}
