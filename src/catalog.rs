//! Import of show metadata from a JSON catalog.
//!
//! A catalog is what a metadata source hands back for the shows the user
//! follows:
//!
//! ```json
//! { "shows": [ { "tvdb_id": 72023, "name": "Deadwood",
//!                "episodes": [ { "season_number": 1, "episode_number": 1,
//!                                "name": "Deadwood",
//!                                "first_aired": "2004-03-21T21:00:00" } ] } ] }
//! ```
//!
//! New shows and episodes are inserted. Episodes already in the store are
//! refreshed in a single batch per show, which never touches `watched`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use log::*;
use serde::Deserialize;
use thiserror::Error;

use crate::db::error::StoreError;
use crate::db::selection::Selection;
use crate::db::Database;
use crate::models::{Episode, EpisodeChanges, EpisodeUpdate, NewEpisode, NewShow, Show, ShowChanges};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog: {0}")]
    Read(#[from] std::io::Error),
    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub shows: Vec<CatalogShow>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogShow {
    pub tvdb_id: Option<i32>,
    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub overview: String,
    pub first_aired: Option<NaiveDateTime>,
    pub banner_path: Option<String>,
    pub fanart_path: Option<String>,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub episodes: Vec<CatalogEpisode>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogEpisode {
    pub season_number: i32,
    pub episode_number: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub first_aired: Option<NaiveDateTime>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub shows_added: usize,
    pub shows_updated: usize,
    pub episodes_added: usize,
    pub episodes_updated: usize,
    pub skipped: usize,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl CatalogShow {
    fn new_show(&self) -> NewShow {
        NewShow {
            tvdb_id: self.tvdb_id,
            tmdb_id: self.tmdb_id,
            imdb_id: self.imdb_id.clone(),
            name: self.name.clone(),
            language: self.language.clone(),
            overview: self.overview.clone(),
            first_aired: self.first_aired,
            banner_path: self.banner_path.clone(),
            fanart_path: self.fanart_path.clone(),
            poster_path: self.poster_path.clone(),
            starred: false,
            archived: false,
        }
    }

    /// Metadata fields that differ from `stored`. Never touches the user's
    /// flags.
    fn changes_from(&self, stored: &Show) -> ShowChanges {
        fn differs<T: PartialEq + Clone>(new: &T, old: &T) -> Option<T> {
            (new != old).then(|| new.clone())
        }

        ShowChanges {
            tmdb_id: differs(&self.tmdb_id, &stored.tmdb_id),
            imdb_id: differs(&self.imdb_id, &stored.imdb_id),
            name: differs(&self.name, &stored.name),
            language: differs(&self.language, &stored.language),
            overview: differs(&self.overview, &stored.overview),
            first_aired: differs(&self.first_aired, &stored.first_aired),
            banner_path: differs(&self.banner_path, &stored.banner_path),
            fanart_path: differs(&self.fanart_path, &stored.fanart_path),
            poster_path: differs(&self.poster_path, &stored.poster_path),
            ..Default::default()
        }
    }
}

impl CatalogEpisode {
    fn new_episode(&self, show_id: i32) -> NewEpisode {
        NewEpisode {
            show_id,
            season_number: self.season_number,
            episode_number: self.episode_number,
            name: self.name.clone(),
            overview: self.overview.clone(),
            first_aired: self.first_aired,
            watched: false,
        }
    }

    fn changes_from(&self, stored: &Episode) -> EpisodeChanges {
        EpisodeChanges {
            name: (self.name != stored.name).then(|| self.name.clone()),
            overview: (self.overview != stored.overview).then(|| self.overview.clone()),
            first_aired: (self.first_aired != stored.first_aired).then_some(self.first_aired),
            ..Default::default()
        }
    }
}

/// Bring the store in line with `catalog`.
pub fn import(db: &Database, catalog: &Catalog) -> Result<ImportReport, CatalogError> {
    let mut report = ImportReport::default();
    for entry in &catalog.shows {
        import_show(db, entry, &mut report)?;
    }

    info!(
        "catalog import: {} shows added, {} updated; {} episodes added, {} updated; {} skipped",
        report.shows_added,
        report.shows_updated,
        report.episodes_added,
        report.episodes_updated,
        report.skipped
    );
    Ok(report)
}

fn import_show(
    db: &Database,
    entry: &CatalogShow,
    report: &mut ImportReport,
) -> Result<(), CatalogError> {
    // tvdb_id is what matches a catalog show to its stored row on re-import
    let Some(tvdb_id) = entry.tvdb_id else {
        warn!("skipping catalog show '{}': no tvdb id", entry.name);
        report.skipped += 1;
        return Ok(());
    };

    let inserted = db.insert(&db.router().shows(), entry.new_show().into())?;

    let show_id = match inserted {
        Some(uri) => {
            report.shows_added += 1;
            db.router().resolve(&uri)?.id
        }
        None => match db.find_show_by_tvdb_id(tvdb_id)? {
            Some(show) => {
                let changes = entry.changes_from(&show);
                if !changes.is_empty() {
                    db.update(&db.router().show(show.id), &changes.into(), &Selection::Any)?;
                    report.shows_updated += 1;
                }
                Some(show.id)
            }
            None => None,
        },
    };

    let Some(show_id) = show_id else {
        warn!("skipping catalog show '{}': rejected by the store", entry.name);
        report.skipped += 1;
        return Ok(());
    };

    let stored: HashMap<(i32, i32), Episode> = db
        .episodes_of(show_id)?
        .into_iter()
        .map(|episode| ((episode.season_number, episode.episode_number), episode))
        .collect();

    let mut seen = HashSet::new();
    let mut updates = Vec::new();
    for episode in &entry.episodes {
        let key = (episode.season_number, episode.episode_number);
        if key.0 < 0 || key.1 < 0 {
            warn!("catalog episode {:?} for show {} has a negative number", key, show_id);
            report.skipped += 1;
            continue;
        }
        if !seen.insert(key) {
            debug!("duplicate catalog episode {:?} for show {}", key, show_id);
            report.skipped += 1;
            continue;
        }

        match stored.get(&key) {
            Some(existing) => {
                let changes = episode.changes_from(existing);
                if !changes.is_empty() {
                    updates.push(EpisodeUpdate {
                        id: existing.id,
                        changes,
                    });
                }
            }
            None => match db.insert(&db.router().episodes(), episode.new_episode(show_id).into())? {
                Some(_) => report.episodes_added += 1,
                None => {
                    warn!(
                        "catalog episode {:?} for show {} rejected by the store",
                        key, show_id
                    );
                    report.skipped += 1;
                }
            },
        }
    }

    if !updates.is_empty() {
        report.episodes_updated += db.sync_episodes(&updates)?.matched;
    }
    Ok(())
}
