use crate::schema::{episodes, shows};

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A tracked show, as stored.
#[derive(Clone, Debug, Queryable, Selectable, Identifiable, PartialEq, Serialize)]
#[diesel(table_name = shows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Show {
    pub id: i32,
    pub tvdb_id: Option<i32>,
    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,
    pub name: String,
    pub language: String,
    pub overview: String,
    pub first_aired: Option<NaiveDateTime>,
    pub banner_path: Option<String>,
    pub fanart_path: Option<String>,
    pub poster_path: Option<String>,
    pub starred: bool,
    pub archived: bool,
}

/// A show row before the store has assigned it an id.
#[derive(Clone, Debug, Default, Insertable, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = shows)]
pub struct NewShow {
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
    pub starred: bool,
    #[serde(default)]
    pub archived: bool,
}

impl From<Show> for NewShow {
    fn from(show: Show) -> Self {
        NewShow {
            tvdb_id: show.tvdb_id,
            tmdb_id: show.tmdb_id,
            imdb_id: show.imdb_id,
            name: show.name,
            language: show.language,
            overview: show.overview,
            first_aired: show.first_aired,
            banner_path: show.banner_path,
            fanart_path: show.fanart_path,
            poster_path: show.poster_path,
            starred: show.starred,
            archived: show.archived,
        }
    }
}

/// Partial show update. `None` leaves the column untouched; for nullable
/// columns `Some(None)` clears it.
#[derive(Clone, Debug, Default, AsChangeset, PartialEq)]
#[diesel(table_name = shows)]
pub struct ShowChanges {
    pub tvdb_id: Option<Option<i32>>,
    pub tmdb_id: Option<Option<i32>>,
    pub imdb_id: Option<Option<String>>,
    pub name: Option<String>,
    pub language: Option<String>,
    pub overview: Option<String>,
    pub first_aired: Option<Option<NaiveDateTime>>,
    pub banner_path: Option<Option<String>>,
    pub fanart_path: Option<Option<String>>,
    pub poster_path: Option<Option<String>>,
    pub starred: Option<bool>,
    pub archived: Option<bool>,
}

impl ShowChanges {
    pub fn starred(starred: bool) -> Self {
        ShowChanges {
            starred: Some(starred),
            ..Default::default()
        }
    }

    pub fn archived(archived: bool) -> Self {
        ShowChanges {
            archived: Some(archived),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single episode of a show. Season 0 holds specials.
#[derive(Clone, Debug, Queryable, Selectable, Identifiable, PartialEq, Serialize)]
#[diesel(table_name = episodes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Episode {
    pub id: i32,
    pub show_id: i32,
    pub season_number: i32,
    pub episode_number: i32,
    pub name: String,
    pub overview: String,
    pub first_aired: Option<NaiveDateTime>,
    pub watched: bool,
}

impl Episode {
    pub fn is_special(&self) -> bool {
        self.season_number == 0
    }
}

#[derive(Clone, Debug, Default, Insertable, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = episodes)]
pub struct NewEpisode {
    pub show_id: i32,
    pub season_number: i32,
    pub episode_number: i32,
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub first_aired: Option<NaiveDateTime>,
    #[serde(default)]
    pub watched: bool,
}

impl From<Episode> for NewEpisode {
    fn from(episode: Episode) -> Self {
        NewEpisode {
            show_id: episode.show_id,
            season_number: episode.season_number,
            episode_number: episode.episode_number,
            name: episode.name,
            overview: episode.overview,
            first_aired: episode.first_aired,
            watched: episode.watched,
        }
    }
}

/// Partial episode update, with the same `None` semantics as [`ShowChanges`].
#[derive(Clone, Debug, Default, AsChangeset, PartialEq)]
#[diesel(table_name = episodes)]
pub struct EpisodeChanges {
    pub show_id: Option<i32>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub first_aired: Option<Option<NaiveDateTime>>,
    pub watched: Option<bool>,
}

impl EpisodeChanges {
    pub fn watched(watched: bool) -> Self {
        EpisodeChanges {
            watched: Some(watched),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One record of a bulk episode refresh: the existing row `id` and the
/// fields to overwrite on it.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeUpdate {
    pub id: i32,
    pub changes: EpisodeChanges,
}

/// A row to insert, tagged with the table it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub enum NewRow {
    Show(NewShow),
    Episode(NewEpisode),
}

impl From<NewShow> for NewRow {
    fn from(show: NewShow) -> Self {
        NewRow::Show(show)
    }
}

impl From<NewEpisode> for NewRow {
    fn from(episode: NewEpisode) -> Self {
        NewRow::Episode(episode)
    }
}

/// A partial update, tagged with the table it applies to.
#[derive(Clone, Debug, PartialEq)]
pub enum Changes {
    Show(ShowChanges),
    Episode(EpisodeChanges),
}

impl From<ShowChanges> for Changes {
    fn from(changes: ShowChanges) -> Self {
        Changes::Show(changes)
    }
}

impl From<EpisodeChanges> for Changes {
    fn from(changes: EpisodeChanges) -> Self {
        Changes::Episode(changes)
    }
}

/// Immutable snapshot returned by a query. Rows are addressed by position.
#[derive(Clone, Debug, PartialEq)]
pub enum RowSet {
    Shows(Vec<Show>),
    Episodes(Vec<Episode>),
}

impl RowSet {
    pub fn len(&self) -> usize {
        match self {
            RowSet::Shows(rows) => rows.len(),
            RowSet::Episodes(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shows(&self) -> &[Show] {
        match self {
            RowSet::Shows(rows) => rows,
            RowSet::Episodes(_) => &[],
        }
    }

    pub fn episodes(&self) -> &[Episode] {
        match self {
            RowSet::Episodes(rows) => rows,
            RowSet::Shows(_) => &[],
        }
    }

    pub fn into_shows(self) -> Vec<Show> {
        match self {
            RowSet::Shows(rows) => rows,
            RowSet::Episodes(_) => Vec::new(),
        }
    }

    pub fn into_episodes(self) -> Vec<Episode> {
        match self {
            RowSet::Episodes(rows) => rows,
            RowSet::Shows(_) => Vec::new(),
        }
    }
}
