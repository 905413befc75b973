//! Typed row predicates and sort orders, compiled into boxed diesel
//! expressions so one query shape serves every caller.

use chrono::NaiveDateTime;
use diesel::dsl::sql;
use diesel::expression::BoxableExpression;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use diesel::sqlite::Sqlite;

use crate::address::Table;
use crate::schema::{episodes, shows};

pub(crate) type ShowPredicate = Box<dyn BoxableExpression<shows::table, Sqlite, SqlType = Bool>>;
pub(crate) type EpisodePredicate =
    Box<dyn BoxableExpression<episodes::table, Sqlite, SqlType = Bool>>;

#[derive(Clone, Debug, PartialEq)]
pub enum ShowFilter {
    Id(i32),
    TvdbId(i32),
    Starred(bool),
    Archived(bool),
}

impl ShowFilter {
    fn to_predicate(&self) -> ShowPredicate {
        match *self {
            ShowFilter::Id(id) => Box::new(shows::id.eq(id)),
            ShowFilter::TvdbId(tvdb_id) => Box::new(shows::tvdb_id.eq(tvdb_id).assume_not_null()),
            ShowFilter::Starred(starred) => Box::new(shows::starred.eq(starred)),
            ShowFilter::Archived(archived) => Box::new(shows::archived.eq(archived)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EpisodeFilter {
    Id(i32),
    ShowId(i32),
    SeasonNumber(i32),
    EpisodeNumber(i32),
    /// Leave out season 0.
    NotSpecial,
    Watched(bool),
    /// Air date known and not after the given instant.
    AiredBy(NaiveDateTime),
}

impl EpisodeFilter {
    fn to_predicate(&self) -> EpisodePredicate {
        match *self {
            EpisodeFilter::Id(id) => Box::new(episodes::id.eq(id)),
            EpisodeFilter::ShowId(show_id) => Box::new(episodes::show_id.eq(show_id)),
            EpisodeFilter::SeasonNumber(season) => Box::new(episodes::season_number.eq(season)),
            EpisodeFilter::EpisodeNumber(number) => {
                Box::new(episodes::episode_number.eq(number))
            }
            EpisodeFilter::NotSpecial => Box::new(episodes::season_number.ne(0)),
            EpisodeFilter::Watched(watched) => Box::new(episodes::watched.eq(watched)),
            // NULL air dates compare as NULL and drop out of the WHERE
            EpisodeFilter::AiredBy(now) => Box::new(episodes::first_aired.le(now).assume_not_null()),
        }
    }
}

/// Conjunction of row conditions for one table. `Any` matches every row of
/// whichever table the address names.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Selection {
    #[default]
    Any,
    Shows(Vec<ShowFilter>),
    Episodes(Vec<EpisodeFilter>),
}

impl Selection {
    pub fn shows(filters: impl IntoIterator<Item = ShowFilter>) -> Self {
        Selection::Shows(filters.into_iter().collect())
    }

    pub fn episodes(filters: impl IntoIterator<Item = EpisodeFilter>) -> Self {
        Selection::Episodes(filters.into_iter().collect())
    }

    /// The table this selection is written against, if it names one.
    pub fn table(&self) -> Option<Table> {
        match self {
            Selection::Any => None,
            Selection::Shows(_) => Some(Table::Shows),
            Selection::Episodes(_) => Some(Table::Episodes),
        }
    }

    pub(crate) fn show_predicate(&self, id: Option<i32>) -> Option<ShowPredicate> {
        let mut filters: Vec<ShowFilter> = id.map(ShowFilter::Id).into_iter().collect();
        if let Selection::Shows(extra) = self {
            filters.extend(extra.iter().cloned());
        }

        filters
            .iter()
            .map(ShowFilter::to_predicate)
            .reduce(|acc, next| Box::new(acc.and(next)))
    }

    pub(crate) fn episode_predicate(&self, id: Option<i32>) -> Option<EpisodePredicate> {
        let mut filters: Vec<EpisodeFilter> = id.map(EpisodeFilter::Id).into_iter().collect();
        if let Selection::Episodes(extra) = self {
            filters.extend(extra.iter().cloned());
        }

        filters
            .iter()
            .map(EpisodeFilter::to_predicate)
            .reduce(|acc, next| Box::new(acc.and(next)))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShowOrder {
    #[default]
    Id,
    Name,
    /// Starred first, then by name under the `LOCALIZED` collation.
    StarredThenName,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EpisodeOrder {
    #[default]
    Id,
    SeasonThenEpisode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Natural,
    Shows(ShowOrder),
    Episodes(EpisodeOrder),
}

impl Order {
    pub fn table(&self) -> Option<Table> {
        match self {
            Order::Natural => None,
            Order::Shows(_) => Some(Table::Shows),
            Order::Episodes(_) => Some(Table::Episodes),
        }
    }
}

pub(crate) fn load_shows(
    conn: &mut SqliteConnection,
    predicate: Option<ShowPredicate>,
    order: ShowOrder,
) -> QueryResult<Vec<crate::models::Show>> {
    use crate::models::Show;

    let mut query = shows::table.select(Show::as_select()).into_boxed();
    if let Some(predicate) = predicate {
        query = query.filter(predicate);
    }

    query = match order {
        ShowOrder::Id => query.order_by(shows::id.asc()),
        ShowOrder::Name => query
            .order_by(sql::<Text>("name COLLATE LOCALIZED").asc())
            .then_order_by(shows::id.asc()),
        ShowOrder::StarredThenName => query
            .order_by(shows::starred.desc())
            .then_order_by(sql::<Text>("name COLLATE LOCALIZED").asc())
            .then_order_by(shows::id.asc()),
    };

    query.load(conn)
}

pub(crate) fn load_episodes(
    conn: &mut SqliteConnection,
    predicate: Option<EpisodePredicate>,
    order: EpisodeOrder,
) -> QueryResult<Vec<crate::models::Episode>> {
    use crate::models::Episode;

    let mut query = episodes::table.select(Episode::as_select()).into_boxed();
    if let Some(predicate) = predicate {
        query = query.filter(predicate);
    }

    query = match order {
        EpisodeOrder::Id => query.order_by(episodes::id.asc()),
        EpisodeOrder::SeasonThenEpisode => query
            .order_by(episodes::season_number.asc())
            .then_order_by(episodes::episode_number.asc())
            .then_order_by(episodes::id.asc()),
    };

    query.load(conn)
}
