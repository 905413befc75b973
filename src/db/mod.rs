//! Local store of shows and episodes.
//!
//! All operations are routed through content addresses (see
//! [`crate::address`]) and every successful mutation is published on the
//! store's [`ChangeChannel`].

pub mod error;
pub mod selection;
pub mod sync;

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::DatabaseErrorKind;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::*;
use url::Url;

use crate::address::{Address, AddressKind, Router, Table};
use crate::models::{Changes, Episode, EpisodeChanges, NewRow, RowSet, Show, ShowChanges};
use crate::notify::{ChangeChannel, Subscription};
use crate::schema::{episodes, shows};

use self::error::{Result, StoreError};
use self::selection::{
    EpisodeFilter, EpisodeOrder, EpisodePredicate, Order, Selection, ShowOrder, ShowPredicate,
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const POOL_SIZE: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Per-connection setup: WAL so readers never see a half-applied write,
/// a busy timeout so same-row writers queue up, and the collation used to
/// sort show names.
#[derive(Debug)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        (|| -> QueryResult<()> {
            conn.batch_execute(&format!(
                "PRAGMA busy_timeout = {};",
                self.busy_timeout.as_millis()
            ))?;
            conn.batch_execute("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
            // diesel hands the collation its operands as (rhs, lhs)
            conn.register_collation("LOCALIZED", |rhs: &str, lhs: &str| {
                localized_cmp(lhs, rhs)
            })?;
            Ok(())
        })()
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Case-insensitive name ordering, falling back to the raw text so that the
/// order stays total.
pub fn localized_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

fn is_constraint_violation(err: &diesel::result::Error) -> bool {
    matches!(
        err,
        diesel::result::Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::ForeignKeyViolation,
            _
        )
    )
}

#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    router: Arc<Router>,
    changes: ChangeChannel,
}

impl Database {
    /// Open (creating if needed) the SQLite database at `database_url` and
    /// bring its schema up to date.
    pub fn connect(database_url: &str, router: Arc<Router>) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(POOL_SIZE)
            .connection_customizer(Box::new(ConnectionOptions {
                busy_timeout: BUSY_TIMEOUT,
            }))
            .build(manager)?;

        info!("opened database at {}", database_url);
        Self::with_pool(pool, router)
    }

    /// A private in-memory database, held on a single connection that is
    /// never recycled.
    pub fn in_memory(router: Arc<Router>) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_customizer(Box::new(ConnectionOptions {
                busy_timeout: BUSY_TIMEOUT,
            }))
            .build(manager)?;

        Self::with_pool(pool, router)
    }

    fn with_pool(pool: DbPool, router: Arc<Router>) -> Result<Self> {
        {
            let mut pooled = pool.get()?;
            let conn: &mut SqliteConnection = &mut pooled;
            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|err| StoreError::Migration(err.to_string()))?;
            for version in applied {
                info!("applied migration {}", version);
            }
        }

        Ok(Database {
            pool,
            router,
            changes: ChangeChannel::new(),
        })
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn changes(&self) -> &ChangeChannel {
        &self.changes
    }

    /// Register for changes overlapping `uri`.
    pub fn subscribe(&self, uri: &Url) -> Result<Subscription> {
        let scope = self.router.resolve(uri)?;
        Ok(self.changes.subscribe(scope))
    }

    pub fn type_of(&self, uri: &Url) -> Result<AddressKind> {
        Ok(self.router.resolve(uri)?.kind())
    }

    /// Snapshot of the rows at `uri` matching `selection`.
    pub fn query(&self, uri: &Url, selection: &Selection, order: Order) -> Result<RowSet> {
        let address = self.router.resolve(uri)?;
        check_table(uri, address.table, selection.table())?;
        check_table(uri, address.table, order.table())?;

        let conn = &mut self.pool.get()?;
        let rows = match address.table {
            Table::Shows => {
                let order = match order {
                    Order::Shows(order) => order,
                    _ => ShowOrder::default(),
                };
                RowSet::Shows(selection::load_shows(
                    conn,
                    selection.show_predicate(address.id),
                    order,
                )?)
            }
            Table::Episodes => {
                let order = match order {
                    Order::Episodes(order) => order,
                    _ => EpisodeOrder::default(),
                };
                RowSet::Episodes(selection::load_episodes(
                    conn,
                    selection.episode_predicate(address.id),
                    order,
                )?)
            }
        };

        debug!("query {} returned {} rows", address, rows.len());
        Ok(rows)
    }

    /// Insert one row into the table named by `uri`.
    ///
    /// Returns the new row's address, or `None` when a constraint (such as a
    /// duplicate `tvdb_id`) rejected the row.
    pub fn insert(&self, uri: &Url, row: NewRow) -> Result<Option<Url>> {
        let address = self.router.resolve(uri)?;
        if address.kind().is_item() {
            return Err(invalid(uri, "insert needs a table address"));
        }

        let conn = &mut self.pool.get()?;
        let inserted = match (address.table, &row) {
            (Table::Shows, NewRow::Show(show)) => diesel::insert_into(shows::table)
                .values(show)
                .returning(shows::id)
                .get_result::<i32>(conn),
            (Table::Episodes, NewRow::Episode(episode)) => diesel::insert_into(episodes::table)
                .values(episode)
                .returning(episodes::id)
                .get_result::<i32>(conn),
            _ => return Err(invalid(uri, "row does not belong to this table")),
        };

        match inserted {
            Ok(id) => {
                let new_row = Address::item(address.table, id);
                info!("successfully inserted row {}", new_row);
                self.changes.publish(new_row);
                Ok(Some(self.router.uri(&new_row)))
            }
            Err(err) if is_constraint_violation(&err) => {
                info!("constraint error inserting into {}: {}", address, err);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Write the fields present in `changes` to every row matching `uri` and
    /// `selection`. Returns the number of rows matched.
    pub fn update(&self, uri: &Url, changes: &Changes, selection: &Selection) -> Result<usize> {
        let address = self.router.resolve(uri)?;
        check_table(uri, address.table, selection.table())?;

        let conn = &mut self.pool.get()?;
        let count = match (address.table, changes) {
            (Table::Shows, Changes::Show(changes)) => {
                update_shows(conn, selection.show_predicate(address.id), changes)?
            }
            (Table::Episodes, Changes::Episode(changes)) => {
                update_episodes(conn, selection.episode_predicate(address.id), changes)?
            }
            _ => return Err(invalid(uri, "changes do not belong to this table")),
        };

        info!("updated {} rows at {}", count, address);
        self.changes.publish(address);
        Ok(count)
    }

    /// Delete every row matching `uri` and `selection`. Does not cascade:
    /// deleting a show leaves its episodes in place, see
    /// [`Database::remove_show`].
    pub fn delete(&self, uri: &Url, selection: &Selection) -> Result<usize> {
        let address = self.router.resolve(uri)?;
        check_table(uri, address.table, selection.table())?;

        let conn = &mut self.pool.get()?;
        let count = match address.table {
            Table::Shows => match selection.show_predicate(address.id) {
                Some(predicate) => diesel::delete(shows::table.filter(predicate)).execute(conn)?,
                None => diesel::delete(shows::table).execute(conn)?,
            },
            Table::Episodes => match selection.episode_predicate(address.id) {
                Some(predicate) => {
                    diesel::delete(episodes::table.filter(predicate)).execute(conn)?
                }
                None => diesel::delete(episodes::table).execute(conn)?,
            },
        };

        info!("deleted {} rows at {}", count, address);
        self.changes.publish(address);
        Ok(count)
    }

    /// Delete a show together with all of its episodes, atomically.
    /// Returns the number of episodes removed alongside the show, or `None`
    /// if there was no such show.
    pub fn remove_show(&self, show_id: i32) -> Result<Option<usize>> {
        let conn = &mut self.pool.get()?;
        let removed = conn.immediate_transaction(|conn| {
            let episodes_removed =
                diesel::delete(episodes::table.filter(episodes::show_id.eq(show_id)))
                    .execute(conn)?;
            let shows_removed = diesel::delete(shows::table.find(show_id)).execute(conn)?;
            QueryResult::Ok((shows_removed, episodes_removed))
        })?;

        match removed {
            (0, 0) => Ok(None),
            (shows_removed, episodes_removed) => {
                info!(
                    "removed show {} ({} rows) with {} episodes",
                    show_id, shows_removed, episodes_removed
                );
                self.changes.publish(Address::item(Table::Shows, show_id));
                self.changes.publish(Address::collection(Table::Episodes));
                Ok(Some(episodes_removed))
            }
        }
    }

    /// All shows, starred first and then by name.
    pub fn list_shows(&self) -> Result<Vec<Show>> {
        Ok(self
            .query(
                &self.router.shows(),
                &Selection::Any,
                Order::Shows(ShowOrder::StarredThenName),
            )?
            .into_shows())
    }

    pub fn find_show(&self, show_id: i32) -> Result<Option<Show>> {
        Ok(self
            .query(&self.router.show(show_id), &Selection::Any, Order::Natural)?
            .into_shows()
            .into_iter()
            .next())
    }

    pub fn find_show_by_tvdb_id(&self, tvdb_id: i32) -> Result<Option<Show>> {
        Ok(self
            .query(
                &self.router.shows(),
                &Selection::shows([selection::ShowFilter::TvdbId(tvdb_id)]),
                Order::Natural,
            )?
            .into_shows()
            .into_iter()
            .next())
    }

    pub fn episodes_of(&self, show_id: i32) -> Result<Vec<Episode>> {
        Ok(self
            .query(
                &self.router.episodes(),
                &Selection::episodes([EpisodeFilter::ShowId(show_id)]),
                Order::Episodes(EpisodeOrder::SeasonThenEpisode),
            )?
            .into_episodes())
    }

    pub fn set_starred(&self, show_id: i32, starred: bool) -> Result<usize> {
        self.update(
            &self.router.show(show_id),
            &ShowChanges::starred(starred).into(),
            &Selection::Any,
        )
    }

    pub fn set_archived(&self, show_id: i32, archived: bool) -> Result<usize> {
        self.update(
            &self.router.show(show_id),
            &ShowChanges::archived(archived).into(),
            &Selection::Any,
        )
    }

    pub fn set_episode_watched(&self, episode_id: i32, watched: bool) -> Result<usize> {
        self.update(
            &self.router.episode(episode_id),
            &EpisodeChanges::watched(watched).into(),
            &Selection::Any,
        )
    }

    /// Mark a whole show, or one season of it, as watched or unwatched.
    ///
    /// Marking watched only touches episodes that have aired by `now`;
    /// unmarking clears every episode in range. Specials are only touched
    /// when season 0 is asked for explicitly.
    pub fn set_watched_through(
        &self,
        show_id: i32,
        season: Option<i32>,
        watched: bool,
        now: NaiveDateTime,
    ) -> Result<usize> {
        let mut filters = vec![EpisodeFilter::ShowId(show_id)];
        match season {
            Some(season) => filters.push(EpisodeFilter::SeasonNumber(season)),
            None => filters.push(EpisodeFilter::NotSpecial),
        }
        if watched {
            filters.push(EpisodeFilter::AiredBy(now));
        }

        self.update(
            &self.router.episodes(),
            &EpisodeChanges::watched(watched).into(),
            &Selection::Episodes(filters),
        )
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn invalid(uri: &Url, reason: &'static str) -> StoreError {
    StoreError::InvalidAddress {
        address: uri.to_string(),
        reason,
    }
}

fn check_table(uri: &Url, table: Table, wanted: Option<Table>) -> Result<()> {
    match wanted {
        Some(wanted) if wanted != table => Err(invalid(uri, "selection targets another table")),
        _ => Ok(()),
    }
}

fn update_shows(
    conn: &mut SqliteConnection,
    predicate: Option<ShowPredicate>,
    changes: &ShowChanges,
) -> QueryResult<usize> {
    if changes.is_empty() {
        let matched = match predicate {
            Some(predicate) => shows::table.filter(predicate).count().get_result::<i64>(conn)?,
            None => shows::table.count().get_result::<i64>(conn)?,
        };
        return Ok(matched as usize);
    }

    match predicate {
        Some(predicate) => diesel::update(shows::table.filter(predicate))
            .set(changes)
            .execute(conn),
        None => diesel::update(shows::table).set(changes).execute(conn),
    }
}

fn update_episodes(
    conn: &mut SqliteConnection,
    predicate: Option<EpisodePredicate>,
    changes: &EpisodeChanges,
) -> QueryResult<usize> {
    if changes.is_empty() {
        let matched = match predicate {
            Some(predicate) => episodes::table.filter(predicate).count().get_result::<i64>(conn)?,
            None => episodes::table.count().get_result::<i64>(conn)?,
        };
        return Ok(matched as usize);
    }

    match predicate {
        Some(predicate) => diesel::update(episodes::table.filter(predicate))
            .set(changes)
            .execute(conn),
        None => diesel::update(episodes::table).set(changes).execute(conn),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::selection::ShowFilter;
    use crate::models::{NewEpisode, NewShow};
    use chrono::NaiveDate;

    pub(crate) fn memory_db() -> Database {
        Database::in_memory(Arc::new(Router::default())).unwrap()
    }

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap()
    }

    pub(crate) fn new_show(name: &str, tvdb_id: i32) -> NewShow {
        NewShow {
            tvdb_id: Some(tvdb_id),
            name: name.to_string(),
            language: "en".to_string(),
            overview: format!("All about {name}"),
            first_aired: Some(date(2010, 1, 4)),
            banner_path: Some(format!("banners/{tvdb_id}.jpg")),
            ..Default::default()
        }
    }

    pub(crate) fn new_episode(show_id: i32, season: i32, number: i32) -> NewEpisode {
        NewEpisode {
            show_id,
            season_number: season,
            episode_number: number,
            name: format!("S{season:02}E{number:02}"),
            first_aired: Some(date(2010, 1, 4 + number as u32)),
            ..Default::default()
        }
    }

    pub(crate) fn insert_show(db: &Database, show: NewShow) -> i32 {
        let uri = db.insert(&db.router().shows(), show.into()).unwrap().unwrap();
        db.router().resolve(&uri).unwrap().id.unwrap()
    }

    pub(crate) fn insert_episode(db: &Database, episode: NewEpisode) -> i32 {
        let uri = db
            .insert(&db.router().episodes(), episode.into())
            .unwrap()
            .unwrap();
        db.router().resolve(&uri).unwrap().id.unwrap()
    }

    #[test]
    fn show_round_trips_through_its_item_address() {
        let db = memory_db();
        let written = new_show("Deadwood", 72023);
        let id = insert_show(&db, written.clone());

        let rows = db
            .query(&db.router().show(id), &Selection::Any, Order::Natural)
            .unwrap();
        let read = rows.shows()[0].clone();
        assert_eq!(read.id, id);
        assert_eq!(NewShow::from(read), written);
    }

    #[test]
    fn episode_round_trips_through_its_item_address() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        let written = NewEpisode {
            overview: "Bullock arrives".to_string(),
            watched: true,
            ..new_episode(show_id, 1, 1)
        };
        let id = insert_episode(&db, written.clone());

        let rows = db
            .query(&db.router().episode(id), &Selection::Any, Order::Natural)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(NewEpisode::from(rows.episodes()[0].clone()), written);
    }

    #[test]
    fn duplicate_tvdb_id_is_not_created() {
        let db = memory_db();
        let uri = db.router().shows();

        let first = db.insert(&uri, new_show("The Wire", 79126).into()).unwrap();
        let second = db.insert(&uri, new_show("The Wire", 79126).into()).unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(db.list_shows().unwrap().len(), 1);
    }

    #[test]
    fn shows_without_tvdb_id_do_not_collide() {
        let db = memory_db();
        let uri = db.router().shows();
        let untracked = NewShow {
            tvdb_id: None,
            ..new_show("Local", 0)
        };

        assert!(db.insert(&uri, untracked.clone().into()).unwrap().is_some());
        assert!(db.insert(&uri, untracked.into()).unwrap().is_some());
    }

    #[test]
    fn insert_needs_a_table_address() {
        let db = memory_db();
        let err = db
            .insert(&db.router().show(1), new_show("x", 1).into())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidAddress { .. }));

        let err = db
            .insert(&db.router().episodes(), new_show("x", 1).into())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidAddress { .. }));
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        let id = insert_episode(&db, new_episode(show_id, 1, 3));
        let before = db
            .query(&db.router().episode(id), &Selection::Any, Order::Natural)
            .unwrap()
            .into_episodes()
            .remove(0);

        let count = db.set_episode_watched(id, true).unwrap();
        assert_eq!(count, 1);

        let after = db
            .query(&db.router().episode(id), &Selection::Any, Order::Natural)
            .unwrap()
            .into_episodes()
            .remove(0);
        assert_eq!(after, Episode { watched: true, ..before });
    }

    #[test]
    fn nullable_fields_can_be_cleared() {
        let db = memory_db();
        let id = insert_show(&db, new_show("Deadwood", 72023));

        let changes = ShowChanges {
            banner_path: Some(None),
            ..Default::default()
        };
        db.update(&db.router().show(id), &changes.into(), &Selection::Any)
            .unwrap();

        let show = db.find_show(id).unwrap().unwrap();
        assert_eq!(show.banner_path, None);
        assert_eq!(show.tvdb_id, Some(72023));
    }

    #[test]
    fn update_matching_nothing_returns_zero() {
        let db = memory_db();
        assert_eq!(db.set_starred(404, true).unwrap(), 0);
        assert!(db.find_show(404).unwrap().is_none());
    }

    #[test]
    fn empty_changes_report_matches_without_writing() {
        let db = memory_db();
        let id = insert_show(&db, new_show("Deadwood", 72023));
        let count = db
            .update(
                &db.router().show(id),
                &ShowChanges::default().into(),
                &Selection::Any,
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn selection_is_anded_with_address_id() {
        let db = memory_db();
        let id = insert_show(&db, new_show("Deadwood", 72023));

        let rows = db
            .query(
                &db.router().show(id),
                &Selection::shows([ShowFilter::Starred(true)]),
                Order::Natural,
            )
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn selection_for_the_wrong_table_is_rejected() {
        let db = memory_db();
        let err = db
            .query(
                &db.router().shows(),
                &Selection::episodes([EpisodeFilter::NotSpecial]),
                Order::Natural,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidAddress { .. }));
    }

    #[test]
    fn unknown_address_is_rejected_by_every_operation() {
        let db = memory_db();
        let uri = Url::parse("content://episodes.db.ShowsProvider/seasons").unwrap();

        assert!(matches!(
            db.query(&uri, &Selection::Any, Order::Natural),
            Err(StoreError::InvalidAddress { .. })
        ));
        assert!(matches!(
            db.delete(&uri, &Selection::Any),
            Err(StoreError::InvalidAddress { .. })
        ));
        assert!(matches!(
            db.type_of(&uri),
            Err(StoreError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn type_of_reports_the_address_kind() {
        let db = memory_db();
        assert_eq!(
            db.type_of(&db.router().episode(5)).unwrap(),
            AddressKind::EpisodeItem
        );
        assert_eq!(
            db.type_of(&db.router().shows()).unwrap(),
            AddressKind::ShowCollection
        );
    }

    #[test]
    fn shows_sort_starred_first_then_by_name_ignoring_case() {
        let db = memory_db();
        let zed = insert_show(&db, new_show("zed", 1));
        let alpha = insert_show(&db, new_show("Alpha", 2));
        let beta = insert_show(&db, new_show("beta", 3));
        db.set_starred(zed, true).unwrap();

        let names: Vec<i32> = db.list_shows().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(names, vec![zed, alpha, beta]);
    }

    #[test]
    fn unstarred_names_sort_ascending() {
        let db = memory_db();
        for (tvdb_id, name) in [(1, "Westworld"), (2, "alf"), (3, "Deadwood"), (4, "ALF")] {
            insert_show(&db, new_show(name, tvdb_id));
        }

        let names: Vec<String> = db.list_shows().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["ALF", "alf", "Deadwood", "Westworld"]);
    }

    #[test]
    fn delete_does_not_cascade() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        insert_episode(&db, new_episode(show_id, 1, 1));

        assert_eq!(db.delete(&db.router().show(show_id), &Selection::Any).unwrap(), 1);
        assert_eq!(db.episodes_of(show_id).unwrap().len(), 1);
        assert_eq!(db.delete(&db.router().show(show_id), &Selection::Any).unwrap(), 0);
    }

    #[test]
    fn remove_show_takes_its_episodes_along() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        let other = insert_show(&db, new_show("Carnivale", 70860));
        insert_episode(&db, new_episode(show_id, 1, 1));
        insert_episode(&db, new_episode(show_id, 1, 2));
        insert_episode(&db, new_episode(other, 1, 1));

        assert_eq!(db.remove_show(show_id).unwrap(), Some(2));
        assert!(db.find_show(show_id).unwrap().is_none());
        assert!(db.episodes_of(show_id).unwrap().is_empty());
        assert_eq!(db.episodes_of(other).unwrap().len(), 1);
        assert_eq!(db.remove_show(show_id).unwrap(), None);
    }

    #[test]
    fn watched_through_only_marks_aired_regular_episodes() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        insert_episode(&db, new_episode(show_id, 1, 1));
        insert_episode(&db, new_episode(show_id, 1, 2));
        insert_episode(&db, new_episode(show_id, 0, 1));
        insert_episode(
            &db,
            NewEpisode {
                first_aired: Some(date(2030, 1, 1)),
                ..new_episode(show_id, 2, 1)
            },
        );

        let marked = db
            .set_watched_through(show_id, None, true, date(2020, 1, 1))
            .unwrap();
        assert_eq!(marked, 2);

        let cleared = db
            .set_watched_through(show_id, Some(1), false, date(2020, 1, 1))
            .unwrap();
        assert_eq!(cleared, 2);
    }

    #[test]
    fn each_mutation_notifies_once() {
        let db = memory_db();
        let mut shows = db.subscribe(&db.router().shows()).unwrap();

        let id = insert_show(&db, new_show("Deadwood", 72023));
        assert_eq!(shows.try_next(), Some(Address::item(Table::Shows, id)));
        assert_eq!(shows.try_next(), None);

        db.set_archived(id, true).unwrap();
        assert_eq!(shows.try_next(), Some(Address::item(Table::Shows, id)));
        assert_eq!(shows.try_next(), None);

        // zero matches still notify
        db.set_archived(9999, true).unwrap();
        assert_eq!(shows.try_next(), Some(Address::item(Table::Shows, 9999)));

        db.delete(&db.router().shows(), &Selection::Any).unwrap();
        assert_eq!(shows.try_next(), Some(Address::collection(Table::Shows)));
        assert_eq!(shows.try_next(), None);
    }

    #[test]
    fn rejected_insert_does_not_notify() {
        let db = memory_db();
        insert_show(&db, new_show("Deadwood", 72023));
        let mut shows = db.subscribe(&db.router().shows()).unwrap();

        let created = db
            .insert(&db.router().shows(), new_show("Deadwood", 72023).into())
            .unwrap();
        assert!(created.is_none());
        assert!(!shows.drain());
    }

    #[test]
    fn localized_order_folds_case() {
        assert_eq!(localized_cmp("alpha", "Beta"), Ordering::Less);
        assert_eq!(localized_cmp("Écoute", "écoute"), Ordering::Less);
        assert_eq!(localized_cmp("same", "same"), Ordering::Equal);
    }
}
