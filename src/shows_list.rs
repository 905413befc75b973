//! The filtered list of shows the interface displays.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use log::*;
use tokio::sync::watch;

use crate::aggregate::{EpisodeAggregator, EpisodeCounts};
use crate::db::error::Result;
use crate::db::Database;
use crate::filter::{filter_shows, ShowsFilter};
use crate::models::Show;
use crate::notify::Subscription;

/// A row of the list: a show and its episode counts.
#[derive(Clone, Copy, Debug)]
pub struct ShowEntry<'a> {
    pub show: &'a Show,
    pub counts: EpisodeCounts,
}

pub struct ShowsList {
    db: Database,
    aggregator: EpisodeAggregator,
    show_changes: Subscription,
    filter: watch::Receiver<ShowsFilter>,
    shows: Vec<Show>,
    counts: HashMap<i32, EpisodeCounts>,
    visible: Vec<usize>,
    loaded: bool,
}

impl ShowsList {
    pub fn new(db: Database, filter: watch::Receiver<ShowsFilter>) -> Result<Self> {
        let show_changes = db.subscribe(&db.router().shows())?;
        let aggregator = EpisodeAggregator::new(db.clone())?;
        Ok(ShowsList {
            db,
            aggregator,
            show_changes,
            filter,
            shows: Vec::new(),
            counts: HashMap::new(),
            visible: Vec::new(),
            loaded: false,
        })
    }

    /// Reload whatever changed since the last call and re-apply the filter.
    /// Returns whether the visible list may have changed.
    ///
    /// Nothing is replaced unless every load succeeds, and a failed refresh
    /// retries the show reload on the next call.
    pub fn refresh(&mut self, now: NaiveDateTime) -> Result<bool> {
        let shows_changed = self.show_changes.drain() || !self.loaded;
        if shows_changed {
            self.loaded = false;
        }
        let filter_changed = self.filter.has_changed().unwrap_or(false);

        let shows = if shows_changed {
            Some(self.db.list_shows()?)
        } else {
            None
        };

        // counts move with the clock even when nothing was written
        let counts = self.aggregator.all_counts(now)?;
        let counts_changed = counts != self.counts;

        let changed = shows_changed || filter_changed || counts_changed;
        if let Some(shows) = shows {
            self.shows = shows;
        }
        self.counts = counts;
        if changed {
            let mode = *self.filter.borrow_and_update();
            self.visible = filter_shows(&self.shows, mode, &self.counts);
            debug!(
                "shows list: {} of {} shows visible under '{}'",
                self.visible.len(),
                self.shows.len(),
                mode
            );
        }
        self.loaded = true;
        Ok(changed)
    }

    pub fn mode(&self) -> ShowsFilter {
        *self.filter.borrow()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<ShowEntry<'_>> {
        let show = self.shows.get(*self.visible.get(position)?)?;
        Some(ShowEntry {
            show,
            counts: self.counts.get(&show.id).copied().unwrap_or_default(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = ShowEntry<'_>> + '_ {
        (0..self.len()).filter_map(|position| self.get(position))
    }

    pub fn show_id(&self, position: usize) -> Option<i32> {
        self.get(position).map(|entry| entry.show.id)
    }

    /// Flip the starred flag of the show at `position`.
    pub fn toggle_starred(&self, position: usize) -> Result<bool> {
        match self.get(position) {
            Some(entry) => {
                self.db.set_starred(entry.show.id, !entry.show.starred)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flip the archived flag of the show at `position`.
    pub fn toggle_archived(&self, position: usize) -> Result<bool> {
        match self.get(position) {
            Some(entry) => {
                self.db.set_archived(entry.show.id, !entry.show.archived)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use diesel::connection::SimpleConnection;

    use super::*;
    use crate::config::Preferences;
    use crate::db::selection::Selection;
    use crate::db::tests::{date, insert_episode, insert_show, memory_db, new_show};
    use crate::models::NewEpisode;

    fn aired(show_id: i32, number: i32, on: NaiveDateTime, watched: bool) -> NewEpisode {
        NewEpisode {
            show_id,
            season_number: 1,
            episode_number: number,
            first_aired: Some(on),
            watched,
            ..Default::default()
        }
    }

    fn names(list: &ShowsList) -> Vec<String> {
        list.iter().map(|entry| entry.show.name.clone()).collect()
    }

    #[test]
    fn first_refresh_loads_everything() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        insert_episode(&db, aired(show_id, 1, date(2015, 1, 1), true));
        insert_episode(&db, aired(show_id, 2, date(2015, 1, 8), false));

        let prefs = Preferences::ephemeral(ShowsFilter::All);
        let mut list = ShowsList::new(db, prefs.watch_shows_filter()).unwrap();
        assert!(list.is_empty());

        assert!(list.refresh(date(2024, 1, 1)).unwrap());
        assert_eq!(list.len(), 1);
        let entry = list.get(0).unwrap();
        assert_eq!(entry.show.id, show_id);
        assert_eq!(entry.counts.num_aired, 2);
        assert_eq!(entry.counts.num_watched, 1);

        assert!(!list.refresh(date(2024, 1, 1)).unwrap());
        assert!(list.get(1).is_none());
    }

    #[test]
    fn switching_the_filter_reapplies_it() {
        let db = memory_db();
        let behind = insert_show(&db, new_show("Behind", 1));
        let done = insert_show(&db, new_show("Done", 2));
        insert_episode(&db, aired(behind, 1, date(2015, 1, 1), false));
        insert_episode(&db, aired(done, 1, date(2015, 1, 1), true));

        let prefs = Preferences::ephemeral(ShowsFilter::All);
        let mut list = ShowsList::new(db, prefs.watch_shows_filter()).unwrap();
        let now = date(2024, 1, 1);
        list.refresh(now).unwrap();
        assert_eq!(names(&list), ["Behind", "Done"]);

        prefs.set_shows_filter(ShowsFilter::Uncompleted).unwrap();
        assert!(list.refresh(now).unwrap());
        assert_eq!(list.mode(), ShowsFilter::Uncompleted);
        assert_eq!(names(&list), ["Behind"]);
    }

    #[test]
    fn toggles_are_picked_up_on_refresh() {
        let db = memory_db();
        insert_show(&db, new_show("Alpha", 1));
        insert_show(&db, new_show("Beta", 2));

        let prefs = Preferences::ephemeral(ShowsFilter::All);
        let mut list = ShowsList::new(db, prefs.watch_shows_filter()).unwrap();
        let now = date(2024, 1, 1);
        list.refresh(now).unwrap();

        // starring Beta moves it to the top
        assert!(list.toggle_starred(1).unwrap());
        assert!(list.refresh(now).unwrap());
        assert_eq!(names(&list), ["Beta", "Alpha"]);

        // archiving hides it from the default mode
        assert!(list.toggle_archived(0).unwrap());
        list.refresh(now).unwrap();
        assert_eq!(names(&list), ["Alpha"]);

        assert!(!list.toggle_starred(7).unwrap());
    }

    #[test]
    fn failed_refresh_keeps_the_last_good_list() {
        let db = memory_db();
        let alpha = insert_show(&db, new_show("Alpha", 1));
        let beta = insert_show(&db, new_show("Beta", 2));
        let pilot = insert_episode(&db, aired(alpha, 1, date(2015, 1, 1), false));

        let prefs = Preferences::ephemeral(ShowsFilter::All);
        let mut list = ShowsList::new(db.clone(), prefs.watch_shows_filter()).unwrap();
        let now = date(2024, 1, 1);
        list.refresh(now).unwrap();
        assert_eq!(names(&list), ["Alpha", "Beta"]);

        db.delete(&db.router().show(beta), &Selection::Any).unwrap();
        db.set_episode_watched(pilot, true).unwrap();
        db.pool()
            .get()
            .unwrap()
            .batch_execute("ALTER TABLE episodes RENAME TO episodes_away;")
            .unwrap();

        assert!(list.refresh(now).is_err());
        assert_eq!(names(&list), ["Alpha", "Beta"]);
        assert!(list.get(1).is_some());

        db.pool()
            .get()
            .unwrap()
            .batch_execute("ALTER TABLE episodes_away RENAME TO episodes;")
            .unwrap();

        // the show deletion drained before the failure is still picked up
        assert!(list.refresh(now).unwrap());
        assert_eq!(names(&list), ["Alpha"]);
        assert_eq!(list.get(0).unwrap().counts.num_watched, 1);
    }

    #[test]
    fn passing_an_air_date_moves_a_show_between_modes() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        insert_episode(&db, aired(show_id, 1, date(2025, 3, 1), false));

        let prefs = Preferences::ephemeral(ShowsFilter::Upcoming);
        let mut list = ShowsList::new(db, prefs.watch_shows_filter()).unwrap();

        list.refresh(date(2025, 2, 1)).unwrap();
        assert_eq!(list.len(), 1);

        assert!(list.refresh(date(2025, 3, 2)).unwrap());
        assert!(list.is_empty());
    }
}
