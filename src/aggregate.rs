//! Per-show aired/watched/upcoming counts.
//!
//! Counts are never stored. They are derived from the episodes table,
//! ignoring specials (season 0) and episodes without an air date.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use log::*;

use crate::db::error::Result;
use crate::db::selection::{EpisodeFilter, Order, Selection};
use crate::db::Database;
use crate::models::Episode;
use crate::notify::Subscription;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpisodeCounts {
    pub num_aired: usize,
    pub num_watched: usize,
    pub num_upcoming: usize,
}

impl EpisodeCounts {
    pub fn tally<'a>(episodes: impl IntoIterator<Item = &'a Episode>, now: NaiveDateTime) -> Self {
        let mut counts = EpisodeCounts::default();
        for episode in episodes {
            if !episode.is_special() {
                counts.add(episode.first_aired, episode.watched, now);
            }
        }
        counts
    }

    fn add(&mut self, first_aired: Option<NaiveDateTime>, watched: bool, now: NaiveDateTime) {
        let Some(first_aired) = first_aired else {
            return;
        };

        if first_aired <= now {
            self.num_aired += 1;
        } else {
            self.num_upcoming += 1;
        }
        if watched {
            self.num_watched += 1;
        }
    }

    /// Every aired episode has been watched.
    pub fn caught_up(&self) -> bool {
        self.num_watched == self.num_aired
    }
}

/// Group `episodes` by show and count each group.
pub fn count_by_show(episodes: &[Episode], now: NaiveDateTime) -> HashMap<i32, EpisodeCounts> {
    let mut counts: HashMap<i32, EpisodeCounts> = HashMap::new();
    for episode in episodes.iter().filter(|e| !e.is_special()) {
        counts
            .entry(episode.show_id)
            .or_default()
            .add(episode.first_aired, episode.watched, now);
    }
    counts
}

#[derive(Clone, Copy, Debug)]
struct Stamp {
    first_aired: Option<NaiveDateTime>,
    watched: bool,
}

/// Live counts over the store.
///
/// Holds a snapshot of the regular episodes grouped by show, dropped as soon
/// as a change to the episodes table is seen and reloaded on the next read.
pub struct EpisodeAggregator {
    db: Database,
    changes: Subscription,
    snapshot: Option<HashMap<i32, Vec<Stamp>>>,
}

impl EpisodeAggregator {
    pub fn new(db: Database) -> Result<Self> {
        let changes = db.subscribe(&db.router().episodes())?;
        Ok(EpisodeAggregator {
            db,
            changes,
            snapshot: None,
        })
    }

    /// Drop the snapshot if the episodes table changed. Returns whether it
    /// did.
    pub fn invalidate_if_changed(&mut self) -> bool {
        let changed = self.changes.drain();
        if changed {
            debug!("episodes changed, dropping aggregate snapshot");
            self.snapshot = None;
        }
        changed
    }

    pub fn counts(&mut self, show_id: i32, now: NaiveDateTime) -> Result<EpisodeCounts> {
        let snapshot = self.snapshot()?;
        let mut counts = EpisodeCounts::default();
        for stamp in snapshot.get(&show_id).into_iter().flatten() {
            counts.add(stamp.first_aired, stamp.watched, now);
        }
        Ok(counts)
    }

    pub fn all_counts(&mut self, now: NaiveDateTime) -> Result<HashMap<i32, EpisodeCounts>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .iter()
            .map(|(&show_id, stamps)| {
                let mut counts = EpisodeCounts::default();
                for stamp in stamps {
                    counts.add(stamp.first_aired, stamp.watched, now);
                }
                (show_id, counts)
            })
            .collect())
    }

    fn snapshot(&mut self) -> Result<&HashMap<i32, Vec<Stamp>>> {
        self.invalidate_if_changed();

        if self.snapshot.is_none() {
            let rows = self.db.query(
                &self.db.router().episodes(),
                &Selection::episodes([EpisodeFilter::NotSpecial]),
                Order::Natural,
            )?;

            let mut grouped: HashMap<i32, Vec<Stamp>> = HashMap::new();
            for episode in rows.episodes() {
                grouped.entry(episode.show_id).or_default().push(Stamp {
                    first_aired: episode.first_aired,
                    watched: episode.watched,
                });
            }
            debug!("loaded aggregate snapshot for {} shows", grouped.len());
            self.snapshot = Some(grouped);
        }

        let snapshot: &HashMap<i32, Vec<Stamp>> = self.snapshot.get_or_insert_with(HashMap::new);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{date, insert_episode, insert_show, memory_db, new_show};
    use crate::models::NewEpisode;

    fn episode(show_id: i32, season: i32, aired: Option<NaiveDateTime>, watched: bool) -> NewEpisode {
        NewEpisode {
            show_id,
            season_number: season,
            episode_number: 1,
            name: String::new(),
            overview: String::new(),
            first_aired: aired,
            watched,
        }
    }

    /// 5 aired+watched, 2 aired+unwatched, 2 upcoming, 1 undated, and one
    /// aired special.
    fn seed(db: &Database, show_id: i32) {
        let past = Some(date(2015, 6, 1));
        let future = Some(date(2031, 6, 1));

        for _ in 0..5 {
            insert_episode(db, episode(show_id, 1, past, true));
        }
        for _ in 0..2 {
            insert_episode(db, episode(show_id, 2, past, false));
        }
        for _ in 0..2 {
            insert_episode(db, episode(show_id, 3, future, false));
        }
        insert_episode(db, episode(show_id, 3, None, false));
        insert_episode(db, episode(show_id, 0, past, false));
    }

    #[test]
    fn counts_skip_specials_and_undated_episodes() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        seed(&db, show_id);

        let mut aggregator = EpisodeAggregator::new(db.clone()).unwrap();
        let counts = aggregator.counts(show_id, date(2024, 1, 1)).unwrap();
        assert_eq!(
            counts,
            EpisodeCounts {
                num_aired: 7,
                num_watched: 5,
                num_upcoming: 2,
            }
        );

        let all = db.episodes_of(show_id).unwrap();
        assert_eq!(EpisodeCounts::tally(&all, date(2024, 1, 1)), counts);
        assert_eq!(count_by_show(&all, date(2024, 1, 1))[&show_id], counts);
    }

    #[test]
    fn watched_ahead_of_air_date_still_counts() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        insert_episode(&db, episode(show_id, 1, Some(date(2031, 1, 1)), true));

        let mut aggregator = EpisodeAggregator::new(db).unwrap();
        let counts = aggregator.counts(show_id, date(2024, 1, 1)).unwrap();
        assert_eq!(counts.num_watched, 1);
        assert_eq!(counts.num_upcoming, 1);
        assert_eq!(counts.num_aired, 0);
    }

    #[test]
    fn recomputes_after_episode_changes() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        let id = insert_episode(&db, episode(show_id, 1, Some(date(2015, 1, 1)), false));

        let mut aggregator = EpisodeAggregator::new(db.clone()).unwrap();
        let now = date(2024, 1, 1);
        assert_eq!(aggregator.counts(show_id, now).unwrap().num_watched, 0);

        db.set_episode_watched(id, true).unwrap();
        assert_eq!(aggregator.counts(show_id, now).unwrap().num_watched, 1);

        insert_episode(&db, episode(show_id, 1, Some(date(2015, 1, 8)), false));
        assert_eq!(aggregator.counts(show_id, now).unwrap().num_aired, 2);
    }

    #[test]
    fn reference_time_moves_episodes_from_upcoming_to_aired() {
        let db = memory_db();
        let show_id = insert_show(&db, new_show("Deadwood", 72023));
        insert_episode(&db, episode(show_id, 1, Some(date(2025, 3, 1)), false));

        let mut aggregator = EpisodeAggregator::new(db).unwrap();
        let before = aggregator.counts(show_id, date(2025, 2, 1)).unwrap();
        let after = aggregator.counts(show_id, date(2025, 3, 1)).unwrap();
        assert_eq!((before.num_aired, before.num_upcoming), (0, 1));
        assert_eq!((after.num_aired, after.num_upcoming), (1, 0));
    }

    #[test]
    fn unknown_show_has_zero_counts() {
        let db = memory_db();
        let mut aggregator = EpisodeAggregator::new(db).unwrap();
        assert_eq!(
            aggregator.counts(42, date(2024, 1, 1)).unwrap(),
            EpisodeCounts::default()
        );
        assert!(aggregator.all_counts(date(2024, 1, 1)).unwrap().is_empty());
    }
}
