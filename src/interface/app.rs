use chrono::{NaiveDateTime, Utc};
use log::*;
use ratatui::widgets::{ScrollbarState, TableState};

use crate::config::Preferences;
use crate::db::Database;
use crate::filter::ShowsFilter;
use crate::shows_list::{ShowEntry, ShowsList};

/// Application.
pub struct App {
    /// Is the application running?
    pub running: bool,

    pub db: Database,
    pub prefs: Preferences,
    pub shows: ShowsList,

    pub table_state: TableState,
    pub scroll_state: ScrollbarState,

    /// One-line message for the status bar.
    pub status: Option<String>,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl App {
    /// Constructs a new instance of [`App`].
    pub fn new(db: Database, prefs: Preferences) -> eyre::Result<Self> {
        let shows = ShowsList::new(db.clone(), prefs.watch_shows_filter())?;
        let mut app = App {
            running: true,
            db,
            prefs,
            shows,
            table_state: TableState::default(),
            scroll_state: ScrollbarState::default(),
            status: None,
        };
        app.reload()?;
        Ok(app)
    }

    /// Handles the tick event of the terminal.
    pub fn tick(&mut self) -> eyre::Result<()> {
        self.reload()
    }

    /// Pick up store and preference changes, keeping the selection in range.
    fn reload(&mut self) -> eyre::Result<()> {
        if !self.shows.refresh(now())? {
            return Ok(());
        }

        let len = self.shows.len();
        self.scroll_state = self.scroll_state.content_length(len);
        let selected = match (self.table_state.selected(), len) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.table_state.select(selected);
        self.scroll_state = self.scroll_state.position(selected.unwrap_or(0));
        Ok(())
    }

    /// Set running to false to quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn selected(&self) -> Option<ShowEntry<'_>> {
        self.shows.get(self.table_state.selected()?)
    }

    fn select(&mut self, i: usize) {
        self.table_state.select(Some(i));
        self.scroll_state = self.scroll_state.position(i);
    }

    pub fn next(&mut self, step: usize) {
        if self.shows.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => std::cmp::min(i + step, self.shows.len() - 1),
            None => 0,
        };
        self.select(i);
    }

    pub fn prev(&mut self, step: usize) {
        if self.shows.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => i.saturating_sub(step),
            None => self.shows.len() - 1,
        };
        self.select(i);
    }

    pub fn first(&mut self) {
        if !self.shows.is_empty() {
            self.select(0);
        }
    }

    pub fn last(&mut self) {
        if !self.shows.is_empty() {
            self.select(self.shows.len() - 1);
        }
    }

    pub fn toggle_starred(&mut self) -> eyre::Result<()> {
        if let Some(i) = self.table_state.selected() {
            self.shows.toggle_starred(i)?;
            self.reload()?;
        }
        Ok(())
    }

    pub fn toggle_archived(&mut self) -> eyre::Result<()> {
        if let Some(i) = self.table_state.selected() {
            self.shows.toggle_archived(i)?;
            self.reload()?;
        }
        Ok(())
    }

    /// Mark every aired episode of the selected show watched, or clear
    /// them all.
    pub fn set_show_watched(&mut self, watched: bool) -> eyre::Result<()> {
        let Some(entry) = self.selected() else {
            return Ok(());
        };
        let (show_id, name) = (entry.show.id, entry.show.name.clone());

        let count = self.db.set_watched_through(show_id, None, watched, now())?;
        info!("marked {} episodes of show {} watched={}", count, show_id, watched);
        self.status = Some(format!(
            "{} episodes of {} marked {}",
            count,
            name,
            if watched { "watched" } else { "unwatched" }
        ));
        self.reload()
    }

    pub fn set_filter(&mut self, mode: ShowsFilter) -> eyre::Result<()> {
        self.prefs.set_shows_filter(mode)?;
        self.status = Some(format!("showing {} shows", mode));
        self.reload()
    }

    pub fn cycle_filter(&mut self) -> eyre::Result<()> {
        self.set_filter(self.shows.mode().next())
    }
}
