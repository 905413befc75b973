//! Show list filters.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::EpisodeCounts;
use crate::models::Show;

/// Which shows the list displays.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ShowsFilter {
    #[default]
    All,
    Starred,
    Uncompleted,
    Archived,
    Upcoming,
}

impl ShowsFilter {
    pub const MODES: [ShowsFilter; 5] = [
        ShowsFilter::All,
        ShowsFilter::Starred,
        ShowsFilter::Uncompleted,
        ShowsFilter::Archived,
        ShowsFilter::Upcoming,
    ];

    /// Position in the filter menu.
    pub fn code(self) -> i32 {
        match self {
            ShowsFilter::All => 0,
            ShowsFilter::Starred => 1,
            ShowsFilter::Uncompleted => 2,
            ShowsFilter::Archived => 3,
            ShowsFilter::Upcoming => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::MODES.into_iter().find(|mode| mode.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            ShowsFilter::All => "all",
            ShowsFilter::Starred => "starred",
            ShowsFilter::Uncompleted => "uncompleted",
            ShowsFilter::Archived => "archived",
            ShowsFilter::Upcoming => "upcoming",
        }
    }

    /// The mode after this one, wrapping around.
    pub fn next(self) -> Self {
        let index = Self::MODES.iter().position(|m| *m == self).unwrap_or(0);
        Self::MODES[(index + 1) % Self::MODES.len()]
    }

    pub fn includes(self, show: &Show, counts: &EpisodeCounts) -> bool {
        match self {
            ShowsFilter::All => !show.archived,
            ShowsFilter::Starred => show.starred,
            ShowsFilter::Archived => show.archived,
            ShowsFilter::Uncompleted => !show.archived && counts.num_watched < counts.num_aired,
            ShowsFilter::Upcoming => {
                !show.archived && counts.num_upcoming > 0 && counts.caught_up()
            }
        }
    }
}

impl fmt::Display for ShowsFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown shows filter '{0}'")]
pub struct UnknownFilter(pub String);

impl FromStr for ShowsFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::MODES
            .into_iter()
            .find(|mode| mode.label() == wanted)
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

/// Positions in `shows` that `mode` keeps, in their original order.
///
/// Shows missing from `counts` are treated as having no episodes.
pub fn filter_shows(
    shows: &[Show],
    mode: ShowsFilter,
    counts: &HashMap<i32, EpisodeCounts>,
) -> Vec<usize> {
    let empty = EpisodeCounts::default();
    shows
        .iter()
        .enumerate()
        .filter(|(_, show)| mode.includes(show, counts.get(&show.id).unwrap_or(&empty)))
        .map(|(position, _)| position)
        .collect()
}
