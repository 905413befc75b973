use ratatui::{
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Cell, Row},
};

use crate::shows_list::ShowEntry;

// a show in the list
impl<'a> From<ShowEntry<'a>> for Row<'a> {
    fn from(entry: ShowEntry<'a>) -> Self {
        let show = entry.show;
        let counts = entry.counts;

        let marker = match (show.starred, show.archived) {
            (_, true) => Cell::from("a").style(Style::default().fg(Color::DarkGray)),
            (true, false) => Cell::from("*").style(Style::default().fg(Color::Yellow)),
            (false, false) => Cell::from(""),
        };

        Row::new(vec![
            marker,
            Cell::from(show.name.as_str()),
            Cell::from(format!("{}/{}", counts.num_watched, counts.num_aired)),
            Cell::from(match counts.num_upcoming {
                0 => String::new(),
                n => n.to_string(),
            }),
            Cell::from(match show.first_aired {
                Some(date) => date.format("%Y").to_string(),
                None => "-".to_string(),
            }),
        ])
    }
}

// details pane for the selected show
impl<'a> From<ShowEntry<'a>> for Text<'a> {
    fn from(entry: ShowEntry<'a>) -> Self {
        let show = entry.show;
        let counts = entry.counts;

        let mut lines = vec![
            Line::default(),
            Line::from(format!(
                "First aired: {}",
                show.first_aired
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            )),
            Line::from(format!(
                "{} aired, {} watched, {} upcoming",
                counts.num_aired, counts.num_watched, counts.num_upcoming
            )),
        ];
        if let Some(tvdb_id) = show.tvdb_id {
            lines.push(Line::from(format!("TheTVDB: {tvdb_id}")));
        }
        lines.push(Line::default());
        lines.push(Line::from(show.overview.as_str()));

        Text::from(lines)
    }
}
