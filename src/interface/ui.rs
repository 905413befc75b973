use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Paragraph, Row, Scrollbar, ScrollbarOrientation, Table, Tabs, Wrap,
    },
    Frame,
};

use crate::filter::ShowsFilter;
use crate::interface::app::App;

/// Renders the user interface widgets.
pub fn render(app: &mut App, frame: &mut Frame) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_filter_menu(app, frame, outer[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(outer[1]);

    render_shows(app, frame, chunks[0]);
    render_details(app, frame, chunks[1]);
    render_status(app, frame, outer[2]);
}

fn render_filter_menu(app: &App, frame: &mut Frame, area: Rect) {
    let titles = ShowsFilter::MODES
        .iter()
        .map(|mode| format!("{} {}", mode.code() + 1, mode.label()));

    let tabs = Tabs::new(titles)
        .select(app.shows.mode().code() as usize)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_shows(app: &mut App, frame: &mut Frame, area: Rect) {
    let rows: Vec<Row> = app.shows.iter().map(Row::from).collect();
    let title = format!("Shows ({})", app.shows.len());

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Min(20),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(6),
        ],
    )
    .header(
        Row::new(vec!["", "name", "watched", "upcoming", "year"])
            .style(Style::default().fg(Color::Yellow)),
    )
    .block(Block::default().title(title).borders(Borders::ALL))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol(">> ")
    .style(Style::default().fg(Color::Cyan));

    frame.render_stateful_widget(table, area, &mut app.table_state);

    frame.render_stateful_widget(
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓")),
        area,
        &mut app.scroll_state,
    );
}

fn render_details(app: &App, frame: &mut Frame, area: Rect) {
    let text = match app.selected() {
        Some(entry) => Text::from(entry),
        None => Text::from("no shows"),
    };

    let title = app
        .selected()
        .map(|entry| entry.show.name.clone())
        .unwrap_or_default();

    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let line = match &app.status {
        Some(status) => Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Green),
        )),
        None => Line::from(Span::styled(
            "q quit  s star  a archive  w/W watched  f filter  1-5 pick filter",
            Style::default().fg(Color::DarkGray),
        )),
    };

    frame.render_widget(Paragraph::new(line), area);
}
