//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a three-row split: a header with the dashboard title, a
//!   grid of source tiles, and a one-line status bar at the bottom.
//! * The grid has as many columns as fit [`MIN_TILE_WIDTH`], up to
//!   [`MAX_COLUMNS`]; rows that don't fit vertically are reached by
//!   scrolling.
//! * Tile colours come from [`status_color`].

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::source::{DataPoint, Status};

pub const MIN_TILE_WIDTH: u16 = 36;
pub const MAX_COLUMNS: usize = 3;
const TILE_HEIGHT: u16 = 7;

/// Draw the complete UI for one frame.
///
/// Called once per tick from the main loop.  Updates the app's column count
/// from the current terminal width before drawing the grid.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [header_area, grid_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    app.set_columns(columns_for(grid_area.width));

    draw_header(app, frame, header_area);
    draw_grid(app, frame, grid_area);
    draw_status_bar(app, frame, status_area);
}

pub fn status_color(status: Status) -> Color {
    match status {
        Status::Ok => Color::Green,
        Status::Warn => Color::Yellow,
        Status::Error => Color::Red,
        Status::Loading => Color::Cyan,
    }
}

fn columns_for(width: u16) -> usize {
    usize::from(width / MIN_TILE_WIDTH).clamp(1, MAX_COLUMNS)
}

fn draw_header(app: &App, frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(Span::styled(
        app.title.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .centered()
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

/// Render the visible tile rows, starting at the app's scroll offset.
fn draw_grid(app: &App, frame: &mut Frame, area: Rect) {
    let tiles = app.tiles();
    let columns = app.columns();
    let visible_rows = usize::from((area.height / TILE_HEIGHT).max(1));

    let row_areas = Layout::vertical(vec![Constraint::Length(TILE_HEIGHT); visible_rows]).split(area);
    let col_constraints = vec![Constraint::Ratio(1, columns as u32); columns];

    for (row_area, row) in row_areas
        .iter()
        .zip(tiles.chunks(columns).skip(app.scroll))
    {
        let cells = Layout::horizontal(col_constraints.clone()).split(*row_area);
        for (cell, point) in cells.iter().zip(row) {
            draw_tile(point, frame, *cell);
        }
    }
}

fn draw_tile(point: &DataPoint, frame: &mut Frame, area: Rect) {
    let color = status_color(point.status);

    let mut lines: Vec<Line> = point
        .value
        .lines()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(color))))
        .collect();
    if point.has_detail() {
        lines.extend(
            point
                .detail
                .lines()
                .map(|l| Line::from(Span::styled(l, Style::default().add_modifier(Modifier::DIM)))),
        );
    }

    let tile = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(format!(" {} ", point.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
    );
    frame.render_widget(tile, area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let refreshed = app
        .last_refresh
        .map(|t| format!("Updated {}", t.format("%H:%M:%S")))
        .unwrap_or_else(|| "Waiting for data…".into());

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(refreshed, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} sources", app.tiles().len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  ↑/↓: scroll  Home/End: jump  r: refresh"),
    ]));
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn sample_app() -> App {
        let mut app = App::new(
            "Test Dash",
            vec!["Weather".into(), "News".into(), "Mail".into()],
        );
        let mut snap = Snapshot::new();
        snap.insert(
            "Weather".into(),
            DataPoint::ok("Weather", "22.5 F, wind 8 mph"),
        );
        snap.insert(
            "News".into(),
            DataPoint::error("News", "Missing URL").with_detail("check options"),
        );
        app.refresh(snap);
        app
    }

    // -- rendering (smoke tests) ---------------------------------------------

    #[test]
    fn draw_does_not_panic_with_no_sources() {
        let mut app = App::new("Empty", Vec::new());
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();
    }

    #[test]
    fn draw_does_not_panic_on_tiny_terminal() {
        let mut app = sample_app();
        let mut terminal = Terminal::new(TestBackend::new(10, 4)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();
    }

    #[test]
    fn tiles_show_titles_values_and_details() {
        let mut app = sample_app();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Test Dash"));
        assert!(text.contains("22.5 F, wind 8 mph"));
        assert!(text.contains("Missing URL"));
        assert!(text.contains("check options"));
        assert!(text.contains("Loading..."), "unsnapshotted source shows loading");
        assert!(text.contains("3 sources"));
        assert!(text.contains("Updated "));
    }

    #[test]
    fn tile_border_uses_status_colour() {
        let mut app = sample_app();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();

        // Grid starts below the 3-line header; first tile's top-left corner.
        let buf = terminal.backend().buffer();
        assert_eq!(buf[(0, 3)].fg, Color::Green);
    }

    #[test]
    fn grid_width_sets_columns() {
        assert_eq!(columns_for(20), 1);
        assert_eq!(columns_for(80), 2);
        assert_eq!(columns_for(500), MAX_COLUMNS);

        let mut app = sample_app();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();
        assert_eq!(app.columns(), 2);
    }

    #[test]
    fn scrolled_rows_are_hidden() {
        let mut app = sample_app();
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();
        assert_eq!(app.columns(), 1);
        assert!(screen_text(&terminal).contains("Weather"));

        app.scroll_to_bottom();
        terminal.draw(|f| draw(&mut app, f)).unwrap();
        let text = screen_text(&terminal);
        assert!(!text.contains("Weather"));
        assert!(text.contains("Mail"));
    }

    #[test]
    fn status_colours() {
        assert_eq!(status_color(Status::Ok), Color::Green);
        assert_eq!(status_color(Status::Warn), Color::Yellow);
        assert_eq!(status_color(Status::Error), Color::Red);
        assert_eq!(status_color(Status::Loading), Color::Cyan);
    }
}
