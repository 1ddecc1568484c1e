use chrono::{DateTime, Local};

use crate::snapshot::{entry_or_loading, Snapshot};
use crate::source::DataPoint;

/// Tiles per grid row before the UI has measured the terminal.
const DEFAULT_COLUMNS: usize = 2;

pub struct App {
    /// Dashboard title shown in the header.
    pub title: String,
    /// Source names in configured order; fixes tile order.
    titles: Vec<String>,
    /// Latest pulled snapshot.
    snapshot: Snapshot,
    /// Tiles per grid row, set by the UI from the terminal width.
    columns: usize,
    /// First visible tile row.
    pub scroll: usize,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Set by `r`; the main loop pulls a snapshot on its next tick.
    refresh_requested: bool,
    /// When the snapshot was last pulled.
    pub last_refresh: Option<DateTime<Local>>,
}

impl App {
    pub fn new(title: impl Into<String>, titles: Vec<String>) -> Self {
        Self {
            title: title.into(),
            titles,
            snapshot: Snapshot::new(),
            columns: DEFAULT_COLUMNS,
            scroll: 0,
            quit: false,
            refresh_requested: false,
            last_refresh: None,
        }
    }

    /// Replace the displayed snapshot.
    pub fn refresh(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.last_refresh = Some(Local::now());
        self.refresh_requested = false;
    }

    /// One tile per configured source, in order.  Sources missing from the
    /// snapshot show as loading.
    pub fn tiles(&self) -> Vec<DataPoint> {
        self.titles
            .iter()
            .map(|name| entry_or_loading(&self.snapshot, name))
            .collect()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
        self.scroll = self.scroll.min(self.last_row());
    }

    pub fn row_count(&self) -> usize {
        self.titles.len().div_ceil(self.columns)
    }

    fn last_row(&self) -> usize {
        self.row_count().saturating_sub(1)
    }

    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Whether a refresh was requested since the last pull.
    pub fn refresh_requested(&self) -> bool {
        self.refresh_requested
    }

    // -- navigation ----------------------------------------------------------

    pub fn scroll_down(&mut self) {
        self.scroll = (self.scroll + 1).min(self.last_row());
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.last_row();
    }
}
