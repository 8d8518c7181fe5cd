use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{DashboardConfig, DatasetYear};
use crate::dashboard::DashboardView;
use crate::data::cache::TableCache;
use crate::data::filter::PropertyType;
use crate::data::model::TransactionTable;

// ---------------------------------------------------------------------------
// Time-series window
// ---------------------------------------------------------------------------

/// Visible x-range of the time-series chart, in days from the common era.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeWindow {
    pub range: Option<(f64, f64)>,
    /// Set when the range changed and the plot bounds must follow.
    pub pending: bool,
}

impl TimeWindow {
    pub fn set(&mut self, start: f64, end: f64) {
        self.range = Some((start.min(end), start.max(end)));
        self.pending = true;
    }

    /// Take the range if it has not been applied to the plot yet.
    pub fn take_pending(&mut self) -> Option<(f64, f64)> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        self.range
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded tables, keyed by file path.
    pub cache: TableCache,

    pub year: DatasetYear,
    pub property_type: PropertyType,

    /// Charts for the current selection, rebuilt only when it changes.
    pub view: DashboardView,

    pub time_window: TimeWindow,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let year = config.initial_year;
        let property_type = config.initial_property_type;
        let mut state = AppState {
            cache: TableCache::new(config.chunk_size),
            view: DashboardView::build(year, &TransactionTable::empty(config.path_for(year)), property_type),
            config,
            year,
            property_type,
            time_window: TimeWindow::default(),
            status_message: None,
        };
        state.refresh();
        state
    }

    /// Path of the file backing the selected year.
    pub fn current_path(&self) -> PathBuf {
        self.config.path_for(self.year)
    }

    pub fn select_year(&mut self, year: DatasetYear) {
        if year != self.year {
            self.year = year;
            self.refresh();
        }
    }

    pub fn select_property_type(&mut self, property_type: PropertyType) {
        if property_type != self.property_type {
            self.property_type = property_type;
            self.refresh();
        }
    }

    /// Re-read the selected year's file.
    pub fn reload(&mut self) {
        let path = self.current_path();
        self.cache.invalidate(&path);
        self.refresh();
    }

    /// Point the dashboard at another dataset directory.
    pub fn set_dataset_dir(&mut self, dir: PathBuf) {
        log::info!("Dataset directory set to {}", dir.display());
        self.config.dataset_dir = dir;
        self.cache.clear();
        self.refresh();
    }

    /// Rebuild the view for the current selection.
    ///
    /// A file that cannot be loaded is reported in the status line and the
    /// charts are drawn over an empty table.
    pub fn refresh(&mut self) {
        let path = self.current_path();
        let table = match self.cache.get_or_load(&path) {
            Ok(table) => {
                self.status_message = None;
                table
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                Arc::new(TransactionTable::empty(path))
            }
        };

        self.view = DashboardView::build(self.year, &table, self.property_type);
        self.time_window = TimeWindow::default();
    }

    /// Write the current charts as pretty-printed JSON.
    pub fn export_view(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &self.view)
            .context("writing chart JSON")?;
        log::info!("Exported charts to {}", path.display());
        Ok(())
    }
}
