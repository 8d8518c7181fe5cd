//! Chart descriptions produced by the builders and drawn by `ui::plot`.
//!
//! A [`ChartSpec`] is plain data (kind, data, layout) so it can be rendered,
//! inspected in tests, or exported as JSON without touching the GUI.

pub mod builders;
pub mod geo;

use chrono::{Months, NaiveDate};
use serde::Serialize;

// ---------------------------------------------------------------------------
// ChartSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Pie,
    Histogram,
    Scatter,
    TimeSeries,
    ScatterGeo,
}

/// One histogram bin, `[start, end)` except the last which includes `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// A plotted coordinate pair; never contains a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartData {
    Bar {
        labels: Vec<String>,
        values: Vec<f64>,
        /// Text drawn on each bar.
        text: Vec<String>,
    },
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
        /// Inner radius as a fraction of the outer one.
        hole: f64,
    },
    Histogram {
        bins: Vec<HistogramBin>,
    },
    Scatter {
        x: Vec<String>,
        y: Vec<f64>,
        /// Value mapped onto the colour scale, one per point.
        color: Vec<f64>,
        /// Extra per-point hover text.
        hover: Vec<String>,
    },
    TimeSeries {
        dates: Vec<NaiveDate>,
        counts: Vec<f64>,
    },
    ScatterGeo {
        points: Vec<GeoPoint>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverMode {
    X,
    Closest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStep {
    Month,
    Year,
    All,
}

/// A zoom preset button of the time-series range selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangePreset {
    pub label: String,
    pub count: u32,
    pub step: RangeStep,
}

impl RangePreset {
    pub fn new(label: &str, count: u32, step: RangeStep) -> Self {
        RangePreset {
            label: label.to_string(),
            count,
            step,
        }
    }

    /// The `1m`, `6m`, `1y`, `all` buttons.
    pub fn standard() -> Vec<RangePreset> {
        vec![
            RangePreset::new("1m", 1, RangeStep::Month),
            RangePreset::new("6m", 6, RangeStep::Month),
            RangePreset::new("1y", 1, RangeStep::Year),
            RangePreset::new("all", 0, RangeStep::All),
        ]
    }

    /// First visible date when the preset is applied "backward" from `last`,
    /// clamped to `first`.
    pub fn window_start(&self, first: NaiveDate, last: NaiveDate) -> NaiveDate {
        let months = match self.step {
            RangeStep::Month => self.count,
            RangeStep::Year => self.count * 12,
            RangeStep::All => return first,
        };
        last.checked_sub_months(Months::new(months))
            .map_or(first, |start| start.max(first))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub width: f32,
    pub height: f32,
    pub hovermode: Option<HoverMode>,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub range_selector: Vec<RangePreset>,
    pub range_slider: bool,
}

impl Layout {
    pub fn new(title: &str, width: f32, height: f32) -> Self {
        Layout {
            title: title.to_string(),
            width,
            height,
            hovermode: None,
            x_title: None,
            y_title: None,
            range_selector: Vec::new(),
            range_slider: false,
        }
    }

    pub fn hovermode(mut self, mode: HoverMode) -> Self {
        self.hovermode = Some(mode);
        self
    }

    pub fn axis_titles(mut self, x: &str, y: &str) -> Self {
        self.x_title = Some(x.to_string());
        self.y_title = Some(y.to_string());
        self
    }
}

/// A complete, renderer-independent chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(flatten)]
    pub data: ChartData,
    pub layout: Layout,
}

impl ChartSpec {
    pub fn kind(&self) -> ChartKind {
        match self.data {
            ChartData::Bar { .. } => ChartKind::Bar,
            ChartData::Pie { .. } => ChartKind::Pie,
            ChartData::Histogram { .. } => ChartKind::Histogram,
            ChartData::Scatter { .. } => ChartKind::Scatter,
            ChartData::TimeSeries { .. } => ChartKind::TimeSeries,
            ChartData::ScatterGeo { .. } => ChartKind::ScatterGeo,
        }
    }

    /// True when there is nothing to draw. A histogram is empty when every
    /// bin is zero, even though it still carries its bins.
    pub fn is_empty(&self) -> bool {
        match &self.data {
            ChartData::Bar { values, .. } | ChartData::Pie { values, .. } => values.is_empty(),
            ChartData::Histogram { bins } => bins.iter().all(|b| b.count == 0),
            ChartData::Scatter { y, .. } => y.is_empty(),
            ChartData::TimeSeries { dates, .. } => dates.is_empty(),
            ChartData::ScatterGeo { points } => points.is_empty(),
        }
    }
}
