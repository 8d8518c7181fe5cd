use serde::Serialize;

use crate::charts::builders::{
    bar_chart, histogram, pie_chart, property_type_overview, scatter_chart, time_series,
};
use crate::charts::geo::{geo_view, GeoView};
use crate::charts::ChartSpec;
use crate::config::DatasetYear;
use crate::data::filter::{filter_by_type, PropertyType};
use crate::data::model::TransactionTable;

// ---------------------------------------------------------------------------
// DashboardView – every chart for one (year, property type) selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub year: DatasetYear,
    pub property_type: PropertyType,
    /// Rows in the whole year table.
    pub total_rows: usize,
    /// Rows left after filtering by property type.
    pub selected_rows: usize,
    /// `type_local` counts over the whole year.
    pub overview: ChartSpec,
    pub pie: ChartSpec,
    pub bar: ChartSpec,
    pub histogram: ChartSpec,
    pub scatter: ChartSpec,
    pub time_series: ChartSpec,
    pub geo: GeoView,
}

impl DashboardView {
    /// Filter `table` and run every builder on the result.
    pub fn build(year: DatasetYear, table: &TransactionTable, property_type: PropertyType) -> Self {
        let view = filter_by_type(table, property_type);
        log::debug!(
            "{year} / {property_type}: {} of {} rows",
            view.len(),
            table.len()
        );

        DashboardView {
            year,
            property_type,
            total_rows: table.len(),
            selected_rows: view.len(),
            overview: property_type_overview(table.records()),
            pie: pie_chart(view.iter()),
            bar: bar_chart(view.iter()),
            histogram: histogram(view.iter().map(|r| r.valeur_fonciere)),
            scatter: scatter_chart(view.iter()),
            time_series: time_series(view.iter()),
            geo: geo_view(view.iter()),
        }
    }

    /// The grid charts in display order (left column first).
    pub fn grid(&self) -> [&ChartSpec; 5] {
        [
            &self.bar,
            &self.pie,
            &self.scatter,
            &self.histogram,
            &self.time_series,
        ]
    }
}
