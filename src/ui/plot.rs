use std::f32::consts::{FRAC_PI_2, TAU};

use chrono::{Datelike, NaiveDate};
use eframe::egui::{
    self, Align2, Color32, FontId, RichText, ScrollArea, Sense, Shape, Stroke, Ui, Vec2,
};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Line, Plot, PlotBounds, PlotPoint, PlotPoints, Points, Text};

use crate::charts::geo::GeoView;
use crate::charts::{ChartData, ChartSpec, HistogramBin, Layout, RangePreset};
use crate::color::{generate_palette, ColorScale};
use crate::state::{AppState, TimeWindow};

const BAR_COLOR: Color32 = Color32::from_rgb(99, 110, 250);
const LINE_COLOR: Color32 = Color32::from_rgb(99, 110, 250);
/// Colour buckets used for the count-coloured scatter.
const SCATTER_SHADES: usize = 8;
/// Legend rows shown next to the donut.
const PIE_LEGEND_ROWS: usize = 12;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the overview, the two-column chart grid and the geographic view.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let AppState {
        view, time_window, ..
    } = state;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            chart_panel(ui, "overview", &view.overview);
            ui.add_space(8.0);

            ui.columns(2, |columns: &mut [Ui]| {
                chart_panel(&mut columns[0], "bar", &view.bar);
                chart_panel(&mut columns[0], "scatter", &view.scatter);

                chart_panel(&mut columns[1], "pie", &view.pie);
                chart_panel(&mut columns[1], "histogram", &view.histogram);
                time_series_panel(&mut columns[1], &view.time_series, time_window);
            });
            ui.add_space(8.0);

            geo_panel(ui, &view.geo);
        });
}

fn panel_header(ui: &mut Ui, spec: &ChartSpec) {
    ui.strong(&spec.layout.title);
    if spec.is_empty() {
        ui.label(RichText::new("No data for this selection").weak());
    }
}

/// Render one chart inside a framed group.
pub fn chart_panel(ui: &mut Ui, id: &str, spec: &ChartSpec) {
    ui.group(|ui: &mut Ui| {
        panel_header(ui, spec);
        match &spec.data {
            ChartData::Bar {
                labels,
                values,
                text,
            } => bar_plot(ui, id, labels, values, text, &spec.layout),
            ChartData::Pie {
                labels,
                values,
                hole,
            } => donut(ui, labels, values, *hole, &spec.layout),
            ChartData::Histogram { bins } => histogram_plot(ui, id, bins, &spec.layout),
            ChartData::Scatter { x, y, color, hover } => {
                scatter_plot(ui, id, x, y, color, hover, &spec.layout)
            }
            // Drawn by their own panels.
            ChartData::TimeSeries { .. } | ChartData::ScatterGeo { .. } => {}
        }
    });
}

// ---------------------------------------------------------------------------
// Category axis helpers
// ---------------------------------------------------------------------------

fn category_at(labels: &[String], x: f64) -> Option<&str> {
    let i = x.round();
    if (x - i).abs() > 0.25 || i < 0.0 {
        return None;
    }
    labels.get(i as usize).map(String::as_str)
}

fn short(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let head: String = label.chars().take(max_chars - 1).collect();
        format!("{head}…")
    }
}

fn base_plot<'a>(id: &str, layout: &'a Layout) -> Plot<'a> {
    let mut plot = Plot::new(id)
        .height(layout.height * 0.75)
        .allow_scroll(false)
        .allow_boxed_zoom(true);
    if let Some(x) = &layout.x_title {
        plot = plot.x_axis_label(x.as_str());
    }
    if let Some(y) = &layout.y_title {
        plot = plot.y_axis_label(y.as_str());
    }
    plot
}

// ---------------------------------------------------------------------------
// Bar / histogram
// ---------------------------------------------------------------------------

fn bar_plot(
    ui: &mut Ui,
    id: &str,
    labels: &[String],
    values: &[f64],
    text: &[String],
    layout: &Layout,
) {
    let bars: Vec<Bar> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            Bar::new(i as f64, v)
                .name(&labels[i])
                .width(0.7)
                .fill(BAR_COLOR)
        })
        .collect();

    let axis_labels = labels.to_vec();
    let hover_labels = labels.to_vec();
    base_plot(id, layout)
        .x_axis_formatter(move |mark, _range| {
            category_at(&axis_labels, mark.value)
                .map(|l| short(l, 14))
                .unwrap_or_default()
        })
        .label_formatter(move |_name, point| match category_at(&hover_labels, point.x) {
            Some(label) => format!("{label}\ncount: {:.0}", point.y),
            None => String::new(),
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR));
            // Count labels just above each bar.
            for (i, (v, t)) in values.iter().zip(text).enumerate() {
                plot_ui.text(
                    Text::new(PlotPoint::new(i as f64, *v), t.as_str())
                        .anchor(Align2::CENTER_BOTTOM)
                        .color(Color32::GRAY),
                );
            }
        });
}

fn histogram_plot(ui: &mut Ui, id: &str, bins: &[HistogramBin], layout: &Layout) {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new(b.center(), b.count as f64)
                .width(b.width())
                .name(format!("{:.0} – {:.0}", b.start, b.end))
                .fill(BAR_COLOR)
        })
        .collect();

    base_plot(id, layout).show(ui, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR));
    });
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

fn scatter_plot(
    ui: &mut Ui,
    id: &str,
    x: &[String],
    y: &[f64],
    color: &[f64],
    hover: &[String],
    layout: &Layout,
) {
    let scale = ColorScale::from_values(color);

    // One Points item per colour shade; egui_plot colours a series, not a point.
    let mut shades: Vec<Vec<[f64; 2]>> = vec![Vec::new(); SCATTER_SHADES];
    for (i, (&yi, &ci)) in y.iter().zip(color).enumerate() {
        let shade = ((scale.fraction(ci) * SCATTER_SHADES as f32) as usize).min(SCATTER_SHADES - 1);
        shades[shade].push([i as f64, yi]);
    }

    let axis_labels = x.to_vec();
    let hover_labels: Vec<String> = x
        .iter()
        .zip(hover)
        .map(|(street, nature)| format!("{street} ({nature})"))
        .collect();

    base_plot(id, layout)
        .x_axis_formatter(move |mark, _range| {
            category_at(&axis_labels, mark.value)
                .map(|l| short(l, 14))
                .unwrap_or_default()
        })
        .label_formatter(move |_name, point| match category_at(&hover_labels, point.x) {
            Some(label) => format!("{label}\ncounts: {:.0}", point.y),
            None => String::new(),
        })
        .show(ui, |plot_ui| {
            for (shade, points) in shades.into_iter().enumerate() {
                if points.is_empty() {
                    continue;
                }
                let t = (shade as f64 + 0.5) / SCATTER_SHADES as f64;
                let value = scale.min() + t * (scale.max() - scale.min());
                plot_ui.points(
                    Points::new(PlotPoints::new(points))
                        .radius(3.0)
                        .color(scale.color_for(value)),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Donut
// ---------------------------------------------------------------------------

fn donut(ui: &mut Ui, labels: &[String], values: &[f64], hole: f64, layout: &Layout) {
    let size = Vec2::new(ui.available_width(), layout.height * 0.75);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return;
    }

    let rect = response.rect;
    let radius = (rect.height().min(rect.width() * 0.55) / 2.0 - 4.0).max(4.0);
    let inner = radius * hole as f32;
    let center = rect.left_center() + Vec2::new(radius + 4.0, 0.0);
    let palette = generate_palette(values.len());

    let hovered_angle = response.hover_pos().and_then(|p| {
        let d = p - center;
        let r = d.length();
        (r >= inner && r <= radius).then(|| (d.y.atan2(d.x) + FRAC_PI_2).rem_euclid(TAU))
    });
    let mut hovered = None;

    let mut angle = 0.0f32;
    for (i, &v) in values.iter().enumerate() {
        let sweep = (v / total) as f32 * TAU;
        let steps = ((sweep / TAU * 128.0).ceil() as usize).max(1);
        for s in 0..steps {
            let a0 = angle + sweep * s as f32 / steps as f32 - FRAC_PI_2;
            let a1 = angle + sweep * (s + 1) as f32 / steps as f32 - FRAC_PI_2;
            let quad = vec![
                center + Vec2::angled(a0) * inner,
                center + Vec2::angled(a0) * radius,
                center + Vec2::angled(a1) * radius,
                center + Vec2::angled(a1) * inner,
            ];
            painter.add(Shape::convex_polygon(quad, palette[i], Stroke::NONE));
        }

        // Percentages only where they fit.
        if sweep > 0.3 {
            let mid = angle + sweep / 2.0 - FRAC_PI_2;
            painter.text(
                center + Vec2::angled(mid) * (inner + radius) / 2.0,
                Align2::CENTER_CENTER,
                format!("{:.1}%", v / total * 100.0),
                FontId::proportional(10.0),
                Color32::WHITE,
            );
        }
        if hovered_angle.is_some_and(|a| a >= angle && a < angle + sweep) {
            hovered = Some(i);
        }
        angle += sweep;
    }

    if let Some(i) = hovered {
        painter.text(
            center,
            Align2::CENTER_CENTER,
            format!("{}\n{}", labels[i], values[i]),
            FontId::proportional(12.0),
            ui.visuals().text_color(),
        );
    }

    // Legend on the right.
    let mut y = rect.top() + 8.0;
    let x = center.x + radius + 16.0;
    for (i, label) in labels.iter().enumerate().take(PIE_LEGEND_ROWS) {
        painter.rect_filled(
            egui::Rect::from_min_size(egui::pos2(x, y), Vec2::splat(10.0)),
            2.0,
            palette[i],
        );
        painter.text(
            egui::pos2(x + 14.0, y + 5.0),
            Align2::LEFT_CENTER,
            label,
            FontId::proportional(11.0),
            ui.visuals().text_color(),
        );
        y += 16.0;
    }
    if labels.len() > PIE_LEGEND_ROWS {
        painter.text(
            egui::pos2(x, y + 5.0),
            Align2::LEFT_CENTER,
            format!("… {} more", labels.len() - PIE_LEGEND_ROWS),
            FontId::proportional(11.0),
            ui.visuals().weak_text_color(),
        );
    }
}

// ---------------------------------------------------------------------------
// Time series with presets and range slider
// ---------------------------------------------------------------------------

fn days(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn date_label(days: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(days.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn time_series_panel(ui: &mut Ui, spec: &ChartSpec, window: &mut TimeWindow) {
    ui.group(|ui: &mut Ui| {
        panel_header(ui, spec);
        let ChartData::TimeSeries { dates, counts } = &spec.data else {
            return;
        };
        let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
            base_plot("time_series", &spec.layout).show(ui, |_| {});
            return;
        };
        let (lo, hi) = (days(first), days(last));

        if !spec.layout.range_selector.is_empty() {
            ui.horizontal(|ui: &mut Ui| {
                for preset in &spec.layout.range_selector {
                    if ui.small_button(&preset.label).clicked() {
                        apply_preset(window, preset, first, last);
                    }
                }
            });
        }

        let points: PlotPoints = dates
            .iter()
            .zip(counts)
            .map(|(&d, &n)| [days(d), n])
            .collect();
        let y_max = counts.iter().copied().fold(1.0, f64::max);
        let pending = window.take_pending();

        base_plot("time_series", &spec.layout)
            .x_axis_formatter(|mark, _range| date_label(mark.value))
            .label_formatter(|_name, point| {
                format!("{}\ncounts: {:.0}", date_label(point.x), point.y)
            })
            .show(ui, |plot_ui| {
                if let Some((start, end)) = pending {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                        [start - 0.5, 0.0],
                        [end + 0.5, y_max * 1.1],
                    ));
                }
                plot_ui.line(Line::new(points).color(LINE_COLOR).width(1.5));
            });

        if spec.layout.range_slider && hi > lo {
            let (mut start, mut end) = window.range.unwrap_or((lo, hi));
            let from = ui.add(
                egui::Slider::new(&mut start, lo..=hi)
                    .text("from")
                    .custom_formatter(|v, _| date_label(v)),
            );
            let to = ui.add(
                egui::Slider::new(&mut end, lo..=hi)
                    .text("to")
                    .custom_formatter(|v, _| date_label(v)),
            );
            if from.changed() || to.changed() {
                window.set(start, end);
            }
        }
    });
}

fn apply_preset(window: &mut TimeWindow, preset: &RangePreset, first: NaiveDate, last: NaiveDate) {
    window.set(days(preset.window_start(first, last)), days(last));
}

// ---------------------------------------------------------------------------
// Geographic view
// ---------------------------------------------------------------------------

fn geo_panel(ui: &mut Ui, geo: &GeoView) {
    ui.group(|ui: &mut Ui| {
        panel_header(ui, &geo.chart);
        let ChartData::ScatterGeo { points } = &geo.chart.data else {
            return;
        };

        let coords: PlotPoints = points.iter().map(|p| [p.longitude, p.latitude]).collect();
        base_plot("scatter_geo", &geo.chart.layout)
            .data_aspect(1.0)
            .label_formatter(|_name, point| format!("lat {:.5}\nlon {:.5}", point.y, point.x))
            .show(ui, |plot_ui| {
                plot_ui.points(Points::new(coords).radius(2.5).color(BAR_COLOR));
            });

        let markers = &geo.markers;
        if let Some(center) = markers.center {
            ui.label(format!(
                "{} markers, centre {:.5}, {:.5}, zoom {}",
                markers.markers.len(),
                center.latitude,
                center.longitude,
                markers.zoom_start
            ));
        }
        if markers.markers.is_empty() {
            return;
        }

        TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(200.0)
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong("#");
                });
                header.col(|ui: &mut Ui| {
                    ui.strong("latitude");
                });
                header.col(|ui: &mut Ui| {
                    ui.strong("longitude");
                });
            })
            .body(|body| {
                body.rows(18.0, markers.markers.len(), |mut row| {
                    let i = row.index();
                    let marker = markers.markers[i];
                    row.col(|ui: &mut Ui| {
                        ui.label(i.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.6}", marker.latitude));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.6}", marker.longitude));
                    });
                });
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_axis_only_labels_whole_positions() {
        let labels = vec!["sols".to_string(), "jardins".to_string()];
        assert_eq!(category_at(&labels, 0.0), Some("sols"));
        assert_eq!(category_at(&labels, 1.1), Some("jardins"));
        assert_eq!(category_at(&labels, 0.5), None);
        assert_eq!(category_at(&labels, -1.0), None);
        assert_eq!(category_at(&labels, 2.0), None);
    }

    #[test]
    fn long_labels_are_shortened() {
        assert_eq!(short("RUE DE LA REPUBLIQUE", 8), "RUE DE …");
        assert_eq!(short("sols", 8), "sols");
    }

    #[test]
    fn day_numbers_round_trip_to_labels() {
        let d = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        assert_eq!(date_label(days(d)), "2020-06-15");
        assert_eq!(date_label(days(d) + 0.2), "2020-06-15");
    }

    #[test]
    fn presets_set_a_pending_window() {
        let mut window = TimeWindow::default();
        let first = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
        apply_preset(&mut window, &RangePreset::standard()[0], first, last);

        let expected_start = NaiveDate::from_ymd_opt(2020, 11, 30).unwrap();
        assert_eq!(window.take_pending(), Some((days(expected_start), days(last))));
    }
}
