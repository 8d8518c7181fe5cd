use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use super::{ChartData, ChartSpec, HistogramBin, HoverMode, Layout, RangePreset};
use crate::data::model::TransactionRecord;

/// Number of histogram bins, whatever the input size.
pub const HISTOGRAM_BINS: usize = 20;

// ---------------------------------------------------------------------------
// Counting helpers
// ---------------------------------------------------------------------------

/// Count distinct values, most frequent first; ties keep first-seen order.
/// Missing values are not counted.
pub fn value_counts<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Vec<(String, u64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, u64)> = Vec::new();

    for value in values.into_iter().flatten() {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(v, n)| (v.to_string(), n))
        .collect()
}

/// Format a number with two significant digits and an SI suffix
/// (`1234` → `1.2k`, `5` → `5.0`).
pub fn format_si(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let step = 10f64.powi(magnitude - 1);
    let rounded = (value / step).round() * step;

    const PREFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "G"), (1e6, "M"), (1e3, "k")];
    let (scale, suffix) = PREFIXES
        .iter()
        .copied()
        .find(|(scale, _)| rounded.abs() >= *scale)
        .unwrap_or((1.0, ""));

    let scaled = rounded / scale;
    let digits = scaled.abs().log10().floor() as i32;
    let decimals = (1 - digits).max(0) as usize;
    format!("{scaled:.decimals$}{suffix}")
}

fn counts_to_bar(counts: Vec<(String, u64)>, layout: Layout) -> ChartSpec {
    let (labels, values): (Vec<String>, Vec<f64>) =
        counts.into_iter().map(|(v, n)| (v, n as f64)).unzip();
    let text = values.iter().map(|v| format_si(*v)).collect();
    ChartSpec {
        data: ChartData::Bar {
            labels,
            values,
            text,
        },
        layout,
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Bar chart of `nature_culture` value counts.
pub fn bar_chart<'a>(rows: impl IntoIterator<Item = &'a TransactionRecord>) -> ChartSpec {
    let counts = value_counts(rows.into_iter().map(|r| r.nature_culture.as_deref()));
    counts_to_bar(
        counts,
        Layout::new("Bar Plot for Nature Culture", 600.0, 400.0)
            .hovermode(HoverMode::X)
            .axis_titles("nature_culture", "count"),
    )
}

/// Whole-year bar chart of `type_local` counts, shown above the grid.
pub fn property_type_overview<'a>(
    rows: impl IntoIterator<Item = &'a TransactionRecord>,
) -> ChartSpec {
    let counts = value_counts(rows.into_iter().map(|r| r.type_local.as_deref()));
    counts_to_bar(
        counts,
        Layout::new("Transactions per property type", 1200.0, 300.0)
            .hovermode(HoverMode::X)
            .axis_titles("type_local", "count"),
    )
}

/// Donut chart of `code_commune` value counts: one sector per commune,
/// sized by its number of transactions.
pub fn pie_chart<'a>(rows: impl IntoIterator<Item = &'a TransactionRecord>) -> ChartSpec {
    let counts = value_counts(rows.into_iter().map(|r| r.code_commune.as_deref()));
    let (labels, values) = counts.into_iter().map(|(v, n)| (v, n as f64)).unzip();
    ChartSpec {
        data: ChartData::Pie {
            labels,
            values,
            hole: 0.4,
        },
        layout: Layout::new("Pie Chart for code_commune types", 600.0, 400.0),
    }
}

/// Distribution of declared values over [`HISTOGRAM_BINS`] equal-width bins.
///
/// Missing and non-finite values are skipped. With no values left the
/// result still has every bin, all at zero.
pub fn histogram(values: impl IntoIterator<Item = Option<f64>>) -> ChartSpec {
    let mut prices: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    prices.sort_by(f64::total_cmp);

    ChartSpec {
        data: ChartData::Histogram {
            bins: bin_sorted(&prices, HISTOGRAM_BINS),
        },
        layout: Layout::new("Distribution of Valeur_fonciere data", 600.0, 300.0)
            .hovermode(HoverMode::X)
            .axis_titles("valeur_fonciere", "count"),
    }
}

fn bin_sorted(sorted: &[f64], n_bins: usize) -> Vec<HistogramBin> {
    let (min, max) = match (sorted.first(), sorted.last()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => (0.0, 1.0),
    };
    // A single distinct value still gets a drawable unit-wide range.
    let (start, width) = if max > min {
        (min, (max - min) / n_bins as f64)
    } else {
        (min - 0.5, 1.0 / n_bins as f64)
    };

    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|i| HistogramBin {
            start: start + width * i as f64,
            end: start + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &v in sorted {
        let i = (((v - start) / width).floor() as usize).min(n_bins - 1);
        bins[i].count += 1;
    }
    bins
}

/// Transactions per (`adresse_nom_voie`, `nature_mutation`) pair:
/// x = street, y = count, coloured by count. Pairs come out in key order.
pub fn scatter_chart<'a>(rows: impl IntoIterator<Item = &'a TransactionRecord>) -> ChartSpec {
    let mut groups: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for r in rows {
        let (Some(street), Some(nature)) = (r.adresse_nom_voie.as_deref(), r.nature_mutation.as_deref())
        else {
            continue;
        };
        *groups.entry((street, nature)).or_default() += 1;
    }

    let mut x = Vec::with_capacity(groups.len());
    let mut y = Vec::with_capacity(groups.len());
    let mut hover = Vec::with_capacity(groups.len());
    for ((street, nature), n) in groups {
        x.push(street.to_string());
        y.push(n as f64);
        hover.push(nature.to_string());
    }

    ChartSpec {
        data: ChartData::Scatter {
            color: y.clone(),
            x,
            y,
            hover,
        },
        layout: Layout::new("Scatter plot between adresse_nom_voie and total counts", 600.0, 400.0)
            .hovermode(HoverMode::X)
            .axis_titles("adresse_nom_voie", "counts"),
    }
}

/// Parse a `date_mutation` cell. DVF uses ISO dates; older exports use
/// day-first dates. A time of day (`2020-01-07T00:00:00`, as written for
/// timestamp columns) is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
            .ok()
    };
    day(raw).or_else(|| raw.split(['T', ' ']).next().and_then(day))
}

/// Transfers per day as a line with range presets and a range slider.
/// Rows whose date does not parse are left out.
pub fn time_series<'a>(rows: impl IntoIterator<Item = &'a TransactionRecord>) -> ChartSpec {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut unparsable = 0usize;
    for r in rows {
        match parse_date(&r.date_mutation) {
            Some(d) => *per_day.entry(d).or_default() += 1,
            None => unparsable += 1,
        }
    }
    if unparsable > 0 {
        log::debug!("Skipped {unparsable} rows with an unparsable date_mutation");
    }

    let (dates, counts) = per_day.into_iter().map(|(d, n)| (d, n as f64)).unzip();

    let mut layout = Layout::new("Count of Transfers conducted per day", 600.0, 400.0)
        .hovermode(HoverMode::X)
        .axis_titles("date_mutation", "counts");
    layout.range_selector = RangePreset::standard();
    layout.range_slider = true;

    ChartSpec {
        data: ChartData::TimeSeries { dates, counts },
        layout,
    }
}
