use serde::Serialize;

use super::{ChartData, ChartSpec, GeoPoint, HoverMode, Layout};
use crate::data::model::TransactionRecord;

/// Initial zoom of the marker map.
pub const MAP_ZOOM_START: u8 = 14;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Usable coordinates of `rows`, in row order.
///
/// Coordinates were coerced when the table was loaded; rows where either is
/// missing or outside the WGS84 range are left out rather than plotted.
pub fn geo_points<'a>(rows: impl IntoIterator<Item = &'a TransactionRecord>) -> Vec<GeoPoint> {
    let mut skipped = 0usize;
    let points: Vec<GeoPoint> = rows
        .into_iter()
        .filter_map(|r| {
            let point = match (r.latitude, r.longitude) {
                (Some(latitude), Some(longitude))
                    if latitude.abs() <= 90.0 && longitude.abs() <= 180.0 =>
                {
                    Some(GeoPoint {
                        latitude,
                        longitude,
                    })
                }
                _ => None,
            };
            if point.is_none() {
                skipped += 1;
            }
            point
        })
        .collect();

    if skipped > 0 {
        log::debug!("{skipped} rows without usable coordinates left off the map");
    }
    points
}

// ---------------------------------------------------------------------------
// Geographic view
// ---------------------------------------------------------------------------

/// Markers for the map view, centred on the mean position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarkers {
    /// `None` when there is no marker to centre on.
    pub center: Option<GeoPoint>,
    pub zoom_start: u8,
    pub markers: Vec<GeoPoint>,
}

impl MapMarkers {
    pub fn from_points(markers: Vec<GeoPoint>) -> Self {
        let center = (!markers.is_empty()).then(|| {
            let n = markers.len() as f64;
            GeoPoint {
                latitude: markers.iter().map(|p| p.latitude).sum::<f64>() / n,
                longitude: markers.iter().map(|p| p.longitude).sum::<f64>() / n,
            }
        });
        MapMarkers {
            center,
            zoom_start: MAP_ZOOM_START,
            markers,
        }
    }
}

/// Scatter-geo chart plus the marker view for the same points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoView {
    pub chart: ChartSpec,
    pub markers: MapMarkers,
}

pub fn scatter_geo(points: Vec<GeoPoint>) -> ChartSpec {
    ChartSpec {
        data: ChartData::ScatterGeo { points },
        layout: Layout::new("Transaction locations", 1200.0, 500.0)
            .hovermode(HoverMode::Closest)
            .axis_titles("longitude", "latitude"),
    }
}

pub fn geo_view<'a>(rows: impl IntoIterator<Item = &'a TransactionRecord>) -> GeoView {
    let points = geo_points(rows);
    GeoView {
        chart: scatter_geo(points.clone()),
        markers: MapMarkers::from_points(points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::record;

    #[test]
    fn non_numeric_coordinates_are_excluded() {
        let rows = [
            record(&[("latitude", "46.20"), ("longitude", "5.22")]),
            record(&[("latitude", "north"), ("longitude", "5.10")]),
            record(&[("latitude", "46.10"), ("longitude", "")]),
            record(&[("latitude", "123.0"), ("longitude", "5.0")]),
            record(&[("latitude", "46.00"), ("longitude", "5.02")]),
        ];
        let view = geo_view(&rows);

        assert_eq!(view.markers.markers.len(), 2);
        let ChartData::ScatterGeo { points } = &view.chart.data else {
            panic!("expected scatter-geo data");
        };
        assert_eq!(points, &view.markers.markers);
        assert!(points.iter().all(|p| p.latitude.is_finite() && p.longitude.is_finite()));
    }

    #[test]
    fn markers_are_centred_on_the_mean() {
        let markers = MapMarkers::from_points(vec![
            GeoPoint { latitude: 46.0, longitude: 5.0 },
            GeoPoint { latitude: 48.0, longitude: 3.0 },
        ]);
        assert_eq!(markers.center, Some(GeoPoint { latitude: 47.0, longitude: 4.0 }));
        assert_eq!(markers.zoom_start, MAP_ZOOM_START);
    }

    #[test]
    fn no_points_means_no_centre() {
        let rows: [TransactionRecord; 0] = [];
        let view = geo_view(&rows);
        assert_eq!(view.markers.center, None);
        assert!(view.chart.is_empty());
    }
}
