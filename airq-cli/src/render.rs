use airq_core::{
    AqiBand, CityPrediction, MapView, PredictionPoint, SeriesSummary, Station,
    dashboard::{CityStationSummary, StationSummary},
};
use chrono::NaiveDateTime;
use std::fmt::Write;

const BAR_WIDTH: usize = 40;
const TIME_FORMAT: &str = "%m-%d %H:%M";

pub fn badge(band: AqiBand) -> String {
    format!("[{} {}]", band.label(), band.color())
}

pub fn map_line(map: MapView) -> String {
    format!("Map: {:.4}, {:.4} (zoom {})", map.lat, map.lon, map.zoom)
}

pub fn station_table(stations: &[Station]) -> String {
    let mut out = String::new();
    let id_width = stations.iter().map(|s| s.station_id.len()).max().unwrap_or(0).max(2);

    let _ = writeln!(out, "{:<id_width$}  {:<12}  {:>8}  {:>8}  NAME", "ID", "CITY", "LAT", "LON");
    for s in stations {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<12}  {:>8.4}  {:>8.4}  {}",
            s.station_id, s.city, s.lat, s.lon, s.station_name
        );
    }
    out
}

pub fn city_list(cities: &[String]) -> String {
    format!("Cities ({}): {}", cities.len(), cities.join(", "))
}

/// Horizontal bar per hour, scaled to the largest value in the series.
pub fn forecast_chart(points: &[PredictionPoint]) -> String {
    let peak = points.iter().map(|p| p.pm25).fold(0.0_f64, f64::max);
    let mut out = String::new();

    for p in points {
        let len = if peak > 0.0 { ((p.pm25 / peak) * BAR_WIDTH as f64).round() as usize } else { 0 };
        let _ = writeln!(
            out,
            "{} │{:<BAR_WIDTH$} {:>7.1} µg/m³",
            p.timestamp.format(TIME_FORMAT),
            "█".repeat(len),
            p.pm25
        );
    }
    out
}

pub fn summary_block(summary: &SeriesSummary) -> String {
    let mut out = String::new();
    let band = summary.aqi.band;

    let _ = writeln!(out, "Average PM2.5: {:.1} µg/m³ {}", summary.aqi.average, badge(band));
    let _ = writeln!(out, "{}", band.advice());
    let _ = writeln!(
        out,
        "Peak:   {:.1} µg/m³ at {}",
        summary.extremes.max.pm25,
        fmt_time(summary.extremes.max.timestamp)
    );
    let _ = writeln!(
        out,
        "Lowest: {:.1} µg/m³ at {}",
        summary.extremes.min.pm25,
        fmt_time(summary.extremes.min.timestamp)
    );
    out
}

pub fn city_report(bundle: &CityPrediction, summaries: &[CityStationSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} forecast, data as of {}",
        bundle.city,
        bundle.last_updated.format("%Y-%m-%d %H:%M")
    );

    for entry in summaries {
        let name = entry.station_name.as_deref().unwrap_or("unknown station");
        let _ = writeln!(out);
        let _ = writeln!(out, "{} ({})", name, entry.station_id);
        match &entry.summary {
            StationSummary::Ready(summary) => out.push_str(&summary_block(summary)),
            StationSummary::Empty => out.push_str("No predictions returned.\n"),
            StationSummary::Failed { error } => {
                let _ = writeln!(out, "Prediction failed: {error}");
            }
        }
    }
    out
}

fn fmt_time(ts: NaiveDateTime) -> String {
    ts.format(TIME_FORMAT).to_string()
}
