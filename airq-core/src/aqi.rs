//! AQI classification and the reductions the dashboard shows next to a chart.

use serde::Serialize;
use std::fmt;

use crate::model::PredictionPoint;

/// Health-risk band for an average PM2.5 concentration, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AqiBand {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiBand {
    /// Upper bounds (inclusive) of every band except `Hazardous`.
    const BREAKPOINTS: [(f64, AqiBand); 5] = [
        (50.0, AqiBand::Good),
        (100.0, AqiBand::Moderate),
        (150.0, AqiBand::UnhealthyForSensitiveGroups),
        (200.0, AqiBand::Unhealthy),
        (300.0, AqiBand::VeryUnhealthy),
    ];

    /// Classify an average PM2.5 value (µg/m³).
    ///
    /// A value sitting exactly on a breakpoint belongs to the lower band.
    /// NaN compares false against every breakpoint and therefore lands in
    /// `Hazardous`; callers only classify non-empty series.
    pub fn classify(pm25: f64) -> Self {
        Self::BREAKPOINTS
            .iter()
            .find(|(upper, _)| pm25 <= *upper)
            .map(|(_, band)| *band)
            .unwrap_or(AqiBand::Hazardous)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiBand::Good => "Good",
            AqiBand::Moderate => "Moderate",
            AqiBand::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiBand::Unhealthy => "Unhealthy",
            AqiBand::VeryUnhealthy => "Very Unhealthy",
            AqiBand::Hazardous => "Hazardous",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            AqiBand::Good => "Air quality is satisfactory and poses little or no risk.",
            AqiBand::Moderate => {
                "Air quality is acceptable. Unusually sensitive people should limit prolonged outdoor exertion."
            }
            AqiBand::UnhealthyForSensitiveGroups => {
                "Children, older adults and people with heart or lung disease should reduce prolonged outdoor exertion."
            }
            AqiBand::Unhealthy => {
                "Everyone may begin to experience health effects. Limit time spent outdoors."
            }
            AqiBand::VeryUnhealthy => {
                "Health alert: everyone may experience more serious effects. Avoid outdoor activity."
            }
            AqiBand::Hazardous => {
                "Health warning of emergency conditions. Stay indoors and keep windows closed."
            }
        }
    }

    /// Conventional badge color as a hex string.
    pub fn color(&self) -> &'static str {
        match self {
            AqiBand::Good => "#00e400",
            AqiBand::Moderate => "#ffff00",
            AqiBand::UnhealthyForSensitiveGroups => "#ff7e00",
            AqiBand::Unhealthy => "#ff0000",
            AqiBand::VeryUnhealthy => "#8f3f97",
            AqiBand::Hazardous => "#7e0023",
        }
    }

    pub const fn all() -> &'static [AqiBand] {
        &[
            AqiBand::Good,
            AqiBand::Moderate,
            AqiBand::UnhealthyForSensitiveGroups,
            AqiBand::Unhealthy,
            AqiBand::VeryUnhealthy,
            AqiBand::Hazardous,
        ]
    }
}

impl fmt::Display for AqiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Average of a series plus its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AqiSummary {
    pub average: f64,
    pub band: AqiBand,
}

/// Mean of `values` mapped through [`AqiBand::classify`].
///
/// An empty slice yields a NaN average.
pub fn summarize(values: &[f64]) -> AqiSummary {
    let average = values.iter().sum::<f64>() / values.len() as f64;
    AqiSummary { average, band: AqiBand::classify(average) }
}

pub fn summarize_points(points: &[PredictionPoint]) -> AqiSummary {
    let values: Vec<f64> = points.iter().map(|p| p.pm25).collect();
    summarize(&values)
}

/// Highest and lowest points of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremes {
    pub max: PredictionPoint,
    pub min: PredictionPoint,
}

/// Select the max and min points. On ties the earliest point wins, since an
/// incumbent is only replaced by a strictly greater (or lesser) value.
pub fn extremes(points: &[PredictionPoint]) -> Option<Extremes> {
    let first = points.first()?;

    let (max, min) = points.iter().skip(1).fold((first, first), |(max, min), p| {
        let max = if p.pm25 > max.pm25 { p } else { max };
        let min = if p.pm25 < min.pm25 { p } else { min };
        (max, min)
    });

    Some(Extremes { max: max.clone(), min: min.clone() })
}
