//! Synthetic weekly sample data and prediction summaries for the `demo` command.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::data::SalesFrame;
use crate::models::PredictionMap;

struct SampleShape {
    id: &'static str,
    base: f64,
    slope: f64,
    amplitude: f64,
    sigma: f64,
}

const SAMPLE_SHAPES: [SampleShape; 8] = [
    SampleShape { id: "M01AB", base: 100.0, slope: 0.5, amplitude: 10.0, sigma: 5.0 },
    SampleShape { id: "M01AE", base: 50.0, slope: 0.3, amplitude: 8.0, sigma: 3.0 },
    SampleShape { id: "N02BA", base: 200.0, slope: 0.8, amplitude: 15.0, sigma: 8.0 },
    SampleShape { id: "N02BE", base: 75.0, slope: 0.4, amplitude: 12.0, sigma: 4.0 },
    SampleShape { id: "N05B", base: 120.0, slope: 0.6, amplitude: 9.0, sigma: 6.0 },
    SampleShape { id: "N05C", base: 80.0, slope: 0.2, amplitude: 7.0, sigma: 3.0 },
    SampleShape { id: "R03", base: 60.0, slope: 0.3, amplitude: 6.0, sigma: 2.0 },
    SampleShape { id: "R06", base: 40.0, slope: 0.1, amplitude: 5.0, sigma: 2.0 },
];

const WEEKS_PER_YEAR: f64 = 52.0;

/// Weekly Sundays from the first Sunday of 2020 through the end of 2023.
pub fn sample_dates() -> Vec<NaiveDate> {
    let (Some(first), Some(last)) = (
        NaiveDate::from_ymd_opt(2020, 1, 5),
        NaiveDate::from_ymd_opt(2023, 12, 31),
    ) else {
        return Vec::new();
    };
    std::iter::successors(Some(first), |d| Some(*d + Duration::weeks(1)))
        .take_while(|d| *d <= last)
        .collect()
}

/// `base + slope*i + amplitude*sin(2*pi*i/52) + noise`, clipped at zero.
pub fn synthetic_sample(seed: u64) -> anyhow::Result<SalesFrame> {
    let dates = sample_dates();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut columns = Vec::with_capacity(SAMPLE_SHAPES.len());
    for shape in &SAMPLE_SHAPES {
        let noise = Normal::new(0.0, shape.sigma)?;
        let values = (0..dates.len())
            .map(|i| {
                let i = i as f64;
                let seasonal = shape.amplitude * (2.0 * std::f64::consts::PI * i / WEEKS_PER_YEAR).sin();
                let v = shape.base + shape.slope * i + seasonal + noise.sample(&mut rng);
                Some(v.max(0.0))
            })
            .collect();
        columns.push((shape.id.to_string(), values));
    }

    Ok(SalesFrame::from_columns(dates, columns))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesSummary {
    pub series_id: String,
    pub points: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

pub fn summarize(predictions: &PredictionMap) -> Vec<SeriesSummary> {
    predictions
        .iter()
        .filter(|(_, result)| !result.predictions.is_empty())
        .map(|(id, result)| {
            let values = &result.predictions;
            SeriesSummary {
                series_id: id.clone(),
                points: values.len(),
                mean: values.iter().sum::<f64>() / values.len() as f64,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForecastResult;
    use chrono::Weekday;
    use chrono::Datelike;

    #[test]
    fn test_sample_dates_are_weekly_sundays() {
        let dates = sample_dates();
        assert_eq!(dates.first(), NaiveDate::from_ymd_opt(2020, 1, 5).as_ref());
        assert_eq!(dates.last(), NaiveDate::from_ymd_opt(2023, 12, 31).as_ref());
        assert!(dates.iter().all(|d| d.weekday() == Weekday::Sun));
        assert_eq!(dates.len(), 209);
    }

    #[test]
    fn test_sample_covers_every_series_and_is_non_negative() {
        let frame = synthetic_sample(42).unwrap();
        assert_eq!(frame.len(), 209);
        assert_eq!(frame.series_ids().len(), 8);
        assert!(frame.has_series("R06"));
        assert!(frame
            .observations()
            .iter()
            .all(|o| o.value.map_or(false, |v| v >= 0.0)));
    }

    #[test]
    fn test_same_seed_same_sample() {
        let a = synthetic_sample(7).unwrap().observations();
        let b = synthetic_sample(7).unwrap().observations();
        assert_eq!(a, b);
    }

    #[test]
    fn test_summarize() {
        let mut predictions = PredictionMap::new();
        predictions.insert(
            "R03".into(),
            ForecastResult {
                series_id: "R03".into(),
                dates: Vec::new(),
                predictions: vec![1.0, 3.0, 5.0],
                mse: None,
                mape: None,
                note: None,
            },
        );
        let summary = summarize(&predictions);
        assert_eq!(
            summary,
            vec![SeriesSummary {
                series_id: "R03".into(),
                points: 3,
                mean: 3.0,
                min: 1.0,
                max: 5.0,
            }]
        );
    }
}
