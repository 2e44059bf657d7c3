//! Dashboard KPIs derived from a series' recent history and its forecast.

use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::ml::metrics::round2;
use crate::models::{ForecastResult, Trend};

/// Actual and back-cast values over the same recent dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<NaiveDate>,
    pub actual: Vec<f64>,
    pub fitted: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardPayload {
    pub series_id: String,
    pub total_sales: f64,
    pub predicted_sales: f64,
    pub percentage_change: f64,
    pub trend: Trend,
    pub recommendation: String,
    pub chart: ChartSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverallPayload {
    pub total_sales: f64,
    pub predicted_sales: f64,
    pub percentage_change: f64,
    pub trend: Trend,
    pub recommendation: String,
    pub chart: ChartSeries,
}

pub fn aggregate(
    series_id: &str,
    history: &[(NaiveDate, f64)],
    forecast: &ForecastResult,
    settings: &DashboardConfig,
) -> DashboardPayload {
    let mut history = history.to_vec();
    history.sort_by_key(|(d, _)| *d);

    let window = settings.chart_points;
    let tail = &history[history.len().saturating_sub(window)..];
    let total_sales: f64 = tail.iter().map(|(_, v)| v).sum();

    let last_date = history.last().map(|(d, _)| *d);
    let predicted_sales: f64 = forecast
        .dates
        .iter()
        .zip(&forecast.predictions)
        .filter(|(date, _)| last_date.map_or(true, |last| **date > last))
        .take(settings.predict_next)
        .map(|(_, p)| p)
        .sum();

    let percentage_change = if window > 0 && history.len() >= 2 * window {
        let end = history.len() - window;
        let previous: f64 = history[end - window..end].iter().map(|(_, v)| v).sum();
        pct_change(total_sales, previous)
    } else {
        0.0
    };
    let trend = Trend::from_change(percentage_change);

    let labels: Vec<NaiveDate> = tail.iter().map(|(d, _)| *d).collect();
    let chart = ChartSeries {
        actual: tail.iter().map(|(_, v)| round2(*v)).collect(),
        fitted: labels.iter().filter_map(|d| forecast.at(*d)).map(round2).collect(),
        labels,
    };

    DashboardPayload {
        series_id: series_id.into(),
        total_sales,
        predicted_sales,
        percentage_change,
        trend,
        recommendation: product_recommendation(series_id, trend, percentage_change, settings.growth_threshold_pct),
        chart,
    }
}

/// Sums every product; the trend comes from the mean of the whole-percent
/// changes each product card displays.
pub fn overall(products: &[DashboardPayload]) -> OverallPayload {
    let total_sales = products.iter().map(|p| p.total_sales).sum();
    let predicted_sales = products.iter().map(|p| p.predicted_sales).sum();

    let percentage_change = if products.is_empty() {
        0.0
    } else {
        products.iter().map(|p| p.percentage_change.round()).sum::<f64>() / products.len() as f64
    };
    let trend = Trend::from_change(percentage_change);

    let mut chart = products.first().map(|p| p.chart.clone()).unwrap_or_default();
    for product in products.iter().skip(1) {
        let m = chart.actual.len().min(product.chart.actual.len());
        chart.actual.truncate(m);
        for (acc, v) in chart.actual.iter_mut().zip(&product.chart.actual) {
            *acc += v;
        }
        let m = chart.fitted.len().min(product.chart.fitted.len());
        chart.fitted.truncate(m);
        for (acc, v) in chart.fitted.iter_mut().zip(&product.chart.fitted) {
            *acc += v;
        }
    }
    chart.labels.truncate(chart.actual.len());
    chart.actual.iter_mut().for_each(|v| *v = round2(*v));
    chart.fitted.iter_mut().for_each(|v| *v = round2(*v));

    OverallPayload {
        total_sales,
        predicted_sales,
        percentage_change,
        trend,
        recommendation: overall_recommendation(percentage_change),
        chart,
    }
}

pub fn pct_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

pub fn product_recommendation(series_id: &str, trend: Trend, change: f64, growth_threshold: f64) -> String {
    match trend {
        Trend::Up if change >= growth_threshold => format!("{series_id} demand is expected to rise"),
        Trend::Down => format!("{series_id} sales are declining, consider marketing push"),
        _ => format!("{series_id} inventory is sufficient for the next 10 days"),
    }
}

pub fn overall_recommendation(change: f64) -> String {
    if change >= 0.0 {
        format!("Overall sales expected to grow by {:.0}% in next 7 days", change.max(0.0).round())
    } else {
        "Overall sales may decline; consider promotions".into()
    }
}
