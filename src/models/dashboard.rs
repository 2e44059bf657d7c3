use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::ml::kpi::{ChartSeries, DashboardPayload, OverallPayload};
use crate::models::Trend;

const PREDICTED_PERIOD: &str = "next 7 days";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSales {
    pub value: String,
    pub trend: Trend,
    pub percentage_change: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedSales {
    pub value: String,
    pub period: String,
    pub trend: Trend,
    pub percentage_change: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub total_sales: TotalSales,
    pub predicted_sales: PredictedSales,
    pub smart_recommendation: Recommendation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesTrend {
    pub chart: Chart,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub kpi: Kpi,
    pub sales_trend: SalesTrend,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallView {
    pub kpi: Kpi,
    pub sales_trend: SalesTrend,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub overall: OverallView,
    pub products: Vec<ProductView>,
}

impl From<&DashboardPayload> for ProductView {
    fn from(p: &DashboardPayload) -> Self {
        Self {
            id: p.series_id.clone(),
            kpi: kpi(p.total_sales, p.predicted_sales, p.percentage_change, p.trend, &p.recommendation),
            sales_trend: sales_trend(&p.chart),
        }
    }
}

impl From<&OverallPayload> for OverallView {
    fn from(p: &OverallPayload) -> Self {
        Self {
            kpi: kpi(p.total_sales, p.predicted_sales, p.percentage_change, p.trend, &p.recommendation),
            sales_trend: sales_trend(&p.chart),
        }
    }
}

fn kpi(total: f64, predicted: f64, change: f64, trend: Trend, message: &str) -> Kpi {
    Kpi {
        total_sales: TotalSales {
            value: humanize_number(total),
            trend,
            percentage_change: format_pct(change),
        },
        predicted_sales: PredictedSales {
            value: humanize_number(predicted),
            period: PREDICTED_PERIOD.into(),
            trend,
            percentage_change: format_pct(change),
        },
        smart_recommendation: Recommendation {
            message: message.into(),
        },
    }
}

fn sales_trend(chart: &ChartSeries) -> SalesTrend {
    SalesTrend {
        chart: Chart {
            labels: chart.labels.iter().map(|d| format_date(*d)).collect(),
            datasets: vec![
                Dataset {
                    label: "Actual Sales".into(),
                    data: chart.actual.clone(),
                },
                Dataset {
                    label: "Forecasted Sales".into(),
                    data: chart.fitted.clone(),
                },
            ],
        },
    }
}

/// `1234567 -> "1.2M"`, `45600 -> "46K"`, `512.4 -> "512"`.
pub fn humanize_number(x: f64) -> String {
    if x >= 1_000_000.0 {
        format!("{:.1}M", x / 1_000_000.0)
    } else if x >= 1_000.0 {
        format!("{:.0}K", (x / 1_000.0).round())
    } else {
        format!("{:.0}", x.round())
    }
}

pub fn format_pct(change: f64) -> String {
    format!("{:.0}%", change.round())
}

/// Day without padding, zero-padded month: `6/01/2019`.
pub fn format_date(d: NaiveDate) -> String {
    format!("{}/{:02}/{}", d.day(), d.month(), d.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize_number(1_234_567.0), "1.2M");
        assert_eq!(humanize_number(45_600.0), "46K");
        assert_eq!(humanize_number(1_000.0), "1K");
        assert_eq!(humanize_number(512.4), "512");
        assert_eq!(humanize_number(0.0), "0");
    }

    #[test]
    fn test_format_pct_and_date() {
        assert_eq!(format_pct(12.6), "13%");
        assert_eq!(format_pct(-4.2), "-4%");
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2019, 1, 6).unwrap()), "6/01/2019");
    }

    #[test]
    fn test_product_view_shape() {
        let payload = DashboardPayload {
            series_id: "R03".into(),
            total_sales: 2500.0,
            predicted_sales: 1800.0,
            percentage_change: 9.4,
            trend: Trend::Up,
            recommendation: "R03 demand is expected to rise".into(),
            chart: ChartSeries {
                labels: vec![NaiveDate::from_ymd_opt(2019, 10, 13).unwrap()],
                actual: vec![250.0],
                fitted: vec![240.5],
            },
        };
        let json = serde_json::to_value(ProductView::from(&payload)).unwrap();
        assert_eq!(json["id"], "R03");
        assert_eq!(json["kpi"]["totalSales"]["value"], "3K");
        assert_eq!(json["kpi"]["totalSales"]["trend"], "up");
        assert_eq!(json["kpi"]["predictedSales"]["period"], "next 7 days");
        assert_eq!(json["kpi"]["predictedSales"]["percentageChange"], "9%");
        assert_eq!(json["kpi"]["smartRecommendation"]["message"], "R03 demand is expected to rise");
        assert_eq!(json["salesTrend"]["chart"]["labels"][0], "13/10/2019");
        assert_eq!(json["salesTrend"]["chart"]["datasets"][1]["label"], "Forecasted Sales");
        assert_eq!(json["salesTrend"]["chart"]["datasets"][1]["data"][0], 240.5);
    }
}
