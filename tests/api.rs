use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use drugcast::catalog::SeriesCatalog;
use drugcast::config::AppConfig;
use drugcast::data::SalesFrame;
use drugcast::handlers::{api_router, dashboard_router, AppState};
use drugcast::ml::forecast::NOTE_NO_EVALUATION;
use drugcast::ml::trainer;
use drugcast::store::ModelStore;

const BOUNDARY: &str = "drugcast-test-boundary";

fn weekly_frame(ids: &[&str], weeks: i64) -> SalesFrame {
    let start = NaiveDate::from_ymd_opt(2016, 1, 3).unwrap();
    let dates: Vec<NaiveDate> = (0..weeks).map(|i| start + Duration::weeks(i)).collect();
    let columns = ids
        .iter()
        .enumerate()
        .map(|(k, id)| {
            let values = (0..weeks)
                .map(|i| Some(50.0 + 10.0 * k as f64 + 0.2 * i as f64 + (i % 5) as f64))
                .collect();
            (id.to_string(), values)
        })
        .collect();
    SalesFrame::from_columns(dates, columns)
}

fn csv_text(frame: &SalesFrame) -> String {
    let mut buf = Vec::new();
    frame.write_csv(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

/// Trains M01AB and R06 on 2016-2018 and writes a four-year reference dataset.
fn setup() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let catalog = SeriesCatalog::reference();

    let mut config = AppConfig::default();
    config.store.model_dir = dir.path().join("models").to_string_lossy().into_owned();
    config.data.path = dir.path().join("salesweekly.csv").to_string_lossy().into_owned();

    let frame = weekly_frame(&["M01AB", "R06"], 208);
    std::fs::write(&config.data.path, csv_text(&frame)).unwrap();

    let store = ModelStore::from_config(&config.store);
    let observations = frame.observations();
    for id in ["M01AB", "R06"] {
        let series = catalog.get(id).unwrap();
        trainer::train(series, &observations, config.data.train_cutoff, &store).unwrap();
    }

    let state = AppState::new(&config, catalog);
    (dir, state)
}

fn multipart_request(uri: &str, filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::post(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_root_and_health() {
    let (_dir, state) = setup();

    let (status, body) = send(api_router(state.clone()), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_series"].as_array().unwrap().len(), 8);

    let (status, body) = send(api_router(state), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["models"], serde_json::json!(["M01AB", "R06"]));
}

#[tokio::test]
async fn test_series_lists_catalog_parameters() {
    let (_dir, state) = setup();
    let (status, body) = send(api_router(state), get("/series")).await;
    assert_eq!(status, StatusCode::OK);

    let series = body["series"].as_array().unwrap();
    assert_eq!(series.len(), 8);
    assert_eq!(series[0]["name"], "M01AB");
    assert_eq!(series[0]["parameters"]["changepoint_prior_scale"], 30.0);
    let r06 = series.iter().find(|s| s["name"] == "R06").unwrap();
    assert_eq!(r06["parameters"]["seasonality_prior_scale"], 120.0);
}

#[tokio::test]
async fn test_predict_upload_reports_available_and_missing() {
    let (_dir, state) = setup();
    let upload = weekly_frame(&["M01AB", "N05C"], 20);

    let (status, body) = send(
        api_router(state),
        multipart_request("/predict", "sales.csv", &csv_text(&upload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let metadata = &body["metadata"];
    assert_eq!(metadata["filename"], "sales.csv");
    assert_eq!(metadata["data_rows"], 20);
    assert_eq!(metadata["date_range"]["start"], "2016-01-03");
    assert_eq!(metadata["available_series"], serde_json::json!(["M01AB", "N05C"]));
    assert_eq!(metadata["missing_series"].as_array().unwrap().len(), 6);

    // N05C has no persisted model and is left out of the predictions.
    let predictions = body["predictions"].as_object().unwrap();
    assert_eq!(predictions.len(), 1);
    let m01ab = &predictions["M01AB"];
    assert_eq!(m01ab["predictions"].as_array().unwrap().len(), 20);
    assert!(m01ab["mse"].is_number());
    assert!(m01ab["mape"].is_number());
}

#[tokio::test]
async fn test_predict_rejects_non_csv_upload() {
    let (_dir, state) = setup();
    let (status, body) = send(
        api_router(state),
        multipart_request("/predict", "sales.xlsx", "datum,M01AB\n2019-01-06,1\n"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_predict_rejects_missing_date_column() {
    let (_dir, state) = setup();
    let (status, _) = send(
        api_router(state),
        multipart_request("/predict", "sales.csv", "week,M01AB\n2019-01-06,1\n"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_rejects_upload_without_catalog_series() {
    let (_dir, state) = setup();
    let (status, body) = send(
        api_router(state),
        multipart_request("/predict", "sales.csv", "datum,XYZ\n2019-01-06,1\n"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["available_series"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_predict_without_file_evaluates_reference_year() {
    let (_dir, state) = setup();
    let (status, body) = send(api_router(state), Request::post("/predict").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let m01ab = &body["predictions"]["M01AB"];
    let dates = m01ab["dates"].as_array().unwrap();
    assert!(!dates.is_empty());
    assert!(dates.iter().all(|d| d.as_str().unwrap().starts_with("2019-")));
    assert!(m01ab["mse"].is_number());
    assert_eq!(body["metadata"]["filename"], "salesweekly.csv");
}

#[tokio::test]
async fn test_predict_rejects_multipart_without_file_field() {
    let (_dir, state) = setup();
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"comment\"\r\n\r\n\
         hello\r\n\
         --{BOUNDARY}--\r\n"
    );
    let request = Request::post("/predict")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(api_router(state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("'file'"));
}

#[tokio::test]
async fn test_predict_rejects_multipart_without_boundary() {
    let (_dir, state) = setup();
    let request = Request::post("/predict")
        .header(header::CONTENT_TYPE, "multipart/form-data")
        .body(Body::from("datum,M01AB\n2019-01-06,1\n"))
        .unwrap();

    let (status, body) = send(api_router(state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Malformed multipart request"));
}

#[tokio::test]
async fn test_forecast_explicit_dates_without_actuals() {
    let (_dir, state) = setup();
    let request = json_request(
        "/forecast",
        serde_json::json!({ "dates": ["2030-01-06", "2030-01-13"], "series": ["R06"] }),
    );
    let (status, body) = send(api_router(state), request).await;
    assert_eq!(status, StatusCode::OK);

    let r06 = &body["predictions"]["R06"];
    assert_eq!(r06["predictions"].as_array().unwrap().len(), 2);
    assert_eq!(r06["note"], NOTE_NO_EVALUATION);
    assert!(r06.get("mse").is_none());
}

#[tokio::test]
async fn test_forecast_validates_request() {
    let (_dir, state) = setup();

    let (status, _) = send(
        api_router(state.clone()),
        json_request("/forecast", serde_json::json!({ "dates": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        api_router(state),
        json_request("/forecast", serde_json::json!({ "dates": ["2030-01-06"], "series": ["XYZ"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("XYZ"));
}

#[tokio::test]
async fn test_dashboard_rolls_up_persisted_models() {
    let (_dir, state) = setup();
    let (status, body) = send(dashboard_router(state), get("/api/dashboard")).await;
    assert_eq!(status, StatusCode::OK);

    let products = body["products"].as_array().unwrap();
    let ids: Vec<&str> = products.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["M01AB", "R06"]);

    let product = &products[0];
    assert_eq!(product["kpi"]["predictedSales"]["period"], "next 7 days");
    let datasets = product["salesTrend"]["chart"]["datasets"].as_array().unwrap();
    assert_eq!(datasets.len(), 2);
    assert_eq!(datasets[0]["label"], "Actual Sales");
    assert_eq!(datasets[0]["data"].as_array().unwrap().len(), 10);

    let overall = &body["overall"];
    assert!(overall["kpi"]["smartRecommendation"]["message"].is_string());
    assert_eq!(overall["salesTrend"]["chart"]["labels"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_dashboard_auxiliary_routes() {
    let (_dir, state) = setup();

    let response = dashboard_router(state.clone()).oneshot(get("/favicon.ico")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, body) = send(dashboard_router(state.clone()), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(dashboard_router(state), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"].as_array().unwrap().len() >= 2);
}
