use crate::api::{OpenMeteoClient, WeatherSource, DAILY_VARIABLES};
use crate::config::Settings;
use crate::error::AppError;
use crate::models::{find_region, ExtractionMode, Region};
use chrono::NaiveDate;
use mockito::{Matcher, Server};
use serde_json::json;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

fn settings_for(server_url: &str) -> Settings {
    Settings {
        database_url: "postgres://unused".to_string(),
        forecast_url: format!("{}/v1/forecast", server_url),
        archive_url: format!("{}/v1/archive", server_url),
        timezone: "America/Sao_Paulo".to_string(),
        historical_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        http_timeout: Duration::from_secs(5),
    }
}

fn plano_piloto() -> Region {
    find_region("Plano Piloto").unwrap()
}

fn daily_body() -> String {
    json!({
        "latitude": -15.78,
        "longitude": -47.92,
        "timezone": "America/Sao_Paulo",
        "daily_units": {"time": "iso8601", "temperature_2m_max": "°C"},
        "daily": {
            "time": ["2025-01-01", "2025-01-02", "2025-01-03"],
            "temperature_2m_max": [28.0, 29.5, null],
            "temperature_2m_min": [18.0, 18.4, 17.9],
            "precipitation_sum": [0.0, 12.3, 1.1]
        }
    })
    .to_string()
}

#[tokio::test]
async fn forecast_request_carries_coordinates_variables_and_timezone() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/forecast")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("latitude".into(), "-15.7833".into()),
            Matcher::UrlEncoded("longitude".into(), "-47.9167".into()),
            Matcher::UrlEncoded("daily".into(), DAILY_VARIABLES.into()),
            Matcher::UrlEncoded("timezone".into(), "America/Sao_Paulo".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(daily_body())
        .create_async()
        .await;

    let client = OpenMeteoClient::new(&settings_for(&server.url())).unwrap();
    let days = client
        .fetch_daily(&plano_piloto(), ExtractionMode::Forecast)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(days.len(), 3);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    assert_eq!(days[1].precip_total, Some(12.3));
    assert_eq!(days[2].temp_max, None);
}

#[tokio::test]
async fn historical_request_targets_archive_with_date_range() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/archive")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("start_date".into(), "2025-01-01".into()),
            Matcher::Regex("end_date=\\d{4}-\\d{2}-\\d{2}".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(daily_body())
        .create_async()
        .await;

    let client = OpenMeteoClient::new(&settings_for(&server.url())).unwrap();
    let days = client
        .fetch_daily(&plano_piloto(), ExtractionMode::Historical)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(days.len(), 3);
}

#[test]
fn forecast_query_has_no_date_range() {
    let client = OpenMeteoClient::new(&settings_for("http://localhost")).unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();

    let forecast = client.query(&plano_piloto(), ExtractionMode::Forecast, today);
    assert!(forecast.iter().all(|(k, _)| *k != "start_date" && *k != "end_date"));

    let historical = client.query(&plano_piloto(), ExtractionMode::Historical, today);
    assert!(historical.contains(&("start_date", "2025-01-01".to_string())));
    assert!(historical.contains(&("end_date", "2025-06-30".to_string())));
}

#[tokio::test]
async fn server_error_is_an_api_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/forecast")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let client = OpenMeteoClient::new(&settings_for(&server.url())).unwrap();
    let result = client
        .fetch_daily(&plano_piloto(), ExtractionMode::Forecast)
        .await;

    match result {
        Err(AppError::Api(e)) => assert_eq!(e.status().map(|s| s.as_u16()), Some(500)),
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn body_without_daily_block_is_malformed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/forecast")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"error": false, "hourly": {}}).to_string())
        .create_async()
        .await;

    let client = OpenMeteoClient::new(&settings_for(&server.url())).unwrap();
    let result = client
        .fetch_daily(&plano_piloto(), ExtractionMode::Forecast)
        .await;
    assert!(matches!(result, Err(AppError::MalformedResponse(_))));
}

#[tokio::test]
async fn mismatched_array_lengths_are_malformed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/forecast")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "daily": {
                    "time": ["2025-01-01", "2025-01-02"],
                    "temperature_2m_max": [28.0, 29.0],
                    "temperature_2m_min": [18.0, 18.0],
                    "precipitation_sum": [0.0]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = OpenMeteoClient::new(&settings_for(&server.url())).unwrap();
    let result = client
        .fetch_daily(&plano_piloto(), ExtractionMode::Forecast)
        .await;
    assert!(matches!(result, Err(AppError::MalformedResponse(_))));
}

#[tokio::test]
async fn unreachable_endpoint_is_an_api_error() {
    // Nothing listens on port 9 (discard) in the test environment.
    let client = OpenMeteoClient::new(&settings_for("http://127.0.0.1:9")).unwrap();
    let result = client
        .fetch_daily(&plano_piloto(), ExtractionMode::Forecast)
        .await;
    assert!(matches!(result, Err(AppError::Api(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_endpoint_is_cut_off_by_the_request_timeout() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/forecast")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            thread::sleep(Duration::from_secs(3));
            w.write_all(daily_body().as_bytes())
        })
        .create_async()
        .await;

    let mut settings = settings_for(&server.url());
    settings.http_timeout = Duration::from_secs(1);
    let client = OpenMeteoClient::new(&settings).unwrap();

    let started = Instant::now();
    let result = client
        .fetch_daily(&plano_piloto(), ExtractionMode::Forecast)
        .await;
    let elapsed = started.elapsed();

    match result {
        Err(AppError::Api(_)) => {},
        other => panic!("expected Api error, got {:?}", other),
    }
    assert!(elapsed < Duration::from_millis(2500), "took {:?}", elapsed);
}
