//! Open-Meteo archive client against a mock HTTP server.

use chrono::NaiveDate;
use weather_alert_core::{
    ArchiveFetcher, ArchiveRequest, ArchiveSettings, HourlyVariable, OpenMeteoArchive,
    archive::ResponseCache,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const START: i64 = 1_718_953_200; // 2024-06-21T00:00 America/Los_Angeles

fn archive_body(hours: usize) -> serde_json::Value {
    let time: Vec<i64> = (0..hours as i64).map(|h| START + h * 3600).collect();
    let temperature: Vec<serde_json::Value> = (0..hours)
        .map(|h| {
            if h == 1 {
                serde_json::Value::Null
            } else {
                serde_json::json!(15.0 + h as f64 * 0.5)
            }
        })
        .collect();
    let rain: Vec<f64> = (0..hours).map(|h| if h % 5 == 0 { 0.2 } else { 0.0 }).collect();

    serde_json::json!({
        "latitude": 49.25,
        "longitude": -123.125,
        "generationtime_ms": 0.5,
        "utc_offset_seconds": -25200,
        "timezone": "America/Los_Angeles",
        "timezone_abbreviation": "PDT",
        "elevation": 73.0,
        "hourly_units": {"time": "unixtime", "temperature_2m": "°C", "rain": "mm"},
        "hourly": {
            "time": time,
            "temperature_2m": temperature,
            "rain": rain
        }
    })
}

fn request(days: u32) -> ArchiveRequest {
    let start = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
    ArchiveRequest {
        latitude: 49.2497,
        longitude: -123.1193,
        start_date: start,
        end_date: start + chrono::Days::new(u64::from(days) - 1),
        hourly: vec![HourlyVariable::Temperature2m, HourlyVariable::Rain],
        timezone: "America/Los_Angeles".to_string(),
    }
}

fn settings(server: &MockServer) -> ArchiveSettings {
    ArchiveSettings {
        base_url: server.uri(),
        timeout_secs: 5,
        cache: false,
        cache_dir: None,
        max_retries: 2,
        backoff_factor: 0.0,
    }
}

#[tokio::test]
async fn fetches_and_reshapes_hourly_series() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .and(query_param("latitude", "49.2497"))
        .and(query_param("longitude", "-123.1193"))
        .and(query_param("start_date", "2024-06-21"))
        .and(query_param("end_date", "2024-06-22"))
        .and(query_param("hourly", "temperature_2m,rain"))
        .and(query_param("timezone", "America/Los_Angeles"))
        .and(query_param("timeformat", "unixtime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(48)))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenMeteoArchive::new(&settings(&server)).unwrap();
    let response = client.fetch_hourly(&request(2)).await.unwrap();

    assert_eq!(response.location.timezone_abbreviation, "PDT");
    assert_eq!(response.location.elevation, 73.0);
    assert_eq!(response.hourly.start_time, START);
    assert_eq!(response.hourly.end_time, START + 48 * 3600);
    assert_eq!(response.hourly.timestamps().unwrap().len(), 48);

    let temp = response.hourly.variable(HourlyVariable::Temperature2m).unwrap();
    assert_eq!(temp.values[0], Some(15.0));
    assert_eq!(temp.values[1], None);
}

#[tokio::test]
async fn api_error_body_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": true,
            "reason": "Parameter 'end_date' is out of allowed range"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenMeteoArchive::new(&settings(&server)).unwrap();
    let err = client.fetch_hourly(&request(1)).await.unwrap_err();

    assert!(format!("{err:#}").contains("out of allowed range"));
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(24)))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenMeteoArchive::new(&settings(&server)).unwrap();
    let response = client.fetch_hourly(&request(1)).await.unwrap();

    assert_eq!(response.hourly.timestamps().unwrap().len(), 24);
}

#[tokio::test]
async fn gives_up_after_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = OpenMeteoArchive::new(&settings(&server)).unwrap();
    let err = client.fetch_hourly(&request(1)).await.unwrap_err();

    assert!(format!("{err:#}").contains("503"));
}

#[tokio::test]
async fn cached_response_skips_the_network() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(24)))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenMeteoArchive::new(&settings(&server))
        .unwrap()
        .with_cache(Some(ResponseCache::new(dir.path())));

    let first = client.fetch_hourly(&request(1)).await.unwrap();
    let second = client.fetch_hourly(&request(1)).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn corrupt_cache_entry_is_replaced() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(24)))
        .expect(2)
        .mount(&server)
        .await;

    let client = OpenMeteoArchive::new(&settings(&server))
        .unwrap()
        .with_cache(Some(ResponseCache::new(dir.path())));

    let first = client.fetch_hourly(&request(1)).await.unwrap();

    for entry in std::fs::read_dir(dir.path()).unwrap() {
        std::fs::write(entry.unwrap().path(), "{ truncated").unwrap();
    }

    let second = client.fetch_hourly(&request(1)).await.unwrap();
    let third = client.fetch_hourly(&request(1)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[tokio::test]
async fn invalid_coordinates_fail_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = OpenMeteoArchive::new(&settings(&server)).unwrap();
    let mut req = request(1);
    req.latitude = 123.0;

    let err = client.fetch_hourly(&req).await.unwrap_err();
    assert!(err.to_string().contains("Invalid coordinates"));
}

#[tokio::test]
async fn malformed_body_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = OpenMeteoArchive::new(&settings(&server)).unwrap();
    let err = client.fetch_hourly(&request(1)).await.unwrap_err();

    assert!(format!("{err:#}").contains("Malformed archive response"));
}
