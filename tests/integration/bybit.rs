//! Integration tests for the Bybit REST market data adapter.

use rust_decimal_macros::dec;
use serde_json::json;
use stalker::models::interval::Interval;
use stalker::services::bybit::BybitMarketData;
use stalker::services::market_data::MarketDataSource;
use stalker::StalkerError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn kline_body() -> serde_json::Value {
    json!({
        "retCode": 0,
        "retMsg": "OK",
        "result": {
            "category": "linear",
            "symbol": "ADAUSDT",
            "list": [
                ["1700000120000", "0.3490", "0.3500", "0.3480", "0.3495", "1500", "523.5"],
                ["1700000060000", "0.3485", "0.3492", "0.3479", "0.3490", "1200", "418.7"],
                ["1700000000000", "0.3481", "0.3490", "0.3470", "0.3485", "1000", "348.1"]
            ]
        }
    })
}

#[tokio::test]
async fn fetch_bars_parses_kline_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .and(query_param("category", "linear"))
        .and(query_param("symbol", "ADAUSDT"))
        .and(query_param("interval", "5"))
        .and(query_param("limit", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = BybitMarketData::new(server.uri());
    let bars = client
        .fetch_bars("ADAUSDT", Interval::FiveMinutes, None, 200)
        .await
        .expect("kline request succeeds");

    assert_eq!(bars.len(), 3);
    // Exchange order is preserved; the feed sorts before storing.
    assert_eq!(bars[0].timestamp.timestamp_millis(), 1_700_000_120_000);
    assert_eq!(bars[2].open, dec!(0.3481));
    assert_eq!(bars[2].volume, dec!(1000));
    assert_eq!(bars[0].turnover, dec!(523.5));
}

#[tokio::test]
async fn fetch_bars_sends_start_when_resuming() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .and(query_param("start", "1700000060000"))
        .and(query_param("interval", "D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_body()))
        .expect(1)
        .mount(&server)
        .await;

    let since = chrono::DateTime::from_timestamp_millis(1_700_000_060_000).unwrap();
    let client = BybitMarketData::new(format!("{}/", server.uri()));
    let bars = client
        .fetch_bars("ADAUSDT", Interval::OneDay, Some(since), 50)
        .await
        .unwrap();
    assert_eq!(bars.len(), 3);
}

#[tokio::test]
async fn non_zero_ret_code_is_an_external_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 10001,
            "retMsg": "params error: symbol invalid",
            "result": {}
        })))
        .mount(&server)
        .await;

    let client = BybitMarketData::new(server.uri());
    let err = client
        .fetch_bars("NOPE", Interval::OneMinute, None, 10)
        .await
        .unwrap_err();
    match err {
        StalkerError::ExternalCall { operation, message } => {
            assert_eq!(operation, "fetch_bars");
            assert!(message.contains("10001"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn http_errors_and_malformed_rows_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .and(query_param("symbol", "DOWNUSDT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .and(query_param("symbol", "BADUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": { "list": [["1700000000000", "oops", "1", "1", "1", "1", "1"]] }
        })))
        .mount(&server)
        .await;

    let client = BybitMarketData::new(server.uri());
    assert!(client.fetch_bars("DOWNUSDT", Interval::OneMinute, None, 10).await.is_err());
    assert!(client.fetch_bars("BADUSDT", Interval::OneMinute, None, 10).await.is_err());
}

#[tokio::test]
async fn latest_price_reads_mark_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/tickers"))
        .and(query_param("symbol", "DOTUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "category": "linear",
                "list": [{ "symbol": "DOTUSDT", "lastPrice": "5.010", "markPrice": "5.012" }]
            }
        })))
        .mount(&server)
        .await;

    let client = BybitMarketData::new(server.uri());
    assert_eq!(client.latest_price("DOTUSDT").await.unwrap(), dec!(5.012));
}

#[tokio::test]
async fn latest_price_without_ticker_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/tickers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": { "list": [] }
        })))
        .mount(&server)
        .await;

    let client = BybitMarketData::new(server.uri());
    assert!(client.latest_price("DOTUSDT").await.is_err());
}
