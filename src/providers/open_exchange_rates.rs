use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::core::config::{DEFAULT_ANCHOR_CURRENCY, DEFAULT_TIMEOUT_SECS, OpenExchangeRatesConfig};
use crate::core::currency::RateProvider;
use crate::core::error::{FxError, Result};
use crate::core::rates::{CurrencyCatalog, RateSnapshot};
use crate::core::usage::UsageInfo;

#[derive(Debug, Deserialize)]
struct RatesResponse {
    base: Option<String>,
    timestamp: Option<i64>,
    rates: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    data: UsageData,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    plan: PlanData,
    usage: UsageCounters,
}

#[derive(Debug, Deserialize)]
struct PlanData {
    name: String,
    update_frequency: String,
}

#[derive(Debug, Deserialize)]
struct UsageCounters {
    requests: u64,
    requests_quota: u64,
    requests_remaining: u64,
    days_elapsed: u64,
    days_remaining: u64,
    daily_average: f64,
}

impl From<UsageData> for UsageInfo {
    fn from(data: UsageData) -> Self {
        UsageInfo {
            plan_name: data.plan.name,
            update_frequency: data.plan.update_frequency,
            requests: data.usage.requests,
            requests_quota: data.usage.requests_quota,
            requests_remaining: data.usage.requests_remaining,
            days_elapsed: data.usage.days_elapsed,
            days_remaining: data.usage.days_remaining,
            daily_average: data.usage.daily_average,
        }
    }
}

/// Client for the Open Exchange Rates API.
///
/// Raw rates are always requested against the anchor currency and rebased
/// locally. The client owns one HTTP session, opened on first use or by
/// [`open`](Self::open) and released by [`close`](Self::close). Callers
/// must not close while requests are in flight.
pub struct OpenExchangeRatesClient {
    base_url: String,
    app_id: String,
    anchor: String,
    timeout: Duration,
    http: Mutex<Option<reqwest::Client>>,
}

impl OpenExchangeRatesClient {
    pub fn new(base_url: &str, app_id: &str) -> Self {
        OpenExchangeRatesClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            anchor: DEFAULT_ANCHOR_CURRENCY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            http: Mutex::new(None),
        }
    }

    pub fn from_config(config: &OpenExchangeRatesConfig, app_id: &str) -> Self {
        Self::new(&config.base_url, app_id)
            .with_anchor(&config.anchor_currency)
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_anchor(mut self, anchor: &str) -> Self {
        self.anchor = anchor.to_uppercase();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Creates the HTTP session if it is not open yet.
    pub fn open(&self) -> Result<()> {
        self.session().map(|_| ())
    }

    /// Releases the HTTP session. Closing an already closed client is a no-op.
    pub fn close(&self) {
        let mut http = self.http.lock().unwrap_or_else(PoisonError::into_inner);
        if http.take().is_some() {
            debug!("Closed HTTP session");
        }
    }

    pub fn is_open(&self) -> bool {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn session(&self) -> Result<reqwest::Client> {
        let mut http = self.http.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = http.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .user_agent("fxq/0.1")
            .timeout(self.timeout)
            .build()
            .map_err(|e| FxError::Network(format!("Failed to create HTTP client: {e}")))?;
        debug!(timeout = ?self.timeout, "Opened HTTP session");
        *http = Some(client.clone());
        Ok(client)
    }

    fn anchor_hint(&self) -> Option<String> {
        // The anchor is the provider default unless overridden; only paid plans accept `base`.
        (self.anchor != DEFAULT_ANCHOR_CURRENCY).then(|| format!("base={}", self.anchor))
    }

    fn endpoint_url(&self, endpoint: &str, extra_query: Option<String>) -> String {
        let params: Vec<String> = (!self.app_id.is_empty())
            .then(|| format!("app_id={}", self.app_id))
            .into_iter()
            .chain(extra_query)
            .collect();
        if params.is_empty() {
            format!("{}/{}", self.base_url, endpoint)
        } else {
            format!("{}/{}?{}", self.base_url, endpoint, params.join("&"))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        extra_query: Option<String>,
    ) -> Result<T> {
        let url = self.endpoint_url(endpoint, extra_query);
        debug!(endpoint, "Requesting exchange rate data");

        let client = self.session()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| FxError::from_transport(e, endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    let e = e.without_url();
                    debug!(error = %e, endpoint, "Failed to read error body");
                    format!("<unreadable body: {e}>")
                }
            };
            return Err(FxError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| FxError::from_transport(e, endpoint))?;

        serde_json::from_str(&text).map_err(|e| {
            error!(
                error = ?e,
                response = %text,
                endpoint,
                "Failed to parse response"
            );
            FxError::MalformedResponse(format!("{endpoint}: {e}"))
        })
    }

    async fn fetch_anchor_snapshot(&self, endpoint: &str) -> Result<RateSnapshot> {
        let data: RatesResponse = self.get_json(endpoint, self.anchor_hint()).await?;
        debug!(
            base = ?data.base,
            timestamp = ?data.timestamp,
            count = data.rates.len(),
            "Received rates"
        );
        let base = data.base.unwrap_or_else(|| self.anchor.clone());
        Ok(RateSnapshot::sanitized(base, data.rates))
    }
}

#[async_trait]
impl RateProvider for OpenExchangeRatesClient {
    #[instrument(name = "OxrLatestRates", skip(self))]
    async fn fetch_latest_rates(&self, base: &str) -> Result<RateSnapshot> {
        self.fetch_anchor_snapshot("latest.json")
            .await?
            .rebase(base)
    }

    #[instrument(name = "OxrHistoricalRates", skip(self))]
    async fn fetch_historical_rates(&self, date: NaiveDate, base: &str) -> Result<RateSnapshot> {
        let endpoint = format!("historical/{}.json", date.format("%Y-%m-%d"));
        self.fetch_anchor_snapshot(&endpoint).await?.rebase(base)
    }

    #[instrument(name = "OxrCurrencies", skip(self))]
    async fn fetch_currencies(&self) -> Result<CurrencyCatalog> {
        let names: BTreeMap<String, String> = self.get_json("currencies.json", None).await?;
        Ok(CurrencyCatalog::new(names))
    }

    #[instrument(name = "OxrUsage", skip(self))]
    async fn fetch_usage_info(&self) -> Result<UsageInfo> {
        let data: UsageResponse = self.get_json("usage.json", None).await?;
        Ok(data.data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const APP_ID: &str = "test-key";

    const LATEST_JSON: &str = r#"{
        "disclaimer": "Usage subject to terms",
        "license": "https://openexchangerates.org/license",
        "timestamp": 1760000000,
        "base": "USD",
        "rates": { "USD": 1.0, "EUR": 0.9, "JPY": 150.0, "CNY": 7.2 }
    }"#;

    async fn create_mock_server(request_path: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(request_path))
            .and(query_param("app_id", APP_ID))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_fetch_latest_rates_anchor() {
        let mock_server = create_mock_server("/latest.json", 200, LATEST_JSON).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let snapshot = client.fetch_latest_rates("USD").await.unwrap();

        assert_eq!(snapshot.base(), "USD");
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.get("JPY"), Some(150.0));
    }

    #[tokio::test]
    async fn test_fetch_latest_rates_rebased() {
        let mock_server = create_mock_server("/latest.json", 200, LATEST_JSON).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let snapshot = client.fetch_latest_rates("EUR").await.unwrap();

        assert_eq!(snapshot.base(), "EUR");
        assert!((snapshot.get("USD").unwrap() - 1.0 / 0.9).abs() < 1e-9);
        assert!((snapshot.get("JPY").unwrap() - 150.0 / 0.9).abs() < 1e-9);
        assert!((snapshot.get("CNY").unwrap() - 8.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fetch_latest_rates_unknown_base() {
        let mock_server = create_mock_server("/latest.json", 200, LATEST_JSON).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let err = client.fetch_latest_rates("XYZ").await.unwrap_err();

        assert!(matches!(err, FxError::UnknownCurrency(ref c) if c == "XYZ"));
    }

    #[tokio::test]
    async fn test_fetch_historical_rates() {
        let body = r#"{"base": "USD", "rates": {"EUR": 0.95, "JPY": 140.0}}"#;
        let mock_server = create_mock_server("/historical/2025-01-02.json", 200, body).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let snapshot = client.fetch_historical_rates(date, "JPY").await.unwrap();

        assert_eq!(snapshot.base(), "JPY");
        assert!((snapshot.get("USD").unwrap() - 1.0 / 140.0).abs() < 1e-12);
        assert!((snapshot.get("EUR").unwrap() - 0.95 / 140.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_non_anchor_sends_base_hint() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest.json"))
            .and(query_param("base", "EUR"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"base": "EUR", "rates": {"USD": 1.1, "GBP": 0.85}}"#),
            )
            .mount(&mock_server)
            .await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID).with_anchor("eur");

        let snapshot = client.fetch_latest_rates("EUR").await.unwrap();

        assert_eq!(client.anchor(), "EUR");
        assert_eq!(snapshot.base(), "EUR");
        assert_eq!(snapshot.get("GBP"), Some(0.85));
    }

    #[tokio::test]
    async fn test_remote_error_carries_status_and_body() {
        let body = r#"{"error": true, "status": 401, "message": "invalid_app_id"}"#;
        let mock_server = create_mock_server("/latest.json", 401, body).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let err = client.fetch_latest_rates("USD").await.unwrap_err();

        match err {
            FxError::Remote { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid_app_id"));
            }
            other => panic!("Expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_rates_response() {
        let body = r#"{"base": "USD", "rate": {"EUR": 0.9}}"#; // "rate" instead of "rates"
        let mock_server = create_mock_server("/latest.json", 200, body).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let err = client.fetch_latest_rates("USD").await.unwrap_err();

        assert!(matches!(err, FxError::MalformedResponse(_)));
        assert!(err.to_string().contains("latest.json"));
    }

    #[tokio::test]
    async fn test_zero_rate_in_response_is_dropped() {
        let body = r#"{"base": "USD", "rates": {"USD": 1, "JPY": 150, "VES": 0}}"#;
        let mock_server = create_mock_server("/latest.json", 200, body).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let snapshot = client.fetch_latest_rates("JPY").await.unwrap();

        assert_eq!(snapshot.base(), "JPY");
        assert!((snapshot.get("USD").unwrap() - 1.0 / 150.0).abs() < 1e-12);
        assert!(snapshot.get("VES").is_none());
    }

    #[tokio::test]
    async fn test_fetch_currencies() {
        let body = r#"{"USD": "United States Dollar", "EUR": "Euro", "JPY": "Japanese Yen"}"#;
        let mock_server = create_mock_server("/currencies.json", 200, body).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let catalog = client.fetch_currencies().await.unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.name("EUR"), Some("Euro"));
    }

    #[tokio::test]
    async fn test_currencies_without_app_id_omits_parameter() {
        let body = r#"{"USD": "United States Dollar"}"#;
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currencies.json"))
            .and(query_param_is_missing("app_id"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), "");

        let catalog = client.fetch_currencies().await.unwrap();

        assert_eq!(catalog.name("USD"), Some("United States Dollar"));
    }

    #[test]
    fn test_endpoint_url_query() {
        let client = OpenExchangeRatesClient::new("http://localhost/api/", APP_ID);
        assert_eq!(
            client.endpoint_url("latest.json", None),
            "http://localhost/api/latest.json?app_id=test-key"
        );

        let client = client.with_anchor("EUR");
        assert_eq!(
            client.endpoint_url("latest.json", client.anchor_hint()),
            "http://localhost/api/latest.json?app_id=test-key&base=EUR"
        );

        let client = OpenExchangeRatesClient::new("http://localhost/api", "").with_anchor("EUR");
        assert_eq!(
            client.endpoint_url("latest.json", client.anchor_hint()),
            "http://localhost/api/latest.json?base=EUR"
        );
        assert_eq!(
            client.endpoint_url("currencies.json", None),
            "http://localhost/api/currencies.json"
        );
    }

    #[tokio::test]
    async fn test_fetch_usage_info() {
        let body = r#"{
            "status": 200,
            "data": {
                "app_id": "test-key",
                "status": "active",
                "plan": {
                    "name": "Free",
                    "quota": "1000 requests / month",
                    "update_frequency": "3600s",
                    "features": { "base": false, "symbols": false }
                },
                "usage": {
                    "requests": 100,
                    "requests_quota": 1000,
                    "requests_remaining": 900,
                    "days_elapsed": 10,
                    "days_remaining": 20,
                    "daily_average": 10
                }
            }
        }"#;
        let mock_server = create_mock_server("/usage.json", 200, body).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let usage = client.fetch_usage_info().await.unwrap();

        assert_eq!(usage.plan_name, "Free");
        assert_eq!(usage.update_frequency, "3600s");
        assert_eq!(usage.requests_quota, 1000);
        assert_eq!(usage.requests_remaining, 900);
        assert_eq!(usage.daily_average, 10.0);
        assert!((usage.remaining_percent() - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fetch_usage_info_malformed() {
        let body = r#"{"status": 200, "data": {"plan": {"name": "Free"}}}"#;
        let mock_server = create_mock_server("/usage.json", 200, body).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);

        let err = client.fetch_usage_info().await.unwrap_err();

        assert!(matches!(err, FxError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(LATEST_JSON)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID)
            .with_timeout(Duration::from_millis(100));

        let err = client.fetch_latest_rates("USD").await.unwrap_err();

        assert!(matches!(err, FxError::Timeout(ref endpoint) if endpoint == "latest.json"));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let mock_server = create_mock_server("/latest.json", 200, LATEST_JSON).await;
        let client = OpenExchangeRatesClient::new(&mock_server.uri(), APP_ID);
        assert!(!client.is_open());

        // Closing before anything was opened is a no-op
        client.close();
        assert!(!client.is_open());

        client.fetch_latest_rates("USD").await.unwrap();
        assert!(client.is_open());

        client.close();
        client.close();
        assert!(!client.is_open());

        client.open().unwrap();
        assert!(client.is_open());
        client.close();
    }
}
