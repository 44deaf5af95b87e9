use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::config::FETCH_TIMEOUT_SECS;

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; quote_board/0.1)";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid response for {symbol}: {reason}")]
    InvalidResponse { symbol: String, reason: String },
}

/// Market-data lookup, one symbol per call. The poller treats this as a
/// black box and records any error inline against the symbol.
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<f64, FetchError>;
}

/// Fetcher backed by the public Yahoo chart endpoint.
pub struct YahooFetcher {
    client: Client,
    base_url: String,
}

impl YahooFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: CHART_BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl QuoteFetcher for YahooFetcher {
    async fn fetch(&self, symbol: &str) -> Result<f64, FetchError> {
        let url = format!("{}/{}?interval=1d&range=1d", self.base_url, symbol);
        let body: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        extract_market_price(symbol, &body)
    }
}

/// Pulls `chart.result[0].meta.regularMarketPrice` out of the chart
/// response body.
fn extract_market_price(symbol: &str, body: &Value) -> Result<f64, FetchError> {
    if let Some(error) = body["chart"]["error"].as_object() {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(FetchError::InvalidResponse {
            symbol: symbol.to_string(),
            reason: description.to_string(),
        });
    }

    body["chart"]["result"][0]["meta"]["regularMarketPrice"]
        .as_f64()
        .ok_or_else(|| FetchError::InvalidResponse {
            symbol: symbol.to_string(),
            reason: "no regularMarketPrice in response".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_market_price() {
        let body = json!({
            "chart": {
                "result": [{"meta": {"regularMarketPrice": 312.75}}],
                "error": null
            }
        });
        assert_eq!(extract_market_price("THYAO.IS", &body).unwrap(), 312.75);
    }

    #[test]
    fn test_extract_reports_endpoint_error() {
        let body = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        });
        let err = extract_market_price("NOPE", &body).unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse { ref reason, .. } if reason == "No data found"));
    }

    #[test]
    fn test_extract_rejects_missing_price() {
        let body = json!({"chart": {"result": [{"meta": {}}], "error": null}});
        assert!(extract_market_price("THYAO.IS", &body).is_err());
    }

    #[tokio::test]
    async fn test_fetch_surfaces_transport_error() {
        // Nothing listens here; the request itself must fail.
        let fetcher = YahooFetcher::with_base_url("http://127.0.0.1:9/chart".to_string());
        assert!(matches!(
            fetcher.fetch("THYAO.IS").await,
            Err(FetchError::Http(_))
        ));
    }
}
