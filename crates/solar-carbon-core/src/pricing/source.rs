use async_trait::async_trait;

use super::RawPriceTable;
use crate::CarbonResult;

/// External settings collaborator that owns the year -> price table.
///
/// Implementations return whatever is configured, past years included;
/// filtering is the caller's job. Failures are reported as errors, never as
/// an empty table.
#[async_trait]
pub trait CarbonPriceSource: Send + Sync {
    async fn carbon_prices(&self) -> CarbonResult<RawPriceTable>;
}

/// A fixed in-memory price table (JSON files, tests, offline runs).
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    prices: RawPriceTable,
}

impl StaticPriceSource {
    pub fn new(prices: RawPriceTable) -> Self {
        Self { prices }
    }

    /// Parse a `{"2025": 78.36, ...}` JSON document.
    pub fn from_json(json: &str) -> CarbonResult<Self> {
        let prices: RawPriceTable = serde_json::from_str(json)?;
        Ok(Self { prices })
    }
}

#[async_trait]
impl CarbonPriceSource for StaticPriceSource {
    async fn carbon_prices(&self) -> CarbonResult<RawPriceTable> {
        Ok(self.prices.clone())
    }
}

#[cfg(feature = "http")]
pub use http::HttpPriceSource;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use serde::Deserialize;
    use tracing::debug;

    use super::CarbonPriceSource;
    use crate::config::PriceSourceConfig;
    use crate::error::CarbonError;
    use crate::pricing::RawPriceTable;
    use crate::CarbonResult;

    const USER_AGENT: &str = concat!("solar-carbon/", env!("CARGO_PKG_VERSION"));

    /// Settings endpoints answer either with the table itself or with
    /// settings rows whose `value` holds the table.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    enum SettingsResponse {
        Table(RawPriceTable),
        Rows(Vec<SettingsRow>),
    }

    #[derive(Debug, Deserialize)]
    struct SettingsRow {
        value: RawPriceTable,
    }

    /// Reads the carbon price table from a hosted settings endpoint.
    #[derive(Debug, Clone)]
    pub struct HttpPriceSource {
        client: reqwest::Client,
        url: String,
        api_key: Option<String>,
    }

    impl HttpPriceSource {
        pub fn new(config: &PriceSourceConfig) -> CarbonResult<Self> {
            let client = reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .map_err(|e| {
                    CarbonError::PriceFetch(format!("Failed to build HTTP client: {e}"))
                })?;
            Ok(Self {
                client,
                url: config.url.clone(),
                api_key: config.api_key.clone(),
            })
        }
    }

    #[async_trait]
    impl CarbonPriceSource for HttpPriceSource {
        async fn carbon_prices(&self) -> CarbonResult<RawPriceTable> {
            let mut request = self.client.get(&self.url);
            if let Some(ref key) = self.api_key {
                request = request.header("apikey", key).bearer_auth(key);
            }

            debug!(url = %self.url, "requesting carbon prices");
            let response = request
                .send()
                .await
                .map_err(|e| CarbonError::PriceFetch(format!("Request failed: {e}")))?;

            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error body".to_string());
                return Err(CarbonError::PriceFetch(format!(
                    "Settings API error {status}: {body}"
                )));
            }

            let parsed: SettingsResponse = response
                .json()
                .await
                .map_err(|e| CarbonError::PriceFormat(format!("Failed to parse response: {e}")))?;

            match parsed {
                SettingsResponse::Table(table) => Ok(table),
                SettingsResponse::Rows(rows) => Ok(rows
                    .into_iter()
                    .next()
                    .map(|row| row.value)
                    .unwrap_or_default()),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use mockito::Server;
        use rust_decimal_macros::dec;
        use serde_json::json;

        fn config(url: String, api_key: Option<&str>) -> PriceSourceConfig {
            PriceSourceConfig {
                url,
                api_key: api_key.map(str::to_string),
            }
        }

        #[tokio::test]
        async fn test_plain_table_response() {
            let mut server = Server::new_async().await;
            let mock = server
                .mock("GET", "/carbon_prices")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(json!({"2025": 78.36, "2026": 93.19}).to_string())
                .create_async()
                .await;

            let source =
                HttpPriceSource::new(&config(format!("{}/carbon_prices", server.url()), None))
                    .unwrap();
            let prices = source.carbon_prices().await.unwrap();
            assert_eq!(prices.get("2025"), Some(&dec!(78.36)));
            assert_eq!(prices.get("2026"), Some(&dec!(93.19)));
            mock.assert_async().await;
        }

        #[tokio::test]
        async fn test_settings_rows_response_with_key() {
            let mut server = Server::new_async().await;
            let mock = server
                .mock("GET", "/settings")
                .match_header("apikey", "anon-key")
                .match_header("authorization", "Bearer anon-key")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(json!([{"value": {"2027": 110.5}}]).to_string())
                .create_async()
                .await;

            let source = HttpPriceSource::new(&config(
                format!("{}/settings", server.url()),
                Some("anon-key"),
            ))
            .unwrap();
            let prices = source.carbon_prices().await.unwrap();
            assert_eq!(prices.len(), 1);
            assert_eq!(prices.get("2027"), Some(&dec!(110.5)));
            mock.assert_async().await;
        }

        #[tokio::test]
        async fn test_no_rows_is_empty_table() {
            let mut server = Server::new_async().await;
            let _mock = server
                .mock("GET", "/settings")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body("[]")
                .create_async()
                .await;

            let source =
                HttpPriceSource::new(&config(format!("{}/settings", server.url()), None)).unwrap();
            assert!(source.carbon_prices().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_server_error_is_fetch_error() {
            let mut server = Server::new_async().await;
            let _mock = server
                .mock("GET", "/settings")
                .with_status(503)
                .with_body("unavailable")
                .create_async()
                .await;

            let source =
                HttpPriceSource::new(&config(format!("{}/settings", server.url()), None)).unwrap();
            let err = source.carbon_prices().await.unwrap_err();
            assert!(matches!(err, CarbonError::PriceFetch(_)));
        }

        #[tokio::test]
        async fn test_malformed_body_is_format_error() {
            let mut server = Server::new_async().await;
            let _mock = server
                .mock("GET", "/settings")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(json!({"2025": "not a price"}).to_string())
                .create_async()
                .await;

            let source =
                HttpPriceSource::new(&config(format!("{}/settings", server.url()), None)).unwrap();
            let err = source.carbon_prices().await.unwrap_err();
            assert!(matches!(err, CarbonError::PriceFormat(_)));
        }
    }
}
