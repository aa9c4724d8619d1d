// HTTP client for wttr.in, a keyless weather service

use super::report::WeatherReport;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://wttr.in";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Transport failure, timeout, non-2xx status or undecodable body
    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

/// Fetches current conditions from a wttr.in-compatible endpoint
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: Url,
}

impl WeatherClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, WeatherError> {
        if base_url.cannot_be_a_base() {
            return Err(WeatherError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("ssemcp/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    /// `<base>/<location>?format=j1`, with the location percent-encoded as one segment
    pub fn report_url(&self, location: &str) -> Result<Url, WeatherError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| WeatherError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(location);
        url.query_pairs_mut().append_pair("format", "j1");
        Ok(url)
    }

    /// Look up current conditions for `location`
    pub async fn current(&self, location: &str) -> Result<WeatherReport, WeatherError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(WeatherError::InvalidLocation(
                "location must not be empty".to_string(),
            ));
        }

        let url = self.report_url(location)?;
        tracing::debug!("Fetching weather from {}", url);

        let body: serde_json::Value = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(WeatherReport::from_wttr(location, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherClient {
        WeatherClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_report_url_encodes_location() {
        let client = WeatherClient::new(Url::parse(DEFAULT_BASE_URL).unwrap(), DEFAULT_TIMEOUT)
            .unwrap();

        let url = client.report_url("New York").unwrap();
        assert_eq!(url.as_str(), "https://wttr.in/New%20York?format=j1");

        let url = client.report_url("a/b").unwrap();
        assert_eq!(url.path(), "/a%2Fb");
    }

    #[tokio::test]
    async fn test_current_conditions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Lyon"))
            .and(query_param("format", "j1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current_condition": [{
                    "temp_C": "21",
                    "temp_F": "70",
                    "weatherDesc": [{ "value": "Sunny" }]
                }]
            })))
            .mount(&server)
            .await;

        let report = client_for(&server).current("  Lyon ").await.unwrap();
        assert_eq!(report.location, "Lyon");
        assert_eq!(report.temperature_c, "21");
        assert_eq!(report.condition, "Sunny");
        assert_eq!(report.humidity, "N/A");
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).current("Lyon").await.unwrap_err();
        assert!(matches!(err, WeatherError::Request(_)));
    }

    #[tokio::test]
    async fn test_empty_location_rejected() {
        let server = MockServer::start().await;
        let err = client_for(&server).current("   ").await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidLocation(_)));
    }
}
