//! HTTP page fetcher for institution pages.
//!
//! One shared client with a fixed user agent and request timeout. Failures
//! are returned as [`PubwatchError::Network`]; nothing is retried.

use reqwest::Client;
use tracing::{debug, instrument};

use pubwatch_shared::{FetchConfig, PubwatchError, Result};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Fetches raw markup for institution pages.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher with the given user agent and timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| PubwatchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// GET `url` and return the body. Non-2xx statuses are errors.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!("fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PubwatchError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PubwatchError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PubwatchError::Network(format!("{url}: body read failed: {e}")))?;

        debug!(status = status.as_u16(), bytes = body.len(), "page fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pubwatch_shared::DEFAULT_USER_AGENT;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher(timeout: Duration) -> Fetcher {
        Fetcher::new(&FetchConfig {
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_body_and_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/publications"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Publications</h1>"))
            .mount(&server)
            .await;

        let body = fetcher(Duration::from_secs(5))
            .fetch(&format!("{}/publications", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<h1>Publications</h1>");
    }

    #[tokio::test]
    async fn non_success_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetcher(Duration::from_secs(5))
            .fetch(&server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, PubwatchError::Network(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let result = fetcher(Duration::from_millis(200)).fetch(&server.uri()).await;
        assert!(matches!(result, Err(PubwatchError::Network(_))));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let result = fetcher(Duration::from_secs(2))
            .fetch("http://127.0.0.1:9/")
            .await;
        assert!(matches!(result, Err(PubwatchError::Network(_))));
    }
}
