//! HTTP speed-test client
//!
//! Talks to the speed-test provider through the local tunnel-entry port:
//! `init` scrapes the API token from the provider's landing script,
//! `get_urls` asks the API for download targets, and `measure` streams
//! the targets while emitting cumulative throughput samples over a
//! channel. The endpoints are overridable so tests can point the client
//! at a mock server.

use crate::defaults;
use crate::error::{AppError, Result};
use futures::StreamExt;
use regex::Regex;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use url::Url;

const SCRIPT_SRC_PATTERN: &str = r#"src="([^"]*app-[^"]*\.js)""#;
const TOKEN_PATTERN: &str = r#"token:"([a-zA-Z0-9]+)""#;

/// One download target returned by the provider API
#[derive(Debug, Clone, Deserialize)]
struct Target {
    url: String,
}

/// Speed-test client bound to one proxy port
pub struct SpeedtestClient {
    http: reqwest::Client,
    home_url: String,
    api_url: String,
    token: Option<String>,
}

impl SpeedtestClient {
    /// Build a client whose traffic is routed through `proxy_url`
    pub fn new(proxy_url: &str) -> Result<Self> {
        Self::build(Some(proxy_url))
    }

    fn build(proxy_url: Option<&str>) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(proxy_url) = proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| AppError::config(format!("invalid proxy URL '{}': {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            home_url: defaults::SPEEDTEST_HOME_URL.to_string(),
            api_url: defaults::SPEEDTEST_API_URL.to_string(),
            token: None,
        })
    }

    /// Point the client at alternative provider endpoints
    pub fn with_endpoints<S: Into<String>>(mut self, home_url: S, api_url: S) -> Self {
        self.home_url = home_url.into();
        self.api_url = api_url.into();
        self
    }

    /// Fetch the provider landing page and extract the API token from
    /// its application script.
    pub async fn init(&mut self) -> Result<()> {
        let home = self.fetch_text(&self.home_url).await?;
        let script_url = self.resolve_script_url(&home)?;
        let script = self.fetch_text(&script_url).await?;
        let token = capture(TOKEN_PATTERN, &script)
            .ok_or_else(|| AppError::network("no API token in the speedtest script"))?;
        self.token = Some(token);
        Ok(())
    }

    /// Ask the provider API for download target URLs
    pub async fn get_urls(&self) -> Result<Vec<Url>> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| AppError::internal("speedtest client used before init"))?;

        let url_count = defaults::SPEEDTEST_URL_COUNT.to_string();
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("https", "true"),
                ("token", token.as_str()),
                ("urlCount", url_count.as_str()),
            ])
            .send()
            .await
            .map_err(AppError::from)?
            .error_for_status()
            .map_err(AppError::from)?;

        let targets: Vec<Target> = response.json().await.map_err(AppError::from)?;
        if targets.is_empty() {
            return Err(AppError::network("speedtest API returned no targets"));
        }
        targets
            .into_iter()
            .map(|target| {
                Url::parse(&target.url).map_err(|e| {
                    AppError::network(format!("speedtest API returned invalid URL: {}", e))
                })
            })
            .collect()
    }

    /// Download every target, streaming cumulative Kbps samples into
    /// `samples`. The sender is dropped on return, closing the channel.
    /// A final sample is always emitted when any bytes arrived.
    pub async fn measure(&self, urls: &[Url], samples: mpsc::Sender<f64>) -> Result<()> {
        let started = Instant::now();
        let mut total_bytes: u64 = 0;
        let mut last_sample = Instant::now();

        for url in urls {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(AppError::from)?
                .error_for_status()
                .map_err(AppError::from)?;

            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(AppError::from)?;
                total_bytes += chunk.len() as u64;

                if last_sample.elapsed() >= defaults::SAMPLE_INTERVAL {
                    last_sample = Instant::now();
                    if samples
                        .send(kbps(total_bytes, started.elapsed()))
                        .await
                        .is_err()
                    {
                        // Consumer went away; nothing left to report to
                        return Ok(());
                    }
                }
            }
        }

        if total_bytes > 0 {
            let _ = samples.send(kbps(total_bytes, started.elapsed())).await;
        }
        Ok(())
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.http
            .get(url)
            .send()
            .await
            .map_err(AppError::from)?
            .error_for_status()
            .map_err(AppError::from)?
            .text()
            .await
            .map_err(AppError::from)
    }

    /// Locate the application script referenced by the landing page,
    /// resolving relative paths against the home URL.
    fn resolve_script_url(&self, home_page: &str) -> Result<String> {
        let path = capture(SCRIPT_SRC_PATTERN, home_page)
            .ok_or_else(|| AppError::network("no application script on the speedtest page"))?;
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path);
        }
        let base = Url::parse(&self.home_url)?;
        let resolved = base
            .join(&path)
            .map_err(|e| AppError::network(format!("bad script path '{}': {}", path, e)))?;
        Ok(resolved.into())
    }
}

/// First capture group of `pattern` in `text`
fn capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().to_string())
}

/// Cumulative throughput in Kbps
fn kbps(total_bytes: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return 0.0;
    }
    (total_bytes as f64 * 8.0) / 1000.0 / seconds
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn unproxied() -> SpeedtestClient {
        SpeedtestClient::build(None).unwrap()
    }

    #[test]
    fn test_token_capture() {
        let script = r#"var config={token:"YXNkZmFzZGZhc2RmMTIz",urlCount:5};"#;
        assert_eq!(
            capture(TOKEN_PATTERN, script).as_deref(),
            Some("YXNkZmFzZGZhc2RmMTIz")
        );
        assert!(capture(TOKEN_PATTERN, "nothing here").is_none());
    }

    #[test]
    fn test_kbps_math() {
        // 1,000,000 bytes in 1s = 8,000 Kbps
        assert_eq!(kbps(1_000_000, Duration::from_secs(1)), 8_000.0);
        assert_eq!(kbps(0, Duration::from_secs(1)), 0.0);
        assert_eq!(kbps(1_000_000, Duration::ZERO), 0.0);
    }

    #[tokio::test]
    async fn test_init_extracts_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><script src="/app-ed6f621.js"></script></html>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/app-ed6f621.js"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"init({token:"TESTTOKEN123"})"#),
            )
            .mount(&server)
            .await;

        let mut client = unproxied().with_endpoints(
            server.uri(),
            format!("{}/netflix/speedtest", server.uri()),
        );
        client.init().await.unwrap();
        assert_eq!(client.token.as_deref(), Some("TESTTOKEN123"));
    }

    #[tokio::test]
    async fn test_init_fails_without_script() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>bare</html>"))
            .mount(&server)
            .await;

        let mut client = unproxied().with_endpoints(
            server.uri(),
            format!("{}/netflix/speedtest", server.uri()),
        );
        let err = client.init().await.unwrap_err();
        assert_eq!(err.category(), "NETWORK");
    }

    #[tokio::test]
    async fn test_get_urls_parses_targets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/netflix/speedtest"))
            .and(query_param("token", "TESTTOKEN123"))
            .and(query_param("https", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"url": format!("{}/dl/1", server.uri())},
                {"url": format!("{}/dl/2", server.uri())},
            ])))
            .mount(&server)
            .await;

        let mut client = unproxied().with_endpoints(
            server.uri(),
            format!("{}/netflix/speedtest", server.uri()),
        );
        client.token = Some("TESTTOKEN123".to_string());
        let urls = client.get_urls().await.unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].path().ends_with("/dl/1"));
    }

    #[tokio::test]
    async fn test_get_urls_requires_init() {
        let client = unproxied();
        let err = client.get_urls().await.unwrap_err();
        assert_eq!(err.category(), "INTERNAL");
    }

    #[tokio::test]
    async fn test_measure_streams_samples_then_closes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dl/1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 256 * 1024]))
            .mount(&server)
            .await;

        let client = unproxied();
        let url = Url::parse(&format!("{}/dl/1", server.uri())).unwrap();
        let (tx, mut rx) = mpsc::channel(16);

        client.measure(&[url], tx).await.unwrap();

        let mut last = None;
        while let Some(sample) = rx.recv().await {
            last = Some(sample);
        }
        // Channel closed after at least the final sample
        let final_kbps = last.expect("at least one sample");
        assert!(final_kbps > 0.0);
    }

    #[tokio::test]
    async fn test_measure_propagates_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dl/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = unproxied();
        let url = Url::parse(&format!("{}/dl/missing", server.uri())).unwrap();
        let (tx, mut rx) = mpsc::channel(16);

        let err = client.measure(&[url], tx).await.unwrap_err();
        assert_eq!(err.category(), "NETWORK");
        // No samples were delivered and the channel is closed
        assert!(rx.recv().await.is_none());
    }
}
