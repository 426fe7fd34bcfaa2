use std::thread;
use std::time::Duration;

use log::{error, warn};
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT,
};
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::RequestConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(StatusCode),
    #[error("giving up on {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },
}

/// Blocking HTTP client with a browser-like header set and retry/backoff.
///
/// Accept-Encoding is deliberately left unset so reqwest negotiates
/// compression itself; response bodies are decoded from the declared
/// charset, falling back to UTF-8 rather than Latin-1.
pub struct Transport {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl Transport {
    pub fn new(config: &RequestConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        Transport {
            client,
            max_retries: config.max_retries,
            // Backoff between retries: twice the normal pacing delay.
            retry_delay: config.request_delay * 2,
        }
    }

    /// GET `url` with optional query parameters, retrying transient
    /// failures. Exhausting the retries is reported as an error value;
    /// callers treat it as "no data for this request".
    pub fn fetch(
        &self,
        url: &str,
        params: Option<&[(&str, String)]>,
    ) -> Result<String, FetchError> {
        for attempt in 1..=self.max_retries {
            match self.try_get(url, params) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(
                        "Request failed (attempt {}/{}): {}",
                        attempt, self.max_retries, e
                    );
                    if attempt < self.max_retries {
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }

        error!("Request failed, retries exhausted: {}", url);
        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.max_retries,
        })
    }

    fn try_get(
        &self,
        url: &str,
        params: Option<&[(&str, String)]>,
    ) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if let Some(params) = params {
            request = request.query(params);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.text()?)
    }
}
