//! Internet tool - HTTP GET/POST with a timeout
//!
//! Non-2xx responses are failures. Response bodies are clipped to
//! [`MAX_BODY_CHARS`] characters.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::core::{types::truncate_chars, ToolError, ToolResult};

/// Default timeout for HTTP requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Maximum characters of a response body kept in the result
pub const MAX_BODY_CHARS: usize = 5000;

/// Makes HTTP requests on behalf of the agent
#[derive(Debug, Clone)]
pub struct InternetTool {
    enabled: bool,
    timeout_secs: u64,
    client: Client,
}

impl InternetTool {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            client: Client::new(),
        }
    }

    /// Override the default timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// GET `url` with the configured timeout
    pub async fn fetch(&self, url: &str) -> ToolResult {
        self.get(url, self.timeout_secs).await
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, timeout_secs: u64) -> ToolResult {
        if !self.enabled {
            return ToolError::Disabled { tool: "Internet" }.into();
        }

        let url = match parse_url(url) {
            Ok(url) => url,
            Err(e) => return e.into(),
        };

        tracing::info!("GET request to: {}", url);

        let request = self
            .client
            .get(url)
            .timeout(Duration::from_secs(timeout_secs));
        Self::send(request, timeout_secs).await
    }

    /// Make a POST request with an optional JSON body
    pub async fn post(
        &self,
        url: &str,
        body: Option<&serde_json::Value>,
        timeout_secs: u64,
    ) -> ToolResult {
        if !self.enabled {
            return ToolError::Disabled { tool: "Internet" }.into();
        }

        let url = match parse_url(url) {
            Ok(url) => url,
            Err(e) => return e.into(),
        };

        tracing::info!("POST request to: {}", url);

        let mut request = self
            .client
            .post(url)
            .timeout(Duration::from_secs(timeout_secs));
        if let Some(body) = body {
            request = request.json(body);
        }
        Self::send(request, timeout_secs).await
    }

    async fn send(request: reqwest::RequestBuilder, timeout_secs: u64) -> ToolResult {
        match read_body(request).await {
            Ok(body) => ToolResult::success(truncate_chars(&body, MAX_BODY_CHARS)),
            Err(e) if e.is_timeout() => ToolError::Timeout {
                what: "Request",
                secs: timeout_secs,
            }
            .into(),
            Err(e) => {
                tracing::debug!("Request failed: {}", e);
                ToolError::execution(e.to_string()).into()
            }
        }
    }
}

impl Default for InternetTool {
    fn default() -> Self {
        Self::new(true)
    }
}

async fn read_body(request: reqwest::RequestBuilder) -> reqwest::Result<String> {
    let response = request.send().await?.error_for_status()?;
    response.text().await
}

fn parse_url(raw: &str) -> Result<Url, ToolError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ToolError::execution(format!("Invalid URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ToolError::execution(format!(
            "Unsupported URL scheme '{}'",
            other
        ))),
    }
}
