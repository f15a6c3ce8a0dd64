//! HTTP transport backed by reqwest

use crate::api::{ApiRequest, ApiResponse, Method, Transport};
use crate::core::{ApiConfig, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

/// Talks to the REST API over the network
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a client with one fixed timeout for connect and response
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a request path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path);
        log::debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(to_reqwest(request.method), &url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        log::debug!("{} {} -> {}", request.method, url, status);
        Ok(ApiResponse { status, body })
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/api/".into(),
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();

        assert_eq!(transport.base_url(), "http://localhost:8000/api");
        assert_eq!(transport.url("/readings/"), "http://localhost:8000/api/readings/");
    }
}
