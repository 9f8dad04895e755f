//! HTTP access to the grid service.

use std::time::Duration;

use tracing::{debug, info};
use ureq::Agent;

use crate::urls::next_link;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// What the export and import loops need from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Raw `Link` header, if any.
    pub link: Option<String>,
    pub body: String,
}

impl ApiResponse {
    /// URL of the next page announced by the `Link` header.
    pub fn next_url(&self) -> Option<String> {
        self.link.as_deref().and_then(next_link)
    }
}

/// The two calls made against the grid service.
///
/// Errors are transport failures only; HTTP error statuses come back as
/// regular responses so callers can react to them.
pub trait GridApi {
    /// GET `url` with extra query parameters.
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<ApiResponse, String>;

    /// POST a JSON body to `url`.
    fn post_json(&self, url: &str, body: &str) -> Result<ApiResponse, String>;
}

/// [`GridApi`] over HTTPS with `ApiKey` authorization.
pub struct ApiClient {
    agent: Agent,
    api_key: String,
}

impl ApiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(120)))
            .build();
        ApiClient {
            agent: Agent::new_with_config(config),
            api_key: api_key.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("ApiKey {}", self.api_key)
    }
}

impl GridApi for ApiClient {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<ApiResponse, String> {
        info!("Get data from {}", url);

        let mut request = self
            .agent
            .get(url)
            .header("Authorization", self.authorization())
            .header("Content-Type", "application/json");
        for (key, value) in query {
            request = request.query(key, value);
        }

        let response = request
            .call()
            .map_err(|e| format!("Request to {} failed: {}", url, e))?;
        read_response(url, response)
    }

    fn post_json(&self, url: &str, body: &str) -> Result<ApiResponse, String> {
        info!("Post data to {}", url);
        debug!("payload = {}", body);

        let response = self
            .agent
            .post(url)
            .header("Authorization", self.authorization())
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(|e| format!("Request to {} failed: {}", url, e))?;
        read_response(url, response)
    }
}

fn read_response(
    url: &str,
    response: ureq::http::Response<ureq::Body>,
) -> Result<ApiResponse, String> {
    let status = response.status().as_u16();
    let link = response
        .headers()
        .get("link")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .into_body()
        .read_to_string()
        .map_err(|e| format!("Failed reading response from {}: {}", url, e))?;
    Ok(ApiResponse { status, link, body })
}
