use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

const API_PREFIX: &str = "/api/netsuite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistenceFlags {
    pub customer_exists: bool,
    pub contact_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub data: Option<ExistenceFlags>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub timestamp: String,
    pub path: String,
    pub method: String,
    pub message: String,
    pub error: Option<String>,
    pub max_size: Option<usize>,
    pub retry_after: Option<u64>,
    pub details: Option<serde_json::Value>,
}

pub struct GatewayClient {
    client: Client,
    gateway_url: String,
    api_key: Option<String>,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Send `x-api-key` with every call.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.gateway_url, API_PREFIX, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }

    /// Validate an email against both customers and contacts.
    pub async fn check_customer(&self, email: &str) -> Result<ValidationVerdict, Box<dyn std::error::Error>> {
        let resp = self.check_customer_raw(email).await?;
        decode(resp).await
    }

    /// `POST /customer/check`, returning the raw response (headers included).
    pub async fn check_customer_raw(&self, email: &str) -> Result<Response, reqwest::Error> {
        self.authorized(self.client.post(self.url("/customer/check")))
            .json(&serde_json::json!({ "companyEmail": email }))
            .send()
            .await
    }

    pub async fn customer_exists(&self, email: &str) -> Result<ExistsResponse, Box<dyn std::error::Error>> {
        let resp = self.get(&format!("/customer/{}/exists", email)).await?;
        decode(resp).await
    }

    pub async fn contact_exists(&self, email: &str) -> Result<ExistsResponse, Box<dyn std::error::Error>> {
        let resp = self.get(&format!("/contact/{}/exists", email)).await?;
        decode(resp).await
    }

    pub async fn health(&self) -> Result<HealthResponse, Box<dyn std::error::Error>> {
        let resp = self.get("/health").await?;
        decode(resp).await
    }

    /// Authorized GET of a path under the API prefix.
    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.authorized(self.client.get(self.url(path))).send().await
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(resp: Response) -> Result<T, Box<dyn std::error::Error>> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Err(format!("Gateway returned {}: {}", status, body.message).into()),
            Err(_) => Err(format!("Gateway returned error status {}: {}", status, text).into()),
        };
    }

    Ok(serde_json::from_str(&text)?)
}
