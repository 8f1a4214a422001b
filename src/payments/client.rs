use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};

use super::PatchDocument;

const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
const PRODUCTION_BASE_URL: &str = "https://api-m.paypal.com";
const TOKEN_PATH: &str = "/v1/oauth2/token";
/// Largest page PayPal's catalog and plan listings hand out
const LIST_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayPalEnvironment {
    Sandbox,
    Production,
}

impl PayPalEnvironment {
    /// Anything other than "PRODUCTION" selects the sandbox.
    pub fn from_setting(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("PRODUCTION") {
            PayPalEnvironment::Production
        } else {
            PayPalEnvironment::Sandbox
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            PayPalEnvironment::Sandbox => SANDBOX_BASE_URL,
            PayPalEnvironment::Production => PRODUCTION_BASE_URL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub secret_key: String,
    pub environment: PayPalEnvironment,
    /// Replaces the environment's base URL (local mocks)
    pub base_url_override: Option<String>,
    pub timeout: Duration,
}

impl PayPalConfig {
    pub fn new(
        client_id: impl Into<String>,
        secret_key: impl Into<String>,
        environment: PayPalEnvironment,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            secret_key: secret_key.into(),
            environment,
            base_url_override: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

#[derive(Debug, Serialize)]
struct ListQuery {
    page_size: u32,
    page: u32,
    total_required: bool,
}

/// One page of a list endpoint. PayPal names the item array after the
/// resource (`products`, `plans`).
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Page<T> {
    #[serde(default, alias = "products", alias = "plans")]
    items: Vec<T>,
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Authenticated PayPal REST client.
///
/// The bearer token is fetched on first use and kept for the lifetime of the
/// client. It is never refreshed: build a new client for a fresh token.
#[derive(Debug)]
pub struct PayPalClient {
    http: Client,
    client_id: String,
    secret_key: String,
    base_url: String,
    access_token: OnceCell<String>,
}

impl PayPalClient {
    pub fn new(config: &PayPalConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            secret_key: config.secret_key.clone(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            access_token: OnceCell::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Cached bearer token, fetched with the client-credentials grant on
    /// first call.
    pub async fn access_token(&self) -> Result<&str> {
        self.access_token
            .get_or_try_init(|| self.fetch_access_token())
            .await
            .map(String::as_str)
    }

    async fn fetch_access_token(&self) -> Result<String> {
        tracing::debug!("Requesting PayPal access token from {}", self.base_url);

        let response = self
            .http
            .post(self.url(TOKEN_PATH))
            .basic_auth(&self.client_id, Some(&self.secret_key))
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, "en_US")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: TokenResponse = check_status(response).await?.json().await?;
        token.access_token.ok_or(AppError::MissingField("access_token"))
    }

    /// Standard header set for API calls, including `Authorization: Bearer`.
    pub async fn request_headers(&self) -> Result<HeaderMap> {
        let token = self.access_token().await?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::InvalidResponse("access token is not a valid header".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en_US"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let headers = self.request_headers().await?;
        tracing::debug!("PayPal {} {}", method, path);
        Ok(self.http.request(method, self.url(path)).headers(headers))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        check_status(response).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path).await?;
        Ok(self.execute(request).await?.json().await?)
    }

    pub(crate) async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path).await?.query(query);
        Ok(self.execute(request).await?.json().await?)
    }

    /// Walk every page of a list endpoint.
    pub(crate) async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let query = ListQuery {
                page_size: LIST_PAGE_SIZE,
                page,
                total_required: true,
            };
            let body: Page<T> = self.get_with_query(path, &query).await?;
            let received = body.items.len();
            items.extend(body.items);
            match body.total_pages {
                Some(total) if page < total && received > 0 => page += 1,
                _ => break,
            }
        }
        Ok(items)
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).await?.json(body);
        Ok(self.execute(request).await?.json().await?)
    }

    /// POST whose response body (usually 204) is not needed.
    pub(crate) async fn post_discarding<B>(&self, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.request(Method::POST, path).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request).await?;
        Ok(())
    }

    pub(crate) async fn patch(&self, path: &str, document: &PatchDocument) -> Result<()> {
        let request = self.request(Method::PATCH, path).await?.json(document);
        self.execute(request).await?;
        Ok(())
    }
}

/// Encode a PayPal id for use as a path segment.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Api {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_setting() {
        assert_eq!(
            PayPalEnvironment::from_setting("PRODUCTION"),
            PayPalEnvironment::Production
        );
        assert_eq!(
            PayPalEnvironment::from_setting("production"),
            PayPalEnvironment::Production
        );
        assert_eq!(
            PayPalEnvironment::from_setting("SANDBOX"),
            PayPalEnvironment::Sandbox
        );
        assert_eq!(PayPalEnvironment::from_setting(""), PayPalEnvironment::Sandbox);
    }

    #[test]
    fn test_base_url_per_environment() {
        let sandbox = PayPalConfig::new("id", "secret", PayPalEnvironment::Sandbox);
        assert_eq!(sandbox.base_url(), "https://api-m.sandbox.paypal.com");

        let live = PayPalConfig::new("id", "secret", PayPalEnvironment::Production);
        assert_eq!(live.base_url(), "https://api-m.paypal.com");

        let mocked = live.with_base_url("http://127.0.0.1:9999");
        assert_eq!(mocked.base_url(), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let config = PayPalConfig::new("id", "secret", PayPalEnvironment::Sandbox)
            .with_base_url("http://localhost:1234/");
        let client = PayPalClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
        assert_eq!(client.url("/v1/oauth2/token"), "http://localhost:1234/v1/oauth2/token");
    }

    #[derive(Debug, Deserialize)]
    struct Listed {
        id: String,
    }

    #[test]
    fn test_page_reads_resource_named_items() {
        let page: Page<Listed> = serde_json::from_str(
            r#"{"products": [{"id": "PROD-1"}, {"id": "PROD-2"}], "total_pages": 1}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].id, "PROD-2");
        assert_eq!(page.total_pages, Some(1));

        let page: Page<Listed> = serde_json::from_str(r#"{"plans": [{"id": "P-1"}]}"#).unwrap();
        assert_eq!(page.items[0].id, "P-1");

        let empty: Page<Listed> = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
        assert!(empty.total_pages.is_none());
    }

    #[test]
    fn test_segment_encodes_reserved_characters() {
        assert_eq!(segment("PROD-47M73937LE218162X"), "PROD-47M73937LE218162X");
        assert_eq!(segment("a/b"), "a%2Fb");
    }
}
