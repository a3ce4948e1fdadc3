//! HTTP client implementation

use provider_api::models::ErrorResponse;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::form_urlencoded::byte_serialize;

use crate::authn::credential::Credential;
use crate::errors::PublishError;
use crate::storage::settings::HttpSettings;

/// Percent-encode a value for use as one URL path segment or query value
pub fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Bearer-authenticated JSON client for one provider API
pub struct HttpClient {
    client: Client,
    provider: &'static str,
    base_url: String,
    token: Credential,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(
        provider: &'static str,
        base_url: &str,
        token: Credential,
        settings: &HttpSettings,
        default_headers: &[(&'static str, &'static str)],
    ) -> Result<Self, PublishError> {
        let mut headers = HeaderMap::new();
        for &(name, value) in default_headers {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, token: &Credential) -> RequestBuilder {
        request.header(header::AUTHORIZATION, format!("Bearer {}", token.expose()))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PublishError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .authorized(self.client.get(&url), &self.token)
            .send()
            .await?;
        self.read_json("GET", response).await
    }

    /// Make a GET request, mapping 403 and 404 to `None`
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, PublishError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .authorized(self.client.get(&url), &self.token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(None),
            _ => self.read_json("GET", response).await.map(Some),
        }
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PublishError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .authorized(self.client.post(&url), &self.token)
            .json(body)
            .send()
            .await?;
        self.read_json("POST", response).await
    }

    /// Make a PATCH request
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PublishError> {
        let url = self.url(path);
        debug!("PATCH {}", url);

        let response = self
            .authorized(self.client.patch(&url), &self.token)
            .json(body)
            .send()
            .await?;
        self.read_json("PATCH", response).await
    }

    /// GET a path with another token; `false` when the token is refused
    pub async fn check_credential(&self, path: &str, token: &Credential) -> Result<bool, PublishError> {
        let url = self.url(path);
        debug!("GET {} (credential check)", url);

        let response = self.authorized(self.client.get(&url), token).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Ok(false)
        } else {
            Err(self.status_error("GET", response).await)
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        method: &str,
        response: Response,
    ) -> Result<T, PublishError> {
        if !response.status().is_success() {
            return Err(self.status_error(method, response).await);
        }

        let body = response.json().await?;
        Ok(body)
    }

    async fn status_error(&self, method: &str, response: Response) -> PublishError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("{} {} failed: {} - {}", self.provider, method, status, body);

        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.describe())
            .unwrap_or(body);
        PublishError::provider(self.provider, format!("{}: {}", status, detail))
    }
}
