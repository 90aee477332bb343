use crate::error::Result;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Thin wrapper around a `reqwest::Client` bound to one base URL.
/// Every call returns the raw status and body; interpreting them is left to
/// the caller.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base: String,
}

impl RestClient {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: Client, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { client, base }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// POST a form-encoded body without authorization (token endpoint).
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<ApiResponse> {
        let url = self.url(path);
        debug!("POST {} (form)", url);
        let resp = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;
        ApiResponse::read(resp).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<ApiResponse> {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<ApiResponse> {
        self.send::<()>(Method::GET, path, token, None).await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<ApiResponse> {
        self.send(Method::PUT, path, token, Some(body)).await
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&T>,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let mut req = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json");
        if let Some(b) = body {
            req = req.header(CONTENT_TYPE, "application/json").json(b);
        }
        let resp = req.send().await?;
        ApiResponse::read(resp).await
    }
}

/// Status, headers and body of a finished request.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    async fn read(resp: reqwest::Response) -> Result<Self> {
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Look up a field by JSON pointer, e.g. `/error/status`.
    /// Returns None when the body is not JSON or the field is absent.
    pub fn path(&self, pointer: &str) -> Option<serde_json::Value> {
        let v: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        v.pointer(pointer).cloned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
