//! Core HTTP client shared by all endpoint groups

use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Client for the lobby backend.
///
/// Holds the base URL and the bearer token; endpoint wrappers live in the
/// `admin`, `chat`, `account`, and `docs` modules as further `impl` blocks.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client authenticated with a bearer token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(base_url.into()),
            token: Some(token.into()),
        }
    }

    /// Create an unauthenticated client (only useful for `login`)
    pub fn anonymous(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(base_url.into()),
            token: None,
        }
    }

    /// Replace the bearer token, e.g. after login
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// The configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-success response into the error taxonomy, reading the
    /// `detail` body when present.
    pub(crate) async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "backend request failed");
        Err(Error::from_status(status.as_u16(), &body))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .authorize(self.http.get(self.url(path)).query(query))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    pub(crate) async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let response = self
            .authorize(self.http.get(self.url(path)).query(query))
            .send()
            .await?;
        Ok(self.check(response).await?.text().await?)
    }

    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .authorize(self.http.post(self.url(path)).json(body))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    /// POST where the caller does not care about the response body
    pub(crate) async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let response = self
            .authorize(self.http.post(self.url(path)).json(body))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    pub(crate) async fn patch_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .authorize(self.http.patch(self.url(path)).json(body))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    pub(crate) async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .authorize(self.http.put(self.url(path)).json(body))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    pub(crate) async fn delete_unit(&self, path: &str) -> Result<()> {
        let response = self.authorize(self.http.delete(self.url(path))).send().await?;
        self.check(response).await?;
        Ok(())
    }
}

fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new("http://localhost:8000/", "t");
        assert_eq!(client.url("/admin/metrics"), "http://localhost:8000/admin/metrics");
        assert_eq!(client.url("chats"), "http://localhost:8000/chats");
    }

    #[test]
    fn test_base_url_trailing_slashes_trimmed() {
        let client = ApiClient::anonymous("http://api.example.com//");
        assert_eq!(client.base_url(), "http://api.example.com");
    }
}
