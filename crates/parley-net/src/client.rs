//! Authenticated request client for the history API.
//!
//! [`RequestClient`] is the seam the sync engine depends on; [`HttpClient`]
//! is the production implementation over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{NetError, Result};

/// Minimal HTTP-like verbs the engine needs. Paths are relative to the
/// client's base URL and start with `/`.
#[async_trait]
pub trait RequestClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;
    async fn post(&self, path: &str, body: Value) -> Result<Value>;
    async fn put(&self, path: &str, body: Option<Value>) -> Result<Value>;
}

/// reqwest-backed [`RequestClient`] with a fixed base URL, a per-request
/// timeout and an optional session token header.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    auth: Option<(String, String)>,
}

impl HttpClient {
    /// Build a client rooted at `base_url` (scheme required, trailing slash ignored).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(NetError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            auth: None,
        })
    }

    /// Attach the session token to every request under `header`.
    pub fn with_auth(mut self, header: impl Into<String>, token: impl Into<String>) -> Self {
        self.auth = Some((header.into(), token.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, method: &'static str, path: &str, req: RequestBuilder) -> Result<Value> {
        let req = match &self.auth {
            Some((header, token)) => req.header(header.as_str(), token.as_str()),
            None => req,
        };

        debug!(method, path, "Sending request");
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(method, path, status = status.as_u16(), "Request failed");
            return Err(NetError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RequestClient for HttpClient {
    async fn get(&self, path: &str) -> Result<Value> {
        self.execute("GET", path, self.http.get(self.url(path))).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.execute("POST", path, self.http.post(self.url(path)).json(&body))
            .await
    }

    async fn put(&self, path: &str, body: Option<Value>) -> Result<Value> {
        let req = self.http.put(self.url(path));
        let req = match body {
            Some(body) => req.json(&body),
            None => req,
        };
        self.execute("PUT", path, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpClient {
        HttpClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_sends_token_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations"))
            .and(header("token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "peers": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).with_auth("token", "secret");
        let value = client.get("/conversations").await.unwrap();
        assert_eq!(value["success"], json!(true));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/conversations/u1/messages"))
            .and(body_json(json!({ "text": "hi" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .post("/conversations/u1/messages", json!({ "text": "hi" }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_without_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/messages/m1/seen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.put("/messages/m1/seen", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = client_for(&server).get("/conversations").await.unwrap_err();
        match err {
            NetError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).get("/conversations").await.unwrap_err();
        assert!(matches!(err, NetError::Decode(_)));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.get("/conversations").await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }

    #[test]
    fn test_rejects_url_without_scheme() {
        let err = HttpClient::new("localhost:5000", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let client = HttpClient::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(client.url("/conversations"), "http://localhost:5000/api/conversations");
    }
}
