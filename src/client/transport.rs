use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::models::Setting;
use crate::error::AppError;

/// Wire operations the settings adapter needs from the settings endpoint.
#[async_trait]
pub trait SettingsTransport: Send + Sync {
    /// Read-all: every stored pair.
    async fn fetch_all(&self) -> Result<BTreeMap<String, String>, AppError>;

    /// Write-many: upsert every pair in `entries`.
    async fn save_many(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError>;

    /// Write-one: upsert a single pair and return the stored row.
    async fn save_one(&self, key: &str, value: &str) -> Result<Setting, AppError>;
}

#[async_trait]
impl<T: SettingsTransport + ?Sized> SettingsTransport for std::sync::Arc<T> {
    async fn fetch_all(&self) -> Result<BTreeMap<String, String>, AppError> {
        (**self).fetch_all().await
    }

    async fn save_many(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        (**self).save_many(entries).await
    }

    async fn save_one(&self, key: &str, value: &str) -> Result<Setting, AppError> {
        (**self).save_one(key, value).await
    }
}

/// Map a reqwest failure onto the app taxonomy. Status failures keep only the code.
fn transport_err(e: reqwest::Error) -> AppError {
    match e.status() {
        Some(status) => AppError::Status(status.as_u16()),
        None => AppError::Network(e.to_string()),
    }
}

#[derive(Serialize)]
struct SaveOneBody<'a> {
    key: &'a str,
    value: &'a str,
}

/// HTTP transport against a running clinic server.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    ///
    /// The underlying `reqwest::Client` is configured with a 30-second timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request, check the status code, and deserialize the JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        req.send()
            .await
            .map_err(transport_err)?
            .error_for_status()
            .map_err(transport_err)?
            .json()
            .await
            .map_err(transport_err)
    }

    /// Send a request, check the status code, and discard the response body.
    async fn send_ok(&self, req: reqwest::RequestBuilder) -> Result<(), AppError> {
        req.send()
            .await
            .map_err(transport_err)?
            .error_for_status()
            .map_err(transport_err)?;
        Ok(())
    }
}

#[async_trait]
impl SettingsTransport for HttpTransport {
    /// `GET /api/settings`
    async fn fetch_all(&self) -> Result<BTreeMap<String, String>, AppError> {
        self.send_json(self.request(reqwest::Method::GET, "/api/settings"))
            .await
    }

    /// `POST /api/settings`
    async fn save_many(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        let req = self
            .request(reqwest::Method::POST, "/api/settings")
            .json(entries);
        self.send_ok(req).await
    }

    /// `PUT /api/settings`
    async fn save_one(&self, key: &str, value: &str) -> Result<Setting, AppError> {
        let req = self
            .request(reqwest::Method::PUT, "/api/settings")
            .json(&SaveOneBody { key, value });
        self.send_json(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let transport = HttpTransport::new("http://127.0.0.1:3000/").unwrap();
        assert_eq!(transport.base_url, "http://127.0.0.1:3000");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) is almost never listening on loopback.
        let transport = HttpTransport::new("http://127.0.0.1:9").unwrap();
        let err = transport.fetch_all().await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }
}
