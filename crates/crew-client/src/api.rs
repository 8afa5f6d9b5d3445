//! Async HTTP client for the crew backend REST API.
//!
//! Every method bails on a non-success status with the response body in the
//! error, so callers can surface the server's own message.

use std::time::Duration;

use crew_api_types::{
    AgentPayload, ApiKeyPayload, CreateSessionResponse, ModelInfo, ModelPayload, ModelsResponse,
    ResultResponse, SessionSnapshot, SessionStats, StartPayload, TaskPayload, ToolInfo,
    ToolsResponse, ValidateKeyResponse,
};
use crew_core::config::ApiConfig;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{friendly, ClientError};

/// Reusable client + base URL (including the `/api` prefix).
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build from the `[api]` config section, applying the request timeout
    /// when one is configured.
    pub fn from_config(api: &ApiConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = api.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let base = api.rest_base();
        let client = builder.build().map_err(|e| friendly(e, &base))?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn send(
        &self,
        method: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        tracing::debug!(method, url, "request");
        let resp = request.send().await.map_err(|e| friendly(e, url))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(method, url, status = status.as_u16(), "request rejected");
            return Err(ClientError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(url: &str, resp: Response) -> Result<T, ClientError> {
        let bytes = resp.bytes().await.map_err(|e| friendly(e, url))?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let resp = self.send("GET", &url, self.client.get(&url)).await?;
        Self::decode(&url, resp).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let resp = self
            .send("POST", &url, self.client.post(&url).json(body))
            .await?;
        Self::decode(&url, resp).await
    }

    /// POST whose response body carries nothing the client needs.
    async fn post_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        let url = self.url(path);
        self.send("POST", &url, self.client.post(&url).json(body))
            .await?;
        Ok(())
    }

    // ── Catalog ──

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        let resp: ModelsResponse = self.get_json("/models").await?;
        Ok(resp.models)
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>, ClientError> {
        let resp: ToolsResponse = self.get_json("/tools").await?;
        Ok(resp.tools)
    }

    // ── Session ──

    pub async fn create_session(&self) -> Result<String, ClientError> {
        let url = self.url("/sessions");
        let resp = self.send("POST", &url, self.client.post(&url)).await?;
        let created: CreateSessionResponse = Self::decode(&url, resp).await?;
        Ok(created.session_id)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<SessionSnapshot, ClientError> {
        self.get_json(&format!("/sessions/{session_id}")).await
    }

    pub async fn save_agents(
        &self,
        session_id: &str,
        agents: &[AgentPayload],
    ) -> Result<(), ClientError> {
        self.post_ack(&format!("/sessions/{session_id}/agents"), agents)
            .await
    }

    pub async fn save_model(&self, session_id: &str, model_id: &str) -> Result<(), ClientError> {
        let body = ModelPayload {
            model_id: model_id.to_string(),
        };
        self.post_ack(&format!("/sessions/{session_id}/model"), &body)
            .await
    }

    pub async fn save_tasks(
        &self,
        session_id: &str,
        tasks: &[TaskPayload],
    ) -> Result<(), ClientError> {
        self.post_ack(&format!("/sessions/{session_id}/tasks"), tasks)
            .await
    }

    pub async fn set_api_key(&self, session_id: &str, api_key: &str) -> Result<(), ClientError> {
        let body = ApiKeyPayload {
            api_key: api_key.to_string(),
        };
        self.post_ack(&format!("/sessions/{session_id}/api-key"), &body)
            .await
    }

    pub async fn start(&self, session_id: &str, topic: &str) -> Result<(), ClientError> {
        let body = StartPayload {
            topic: topic.to_string(),
        };
        self.post_ack(&format!("/sessions/{session_id}/start"), &body)
            .await
    }

    pub async fn fetch_result(&self, session_id: &str) -> Result<ResultResponse, ClientError> {
        self.get_json(&format!("/sessions/{session_id}/result"))
            .await
    }

    pub async fn fetch_stats(&self, session_id: &str) -> Result<SessionStats, ClientError> {
        self.get_json(&format!("/sessions/{session_id}/stats"))
            .await
    }

    // ── Settings ──

    /// Ask the backend whether `api_key` works. Any failure here means the
    /// validator could not answer, not that the key is bad.
    pub async fn check_key(&self, api_key: &str) -> Result<ValidateKeyResponse, ClientError> {
        let body = ApiKeyPayload {
            api_key: api_key.to_string(),
        };
        self.post_json("/settings/validate-key", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_is_normalised() {
        let client = ApiClient::new("http://localhost:8000/api/");
        assert_eq!(client.base(), "http://localhost:8000/api");
        assert_eq!(client.url("/models"), "http://localhost:8000/api/models");
    }

    #[test]
    fn from_config_uses_rest_base() {
        let api = ApiConfig {
            base_url: "https://crew.example.com/api/".into(),
            ws_url: None,
            request_timeout_secs: Some(5),
        };
        let client = ApiClient::from_config(&api).unwrap();
        assert_eq!(client.base(), "https://crew.example.com/api");
    }

    #[tokio::test]
    async fn unreachable_backend_maps_to_connect_error() {
        // Port 9 (discard) is essentially never listening on loopback.
        let client = ApiClient::new("http://127.0.0.1:9/api");
        let err = client.list_models().await.unwrap_err();
        assert!(matches!(err, ClientError::Connect { .. }), "{err:?}");
    }
}
