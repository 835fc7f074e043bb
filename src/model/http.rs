//! HTTP model client.
//!
//! A thin JSON adapter for a remote model endpoint: one POST per chat
//! turn, bearer auth when a key is configured, no retries — failures
//! surface immediately through the turn error path.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{ModelClient, ModelRequest, ModelResponse};
use crate::config::ModelConfig;
use crate::error::{AssistantError, Result};

/// JSON body sent to the provider: the request plus the model id.
#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    #[serde(flatten)]
    request: &'a ModelRequest,
}

/// Client for an HTTP model provider.
pub struct HttpModelClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpModelClient {
    /// Create a client from configuration. The API key is resolved from
    /// the configured environment variable once, at construction.
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.resolve_api_key(),
        }
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let body = WireRequest {
            model: &self.model,
            request,
        };

        let mut http_request = self
            .http
            .post(&self.endpoint)
            .header("x-request-id", &request_id)
            .json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        debug!(request_id = %request_id, endpoint = %self.endpoint, "sending model request");

        let response = http_request
            .send()
            .await
            .map_err(|e| AssistantError::Model(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AssistantError::Model(format!(
                "provider returned {status}: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }

        response
            .json::<ModelResponse>()
            .await
            .map_err(|e| AssistantError::Model(format!("cannot parse response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GROUNDING_SOURCE_MAPS;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ModelRequest {
        ModelRequest {
            prior_turns: Vec::new(),
            prompt: "coffee nearby".to_owned(),
            location_bias: None,
            tools: Vec::new(),
            grounding_source: GROUNDING_SOURCE_MAPS.to_owned(),
        }
    }

    fn client_for(server: &MockServer) -> HttpModelClient {
        HttpModelClient::new(&ModelConfig {
            endpoint: format!("{}/v1/generate", server.uri()),
            model: "maps-assistant-1".to_owned(),
            api_key_env: "WAYPOINT_TEST_NO_KEY".to_owned(),
        })
    }

    #[tokio::test]
    async fn parses_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .and(header_exists("x-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "Here you go.",
                "functionCalls": [{"name": "toggle_traffic", "args": {"enabled": true}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = match client.generate(&request()).await {
            Ok(r) => r,
            Err(e) => panic!("generate failed: {e}"),
        };
        assert_eq!(response.text, "Here you go.");
        assert_eq!(response.function_calls.len(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_a_model_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.generate(&request()).await;
        match result {
            Err(AssistantError::Model(detail)) => assert!(detail.contains("500")),
            other => panic!("expected a model error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_model_error() {
        let client = HttpModelClient::new(&ModelConfig {
            endpoint: "http://127.0.0.1:9/v1/generate".to_owned(),
            ..ModelConfig::default()
        });
        assert!(client.generate(&request()).await.is_err());
    }
}
