use std::sync::Arc;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderName, HeaderValue};
use llamabridge_common::Settings;
use llamabridge_protocol::claude::create_message::{CreateMessageRequestBody, CreateMessageResponse};
use llamabridge_protocol::claude::types::{HEADER_ANTHROPIC_VERSION, HEADER_API_KEY};

use crate::error::{GatewayError, TransportErrorKind};
use crate::headers::Headers;
use crate::upstream_client::{UpstreamClient, UpstreamHttpRequest, UpstreamHttpResponse};

const APPLICATION_JSON: &str = "application/json";

/// Talks to the provider's messages endpoint. Each call is made exactly once.
#[derive(Clone)]
pub struct ClaudeClient {
    transport: Arc<dyn UpstreamClient>,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl ClaudeClient {
    pub fn new(transport: Arc<dyn UpstreamClient>, settings: &Settings) -> Self {
        Self {
            transport,
            endpoint: settings.api_endpoint.clone(),
            api_key: settings.api_key.clone(),
            api_version: settings.api_version.clone(),
        }
    }

    pub async fn create_message(
        &self,
        body: &CreateMessageRequestBody,
    ) -> Result<CreateMessageResponse, GatewayError> {
        let payload = serde_json::to_vec(body).map_err(|err| {
            build_failure(format!("failed to encode upstream request: {err}"))
        })?;
        let resp = self.post(Bytes::from(payload), None).await?;

        if !resp.status.is_success() {
            return Err(GatewayError::Provider {
                status: resp.status,
                body: String::from_utf8_lossy(&resp.body).into_owned(),
            });
        }
        serde_json::from_slice(&resp.body).map_err(|err| GatewayError::Decode(err.to_string()))
    }

    /// Sends `body` untouched. Provider error statuses come back as `Ok`.
    pub async fn forward(
        &self,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<UpstreamHttpResponse, GatewayError> {
        self.post(body, content_type).await
    }

    async fn post(
        &self,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<UpstreamHttpResponse, GatewayError> {
        let req = UpstreamHttpRequest {
            url: self.endpoint.clone(),
            headers: self.headers(content_type)?,
            body,
        };
        self.transport.send(req).await
    }

    fn headers(&self, content_type: Option<&str>) -> Result<Headers, GatewayError> {
        let content_type = content_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(APPLICATION_JSON);
        Ok(vec![
            (CONTENT_TYPE, header_value(content_type, "content-type")?),
            (ACCEPT, HeaderValue::from_static(APPLICATION_JSON)),
            (
                HeaderName::from_static(HEADER_API_KEY),
                header_value(&self.api_key, HEADER_API_KEY)?,
            ),
            (
                HeaderName::from_static(HEADER_ANTHROPIC_VERSION),
                header_value(&self.api_version, HEADER_ANTHROPIC_VERSION)?,
            ),
        ])
    }
}

fn header_value(value: &str, name: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(value)
        .map_err(|_| build_failure(format!("invalid {name} header value")))
}

fn build_failure(message: String) -> GatewayError {
    GatewayError::Transport {
        kind: TransportErrorKind::Other,
        message,
    }
}
