use std::sync::Arc;

use bytes::Bytes;
use llamabridge_common::Settings;
use llamabridge_protocol::ollama::{GenerateRequest, GenerateResponse};
use llamabridge_transform::{ModelTable, generate_request_to_claude, generate_response_from_claude};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::provider::ClaudeClient;
use crate::upstream_client::{UpstreamClient, UpstreamHttpResponse};

/// Request-independent state shared by every handler. Nothing in here is
/// mutated after construction.
pub struct Gateway {
    settings: Arc<Settings>,
    models: Arc<ModelTable>,
    client: ClaudeClient,
}

impl Gateway {
    pub fn new(
        settings: Arc<Settings>,
        models: Arc<ModelTable>,
        transport: Arc<dyn UpstreamClient>,
    ) -> Self {
        let client = ClaudeClient::new(transport, &settings);
        Self {
            settings,
            models,
            client,
        }
    }

    /// Ollama generate → Claude messages → Ollama response.
    pub async fn generate(
        &self,
        trace_id: &str,
        req: GenerateRequest,
    ) -> Result<GenerateResponse, GatewayError> {
        let model = self.models.resolve(&req.model);
        info!(
            event = "model_resolved",
            trace_id = %trace_id,
            alias = %req.model,
            model = %model
        );

        let upstream_req = generate_request_to_claude(&req, model, &self.settings);
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(pretty) = serde_json::to_string_pretty(&upstream_req) {
                debug!(trace_id = %trace_id, request = %pretty, "upstream request");
            }
        }

        let resp = match self.client.create_message(&upstream_req).await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(
                    event = "upstream_failed",
                    trace_id = %trace_id,
                    model = %model,
                    retryable = err.is_retryable(),
                    error = %err
                );
                return Err(err);
            }
        };
        debug!(
            trace_id = %trace_id,
            id = %resp.id,
            stop_reason = ?resp.stop_reason,
            "upstream responded"
        );

        Ok(generate_response_from_claude(
            &req.model,
            &resp,
            OffsetDateTime::now_utc(),
        ))
    }

    /// Native passthrough. Provider statuses, headers and body are returned
    /// as received; only transport failures are errors.
    pub async fn forward(
        &self,
        trace_id: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<UpstreamHttpResponse, GatewayError> {
        match self.client.forward(body, content_type).await {
            Ok(resp) => Ok(resp),
            Err(err) => {
                warn!(
                    event = "upstream_failed",
                    trace_id = %trace_id,
                    passthrough = true,
                    error = %err
                );
                Err(err)
            }
        }
    }
}
