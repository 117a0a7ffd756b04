use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use llamabridge_core::{Gateway, GatewayError, UpstreamHttpResponse};
use llamabridge_protocol::ollama::{GenerateRequest, GenerateResponse};

pub const REQUEST_ID_HEADER: &str = "x-llamabridge-request-id";

const MAX_INBOUND_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct ProxyState {
    pub gateway: Arc<Gateway>,
}

pub fn proxy_router(gateway: Arc<Gateway>) -> Router {
    let state = ProxyState { gateway };

    // Ollama clients often run in a browser.
    let compat = Router::new()
        .route("/api/generate", post(ollama_generate).options(preflight))
        .layer(cors_layer());

    Router::new()
        .route("/health", get(health))
        .route("/v1/messages", post(claude_messages_passthrough))
        .merge(compat)
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn health() -> &'static str {
    "OK"
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

// ---- Ollama ----

async fn ollama_generate(State(state): State<ProxyState>, body: Body) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let started_at = Instant::now();
    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        route = "/api/generate"
    );

    let response = match generate(&state, &trace_id, body).await {
        Ok(out) => Json(out).into_response(),
        Err(err) => error_response(&err),
    };
    finish(response, &trace_id, "/api/generate", started_at)
}

async fn generate(
    state: &ProxyState,
    trace_id: &str,
    body: Body,
) -> Result<GenerateResponse, GatewayError> {
    let bytes = read_body(body).await?;
    let req: GenerateRequest = serde_json::from_slice(&bytes)
        .map_err(|err| GatewayError::bad_request(err.to_string()))?;
    state.gateway.generate(trace_id, req).await
}

// ---- Claude ----

async fn claude_messages_passthrough(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let started_at = Instant::now();
    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        route = "/v1/messages"
    );

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let response = match read_body(body).await {
        Ok(bytes) => match state.gateway.forward(&trace_id, bytes, content_type).await {
            Ok(resp) => to_axum_response(resp),
            Err(err) => error_response(&err),
        },
        Err(err) => error_response(&err),
    };
    finish(response, &trace_id, "/v1/messages", started_at)
}

// ---- Helpers ----

async fn read_body(body: Body) -> Result<bytes::Bytes, GatewayError> {
    to_bytes(body, MAX_INBOUND_BODY_BYTES)
        .await
        .map_err(|err| GatewayError::bad_request(format!("error reading request body: {err}")))
}

fn error_response(err: &GatewayError) -> Response {
    (err.status(), err.to_string()).into_response()
}

fn finish(
    mut response: Response,
    trace_id: &str,
    route: &'static str,
    started_at: Instant,
) -> Response {
    if let Ok(value) = HeaderValue::from_str(trace_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    let status = response.status().as_u16();
    let elapsed_ms = started_at.elapsed().as_millis();
    if response.status().is_success() {
        info!(event = "downstream_responded", trace_id = %trace_id, route, status, elapsed_ms);
    } else {
        warn!(event = "downstream_responded", trace_id = %trace_id, route, status, elapsed_ms);
    }
    response
}

fn to_axum_response(resp: UpstreamHttpResponse) -> Response {
    let mut builder = Response::builder().status(resp.status);
    if let Some(h) = builder.headers_mut() {
        for (name, value) in resp.headers {
            // Hyper sets framing itself for the buffered body.
            if is_hop_by_hop_or_framing_header(name.as_str()) {
                continue;
            }
            h.append(name, value);
        }
    }

    builder.body(Body::from(resp.body)).unwrap_or_else(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, "response_build_failed").into_response()
    })
}

fn is_hop_by_hop_or_framing_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("content-length")
        || name.eq_ignore_ascii_case("transfer-encoding")
        || name.eq_ignore_ascii_case("connection")
        || name.eq_ignore_ascii_case("keep-alive")
        || name.eq_ignore_ascii_case("proxy-authenticate")
        || name.eq_ignore_ascii_case("proxy-authorization")
        || name.eq_ignore_ascii_case("te")
        || name.eq_ignore_ascii_case("trailer")
        || name.eq_ignore_ascii_case("upgrade")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderName;

    #[test]
    fn passthrough_keeps_duplicates_and_drops_framing() {
        let resp = UpstreamHttpResponse {
            status: StatusCode::from_u16(529).unwrap(),
            headers: vec![
                (header::CONTENT_LENGTH, HeaderValue::from_static("2")),
                (header::TRANSFER_ENCODING, HeaderValue::from_static("chunked")),
                (HeaderName::from_static("x-dup"), HeaderValue::from_static("1")),
                (HeaderName::from_static("x-dup"), HeaderValue::from_static("2")),
            ],
            body: bytes::Bytes::from_static(b"{}"),
        };
        let out = to_axum_response(resp);

        assert_eq!(out.status().as_u16(), 529);
        assert!(out.headers().get(header::TRANSFER_ENCODING).is_none());
        let dup: Vec<_> = out.headers().get_all("x-dup").iter().collect();
        assert_eq!(dup, ["1", "2"]);
    }

    #[test]
    fn errors_render_their_kind() {
        let out = error_response(&GatewayError::bad_request("expected value"));
        assert_eq!(out.status(), StatusCode::BAD_REQUEST);
    }
}
