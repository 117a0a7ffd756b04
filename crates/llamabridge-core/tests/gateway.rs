use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use llamabridge_common::Settings;
use llamabridge_core::{
    Gateway, GatewayError, TransportErrorKind, UpstreamClient, UpstreamHttpRequest,
    UpstreamHttpResponse, header_get,
};
use llamabridge_protocol::ollama::{GenerateOptions, GenerateRequest};
use llamabridge_transform::ModelTable;

const ENDPOINT: &str = "http://provider.test/v1/messages";

struct StubUpstream {
    reply: Result<UpstreamHttpResponse, GatewayError>,
    seen: Mutex<Vec<UpstreamHttpRequest>>,
}

impl StubUpstream {
    fn new(reply: Result<UpstreamHttpResponse, GatewayError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn json(status: u16, body: &str) -> Arc<Self> {
        Self::new(Ok(UpstreamHttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: vec![
                (
                    HeaderName::from_static("content-type"),
                    HeaderValue::from_static("application/json"),
                ),
                (
                    HeaderName::from_static("request-id"),
                    HeaderValue::from_static("req_1"),
                ),
                (
                    HeaderName::from_static("x-trace"),
                    HeaderValue::from_static("a"),
                ),
                (
                    HeaderName::from_static("x-trace"),
                    HeaderValue::from_static("b"),
                ),
            ],
            body: Bytes::from(body.to_string()),
        }))
    }

    fn seen(&self) -> Vec<UpstreamHttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl UpstreamClient for StubUpstream {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, GatewayError>> + Send + 'a>>
    {
        self.seen.lock().unwrap().push(req);
        let reply = self.reply.clone();
        Box::pin(async move { reply })
    }
}

fn settings() -> Settings {
    Settings {
        port: 0,
        api_key: "sk-test".to_string(),
        api_version: "2023-06-01".to_string(),
        api_endpoint: ENDPOINT.to_string(),
        system_prompt: "You are Claude, an AI assistant by Anthropic.".to_string(),
        default_model: "claude-3-5-sonnet-20240620".to_string(),
        request_timeout: Duration::from_secs(5),
    }
}

fn gateway(upstream: Arc<StubUpstream>) -> Gateway {
    let settings = Arc::new(settings());
    let models = Arc::new(ModelTable::builtin(settings.default_model.clone()));
    Gateway::new(settings, models, upstream)
}

fn haiku_request() -> GenerateRequest {
    GenerateRequest {
        model: "Claude-3-Haiku".to_string(),
        prompt: "hi".to_string(),
        options: GenerateOptions {
            temperature: 0.7,
            num_predict: 50,
            ..GenerateOptions::default()
        },
        ..GenerateRequest::default()
    }
}

const HELLO: &str = r#"{"id":"x","type":"message","role":"assistant","content":[{"type":"text","text":"hello"}],"stop_reason":"end_turn"}"#;

#[tokio::test]
async fn generate_round_trip() {
    let upstream = StubUpstream::json(200, HELLO);
    let gw = gateway(upstream.clone());

    let out = gw.generate("t1", haiku_request()).await.unwrap();
    assert_eq!(out.model, "Claude-3-Haiku");
    assert_eq!(out.response, "hello");
    assert!(out.done);

    let seen = upstream.seen();
    assert_eq!(seen.len(), 1);
    let req = &seen[0];
    assert_eq!(req.url, ENDPOINT);
    assert_eq!(header_get(&req.headers, "content-type"), Some("application/json"));
    assert_eq!(header_get(&req.headers, "x-api-key"), Some("sk-test"));
    assert_eq!(header_get(&req.headers, "anthropic-version"), Some("2023-06-01"));

    let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(body["model"], "claude-3-haiku-20240307");
    assert_eq!(body["max_tokens"], 50);
    assert_eq!(body["system"], "You are Claude, an AI assistant by Anthropic.");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"][0]["type"], "text");
    assert_eq!(body["messages"][0]["content"][0]["text"], "hi");
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert!(body.get("top_p").is_none());
    assert!(body.get("top_k").is_none());
}

#[tokio::test]
async fn provider_status_is_reported_with_body() {
    let overloaded = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
    let gw = gateway(StubUpstream::json(529, overloaded));

    let err = gw.generate("t2", haiku_request()).await.unwrap_err();
    match &err {
        GatewayError::Provider { status, body } => {
            assert_eq!(status.as_u16(), 529);
            assert_eq!(body, overloaded);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    assert!(err.to_string().contains("Overloaded"));
}

#[tokio::test]
async fn unexpected_success_body_is_decode_error() {
    let gw = gateway(StubUpstream::json(200, r#"{"unexpected":true}"#));
    let err = gw.generate("t3", haiku_request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn transport_failure_is_surfaced() {
    let gw = gateway(StubUpstream::new(Err(GatewayError::Transport {
        kind: TransportErrorKind::Timeout,
        message: "operation timed out".to_string(),
    })));
    let err = gw.generate("t4", haiku_request()).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn forward_is_verbatim_both_ways() {
    let overloaded = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
    let upstream = StubUpstream::json(529, overloaded);
    let gw = gateway(upstream.clone());

    let inbound = Bytes::from_static(br#"{"model":"claude-3-haiku-20240307","max_tokens":1,"messages":[]}"#);
    let resp = gw
        .forward("t5", inbound.clone(), Some("application/json; charset=utf-8"))
        .await
        .unwrap();

    assert_eq!(resp.status.as_u16(), 529);
    assert_eq!(resp.body, Bytes::from(overloaded));
    let traces: Vec<_> = resp
        .headers
        .iter()
        .filter(|(k, _)| k.as_str() == "x-trace")
        .map(|(_, v)| v.to_str().unwrap())
        .collect();
    assert_eq!(traces, ["a", "b"]);

    let seen = upstream.seen();
    assert_eq!(seen[0].body, inbound);
    assert_eq!(
        header_get(&seen[0].headers, "content-type"),
        Some("application/json; charset=utf-8")
    );
    assert_eq!(header_get(&seen[0].headers, "x-api-key"), Some("sk-test"));
    assert_eq!(header_get(&seen[0].headers, "anthropic-version"), Some("2023-06-01"));
}

#[tokio::test]
async fn forward_defaults_content_type() {
    let upstream = StubUpstream::json(200, HELLO);
    let gw = gateway(upstream.clone());
    gw.forward("t6", Bytes::from_static(b"{}"), None).await.unwrap();
    assert_eq!(
        header_get(&upstream.seen()[0].headers, "content-type"),
        Some("application/json")
    );
}
