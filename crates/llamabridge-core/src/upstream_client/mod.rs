use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use wreq::{Client, Method};

use crate::error::{GatewayError, TransportErrorKind};
use crate::headers::Headers;

/// Outbound POST to the provider. The body is sent verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamHttpRequest {
    pub url: String,
    pub headers: Headers,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct UpstreamHttpResponse {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Bytes,
}

/// Raw HTTP transport. Any received response, whatever its status, is `Ok`;
/// only failures to get one are errors, always `GatewayError::Transport`.
///
/// Dropping the returned future aborts the call.
pub trait UpstreamClient: Send + Sync {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, GatewayError>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    pub connect_timeout: Duration,
    /// Bounds the whole call, body included.
    pub request_timeout: Duration,
}

impl UpstreamClientConfig {
    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            connect_timeout: request_timeout.min(Duration::from_secs(10)),
            request_timeout,
        }
    }
}

#[derive(Clone)]
pub struct WreqUpstreamClient {
    client: Client,
}

impl WreqUpstreamClient {
    pub fn new(config: UpstreamClientConfig) -> Result<Self, wreq::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl UpstreamClient for WreqUpstreamClient {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, GatewayError>> + Send + 'a>>
    {
        Box::pin(async move {
            let mut builder = self.client.request(Method::POST, &req.url);
            for (k, v) in &req.headers {
                builder = builder.header(k.as_str(), v.as_bytes());
            }

            let resp = builder.body(req.body).send().await.map_err(map_wreq_error)?;
            convert_response(resp).await
        })
    }
}

async fn convert_response(resp: wreq::Response) -> Result<UpstreamHttpResponse, GatewayError> {
    let status = StatusCode::from_u16(resp.status().as_u16()).map_err(|err| {
        GatewayError::Transport {
            kind: TransportErrorKind::Other,
            message: err.to_string(),
        }
    })?;
    let headers = headers_from_wreq(resp.headers());
    let body = resp.bytes().await.map_err(map_wreq_error)?;
    Ok(UpstreamHttpResponse {
        status,
        headers,
        body,
    })
}

fn headers_from_wreq(map: &wreq::header::HeaderMap) -> Headers {
    let mut out = Vec::with_capacity(map.len());
    for (k, v) in map {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(k.as_str().as_bytes()),
            HeaderValue::from_bytes(v.as_bytes()),
        ) {
            out.push((name, value));
        }
    }
    out
}

fn map_wreq_error(err: wreq::Error) -> GatewayError {
    GatewayError::Transport {
        kind: classify_wreq_error(&err),
        message: err.to_string(),
    }
}

fn classify_wreq_error(err: &wreq::Error) -> TransportErrorKind {
    if err.is_timeout() {
        return TransportErrorKind::Timeout;
    }
    let message = err.to_string().to_ascii_lowercase();
    if err.is_connect() {
        if message.contains("dns") || message.contains("resolve") {
            return TransportErrorKind::Dns;
        }
        if message.contains("tls") || message.contains("ssl") {
            return TransportErrorKind::Tls;
        }
        return TransportErrorKind::Connect;
    }
    if err.is_connection_reset() {
        return TransportErrorKind::Connect;
    }
    if message.contains("tls") || message.contains("ssl") {
        return TransportErrorKind::Tls;
    }
    TransportErrorKind::Other
}
