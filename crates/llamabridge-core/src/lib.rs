pub mod bootstrap;
pub mod error;
pub mod gateway;
pub mod headers;
pub mod provider;
pub mod upstream_client;

pub use error::{GatewayError, TransportErrorKind};
pub use gateway::Gateway;
pub use headers::{Headers, header_get};
pub use provider::ClaudeClient;
pub use upstream_client::{
    UpstreamClient, UpstreamClientConfig, UpstreamHttpRequest, UpstreamHttpResponse,
    WreqUpstreamClient,
};
