//! Wire types for both sides of the gateway.
//!
//! `ollama` is the surface exposed to clients, `claude` is the provider's
//! Messages API. Nothing here performs IO.

pub mod claude;
pub mod ollama;
