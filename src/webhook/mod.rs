//! Webhook forwarding of fetched log payloads.
//!
//! This module provides:
//! - Best-effort delivery to a downstream URL ([`WebhookForwarder`])
//! - The per-delivery error type, only ever logged ([`WebhookError`])

mod error;
mod forwarder;


pub use error::WebhookError;
pub use forwarder::WebhookForwarder;
