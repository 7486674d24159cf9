//! Application state for Axum handlers
//!
//! Contains the shared services initialized once at startup and passed to
//! all handlers.

use patchwright_queue::JobQueue;
use patchwright_webhook::WebhookDispatcher;
use std::sync::Arc;

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// The durable job queues (indexing + generation)
    pub queue: Arc<dyn JobQueue>,
    /// Webhook verification + dispatch
    pub dispatcher: Arc<WebhookDispatcher>,
    /// HMAC secret for webhook signature verification
    pub webhook_secret: String,
}

impl AppState {
    /// Create new application state with all services
    #[must_use]
    pub fn new(
        queue: Arc<dyn JobQueue>,
        dispatcher: Arc<WebhookDispatcher>,
        webhook_secret: String,
    ) -> Self {
        Self {
            queue,
            dispatcher,
            webhook_secret,
        }
    }
}
