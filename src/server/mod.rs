//! HTTP server for the automation engine.
//!
//! This module implements the HTTP server that:
//! - Answers Meta's webhook subscription handshake
//! - Accepts webhook deliveries and runs them through the automation pipeline
//! - Exposes the rule administration API the dashboard uses
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `GET /webhook` - Subscription verification (challenge echo)
//! - `POST /webhook` - Accepts comment-event deliveries
//! - `GET /api/v1/rules` - Lists rules
//! - `POST /api/v1/rules` - Creates a rule
//! - `GET /api/v1/rules/{id}` - Fetches one rule
//! - `PUT /api/v1/rules/{id}` - Replaces a rule
//! - `DELETE /api/v1/rules/{id}` - Deletes a rule
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

pub mod health;
pub mod rules;
pub mod webhook;

pub use health::health_handler;
pub use rules::RuleApiError;
pub use webhook::{delivery_handler, subscription_handler, WebhookError};

use crate::automation::DedupeTracker;
use crate::instagram::PlatformClient;
use crate::rules::RuleStore;

/// Shared application state.
///
/// Passed to all handlers via axum's `State` extractor. Generic over the
/// platform client so the router can be driven by a recording double in
/// tests; production uses [`crate::instagram::GraphClient`].
pub struct AppState<C> {
    inner: Arc<AppStateInner<C>>,
}

// Manual impl: the derive would require `C: Clone`, but the client is
// shared behind the Arc, never cloned itself.
impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<C> {
    /// Rule collection. Webhook handling takes snapshots; the admin API
    /// mutates.
    store: RuleStore,

    /// Outbound Graph API client.
    client: C,

    /// Token Meta must echo during the subscription handshake.
    verify_token: String,

    /// App secret for delivery signature verification; `None` disables it.
    app_secret: Option<Vec<u8>>,

    /// Redelivery guard; `None` means duplicates are processed again.
    dedupe: Option<DedupeTracker>,
}

impl<C> AppState<C> {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `store` - Opened rule store
    /// * `client` - Platform client for replies and DMs
    /// * `verify_token` - Subscription handshake token
    /// * `app_secret` - Delivery signature secret, if signature auth is on
    /// * `dedupe` - Redelivery guard, if deduplication is on
    pub fn new(
        store: RuleStore,
        client: C,
        verify_token: impl Into<String>,
        app_secret: Option<Vec<u8>>,
        dedupe: Option<DedupeTracker>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                store,
                client,
                verify_token: verify_token.into(),
                app_secret,
                dedupe,
            }),
        }
    }

    /// Returns the rule store.
    pub fn store(&self) -> &RuleStore {
        &self.inner.store
    }

    /// Returns the platform client.
    pub fn client(&self) -> &C {
        &self.inner.client
    }

    /// Returns the subscription verify token.
    pub fn verify_token(&self) -> &str {
        &self.inner.verify_token
    }

    /// Returns the delivery signature secret, if configured.
    pub fn app_secret(&self) -> Option<&[u8]> {
        self.inner.app_secret.as_deref()
    }

    /// Returns the redelivery guard, if configured.
    pub fn dedupe(&self) -> Option<&DedupeTracker> {
        self.inner.dedupe.as_ref()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<C>(app_state: AppState<C>) -> axum::Router
where
    C: PlatformClient + Send + Sync + 'static,
{
    use axum::routing::get;
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .route(
            "/webhook",
            get(subscription_handler::<C>).post(delivery_handler::<C>),
        )
        .route(
            "/api/v1/rules",
            get(rules::list_rules::<C>).post(rules::create_rule::<C>),
        )
        .route(
            "/api/v1/rules/{id}",
            get(rules::get_rule::<C>)
                .put(rules::update_rule::<C>)
                .delete(rules::delete_rule::<C>),
        )
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
