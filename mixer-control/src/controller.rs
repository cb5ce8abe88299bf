//! Entry point used by the HTTP filter.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cache::DEFAULT_CAPACITY;
use crate::client::MixerClient;
use crate::config::{HttpClientConfig, LocalAttributes, PerRouteConfig, ServiceConfig};
use crate::context::ClientContext;
use crate::handler::RequestHandler;

/// Builder for [`Controller`].
pub struct ControllerBuilder {
    config: HttpClientConfig,
    client: Arc<dyn MixerClient>,
    outbound: bool,
    local_attributes: LocalAttributes,
    cache_size: usize,
}

impl ControllerBuilder {
    /// Create a new builder with the given configuration and transport.
    pub fn new(config: HttpClientConfig, client: Arc<dyn MixerClient>) -> Self {
        Self {
            config,
            client,
            outbound: false,
            local_attributes: LocalAttributes::default(),
            cache_size: DEFAULT_CAPACITY,
        }
    }

    /// Marks the controller as proxying outbound traffic.
    ///
    /// Outbound controllers apply the outbound local preset and forward the
    /// `forward` preset to the peer; inbound ones apply the inbound preset.
    pub fn outbound(mut self, outbound: bool) -> Self {
        self.outbound = outbound;
        self
    }

    /// Sets the local attribute presets.
    pub fn local_attributes(mut self, local_attributes: LocalAttributes) -> Self {
        self.local_attributes = local_attributes;
        self
    }

    /// Sets how many per-route service configs are cached. Defaults to 1000.
    pub fn service_config_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    /// Build the controller.
    pub fn build(self) -> Controller {
        debug!(
            outbound = self.outbound,
            services = self.config.service_configs.len(),
            cache_size = self.cache_size,
            "building mixer controller"
        );
        let context = ClientContext::new(
            self.config,
            self.client,
            self.local_attributes,
            self.outbound,
            self.cache_size,
        );
        Controller {
            context: Arc::new(context),
        }
    }
}

impl fmt::Debug for ControllerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerBuilder")
            .field("config", &self.config)
            .field("outbound", &self.outbound)
            .field("local_attributes", &self.local_attributes)
            .field("cache_size", &self.cache_size)
            .finish_non_exhaustive()
    }
}

/// Creates request handlers and owns the per-route config cache.
///
/// Cloning creates a new reference to the same shared state. Handlers keep
/// that state alive after the last `Controller` is dropped.
#[derive(Clone, Debug)]
pub struct Controller {
    context: Arc<ClientContext>,
}

impl Controller {
    /// Create a new builder with the given configuration and transport.
    pub fn builder(config: HttpClientConfig, client: Arc<dyn MixerClient>) -> ControllerBuilder {
        ControllerBuilder::new(config, client)
    }

    /// Registers a per-route service config, possibly evicting the least
    /// recently used one.
    pub fn add_service_config(&self, id: impl Into<String>, config: ServiceConfig) {
        self.context.add_service_config(id, config);
    }

    /// Returns true if a per-route service config is cached under `id`.
    ///
    /// Counts as a use of the entry.
    pub fn lookup_service_config(&self, id: &str) -> bool {
        self.context.lookup_service_config(id)
    }

    /// Creates the handler for one request on `route`.
    pub fn create_request_handler(&self, route: &PerRouteConfig) -> RequestHandler {
        let service = self.context.resolve(route);
        RequestHandler::new(Arc::clone(&self.context), service)
    }

    /// The shared client context.
    pub fn client_context(&self) -> &Arc<ClientContext> {
        &self.context
    }
}
