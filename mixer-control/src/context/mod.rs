//! State shared by every request handler of one controller.

mod service;

pub use service::ServiceContext;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cache::RouteConfigCache;
use crate::client::MixerClient;
use crate::config::{
    HttpClientConfig, LocalAttributes, NetworkFailPolicy, PerRouteConfig, ServiceConfig,
};

/// Client-wide configuration, the transport and the route config cache.
///
/// Everything except the cache is read-only after construction.
pub struct ClientContext {
    client: Arc<dyn MixerClient>,
    config: HttpClientConfig,
    local_attributes: LocalAttributes,
    outbound: bool,
    static_services: HashMap<String, Arc<ServiceContext>>,
    default_service: Arc<ServiceContext>,
    route_cache: RouteConfigCache<Arc<ServiceContext>>,
}

impl ClientContext {
    pub(crate) fn new(
        config: HttpClientConfig,
        client: Arc<dyn MixerClient>,
        local_attributes: LocalAttributes,
        outbound: bool,
        cache_size: usize,
    ) -> Self {
        let static_services: HashMap<_, _> = config
            .service_configs
            .iter()
            .map(|(name, service)| {
                let service = Some(service.clone());
                let ctx = ServiceContext::new(&config, &local_attributes, outbound, service);
                (name.clone(), Arc::new(ctx))
            })
            .collect();

        let default_service = match static_services.get(&config.default_destination_service) {
            Some(ctx) => Arc::clone(ctx),
            None => {
                let ctx = ServiceContext::new(&config, &local_attributes, outbound, None);
                Arc::new(ctx)
            }
        };

        Self {
            client,
            config,
            local_attributes,
            outbound,
            static_services,
            default_service,
            route_cache: RouteConfigCache::new(cache_size),
        }
    }

    /// The transport.
    pub fn client(&self) -> &Arc<dyn MixerClient> {
        &self.client
    }

    /// The client-wide configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// The local attribute presets.
    pub fn local_attributes(&self) -> &LocalAttributes {
        &self.local_attributes
    }

    /// Whether this context proxies outbound traffic.
    pub fn is_outbound(&self) -> bool {
        self.outbound
    }

    /// What the filter layer should do with a failed Check.
    pub fn network_fail_policy(&self) -> NetworkFailPolicy {
        self.config.transport.network_fail_policy
    }

    /// Registers `config` under a route id, possibly evicting an older one.
    pub fn add_service_config(&self, id: impl Into<String>, config: ServiceConfig) {
        let ctx = ServiceContext::new(
            &self.config,
            &self.local_attributes,
            self.outbound,
            Some(config),
        );
        self.route_cache.insert(id, Arc::new(ctx));
    }

    /// Returns true if a config is cached under `id`.
    pub fn lookup_service_config(&self, id: &str) -> bool {
        self.route_cache.lookup(id).is_some()
    }

    /// Number of per-route service configs currently cached.
    pub fn cached_service_configs(&self) -> usize {
        self.route_cache.len()
    }

    /// The config cached under `id`.
    pub fn service_config(&self, id: &str) -> Option<Arc<ServiceConfig>> {
        self.route_cache
            .lookup(id)
            .and_then(|ctx| ctx.config().cloned())
    }

    /// Resolves the service context for a route.
    ///
    /// Tries the route id in the cache, then the destination service, then
    /// the default destination service. Never fails.
    pub fn resolve(&self, route: &PerRouteConfig) -> Arc<ServiceContext> {
        if let Some(id) = &route.service_config_id {
            if let Some(ctx) = self.route_cache.lookup(id) {
                debug!(route = %id, "resolved service config by route id");
                return ctx;
            }
        }

        if let Some(service) = &route.destination_service {
            if let Some(ctx) = self.static_services.get(service) {
                debug!(%service, "resolved service config by destination service");
                return Arc::clone(ctx);
            }
        }

        if self.default_service.config().is_some() {
            debug!(
                service = %self.config.default_destination_service,
                "resolved default destination service"
            );
        } else {
            debug!("no service config resolved, check and report disabled");
        }
        Arc::clone(&self.default_service)
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("outbound", &self.outbound)
            .field("static_services", &self.static_services.len())
            .field("route_cache", &self.route_cache)
            .finish_non_exhaustive()
    }
}
