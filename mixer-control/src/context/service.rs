use std::sync::Arc;

use bytes::Bytes;

use crate::api_spec::ApiSpecMatcher;
use crate::attribute::{AttributeBag, MergePolicy};
use crate::client::QuotaRequirement;
use crate::config::{HttpClientConfig, LocalAttributes, ServiceConfig};

/// One service config resolved against the client config.
///
/// Everything that does not depend on the request is merged here once, when
/// the config is registered, and shared by every handler created for it.
#[derive(Debug)]
pub struct ServiceContext {
    config: Option<Arc<ServiceConfig>>,
    static_attributes: AttributeBag,
    local_attributes: AttributeBag,
    forward_attributes: AttributeBag,
    serialized_forward: Option<Bytes>,
    quota_requirements: Vec<QuotaRequirement>,
    api_spec: ApiSpecMatcher,
    ignore_forwarded: bool,
}

impl ServiceContext {
    pub(crate) fn new(
        client: &HttpClientConfig,
        local: &LocalAttributes,
        outbound: bool,
        config: Option<ServiceConfig>,
    ) -> Self {
        let ignore_forwarded = client.ignore_forwarded_attributes
            || config
                .as_ref()
                .is_some_and(|c| c.ignore_forwarded_attributes);

        let mut static_attributes = client.mixer_attributes.clone();
        let mut forward_attributes = client.forward_attributes.clone();
        let mut quota_requirements = Vec::new();
        let mut api_spec = ApiSpecMatcher::default();

        if let Some(config) = &config {
            static_attributes.merge(&config.mixer_attributes, MergePolicy::Override);
            forward_attributes.merge(&config.forward_attributes, MergePolicy::Override);
            quota_requirements = config
                .quota_spec
                .rules
                .iter()
                .flat_map(|rule| &rule.quotas)
                .map(|q| QuotaRequirement::new(q.quota.as_str(), q.charge))
                .collect();
            api_spec = ApiSpecMatcher::new(&config.http_api_spec);
        }

        if outbound && !ignore_forwarded {
            forward_attributes.merge(&local.forward, MergePolicy::Override);
        }

        let local_attributes = if outbound {
            local.outbound.clone()
        } else {
            local.inbound.clone()
        };

        let serialized_forward =
            (!forward_attributes.is_empty()).then(|| forward_attributes.serialize());

        Self {
            config: config.map(Arc::new),
            static_attributes,
            local_attributes,
            forward_attributes,
            serialized_forward,
            quota_requirements,
            api_spec,
            ignore_forwarded,
        }
    }

    /// The resolved service config; `None` when nothing matched.
    pub fn config(&self) -> Option<&Arc<ServiceConfig>> {
        self.config.as_ref()
    }

    /// Whether the transport Check is called.
    pub fn check_enabled(&self) -> bool {
        self.config.as_ref().is_some_and(|c| !c.disable_check_calls)
    }

    /// Whether the transport Report is called.
    pub fn report_enabled(&self) -> bool {
        self.config
            .as_ref()
            .is_some_and(|c| !c.disable_report_calls)
    }

    /// Whether attributes forwarded by the peer are ignored.
    pub fn ignore_forwarded_attributes(&self) -> bool {
        self.ignore_forwarded
    }

    /// Global then service `mixer_attributes`.
    pub fn static_attributes(&self) -> &AttributeBag {
        &self.static_attributes
    }

    /// The local preset for this context's direction.
    pub fn local_attributes(&self) -> &AttributeBag {
        &self.local_attributes
    }

    /// Attributes forwarded to the next hop.
    pub fn forward_attributes(&self) -> &AttributeBag {
        &self.forward_attributes
    }

    pub(crate) fn serialized_forward_attributes(&self) -> Option<&Bytes> {
        self.serialized_forward.as_ref()
    }

    /// Quotas charged on every Check.
    pub fn quota_requirements(&self) -> &[QuotaRequirement] {
        &self.quota_requirements
    }

    pub(crate) fn api_spec(&self) -> &ApiSpecMatcher {
        &self.api_spec
    }
}
