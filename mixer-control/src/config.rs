//! Parsed configuration consumed by the control path.
//!
//! These are plain data types. The filter layer decodes them from its own
//! configuration source (they implement `serde::Deserialize` with every
//! field optional) and hands them to the [`Controller`](crate::Controller).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeBag;

/// Top-level configuration of the HTTP client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Attributes sent with every Check and Report.
    pub mixer_attributes: AttributeBag,

    /// Attributes forwarded to the peer proxy on every request.
    pub forward_attributes: AttributeBag,

    /// Static per destination-service configuration, keyed by service name.
    pub service_configs: HashMap<String, ServiceConfig>,

    /// Service used when a request does not resolve to any other config.
    pub default_destination_service: String,

    /// Ignore attributes forwarded by the downstream peer for every service.
    pub ignore_forwarded_attributes: bool,

    /// Settings passed through to the transport collaborator.
    pub transport: TransportConfig,
}

impl HttpClientConfig {
    /// Registers a static service config under `name`.
    #[must_use]
    pub fn with_service_config(mut self, name: impl Into<String>, config: ServiceConfig) -> Self {
        self.service_configs.insert(name.into(), config);
        self
    }
}

/// Transport related settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// What the filter should do when the policy backend is unreachable.
    pub network_fail_policy: NetworkFailPolicy,
}

/// Admission behavior when a Check fails at the transport level.
///
/// The control path never applies this itself; it is exposed for the
/// filter layer through [`ClientContext::network_fail_policy`].
///
/// [`ClientContext::network_fail_policy`]: crate::context::ClientContext::network_fail_policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFailPolicy {
    /// Let the request through.
    #[default]
    FailOpen,
    /// Reject the request.
    FailClose,
}

/// Configuration scoped to one destination service or one route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Skip the Check call for requests using this config.
    pub disable_check_calls: bool,

    /// Skip the Report call for requests using this config.
    pub disable_report_calls: bool,

    /// Extra attributes sent with Check and Report; override the global ones.
    pub mixer_attributes: AttributeBag,

    /// Extra attributes forwarded to the peer; override the global ones.
    pub forward_attributes: AttributeBag,

    /// Quotas charged by every Check.
    pub quota_spec: QuotaSpec,

    /// HTTP API descriptions used to derive `api.*` attributes.
    pub http_api_spec: Vec<ApiSpec>,

    /// Ignore attributes forwarded by the downstream peer for this service.
    pub ignore_forwarded_attributes: bool,
}

/// A set of quota rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaSpec {
    /// Rules whose quotas are all charged.
    pub rules: Vec<QuotaRule>,
}

/// One quota rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaRule {
    /// Quotas charged when the rule applies.
    pub quotas: Vec<Quota>,
}

/// A named quota and the amount one request charges against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quota {
    /// Quota name as known by the backend.
    pub quota: String,
    /// Amount charged.
    pub charge: i64,
}

impl Quota {
    /// Creates a quota entry.
    pub fn new(quota: impl Into<String>, charge: i64) -> Self {
        Self {
            quota: quota.into(),
            charge,
        }
    }
}

/// Description of an HTTP API served by a destination service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSpec {
    /// Attributes added for every request matching one of the patterns.
    pub attributes: AttributeBag,
    /// Operation patterns, tried in order.
    pub patterns: Vec<ApiPattern>,
    /// Where to look for an API key, tried in order.
    pub api_keys: Vec<ApiKey>,
}

/// One operation of an [`ApiSpec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiPattern {
    /// Attributes added when this pattern matches, e.g. `api.operation`.
    pub attributes: AttributeBag,
    /// HTTP method, or `*` for any.
    pub http_method: String,
    /// URI template such as `/shelves/{shelf}/books/*`.
    pub uri_template: Option<String>,
    /// Regular expression matched against the whole path.
    pub regex: Option<String>,
}

/// Location of an API key in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKey {
    /// Query parameter name.
    Query(String),
    /// Header name.
    Header(String),
}

/// Attributes describing the local node, by traffic direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalAttributes {
    /// Added to Check and Report on inbound contexts.
    pub inbound: AttributeBag,
    /// Added to Check and Report on outbound contexts.
    pub outbound: AttributeBag,
    /// Forwarded to the peer on outbound contexts.
    pub forward: AttributeBag,
}

/// Routing decision for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerRouteConfig {
    /// Destination service name, resolved against the static service configs.
    pub destination_service: Option<String>,
    /// Opaque id of a service config registered at runtime.
    pub service_config_id: Option<String>,
}

impl PerRouteConfig {
    /// A route resolved by destination service name.
    pub fn for_destination(service: impl Into<String>) -> Self {
        Self {
            destination_service: Some(service.into()),
            service_config_id: None,
        }
    }

    /// A route resolved by a registered service config id.
    pub fn for_service_config_id(id: impl Into<String>) -> Self {
        Self {
            destination_service: None,
            service_config_id: Some(id.into()),
        }
    }
}
