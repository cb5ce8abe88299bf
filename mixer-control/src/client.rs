//! Abstraction over the policy and telemetry backend.
//!
//! The control path hands fully merged attribute bags to a [`MixerClient`]
//! and receives the Check outcome through a one-shot callback. Connection
//! management, batching, caching of Check results and retries all live
//! behind this trait.

use std::sync::Arc;

use bytes::Bytes;
use tonic::{Code, Status};

use crate::attribute::AttributeBag;

/// One-shot completion for a Check.
///
/// Invoked exactly once, from whatever thread the transport chooses.
pub type CheckDoneFunc = Box<dyn FnOnce(CheckResponseInfo) + Send + 'static>;

/// Cancels an in-flight Check. Forwarded untouched from the transport.
pub type CancelFunc = Box<dyn FnOnce() + Send + 'static>;

/// Completion of a raw transport call: the encoded response or a failure.
pub type TransportDoneFunc = Box<dyn FnOnce(Result<Bytes, Status>) + Send + 'static>;

/// Per-request override of how an encoded Check request is sent, e.g.
/// through the proxy's own async HTTP client.
///
/// The control path forwards it to [`MixerClient::check`] without calling it.
pub type TransportCheckFunc =
    Arc<dyn Fn(Bytes, TransportDoneFunc) -> Option<CancelFunc> + Send + Sync + 'static>;

/// The remote policy and telemetry backend.
///
/// Implementations must not block: [`check`](Self::check) returns once the
/// call is issued and completes through `on_done`; [`report`](Self::report)
/// is fire-and-forget.
pub trait MixerClient: Send + Sync + 'static {
    /// Issues a Check for `context`.
    ///
    /// `on_done` must be invoked exactly once, with a non-OK status on
    /// transport or backend failure.
    fn check(
        &self,
        context: Arc<CheckContext>,
        transport: Option<TransportCheckFunc>,
        on_done: CheckDoneFunc,
    ) -> Option<CancelFunc>;

    /// Issues a Report for `context`. Failures are not surfaced.
    fn report(&self, context: Arc<ReportContext>);
}

/// A quota to charge as part of a Check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuotaRequirement {
    /// Quota name.
    pub quota: String,
    /// Amount to charge.
    pub charge: i64,
}

impl QuotaRequirement {
    /// Creates a requirement.
    pub fn new(quota: impl Into<String>, charge: i64) -> Self {
        Self {
            quota: quota.into(),
            charge,
        }
    }
}

/// Everything the backend needs for one Check.
#[derive(Debug, Clone)]
pub struct CheckContext {
    attributes: AttributeBag,
    quota_requirements: Vec<QuotaRequirement>,
}

impl CheckContext {
    /// Creates a Check context.
    pub fn new(attributes: AttributeBag, quota_requirements: Vec<QuotaRequirement>) -> Self {
        Self {
            attributes,
            quota_requirements,
        }
    }

    /// The merged request attributes.
    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    /// Quotas to charge with this Check.
    pub fn quota_requirements(&self) -> &[QuotaRequirement] {
        &self.quota_requirements
    }
}

/// Everything the backend needs for one Report.
#[derive(Debug, Clone)]
pub struct ReportContext {
    attributes: AttributeBag,
}

impl ReportContext {
    /// Creates a Report context.
    pub fn new(attributes: AttributeBag) -> Self {
        Self { attributes }
    }

    /// The merged request and response attributes.
    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }
}

/// Outcome of a Check.
#[derive(Debug, Clone)]
pub struct CheckResponseInfo {
    status: Status,
    /// Routing changes requested by the backend.
    pub route_directive: Option<RouteDirective>,
    /// The Check result came from the client's cache.
    pub check_cache_hit: bool,
    /// The quota result came from the client's cache.
    pub quota_cache_hit: bool,
}

impl CheckResponseInfo {
    /// An allowed Check with no backend involvement.
    pub fn ok() -> Self {
        Self::from_status(Status::new(Code::Ok, ""))
    }

    /// A Check outcome with the given status.
    pub fn from_status(status: Status) -> Self {
        Self {
            status,
            route_directive: None,
            check_cache_hit: false,
            quota_cache_hit: false,
        }
    }

    /// The Check status; [`Code::Ok`] means the request may proceed.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Returns true if the status is OK.
    pub fn is_ok(&self) -> bool {
        self.status.code() == Code::Ok
    }
}

/// Request and response changes decided by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDirective {
    /// Operations on request headers.
    pub request_header_operations: Vec<HeaderOperation>,
    /// Operations on response headers.
    pub response_header_operations: Vec<HeaderOperation>,
    /// Respond directly with this code instead of routing upstream.
    pub direct_response_code: Option<u16>,
    /// Body of the direct response.
    pub direct_response_body: String,
}

/// One header mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOperation {
    /// Header name.
    pub name: String,
    /// Header value; ignored for [`HeaderOperationKind::Remove`].
    pub value: String,
    /// What to do.
    pub operation: HeaderOperationKind,
}

/// Kind of header mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderOperationKind {
    /// Replace any existing values.
    Replace,
    /// Remove the header.
    Remove,
    /// Append a value.
    Append,
}
