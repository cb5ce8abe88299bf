//! Per-request policy Check and telemetry Report for HTTP proxy filters.
//!
//! This crate is the control path between an HTTP filter and a remote policy
//! and telemetry backend. It handles:
//! - Resolution of the service config that applies to a route
//! - Merging of configured, request-derived and peer-forwarded attributes
//! - Quota requirements attached to Check
//! - Attributes forwarded to the next hop
//!
//! It does NOT contain:
//! - The proxy's HTTP objects (see [`CheckData`], [`ReportData`], [`HeaderUpdate`])
//! - The transport, its batching or its Check result cache (see [`MixerClient`])
//! - Admission decisions on a failed Check
//!
//! # Example
//!
//! ```ignore
//! use mixer_control::{Controller, HttpClientConfig, PerRouteConfig};
//!
//! let controller = Controller::builder(config, client)
//!     .outbound(false)
//!     .local_attributes(local)
//!     .build();
//!
//! // One handler per request.
//! let route = PerRouteConfig::for_destination("reviews");
//! let mut handler = controller.create_request_handler(&route);
//! let status = handler.check_async(&request, &mut headers, None).await;
//! if status.is_ok() {
//!     // forward the request, then once the response is done:
//!     handler.report(&request, &response);
//! }
//! ```

pub mod attribute;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod data;
pub mod error;
pub mod handler;

mod api_spec;
mod builder;

pub use attribute::{AttributeBag, MergePolicy, Value};
pub use cache::RouteConfigCache;
pub use client::{
    CancelFunc, CheckContext, CheckDoneFunc, CheckResponseInfo, MixerClient, QuotaRequirement,
    ReportContext, RouteDirective, TransportCheckFunc, TransportDoneFunc,
};
pub use config::{
    HttpClientConfig, LocalAttributes, NetworkFailPolicy, PerRouteConfig, ServiceConfig,
};
pub use context::{ClientContext, ServiceContext};
pub use controller::{Controller, ControllerBuilder};
pub use data::{CheckData, GrpcStatus, HeaderUpdate, ReportData, ReportInfo};
pub use error::{Error, Result};
pub use handler::{CheckState, PendingCheck, ReportState, RequestHandler};
