//! Capability interfaces through which the proxy exposes request facts.
//!
//! The control path never sees the proxy's HTTP objects. It reads request
//! facts through [`CheckData`], response facts through [`ReportData`], and
//! writes the attributes forwarded to the next hop through [`HeaderUpdate`].
//! Only the first few methods of each trait are required; the rest default
//! to "not available".

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;

/// Read-only request facts used for Check.
pub trait CheckData {
    /// Address and port of the downstream peer.
    fn source_ip_port(&self) -> Option<(IpAddr, u16)>;

    /// Authenticated principal of the peer (`peer == true`) or of the local
    /// workload (`peer == false`).
    fn principal(&self, peer: bool) -> Option<String>;

    /// Serialized attributes forwarded by the downstream proxy, if the
    /// request carries them.
    fn extract_istio_attributes(&self) -> Option<Bytes>;

    /// Request headers.
    fn request_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Request path including the query string.
    fn path(&self) -> Option<String> {
        None
    }

    /// Request method.
    fn method(&self) -> Option<String> {
        None
    }

    /// Request host (authority).
    fn host(&self) -> Option<String> {
        None
    }

    /// Request scheme.
    fn scheme(&self) -> Option<String> {
        None
    }

    /// Whether the downstream connection uses mutual TLS.
    fn is_mutual_tls(&self) -> bool {
        false
    }

    /// SNI requested by the downstream peer.
    fn requested_server_name(&self) -> Option<String> {
        None
    }
}

/// Read-only response and telemetry facts used for Report.
pub trait ReportData {
    /// Response headers.
    fn response_headers(&self) -> HeaderMap;

    /// Sizes, timing and response code of the finished request.
    fn report_info(&self) -> ReportInfo;

    /// Per-filter dynamic state recorded while handling the request.
    fn dynamic_filter_state(&self) -> HashMap<String, prost_types::Struct> {
        HashMap::new()
    }

    /// Address and port of the upstream host.
    fn destination_ip_port(&self) -> Option<(IpAddr, u16)> {
        None
    }

    /// Unique id of the upstream workload.
    fn destination_uid(&self) -> Option<String> {
        None
    }

    /// gRPC status of the response, for gRPC traffic.
    fn grpc_status(&self) -> Option<GrpcStatus> {
        None
    }
}

/// Sink for attributes forwarded to the next hop.
pub trait HeaderUpdate {
    /// Attaches serialized forward attributes to the outgoing request.
    fn add_istio_attributes(&mut self, serialized: Bytes);

    /// Strips forward attributes received from the downstream peer.
    fn remove_istio_attributes(&mut self) {}
}

/// Telemetry about a finished request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportInfo {
    /// Request body bytes.
    pub request_body_size: u64,
    /// Request bytes including headers.
    pub request_total_size: u64,
    /// Response body bytes.
    pub response_body_size: u64,
    /// Response bytes including headers.
    pub response_total_size: u64,
    /// Time from the first request byte to the last response byte.
    pub duration: Duration,
    /// HTTP response code, if a response was produced.
    pub response_code: Option<u16>,
}

/// gRPC status carried by a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrpcStatus {
    /// Numeric or textual `grpc-status`.
    pub status: String,
    /// `grpc-message`.
    pub message: String,
}
