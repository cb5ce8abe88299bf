//! Extraction of request, response and forwarded attributes.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::SystemTime;

use bytes::Bytes;
use http::HeaderMap;
use http::header::{CONTENT_TYPE, HOST, HeaderValue, USER_AGENT};
use prost_types::value::Kind;
use tracing::{trace, warn};

use crate::api_spec::ApiSpecMatcher;
use crate::attribute::{AttributeBag, names};
use crate::data::{CheckData, ReportData};

/// Name of the RBAC filter whose shadow results are reported.
const RBAC_FILTER_NAME: &str = "envoy.filters.http.rbac";
const RBAC_SHADOW_ENGINE_RESULT: &str = "shadow_engine_result";
const RBAC_SHADOW_EFFECTIVE_POLICY_ID: &str = "shadow_effective_policy_id";

const GRPC_CONTENT_TYPE: &str = "application/grpc";

/// Writes extracted attributes into a bag.
#[derive(Debug)]
pub(crate) struct AttributesBuilder<'a> {
    attributes: &'a mut AttributeBag,
}

impl<'a> AttributesBuilder<'a> {
    pub(crate) fn new(attributes: &'a mut AttributeBag) -> Self {
        Self { attributes }
    }

    /// Adds the request-side facts needed by Check and Report.
    pub(crate) fn extract_check_attributes(&mut self, data: &dyn CheckData) {
        let attrs = &mut *self.attributes;

        if let Some((ip, port)) = data.source_ip_port() {
            attrs.set(names::SOURCE_IP, ip_bytes(ip));
            attrs.set(names::SOURCE_PORT, i64::from(port));
        }

        if let Some(principal) = data.principal(true) {
            attrs.set(names::SOURCE_PRINCIPAL, principal.as_str());
            attrs.set(names::SOURCE_USER, principal);
        }
        if let Some(principal) = data.principal(false) {
            attrs.set(names::DESTINATION_PRINCIPAL, principal);
        }

        attrs.set(names::CONNECTION_MTLS, data.is_mutual_tls());
        if let Some(sni) = data.requested_server_name() {
            attrs.set(names::CONNECTION_REQUESTED_SERVER_NAME, sni);
        }

        let headers = data.request_headers();
        let header = |name: &str| headers.get(name).map(header_value);
        let host = data.host().or_else(|| header(HOST.as_str()));

        let request_facts = [
            (names::REQUEST_PATH, data.path()),
            (names::REQUEST_METHOD, data.method()),
            (names::REQUEST_HOST, host),
            (names::REQUEST_SCHEME, data.scheme()),
            (names::REQUEST_USER_AGENT, header(USER_AGENT.as_str())),
        ];
        for (name, value) in request_facts {
            if let Some(value) = value {
                attrs.set(name, value);
            }
        }

        let protocol = match header(CONTENT_TYPE.as_str()) {
            Some(ct) if ct.starts_with(GRPC_CONTENT_TYPE) => "grpc",
            _ => "http",
        };
        attrs.set(names::CONTEXT_PROTOCOL, protocol);

        if !headers.is_empty() {
            attrs.set(names::REQUEST_HEADERS, header_map(&headers));
        }
        attrs.set(names::REQUEST_TIME, SystemTime::now());

        trace!(count = attrs.len(), "extracted check attributes");
    }

    /// Adds `api.*` attributes for the operation the request matches.
    pub(crate) fn extract_api_attributes(
        &mut self,
        data: &dyn CheckData,
        matcher: &ApiSpecMatcher,
    ) {
        if matcher.is_empty() {
            return;
        }
        let attrs = &mut *self.attributes;
        let method = attrs.get_str(names::REQUEST_METHOD).map(str::to_owned);
        let path = attrs.get_str(names::REQUEST_PATH).map(str::to_owned);
        let (Some(method), Some(path)) = (method, path) else {
            return;
        };
        let headers = data.request_headers();
        matcher.add_attributes(&method, &path, &headers, attrs);
    }

    /// Adds the response-side facts needed by Report.
    pub(crate) fn extract_report_attributes(&mut self, data: &dyn ReportData) {
        let attrs = &mut *self.attributes;

        if let Some((ip, port)) = data.destination_ip_port() {
            attrs.set(names::DESTINATION_IP, ip_bytes(ip));
            attrs.set(names::DESTINATION_PORT, i64::from(port));
        }
        if let Some(uid) = data.destination_uid() {
            attrs.set(names::DESTINATION_UID, uid);
        }

        let headers = data.response_headers();
        if !headers.is_empty() {
            attrs.set(names::RESPONSE_HEADERS, header_map(&headers));
        }

        let info = data.report_info();
        let sizes = [
            (names::REQUEST_SIZE, info.request_body_size),
            (names::REQUEST_TOTAL_SIZE, info.request_total_size),
            (names::RESPONSE_SIZE, info.response_body_size),
            (names::RESPONSE_TOTAL_SIZE, info.response_total_size),
        ];
        for (name, size) in sizes {
            attrs.set(name, i64::try_from(size).unwrap_or(i64::MAX));
        }
        attrs.set(names::RESPONSE_DURATION, info.duration);
        if let Some(code) = info.response_code {
            attrs.set(names::RESPONSE_CODE, i64::from(code));
        }
        attrs.set(names::RESPONSE_TIME, SystemTime::now());

        if let Some(grpc) = data.grpc_status() {
            attrs.set(names::RESPONSE_GRPC_STATUS, grpc.status);
            attrs.set(names::RESPONSE_GRPC_MESSAGE, grpc.message);
        }

        let filter_state = data.dynamic_filter_state();
        if let Some(rbac) = filter_state.get(RBAC_FILTER_NAME) {
            let field = |name: &str| match rbac.fields.get(name)?.kind.as_ref()? {
                Kind::StringValue(s) => Some(s.clone()),
                _ => None,
            };
            if let Some(result) = field(RBAC_SHADOW_ENGINE_RESULT) {
                attrs.set(names::RBAC_PERMISSIVE_RESPONSE_CODE, result);
            }
            if let Some(policy) = field(RBAC_SHADOW_EFFECTIVE_POLICY_ID) {
                attrs.set(names::RBAC_PERMISSIVE_EFFECTIVE_POLICY_ID, policy);
            }
        }

        trace!(count = attrs.len(), "extracted report attributes");
    }
}

/// Decodes the attributes forwarded by the downstream peer.
///
/// Malformed input is dropped: the request proceeds with local attributes.
pub(crate) fn extract_forwarded_attributes(data: &dyn CheckData) -> Option<AttributeBag> {
    let bytes = data.extract_istio_attributes()?;
    match AttributeBag::deserialize(&bytes) {
        Ok(bag) => {
            trace!(count = bag.len(), "extracted forwarded attributes");
            Some(bag)
        }
        Err(error) => {
            warn!(%error, "dropping malformed forwarded attributes");
            None
        }
    }
}

fn ip_bytes(ip: IpAddr) -> Bytes {
    match ip {
        IpAddr::V4(v4) => Bytes::copy_from_slice(&v4.octets()),
        IpAddr::V6(v6) => Bytes::copy_from_slice(&v6.octets()),
    }
}

// Header values are opaque bytes; non UTF-8 sequences are replaced, never dropped.
fn header_value(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (name, value) in headers {
        let value = header_value(value);
        map.entry(name.as_str().to_owned())
            .and_modify(|existing: &mut String| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}
