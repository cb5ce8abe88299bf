//! Well-known attribute names.
//!
//! Names are dotted paths: the first segment names the entity the attribute
//! describes (`source`, `destination`, `request`, `response`, ...) and the
//! rest names the fact.

/// Peer IP address, as 4 or 16 raw bytes.
pub const SOURCE_IP: &str = "source.ip";
/// Peer port.
pub const SOURCE_PORT: &str = "source.port";
/// Peer identity from the connection certificate.
pub const SOURCE_PRINCIPAL: &str = "source.principal";
/// Same as [`SOURCE_PRINCIPAL`], kept for older policies.
pub const SOURCE_USER: &str = "source.user";
/// Local identity from the connection certificate.
pub const DESTINATION_PRINCIPAL: &str = "destination.principal";
/// Upstream IP address, as 4 or 16 raw bytes.
pub const DESTINATION_IP: &str = "destination.ip";
/// Upstream port.
pub const DESTINATION_PORT: &str = "destination.port";
/// Upstream workload id.
pub const DESTINATION_UID: &str = "destination.uid";

/// Whether the downstream connection uses mutual TLS.
pub const CONNECTION_MTLS: &str = "connection.mtls";
/// SNI requested by the downstream peer.
pub const CONNECTION_REQUESTED_SERVER_NAME: &str = "connection.requested_server_name";
/// `grpc` or `http`.
pub const CONTEXT_PROTOCOL: &str = "context.protocol";

/// Request headers as a string map; repeated headers are comma joined.
pub const REQUEST_HEADERS: &str = "request.headers";
/// Request path, query included.
pub const REQUEST_PATH: &str = "request.path";
/// Request authority.
pub const REQUEST_HOST: &str = "request.host";
/// Request method.
pub const REQUEST_METHOD: &str = "request.method";
/// Request scheme.
pub const REQUEST_SCHEME: &str = "request.scheme";
/// `user-agent` header.
pub const REQUEST_USER_AGENT: &str = "request.useragent";
/// When the request attributes were extracted.
pub const REQUEST_TIME: &str = "request.time";
/// Request body size in bytes.
pub const REQUEST_SIZE: &str = "request.size";
/// Request size in bytes, headers included.
pub const REQUEST_TOTAL_SIZE: &str = "request.total_size";

/// Response headers as a string map.
pub const RESPONSE_HEADERS: &str = "response.headers";
/// HTTP status code.
pub const RESPONSE_CODE: &str = "response.code";
/// Response body size in bytes.
pub const RESPONSE_SIZE: &str = "response.size";
/// Response size in bytes, headers included.
pub const RESPONSE_TOTAL_SIZE: &str = "response.total_size";
/// Time between the first request byte and the last response byte.
pub const RESPONSE_DURATION: &str = "response.duration";
/// When the response attributes were extracted.
pub const RESPONSE_TIME: &str = "response.time";
/// gRPC status code, as text.
pub const RESPONSE_GRPC_STATUS: &str = "response.grpc_status";
/// gRPC status message.
pub const RESPONSE_GRPC_MESSAGE: &str = "response.grpc_message";

/// API key found in the query or headers of a request matching an API spec.
pub const API_KEY: &str = "api.key";

/// Result of the shadow RBAC engine.
pub const RBAC_PERMISSIVE_RESPONSE_CODE: &str = "rbac.permissive.response_code";
/// Policy the shadow RBAC engine matched.
pub const RBAC_PERMISSIVE_EFFECTIVE_POLICY_ID: &str = "rbac.permissive.effective_policy_id";
