//! Matching of requests against HTTP API specs.
//!
//! A matched operation contributes its spec and pattern attributes (for
//! example `api.service` and `api.operation`) plus an `api.key` taken from
//! the request, to the Check attributes.

use http::HeaderMap;
use regex::Regex;
use tracing::{trace, warn};

use crate::attribute::{AttributeBag, MergePolicy, names};
use crate::config::{ApiKey, ApiPattern, ApiSpec};
use crate::error::{Error, Result};

/// Compiled form of a service's [`ApiSpec`] list.
#[derive(Debug, Default)]
pub(crate) struct ApiSpecMatcher {
    specs: Vec<CompiledSpec>,
}

#[derive(Debug)]
struct CompiledSpec {
    attributes: AttributeBag,
    patterns: Vec<CompiledPattern>,
    api_keys: Vec<ApiKey>,
}

#[derive(Debug)]
struct CompiledPattern {
    attributes: AttributeBag,
    method: Option<String>,
    path: PathMatcher,
}

#[derive(Debug)]
enum PathMatcher {
    Template(Vec<Segment>),
    Regex(Regex),
}

#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Exactly one path segment.
    Single,
    /// Any number of trailing segments, including none.
    Rest,
}

impl ApiSpecMatcher {
    /// Compiles `specs`, skipping patterns that are invalid.
    pub(crate) fn new(specs: &[ApiSpec]) -> Self {
        let specs = specs
            .iter()
            .map(|spec| CompiledSpec {
                attributes: spec.attributes.clone(),
                patterns: spec
                    .patterns
                    .iter()
                    .filter_map(|pattern| match CompiledPattern::new(pattern) {
                        Ok(p) => Some(p),
                        Err(error) => {
                            warn!(%error, "skipping api spec pattern");
                            None
                        }
                    })
                    .collect(),
                api_keys: spec.api_keys.clone(),
            })
            .collect();
        Self { specs }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.specs.iter().all(|s| s.patterns.is_empty())
    }

    /// Adds the attributes of the first operation matching the request.
    ///
    /// `path` may include a query string; it is ignored for matching but
    /// consulted for API keys.
    pub(crate) fn add_attributes(
        &self,
        method: &str,
        path: &str,
        headers: &HeaderMap,
        attributes: &mut AttributeBag,
    ) -> bool {
        let (path_only, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };

        for spec in &self.specs {
            let Some(pattern) = spec.patterns.iter().find(|p| p.matches(method, path_only)) else {
                continue;
            };
            trace!(method, path = path_only, "matched api spec pattern");

            attributes.merge(&spec.attributes, MergePolicy::Override);
            attributes.merge(&pattern.attributes, MergePolicy::Override);
            if let Some(key) = find_api_key(&spec.api_keys, query, headers) {
                attributes.set(names::API_KEY, key);
            }
            return true;
        }
        false
    }
}

impl CompiledPattern {
    fn new(pattern: &ApiPattern) -> Result<Self> {
        let path = match (&pattern.uri_template, &pattern.regex) {
            (Some(template), _) => PathMatcher::Template(parse_template(template)?),
            (None, Some(regex)) => {
                PathMatcher::Regex(Regex::new(&format!("^(?:{regex})$")).map_err(|e| {
                    Error::InvalidApiSpec {
                        pattern: regex.clone(),
                        reason: e.to_string(),
                    }
                })?)
            }
            (None, None) => {
                return Err(Error::InvalidApiSpec {
                    pattern: String::new(),
                    reason: "neither uri_template nor regex is set".to_owned(),
                });
            }
        };

        let method = match pattern.http_method.as_str() {
            "" | "*" => None,
            m => Some(m.to_ascii_uppercase()),
        };

        Ok(Self {
            attributes: pattern.attributes.clone(),
            method,
            path,
        })
    }

    fn matches(&self, method: &str, path: &str) -> bool {
        if let Some(expected) = &self.method {
            if !expected.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        match &self.path {
            PathMatcher::Template(segments) => template_matches(segments, path),
            PathMatcher::Regex(regex) => regex.is_match(path),
        }
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>> {
    let invalid = |reason: &str| Error::InvalidApiSpec {
        pattern: template.to_owned(),
        reason: reason.to_owned(),
    };

    if !template.starts_with('/') {
        return Err(invalid("template must start with '/'"));
    }

    let parts: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let segment = match *part {
            "*" => Segment::Single,
            "**" => Segment::Rest,
            var if var.starts_with('{') => {
                let inner = var
                    .strip_prefix('{')
                    .and_then(|v| v.strip_suffix('}'))
                    .ok_or_else(|| invalid("unterminated variable"))?;
                match inner.split_once('=') {
                    None | Some((_, "*")) => Segment::Single,
                    Some((_, "**")) => Segment::Rest,
                    Some(_) => return Err(invalid("unsupported variable pattern")),
                }
            }
            literal if literal.contains(['{', '}', '*']) => {
                return Err(invalid("wildcards must span a whole segment"));
            }
            literal => Segment::Literal(literal.to_owned()),
        };
        if segment == Segment::Rest && i + 1 != parts.len() {
            return Err(invalid("'**' is only allowed as the last segment"));
        }
        segments.push(segment);
    }
    Ok(segments)
}

fn template_matches(segments: &[Segment], path: &str) -> bool {
    let mut parts = path.split('/').filter(|s| !s.is_empty());
    for segment in segments {
        match segment {
            Segment::Rest => return true,
            Segment::Single => {
                if parts.next().is_none() {
                    return false;
                }
            }
            Segment::Literal(literal) => {
                if parts.next() != Some(literal.as_str()) {
                    return false;
                }
            }
        }
    }
    parts.next().is_none()
}

fn find_api_key(api_keys: &[ApiKey], query: Option<&str>, headers: &HeaderMap) -> Option<String> {
    let defaults;
    let api_keys = if api_keys.is_empty() {
        defaults = [
            ApiKey::Query("key".to_owned()),
            ApiKey::Query("api_key".to_owned()),
            ApiKey::Header("x-api-key".to_owned()),
        ];
        &defaults[..]
    } else {
        api_keys
    };

    api_keys.iter().find_map(|location| match location {
        ApiKey::Query(name) => query?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k == name.as_str() && !v.is_empty()).then(|| v.to_owned())
        }),
        ApiKey::Header(name) => headers
            .get(name.as_str())
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()),
    })
}
