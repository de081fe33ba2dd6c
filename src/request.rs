//! Request templates and the per-tick working copies made from them.
//!
//! A [`RequestTemplate`] is configured once and never changes. Every tick
//! clones the selected template into a [`WorkingRequest`], which the filter
//! pipeline may mutate or replace before it is dispatched.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkloadError};

/// Header name -> value map. Keys are unique; see [`set_header`] for
/// case-insensitive replacement.
pub type Headers = BTreeMap<String, String>;

/// Method tokens recognised in a one-line request descriptor.
pub const HTTP_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// Default HTTP method.
pub const DEFAULT_METHOD: &str = "GET";

fn default_weight() -> f64 {
    1.0
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

/// One candidate outbound call with its relative selection weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestTemplate {
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: Headers,
}

impl RequestTemplate {
    /// Create a GET template with weight 1.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            weight: default_weight(),
            method: default_method(),
            url: url.into(),
            body: None,
            headers: Headers::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Fresh mutable copy for one tick.
    pub fn to_working(&self) -> WorkingRequest {
        WorkingRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            body: self.body.clone(),
            headers: self.headers.clone(),
        }
    }
}

impl FromStr for RequestTemplate {
    type Err = WorkloadError;

    /// Parse a descriptor of the form `[weight,][METHOD,]url[,body]`.
    ///
    /// Fields follow CSV quoting rules, so a body containing commas can be
    /// written as `POST,http://host/,"{""a"":1,""b"":2}"`.
    fn from_str(line: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());

        let record = reader
            .records()
            .next()
            .ok_or_else(|| WorkloadError::InvalidDescriptor("empty request descriptor".to_string()))??;

        let mut fields = record.iter().peekable();
        let mut template = RequestTemplate::new(String::new());

        if let Some(first) = fields.peek()
            && let Ok(weight) = first.trim().parse::<f64>()
            && weight.is_finite()
        {
            template.weight = weight;
            fields.next();
        }

        if let Some(token) = fields.peek()
            && HTTP_METHODS.contains(&token.trim())
        {
            template.method = token.trim().to_string();
            fields.next();
        }

        template.url = fields
            .next()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| WorkloadError::InvalidDescriptor(format!("missing url in '{}'", line)))?;

        if let Some(body) = fields.next() {
            template.body = Some(body.to_string());
        }

        Ok(template)
    }
}

/// Mutable per-tick copy of a template flowing through the filter chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingRequest {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub headers: Headers,
}

impl WorkingRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Insert `name: value`, first removing any key equal to `name` ignoring
/// ASCII case.
pub fn set_header(headers: &mut Headers, name: &str, value: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

/// Parse a `Name: value` header argument, split at the first colon.
pub fn parse_header_line(line: &str) -> Result<(String, String)> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| WorkloadError::InvalidDescriptor(format!("header '{}' has no ':'", line)))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(WorkloadError::InvalidDescriptor(format!("header '{}' has no name", line)));
    }

    Ok((name.to_string(), value.trim().to_string()))
}

/// Fold `Name: value` arguments into a header map.
pub fn parse_headers<I, S>(lines: I) -> Result<Headers>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut headers = Headers::new();
    for line in lines {
        let (name, value) = parse_header_line(line.as_ref())?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_defaults() {
        let template = RequestTemplate::new("http://localhost/");
        assert_eq!(template.weight, 1.0);
        assert_eq!(template.method, "GET");
        assert!(template.body.is_none());
        assert!(template.headers.is_empty());
    }

    #[test]
    fn test_template_deserialize_defaults() {
        let template: RequestTemplate = serde_json::from_str(r#"{"url": "http://h/"}"#).unwrap();
        assert_eq!(template.weight, 1.0);
        assert_eq!(template.method, "GET");
    }

    #[test]
    fn test_template_deserialize_missing_url() {
        let result = serde_json::from_str::<RequestTemplate>(r#"{"weight": 2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_to_working_is_independent_copy() {
        let template = RequestTemplate::new("http://h/").with_header("a", "1");
        let mut working = template.to_working();
        working.url = "http://other/".to_string();
        working.headers.insert("b".to_string(), "2".to_string());

        assert_eq!(template.url, "http://h/");
        assert_eq!(template.headers.len(), 1);
    }

    #[test]
    fn test_descriptor_url_only() {
        let template: RequestTemplate = "http://example.com/".parse().unwrap();
        assert_eq!(template.url, "http://example.com/");
        assert_eq!(template.method, "GET");
        assert_eq!(template.weight, 1.0);
        assert!(template.body.is_none());
    }

    #[test]
    fn test_descriptor_full() {
        let template: RequestTemplate = "4,POST,http://example.com/api,hello".parse().unwrap();
        assert_eq!(template.weight, 4.0);
        assert_eq!(template.method, "POST");
        assert_eq!(template.url, "http://example.com/api");
        assert_eq!(template.body.as_deref(), Some("hello"));
    }

    #[test]
    fn test_descriptor_weight_without_method() {
        let template: RequestTemplate = "2.5,http://example.com/".parse().unwrap();
        assert_eq!(template.weight, 2.5);
        assert_eq!(template.method, "GET");
    }

    #[test]
    fn test_descriptor_quoted_body() {
        let template: RequestTemplate = r#"PUT,http://h/,"{""a"":1,""b"":2}""#.parse().unwrap();
        assert_eq!(template.method, "PUT");
        assert_eq!(template.body.as_deref(), Some(r#"{"a":1,"b":2}"#));
    }

    #[test]
    fn test_descriptor_missing_url() {
        let result = "3,GET".parse::<RequestTemplate>();
        assert!(matches!(result, Err(WorkloadError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_descriptor_lowercase_method_is_url() {
        // Only upper-case method tokens are recognised
        let template: RequestTemplate = "get".parse().unwrap();
        assert_eq!(template.url, "get");
        assert_eq!(template.method, "GET");
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut headers = Headers::new();
        headers.insert("x-agent".to_string(), "spoofed".to_string());
        set_header(&mut headers, "X-Agent", "workload/1");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-Agent").map(String::as_str), Some("workload/1"));
    }

    #[test]
    fn test_working_request_header_lookup() {
        let working = RequestTemplate::new("http://h/")
            .with_header("Content-Type", "text/plain")
            .to_working();
        assert_eq!(working.header("content-type"), Some("text/plain"));
        assert_eq!(working.header("accept"), None);
    }

    #[test]
    fn test_parse_header_line() {
        let (name, value) = parse_header_line("Authorization: Bearer a:b").unwrap();
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Bearer a:b");
    }

    #[test]
    fn test_parse_header_line_without_colon() {
        assert!(parse_header_line("nonsense").is_err());
        assert!(parse_header_line(": value").is_err());
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(["a: 1", "b:2"]).unwrap();
        assert_eq!(headers.get("a").map(String::as_str), Some("1"));
        assert_eq!(headers.get("b").map(String::as_str), Some("2"));
    }
}
