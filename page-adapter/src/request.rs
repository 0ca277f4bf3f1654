//! Synthetic request built from a single invocation event.

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use lambda_http::request::RequestContext;
use lambda_http::{Request, RequestExt};

use crate::adapter::AdapterError;
use crate::event::ProxyEvent;

pub const FORWARDED_HOST: &str = "x-forwarded-host";
pub const REAL_IP: &str = "x-real-ip";

/// Stream plumbing a long-lived server would expose. Nothing is ever
/// streamed here, so every operation is accepted and ignored.
pub trait StreamLifecycle {
    fn on<F: FnMut()>(&mut self, _event: &str, _listener: F) -> &mut Self {
        self
    }

    fn once<F: FnMut()>(&mut self, _event: &str, _listener: F) -> &mut Self {
        self
    }

    fn remove_listener(&mut self, _event: &str) -> &mut Self {
        self
    }

    /// Always `false`: no listener is ever registered.
    fn emit(&mut self, _event: &str) -> bool {
        false
    }

    fn destroy(&mut self) {}

    fn set_timeout(&mut self, _timeout: Duration) -> &mut Self {
        self
    }
}

/// Request object handed to the page handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticRequest {
    method: String,
    url: String,
    headers: HashMap<String, String>,
    body: Option<String>,
}

impl SyntheticRequest {
    /// Build a request from already-decoded parts, adding the derived
    /// forwarding headers.
    pub fn from_parts(
        method: impl Into<String>,
        url: impl Into<String>,
        mut headers: HashMap<String, String>,
        body: Option<String>,
        source_ip: Option<&str>,
    ) -> Self {
        let host = headers
            .get("Host")
            .or_else(|| headers.get("host"))
            .cloned();
        if let Some(host) = host {
            headers.insert(FORWARDED_HOST.to_string(), host);
        }
        if let Some(ip) = source_ip {
            headers.insert(REAL_IP.to_string(), ip.to_string());
        }

        Self {
            method: method.into(),
            url: url.into(),
            headers,
            body,
        }
    }

    pub fn from_event(event: &ProxyEvent) -> Result<Self, AdapterError> {
        let mut url = event.path.clone();
        if let Some(query) = event.query_string_parameters.as_ref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(&query.to_query_string());
        }

        let body = match &event.body {
            Some(raw) if event.is_base64_encoded => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(raw)
                    .map_err(|e| AdapterError::Request(format!("invalid base64 body: {}", e)))?;
                Some(
                    String::from_utf8(bytes)
                        .map_err(|e| AdapterError::Request(format!("body is not UTF-8: {}", e)))?,
                )
            }
            other => other.clone(),
        };

        Ok(Self::from_parts(
            event.http_method.clone(),
            url,
            event.headers.clone().unwrap_or_default(),
            body,
            event.source_ip(),
        ))
    }

    /// Build a request from an event already decoded by `lambda_http`.
    pub fn from_http(event: &Request) -> Result<Self, AdapterError> {
        let url = event
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let headers: HashMap<String, String> = event
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
            .collect();

        let bytes: &[u8] = event.body().as_ref();
        let body = if bytes.is_empty() {
            None
        } else {
            Some(
                std::str::from_utf8(bytes)
                    .map_err(|e| AdapterError::Request(format!("body is not UTF-8: {}", e)))?
                    .to_string(),
            )
        };

        Ok(Self::from_parts(
            event.method().as_str(),
            url,
            headers,
            body,
            http_source_ip(event).as_deref(),
        ))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Headers exactly as received, plus the derived ones.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

impl StreamLifecycle for SyntheticRequest {}

fn http_source_ip(event: &Request) -> Option<String> {
    match event.request_context_ref()? {
        RequestContext::ApiGatewayV1(ctx) => ctx.identity.source_ip.clone(),
        RequestContext::ApiGatewayV2(ctx) => ctx.http.source_ip.clone(),
        _ => None,
    }
}

/// Pre-parsed URL hint passed alongside the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    pub pathname: String,
    pub query: Vec<(String, String)>,
}

impl ParsedUrl {
    pub fn parse(url: &str) -> Self {
        let (pathname, raw_query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };

        let query = raw_query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_query_component(k), decode_query_component(v))
            })
            .collect();

        Self {
            pathname: if pathname.is_empty() { "/".to_string() } else { pathname.to_string() },
            query,
        }
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Non-empty, percent-decoded path segments.
    pub fn segments(&self) -> Vec<String> {
        self.pathname
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_path_component)
            .collect()
    }
}

fn decode_path_component(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Form-style: `+` is a space.
fn decode_query_component(raw: &str) -> String {
    decode_path_component(&raw.replace('+', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::QueryParams;
    use lambda_http::aws_lambda_events::apigw::ApiGatewayProxyRequestContext;
    use serde_json::json;

    fn event(value: serde_json::Value) -> ProxyEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_url_keeps_query_order() {
        let event = event(json!({
            "path": "/x",
            "httpMethod": "GET",
            "queryStringParameters": { "a": "1", "b": "2" }
        }));
        let request = SyntheticRequest::from_event(&event).unwrap();
        assert_eq!(request.url(), "/x?a=1&b=2");
    }

    #[test]
    fn test_url_without_query() {
        let mut event = event(json!({ "path": "/alice", "httpMethod": "GET" }));
        assert_eq!(SyntheticRequest::from_event(&event).unwrap().url(), "/alice");

        event.query_string_parameters = Some(QueryParams::default());
        assert_eq!(SyntheticRequest::from_event(&event).unwrap().url(), "/alice");
    }

    #[test]
    fn test_derived_headers() {
        let event = event(json!({
            "path": "/",
            "httpMethod": "GET",
            "headers": { "host": "calendar.example.com", "Accept": "text/html" },
            "requestContext": { "identity": { "sourceIp": "198.51.100.4" } }
        }));
        let request = SyntheticRequest::from_event(&event).unwrap();

        assert_eq!(request.header(FORWARDED_HOST), Some("calendar.example.com"));
        assert_eq!(request.header(REAL_IP), Some("198.51.100.4"));
        assert_eq!(request.header("accept"), Some("text/html"));
        assert_eq!(request.headers().get("Accept").map(String::as_str), Some("text/html"));
    }

    #[test]
    fn test_capitalized_host_preferred() {
        let mut headers = HashMap::new();
        headers.insert("Host".to_string(), "a.example.com".to_string());
        headers.insert("host".to_string(), "b.example.com".to_string());

        let request = SyntheticRequest::from_parts("GET", "/", headers, None, None);
        assert_eq!(request.headers()[FORWARDED_HOST], "a.example.com");
        assert!(request.header(REAL_IP).is_none());
    }

    #[test]
    fn test_body_passes_through() {
        let event = event(json!({
            "path": "/api",
            "httpMethod": "POST",
            "body": "{\"name\":\"x\"}"
        }));
        let request = SyntheticRequest::from_event(&event).unwrap();
        assert_eq!(request.method(), "POST");
        assert_eq!(request.body(), Some("{\"name\":\"x\"}"));
    }

    #[test]
    fn test_base64_body_is_decoded() {
        let event = event(json!({
            "path": "/",
            "httpMethod": "POST",
            "body": "aGVsbG8=",
            "isBase64Encoded": true
        }));
        let request = SyntheticRequest::from_event(&event).unwrap();
        assert_eq!(request.body(), Some("hello"));
    }

    #[test]
    fn test_invalid_base64_body_is_rejected() {
        let event = event(json!({
            "path": "/",
            "httpMethod": "POST",
            "body": "%%%",
            "isBase64Encoded": true
        }));
        assert!(matches!(
            SyntheticRequest::from_event(&event),
            Err(AdapterError::Request(_))
        ));
    }

    fn http_event(body: impl Into<lambda_http::Body>) -> Request {
        let mut context = ApiGatewayProxyRequestContext::default();
        context.identity.source_ip = Some("192.0.2.7".to_string());

        lambda_http::http::Request::builder()
            .method("POST")
            .uri("https://calendar.example.com/alice/10?b=2&a=1")
            .header("Host", "calendar.example.com")
            .header("Accept", "application/json")
            .body(body.into())
            .unwrap()
            .with_request_context(RequestContext::ApiGatewayV1(context))
    }

    #[test]
    fn test_http_event_becomes_request() {
        let request = SyntheticRequest::from_http(&http_event("{\"slot\":1}")).unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(request.url(), "/alice/10?b=2&a=1");
        assert_eq!(request.body(), Some("{\"slot\":1}"));
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.header(FORWARDED_HOST), Some("calendar.example.com"));
        assert_eq!(request.header(REAL_IP), Some("192.0.2.7"));
    }

    #[test]
    fn test_http_event_without_context_or_body() {
        let event = lambda_http::http::Request::builder()
            .uri("/")
            .body(lambda_http::Body::Empty)
            .unwrap();
        let request = SyntheticRequest::from_http(&event).unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.url(), "/");
        assert!(request.body().is_none());
        assert!(request.header(REAL_IP).is_none());
    }

    #[test]
    fn test_http_event_binary_body_is_rejected() {
        let event = http_event(vec![0xff_u8, 0xfe, 0x00]);
        assert!(matches!(
            SyntheticRequest::from_http(&event),
            Err(AdapterError::Request(_))
        ));
    }

    #[test]
    fn test_lifecycle_calls_are_noops() {
        let mut request = SyntheticRequest::from_parts("GET", "/", HashMap::new(), None, None);
        let before = request.clone();

        request
            .on("data", || {})
            .once("end", || {})
            .remove_listener("data")
            .set_timeout(Duration::from_secs(5));
        assert!(!request.emit("close"));
        request.destroy();

        assert_eq!(request, before);
    }

    #[test]
    fn test_parsed_url() {
        let url = ParsedUrl::parse("/alice/intro%20call?tz=Europe%2FLondon&flag");
        assert_eq!(url.pathname, "/alice/intro%20call");
        assert_eq!(url.segments(), vec!["alice", "intro call"]);
        assert_eq!(url.query_value("tz"), Some("Europe/London"));
        assert_eq!(url.query_value("flag"), Some(""));
        assert_eq!(ParsedUrl::parse("").pathname, "/");
    }
}
