//! Survey link construction.
//!
//! The origin for a survey URL is taken from the first usable source in
//! this order: explicit base URL, configured public URL, request `Origin`,
//! request `Host`, and finally `http://localhost:3000`.

use axum::http::{HeaderMap, header};
use uuid::Uuid;

const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Candidate origins for a survey link
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginSources<'a> {
    pub base_url: Option<&'a str>,
    pub public_url: Option<&'a str>,
    pub origin_header: Option<&'a str>,
    pub host_header: Option<&'a str>,
}

impl<'a> OriginSources<'a> {
    /// Fill the header candidates from an incoming request
    pub fn with_headers(mut self, headers: &'a HeaderMap) -> Self {
        self.origin_header = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
        self.host_header = headers.get(header::HOST).and_then(|v| v.to_str().ok());
        self
    }

    pub fn resolve(&self) -> String {
        let pick = |value: Option<&str>| {
            value
                .map(|v| v.trim().trim_end_matches('/'))
                .filter(|v| !v.is_empty() && *v != "null")
                .map(str::to_string)
        };

        pick(self.base_url)
            .or_else(|| pick(self.public_url))
            .or_else(|| pick(self.origin_header))
            .or_else(|| pick(self.host_header).map(|host| origin_for_host(&host)))
            .unwrap_or_else(|| FALLBACK_ORIGIN.to_string())
    }
}

fn origin_for_host(host: &str) -> String {
    let hostname = host.split(':').next().unwrap_or(host);
    let scheme = if matches!(hostname, "localhost" | "127.0.0.1") {
        "http"
    } else {
        "https"
    };
    format!("{}://{}", scheme, host)
}

/// `{origin}/survey/{token}`
pub fn survey_url(origin: &str, token_id: Uuid) -> String {
    format!("{}/survey/{}", origin.trim_end_matches('/'), token_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn explicit_base_url_wins() {
        let sources = OriginSources {
            base_url: Some("https://survey.acme.test/"),
            public_url: Some("https://beacon.test"),
            origin_header: Some("https://other.test"),
            host_header: Some("host.test"),
        };
        assert_eq!(sources.resolve(), "https://survey.acme.test");
    }

    #[test]
    fn falls_through_in_priority_order() {
        let mut sources = OriginSources {
            public_url: Some("https://beacon.test//"),
            origin_header: Some("https://origin.test"),
            host_header: Some("host.test"),
            ..Default::default()
        };
        assert_eq!(sources.resolve(), "https://beacon.test");

        sources.public_url = None;
        assert_eq!(sources.resolve(), "https://origin.test");

        sources.origin_header = None;
        assert_eq!(sources.resolve(), "https://host.test");

        sources.host_header = None;
        assert_eq!(sources.resolve(), "http://localhost:3000");
    }

    #[test]
    fn local_hosts_use_plain_http() {
        let local = OriginSources {
            host_header: Some("localhost:8080"),
            ..Default::default()
        };
        assert_eq!(local.resolve(), "http://localhost:8080");

        let loopback = OriginSources {
            host_header: Some("127.0.0.1:3000"),
            ..Default::default()
        };
        assert_eq!(loopback.resolve(), "http://127.0.0.1:3000");
    }

    #[test]
    fn reads_request_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("beacon.example.com"));
        let sources = OriginSources::default().with_headers(&headers);
        assert_eq!(sources.resolve(), "https://beacon.example.com");
    }

    #[test]
    fn survey_url_ends_with_token() {
        let token = Uuid::new_v4();
        let url = survey_url("https://beacon.test/", token);
        assert_eq!(url, format!("https://beacon.test/survey/{}", token));
    }
}
