//! Explicit cookie store passed through the pipeline instead of living inside
//! the HTTP client.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Domain-scoped cookies shared by the requests of one or more transcript
/// lookups. Safe to share between concurrent calls; use separate sessions
/// when calls must not see each other's cookies.
#[derive(Debug, Default)]
pub struct Session {
    jar: Arc<Jar>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing jar, e.g. one also installed on a `reqwest::Client`.
    pub fn with_jar(jar: Arc<Jar>) -> Self {
        Self { jar }
    }

    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// Store a cookie for `domain` and its subdomains, replacing any cookie
    /// with the same name there. IP addresses get a host-only cookie.
    pub fn set_cookie(&self, name: &str, value: &str, domain: &str) {
        let host = domain.trim_start_matches('.');
        let Ok(url) = Url::parse(&format!("https://{host}/")) else {
            debug!("ignoring cookie {name} for unusable domain {domain}");
            return;
        };
        let cookie = if host.parse::<IpAddr>().is_ok() {
            format!("{name}={value}; Path=/")
        } else {
            format!("{name}={value}; Domain={host}; Path=/")
        };
        debug!("setting cookie {name} for domain {domain}");
        self.jar.add_cookie_str(&cookie, &url);
    }

    /// `Cookie` header value for a request to `url`, if any cookie applies.
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.jar.cookies(&url)?;
        header.to_str().ok().map(str::to_string)
    }
}
