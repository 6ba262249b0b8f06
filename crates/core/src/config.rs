//! Client configuration and per-call options.

/// Desktop browser identity sent with watch-page requests; unrecognised
/// clients get a degraded page without the caption manifest.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

/// Where the platform lives and how requests identify themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub accept_language: String,
    pub consent_cookie_domain: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US".to_string(),
            consent_cookie_domain: ".youtube.com".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_consent_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.consent_cookie_domain = domain.into();
        self
    }

    pub fn watch_url(&self) -> String {
        format!("{}/watch", self.base_url)
    }
}

/// What to fetch for one transcript request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptOptions {
    /// Language codes in order of preference. Empty never matches anything.
    pub languages: Vec<String>,
    /// Keep inline formatting tags such as `<i>` in segment text.
    pub preserve_formatting: bool,
}

impl TranscriptOptions {
    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.languages.push(code.into());
        self
    }

    pub fn with_preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }
}
