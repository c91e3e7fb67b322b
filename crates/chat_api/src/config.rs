use std::collections::BTreeMap;
use std::time::Duration;

use crate::dialect::WireDialect;

/// Transport configuration for one provider endpoint.
#[derive(Debug, Clone)]
pub struct ChatApiConfig {
    /// API credential. May be empty for local endpoints that ignore auth.
    pub api_key: String,
    /// Base URL for the provider; empty selects the dialect default.
    pub base_url: String,
    /// Wire format spoken at the endpoint.
    pub dialect: WireDialect,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
}

impl ChatApiConfig {
    pub fn new(api_key: impl Into<String>, dialect: WireDialect) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: String::new(),
            dialect,
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
