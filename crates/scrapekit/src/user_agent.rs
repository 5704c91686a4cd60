use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, USER_AGENT};

/// Desktop browser signatures used for rotation.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

/// Picks the `User-Agent` for the next request.
#[derive(Debug, Clone)]
pub struct UserAgentSelector {
    enabled: bool,
    pool: Vec<HeaderValue>,
}

impl UserAgentSelector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            pool: USER_AGENTS
                .iter()
                .copied()
                .map(HeaderValue::from_static)
                .collect(),
        }
    }

    /// Uses `pool` instead of the built-in signatures. An empty pool keeps the
    /// built-in ones.
    pub fn with_pool<S: AsRef<str>>(enabled: bool, pool: &[S]) -> Result<Self, InvalidHeaderValue> {
        if pool.is_empty() {
            return Ok(Self::new(enabled));
        }

        let pool = pool
            .iter()
            .map(|agent| HeaderValue::from_str(agent.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { enabled, pool })
    }

    pub fn pool(&self) -> &[HeaderValue] {
        &self.pool
    }

    /// Overwrites `User-Agent` with a random pool entry when rotation is on.
    /// Draws are independent, so the same agent may repeat.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if !self.enabled {
            return;
        }

        if let Some(agent) = self.pool.choose(&mut rand::rng()) {
            headers.insert(USER_AGENT, agent.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_leaves_header_untouched() {
        let selector = UserAgentSelector::new(false);
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("static-agent"));

        selector.apply(&mut headers);

        assert_eq!(headers.get(USER_AGENT).unwrap(), "static-agent");
    }

    #[test]
    fn test_enabled_always_picks_from_pool() {
        let selector = UserAgentSelector::new(true);
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("static-agent"));

        for _ in 0..100 {
            selector.apply(&mut headers);
            let agent = headers.get(USER_AGENT).unwrap();
            assert!(selector.pool().contains(agent), "unexpected agent {:?}", agent);
        }
    }

    #[test]
    fn test_builtin_pool_has_desktop_agents() {
        let selector = UserAgentSelector::new(true);
        assert!(selector.pool().len() >= 3);
        assert!(
            selector
                .pool()
                .iter()
                .all(|agent| agent.to_str().unwrap().starts_with("Mozilla/5.0"))
        );
    }

    #[test]
    fn test_custom_pool() {
        let selector = UserAgentSelector::with_pool(true, &["agent-a", "agent-b"]).unwrap();
        let mut headers = HeaderMap::new();
        for _ in 0..20 {
            selector.apply(&mut headers);
            let agent = headers.get(USER_AGENT).unwrap().to_str().unwrap();
            assert!(agent == "agent-a" || agent == "agent-b");
        }
    }

    #[test]
    fn test_empty_custom_pool_falls_back_to_builtin() {
        let empty: [&str; 0] = [];
        let selector = UserAgentSelector::with_pool(true, &empty).unwrap();
        assert_eq!(selector.pool().len(), USER_AGENTS.len());
    }

    #[test]
    fn test_invalid_custom_agent_is_rejected() {
        assert!(UserAgentSelector::with_pool(true, &["bad\nagent"]).is_err());
    }
}
