use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use robots_txt::Robots;
use robots_txt::parts::{Rule, Section};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Why robots.txt could not be evaluated. Never returned to callers of the
/// requester: the check fails open instead.
#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch { url: Url, source: reqwest::Error },
    #[error("{url} answered with HTTP {status}")]
    Status { url: Url, status: StatusCode },
    #[error("Failed to read robots.txt response body from {url}: {source}")]
    Body { url: Url, source: reqwest::Error },
    #[error("URL {0} has no origin to look up robots.txt for")]
    NoOrigin(Url),
}

#[derive(Debug, Clone, PartialEq)]
enum Rules {
    AllowAll,
    DisallowAll,
    Text(String),
}

/// robots.txt rules of a single origin.
/// The text is kept as-is and parsed on each check.
#[derive(Debug)]
pub struct RobotsTxt {
    origin: String,
    rules: Rules,
}

impl RobotsTxt {
    pub fn from_text(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            rules: Rules::Text(text.into()),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Fetches `<origin>/robots.txt` with a single plain GET.
    ///
    /// 401/403 mean everything is off limits, any other 4xx means there are no
    /// rules. Network errors and 5xx answers are errors so that the caller can
    /// retry them on the next check.
    pub async fn fetch(client: &Client, target_url: &Url) -> Result<Self, RobotsError> {
        let origin = origin_of(target_url).ok_or_else(|| RobotsError::NoOrigin(target_url.clone()))?;
        let robots_url = robots_url(target_url).ok_or_else(|| RobotsError::NoOrigin(target_url.clone()))?;

        tracing::info!("Fetching robots.txt from: {}", robots_url);

        let response = client
            .get(robots_url.clone())
            .send()
            .await
            .map_err(|source| RobotsError::Fetch {
                url: robots_url.clone(),
                source,
            })?;
        let status = response.status();

        let rules = if status.is_success() {
            let text = response.text().await.map_err(|source| RobotsError::Body {
                url: robots_url.clone(),
                source,
            })?;
            tracing::debug!("robots.txt content for {}:\n{}", origin, text);
            Rules::Text(text)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::info!("robots.txt for {} is HTTP {}, disallowing all", origin, status);
            Rules::DisallowAll
        } else if status.is_client_error() {
            tracing::info!("No robots.txt for {} (HTTP {}), allowing all", origin, status);
            Rules::AllowAll
        } else {
            return Err(RobotsError::Status {
                url: robots_url,
                status,
            });
        };

        Ok(Self { origin, rules })
    }

    /// Checks if a URL is allowed to be fetched by a specific user-agent.
    ///
    /// Only the product token of `user_agent` (the part before the first `/`)
    /// selects a section, case-insensitively. Rule paths are matched
    /// case-sensitively against path plus query, first match wins.
    pub fn is_allowed(&self, url_to_check: &Url, user_agent: &str) -> bool {
        let text = match &self.rules {
            Rules::AllowAll => return true,
            Rules::DisallowAll => return false,
            Rules::Text(text) => text,
        };

        let parsed_robots = Robots::from_str_lossy(text);
        let section = select_section(&parsed_robots, user_agent);

        let path = match url_to_check.query() {
            Some(query) => format!("{}?{}", url_to_check.path(), query),
            None => url_to_check.path().to_string(),
        };
        check_rules(&section.rules, &path)
    }
}

fn select_section<'r, 'a>(robots: &'r Robots<'a>, user_agent: &str) -> &'r Section<'a> {
    let product = user_agent
        .split('/')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    robots
        .sections
        .iter()
        .find(|section| {
            section
                .useragents
                .iter()
                .any(|agent| agent == "*" || product.contains(&agent.to_lowercase()))
        })
        .unwrap_or(&robots.default_section)
}

fn check_rules(rules: &[Rule<'_>], path: &str) -> bool {
    rules
        .iter()
        .find(|rule| rule.path == "*" || path.starts_with(rule.path.as_ref()))
        // An empty `Disallow:` allows everything.
        .is_none_or(|rule| rule.allow || rule.path.is_empty())
}

/// Per-origin robots.txt cache. Entries live as long as the cache.
#[derive(Debug, Default)]
pub struct RobotsCache {
    enabled: bool,
    entries: DashMap<String, Arc<RobotsTxt>>,
}

impl RobotsCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.entries.contains_key(origin)
    }

    /// Answers whether `user_agent` may fetch `url`.
    ///
    /// Always true when disabled. When robots.txt cannot be fetched the answer
    /// is true and nothing is cached, so the next call fetches again.
    pub async fn is_allowed(&self, client: &Client, url: &Url, user_agent: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let Some(robots) = self.get_or_fetch(client, url).await else {
            return true;
        };
        robots.is_allowed(url, user_agent)
    }

    async fn get_or_fetch(&self, client: &Client, url: &Url) -> Option<Arc<RobotsTxt>> {
        let origin = origin_of(url)?;
        let cached = self.entries.get(&origin).map(|entry| Arc::clone(entry.value()));
        if cached.is_some() {
            return cached;
        }

        match RobotsTxt::fetch(client, url).await {
            Ok(robots) => {
                let robots = Arc::new(robots);
                self.entries.insert(origin, Arc::clone(&robots));
                Some(robots)
            }
            Err(e) => {
                tracing::warn!("Failed to read robots.txt for {}: {}", origin, e);
                None
            }
        }
    }
}

/// `scheme://host[:port]`, with the default port left out.
pub fn origin_of(url: &Url) -> Option<String> {
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

pub fn robots_url(url: &Url) -> Option<Url> {
    let origin = origin_of(url)?;
    Url::parse(&origin).ok()?.join("/robots.txt").ok()
}
