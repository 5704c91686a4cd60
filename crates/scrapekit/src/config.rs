use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// `User-Agent` sent when no header of that name is configured.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Construction-time settings for a [`Requester`](crate::http_client::Requester).
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    /// Applied to every individual attempt, not to the whole retry sequence.
    pub timeout: Duration,
    pub retry_count: u32,
    /// Base delay; attempt `i` is followed by `retry_delay * 2^i`.
    pub retry_delay: Duration,
    pub verify_ssl: bool,
    pub user_agent_rotation: bool,
    /// Rotation pool. Empty means the built-in desktop browser pool.
    pub user_agents: Vec<String>,
    /// Minimum gap between attempt starts. Zero disables rate limiting.
    pub rate_limit: Duration,
    pub respect_robots_txt: bool,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            cookies: HashMap::new(),
            timeout: Duration::from_secs(30),
            retry_count: 3,
            retry_delay: Duration::from_secs(2),
            verify_ssl: true,
            user_agent_rotation: false,
            user_agents: Vec::new(),
            rate_limit: Duration::ZERO,
            respect_robots_txt: true,
        }
    }
}

impl RequesterConfig {
    /// Starts from the defaults and applies `SCRAPEKIT_*` environment variables.
    /// Durations are given in (fractional) seconds. Invalid values are reported
    /// and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(timeout) = env_secs("SCRAPEKIT_TIMEOUT") {
            config.timeout = timeout;
        }

        if let Ok(retry_str) = env::var("SCRAPEKIT_RETRY_COUNT") {
            if let Ok(retry_count) = retry_str.trim().parse::<u32>() {
                config.retry_count = retry_count;
            } else {
                tracing::warn!(
                    "Invalid SCRAPEKIT_RETRY_COUNT value '{}', using default {}",
                    retry_str,
                    config.retry_count
                );
            }
        }

        if let Some(retry_delay) = env_secs("SCRAPEKIT_RETRY_DELAY") {
            config.retry_delay = retry_delay;
        }

        if let Some(rate_limit) = env_secs("SCRAPEKIT_RATE_LIMIT") {
            config.rate_limit = rate_limit;
        }

        if let Some(verify_ssl) = env_bool("SCRAPEKIT_VERIFY_SSL") {
            config.verify_ssl = verify_ssl;
        }

        if let Some(rotation) = env_bool("SCRAPEKIT_USER_AGENT_ROTATION") {
            config.user_agent_rotation = rotation;
        }

        if let Some(respect) = env_bool("SCRAPEKIT_RESPECT_ROBOTS_TXT") {
            config.respect_robots_txt = respect;
        }

        config
    }

    /// Configured headers, with [`DEFAULT_USER_AGENT`] filled in when missing.
    pub fn session_headers(&self) -> HashMap<String, String> {
        let mut headers = self.headers.clone();
        if !headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("user-agent"))
        {
            headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
        }
        headers
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    let value = env::var(name).ok()?;
    match parse_secs(&value) {
        Some(duration) => Some(duration),
        None => {
            tracing::warn!("Invalid {} value '{}', using default", name, value);
            None
        }
    }
}

fn env_bool(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match parse_bool(&value) {
        Some(flag) => Some(flag),
        None => {
            tracing::warn!("Invalid {} value '{}', using default", name, value);
            None
        }
    }
}

pub(crate) fn parse_secs(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// Parses a non-negative, possibly fractional, number of seconds.
pub fn parse_duration_secs(value: &str) -> Result<Duration, String> {
    parse_secs(value).ok_or_else(|| format!("invalid duration '{}', expected seconds", value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
