use crate::config::RequesterConfig;
use crate::error::{AttemptError, Error};
use crate::rate_limiter::RateLimiter;
use crate::robots::RobotsCache;
use crate::user_agent::UserAgentSelector;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// A fetched page. Nothing in the requester keeps a reference to it.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    text: String,
}

impl Response {
    async fn from_reqwest(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        // Decodes using the charset from Content-Type, falling back to UTF-8.
        let text = response.text().await?;
        Ok(Self {
            status,
            headers,
            url,
            text,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.text)
    }
}

/// Per-call overrides. Values set here win over the requester configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub verify_ssl: Option<bool>,
}

impl RequestOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = Some(verify_ssl);
        self
    }
}

// State shared by every request of one requester. Rotating the user agent,
// throttling and sending happen under one lock so that neither the rate limit
// nor a rotated header can leak between concurrent calls.
#[derive(Debug)]
struct Session {
    headers: HeaderMap,
    rate_limiter: RateLimiter,
}

/// HTTP client with retries, exponential backoff, rate limiting, user-agent
/// rotation and robots.txt checks.
#[derive(Debug)]
pub struct Requester {
    config: RequesterConfig,
    client: Client,
    // Same settings with TLS verification flipped, for per-call overrides.
    alternate_client: Client,
    cookie_jar: Arc<Jar>,
    session: Mutex<Session>,
    user_agents: UserAgentSelector,
    robots: RobotsCache,
}

impl Requester {
    pub fn new(config: RequesterConfig) -> Result<Self, Error> {
        let cookie_jar = Arc::new(Jar::default());
        let client = build_client(&config, &cookie_jar, config.verify_ssl)?;
        let alternate_client = build_client(&config, &cookie_jar, !config.verify_ssl)?;
        let headers = header_map(&config.session_headers())?;
        let user_agents = UserAgentSelector::with_pool(config.user_agent_rotation, &config.user_agents)
            .map_err(|e| Error::InvalidHeader {
                name: USER_AGENT.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            session: Mutex::new(Session {
                headers,
                rate_limiter: RateLimiter::new(config.rate_limit),
            }),
            robots: RobotsCache::new(config.respect_robots_txt),
            user_agents,
            cookie_jar,
            alternate_client,
            client,
            config,
        })
    }

    pub fn config(&self) -> &RequesterConfig {
        &self.config
    }

    pub fn robots(&self) -> &RobotsCache {
        &self.robots
    }

    /// Start time of the most recent attempt, if any.
    pub async fn last_request(&self) -> Option<Instant> {
        self.session.lock().await.rate_limiter.last_request()
    }

    /// `User-Agent` the next request sends unless rotation replaces it.
    pub async fn current_user_agent(&self) -> String {
        self.session
            .lock()
            .await
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("*")
            .to_string()
    }

    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.get_with(url, &[], &RequestOptions::default()).await
    }

    pub async fn get_with(
        &self,
        url: &str,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        self.execute(Method::GET, url, params, None, options).await
    }

    /// Sends `body` as JSON.
    pub async fn post<B: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Response, Error> {
        self.post_with(url, body, &RequestOptions::default()).await
    }

    pub async fn post_with<B: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, url, &[], Some(&body), options).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
        body: Option<&serde_json::Value>,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        let url = Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let extra_headers = header_map(&options.headers)?;
        let client = self.client_for(options);
        self.attach_cookies(&url);

        let user_agent = self.current_user_agent().await;
        if !self.robots.is_allowed(client, &url, &user_agent).await {
            tracing::warn!("robots.txt does not allow fetching {}", url);
            return Err(Error::RobotsDisallowed { url });
        }

        let query: Vec<(&str, &str)> = params
            .iter()
            .copied()
            .chain(options.query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .collect();
        let total_attempts = self.config.retry_count.saturating_add(1);
        let mut attempt = 0;

        loop {
            let request = client
                .request(method.clone(), url.clone())
                .headers(extra_headers.clone());
            let request = if query.is_empty() {
                request
            } else {
                request.query(&query)
            };
            let request = match body {
                Some(body) => request.json(body),
                None => request,
            };
            let request = match options.timeout {
                Some(timeout) => request.timeout(timeout),
                None => request,
            };

            match self.send(request, &method, &url).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}",
                        attempt + 1,
                        total_attempts,
                        e
                    );

                    if attempt < self.config.retry_count {
                        let delay = backoff_delay(self.config.retry_delay, attempt);
                        tracing::info!("Retrying {} in {:?}", url, delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    } else {
                        tracing::error!("Request to {} failed after {} attempts", url, total_attempts);
                        return Err(Error::RequestFailed {
                            url,
                            attempts: total_attempts,
                            source: e,
                        });
                    }
                }
            }
        }
    }

    // One attempt. Session headers go first so that per-call headers,
    // already on the builder, are not overwritten.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        method: &Method,
        url: &Url,
    ) -> Result<Response, AttemptError> {
        let response = {
            let mut session = self.session.lock().await;
            self.user_agents.apply(&mut session.headers);
            session.rate_limiter.throttle().await;

            let (client, request) = request.build_split();
            let mut request = request?;
            for (name, value) in session.headers.iter() {
                if !request.headers().contains_key(name) {
                    request.headers_mut().insert(name.clone(), value.clone());
                }
            }

            tracing::debug!("Requesting {} {}", method, url);
            client.execute(request).await?
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(AttemptError::HttpStatus { status });
        }

        Ok(Response::from_reqwest(response).await?)
    }

    fn client_for(&self, options: &RequestOptions) -> &Client {
        match options.verify_ssl {
            Some(verify) if verify != self.config.verify_ssl => &self.alternate_client,
            _ => &self.client,
        }
    }

    fn attach_cookies(&self, url: &Url) {
        for (name, value) in &self.config.cookies {
            self.cookie_jar
                .add_cookie_str(&format!("{}={}; Path=/", name, value), url);
        }
    }
}

/// Delay after failed attempt `attempt` (0-based): `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
}

fn build_client(config: &RequesterConfig, jar: &Arc<Jar>, verify_ssl: bool) -> Result<Client, Error> {
    Client::builder()
        .cookie_provider(Arc::clone(jar))
        .timeout(config.timeout)
        .danger_accept_invalid_certs(!verify_ssl)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(Error::ClientBuild)
}

fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, Error> {
    headers
        .iter()
        .map(|(name, value)| {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
            Ok((header_name, header_value))
        })
        .collect()
}
