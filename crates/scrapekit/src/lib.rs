//! Polite single-URL fetching and content parsing for small scrapers.
//!
//! This crate provides an HTTP requester that retries failed requests with
//! exponential backoff, spaces requests out with a rate limit, optionally rotates
//! the `User-Agent` header, and checks robots.txt before fetching. On top of it
//! sit HTML/JSON/XML parsers and a [`Scraper`](crate::scraper::Scraper) that composes
//! fetch, parse and a site-specific extraction step.
//!
//! # Features
//!
//! - Bounded retries with exponential backoff (`retry_delay * 2^attempt`)
//! - Minimum interval between consecutive requests
//! - Random `User-Agent` rotation from a pool of desktop browser signatures
//! - Per-origin robots.txt cache, failing open when robots.txt is unreachable
//! - HTML (CSS selectors), JSON (key/index paths) and XML (element paths) parsers
//!
//! # Usage
//!
//! ```rust,ignore
//! use scrapekit::config::RequesterConfig;
//! use scrapekit::http_client::Requester;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let requester = Requester::new(RequesterConfig {
//!         retry_count: 2,
//!         rate_limit: Duration::from_secs(1),
//!         ..Default::default()
//!     })?;
//!     let response = requester.get("https://your-target-site.com/").await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```
//!
//! # Failure model
//!
//! A request either returns a usable [`Response`](http_client::Response) or one
//! of two terminal errors:
//! - [`Error::RobotsDisallowed`](error::Error::RobotsDisallowed), raised before any attempt
//! - [`Error::RequestFailed`](error::Error::RequestFailed), raised once every retry is spent
//!
pub mod config;
pub mod error;
pub mod http_client;
pub mod parser;
pub mod rate_limiter;
pub mod robots;
pub mod scraper;
pub mod user_agent;

pub use config::RequesterConfig;
pub use error::{AttemptError, Error};
pub use http_client::{RequestOptions, Requester, Response};
pub use parser::{ContentKind, Document, ParseError, Parser, create_parser};
pub use crate::scraper::{ExtractError, Extractor, ScrapeError, Scraper};
