use clap::Parser;
use miette::{IntoDiagnostic, miette};
use scrapekit::config::{RequesterConfig, parse_duration_secs};
use scrapekit::http_client::{RequestOptions, Requester};
use scrapekit::parser::{ContentKind, HtmlParser, JsonParser, XmlParser};
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Fetches a single URL politely (retries, rate limit, robots.txt) and prints
/// the parsed content.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// The URL to fetch.
    #[clap(required = true)]
    url: String,
    /// How to parse the response body: html, json or xml.
    #[clap(short, long, default_value = "html")]
    parser: String,
    /// CSS selector (html) or element path (xml) to extract.
    #[clap(short, long)]
    select: Option<String>,
    /// Attribute to extract from elements matched by --select (html only).
    #[clap(short, long, requires = "select")]
    attr: Option<String>,
    /// Query parameter as NAME=VALUE. May be repeated.
    #[clap(short = 'q', long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,
    /// Extra request header as 'Name: value'. May be repeated.
    #[clap(short = 'H', long = "header", value_name = "HEADER")]
    headers: Vec<String>,
    /// Number of retries after the first failed attempt.
    #[clap(long)]
    retries: Option<u32>,
    /// Base delay (in seconds) for exponential backoff between retries.
    #[clap(long, value_parser = parse_duration_secs)]
    retry_delay: Option<Duration>,
    /// Per-attempt timeout in seconds.
    #[clap(short, long, value_parser = parse_duration_secs)]
    timeout: Option<Duration>,
    /// Minimum delay (in seconds) between consecutive requests.
    #[clap(long, value_parser = parse_duration_secs)]
    rate_limit: Option<Duration>,
    /// Pick a random desktop browser User-Agent for every request.
    #[clap(long)]
    rotate_user_agent: bool,
    /// Do not fetch or honor robots.txt.
    #[clap(long)]
    ignore_robots: bool,
    /// Skip TLS certificate verification.
    #[clap(short = 'k', long)]
    insecure: bool,
}

impl CliArgs {
    fn requester_config(&self) -> miette::Result<RequesterConfig> {
        let mut config = RequesterConfig::from_env();

        if let Some(retries) = self.retries {
            config.retry_count = retries;
        }
        if let Some(retry_delay) = self.retry_delay {
            config.retry_delay = retry_delay;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(rate_limit) = self.rate_limit {
            config.rate_limit = rate_limit;
        }
        if self.rotate_user_agent {
            config.user_agent_rotation = true;
        }
        if self.ignore_robots {
            config.respect_robots_txt = false;
        }
        if self.insecure {
            config.verify_ssl = false;
        }

        config.headers = self
            .headers
            .iter()
            .map(|header| {
                header
                    .split_once(':')
                    .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                    .ok_or_else(|| miette!("Invalid header '{}', expected 'Name: value'", header))
            })
            .collect::<miette::Result<HashMap<_, _>>>()?;

        Ok(config)
    }

    fn request_options(&self) -> miette::Result<RequestOptions> {
        self.params
            .iter()
            .try_fold(RequestOptions::default(), |options, param| {
                param
                    .split_once('=')
                    .map(|(name, value)| options.query(name, value))
                    .ok_or_else(|| miette!("Invalid parameter '{}', expected NAME=VALUE", param))
            })
    }
}

fn render(args: &CliArgs, kind: ContentKind, body: &str) -> miette::Result<String> {
    match (kind, args.select.as_deref()) {
        (ContentKind::Html, Some(selector)) => {
            let values = match args.attr.as_deref() {
                Some(attr) => HtmlParser.extract_attribute(body, selector, attr),
                None => HtmlParser.extract_text(body, selector),
            }
            .into_diagnostic()?;
            Ok(values.join("\n"))
        }
        (ContentKind::Html, None) => {
            let document = HtmlParser.parse_html(body);
            Ok(document
                .root_element()
                .text()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n"))
        }
        (ContentKind::Xml, Some(path)) => {
            Ok(XmlParser.extract_text(body, path).into_diagnostic()?.join("\n"))
        }
        (ContentKind::Xml, None) => {
            let root = XmlParser.parse_xml(body).into_diagnostic()?;
            serde_json::to_string_pretty(&root).into_diagnostic()
        }
        (ContentKind::Json, _) => {
            let value = JsonParser.parse_json(body).into_diagnostic()?;
            serde_json::to_string_pretty(&value).into_diagnostic()
        }
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let args = CliArgs::parse();

    let kind = args.parser.parse::<ContentKind>().into_diagnostic()?;
    let requester = Requester::new(args.requester_config()?).into_diagnostic()?;
    let options = args.request_options()?;

    tracing::info!("Fetching {} as {}", args.url, kind);

    let response = requester
        .get_with(&args.url, &[], &options)
        .await
        .into_diagnostic()?;
    tracing::info!(
        "Received HTTP {} ({} bytes) from {}",
        response.status(),
        response.text().len(),
        response.url()
    );

    let output = render(&args, kind, response.text())?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", output).into_diagnostic()?;
    handle.flush().into_diagnostic()?;

    Ok(())
}
