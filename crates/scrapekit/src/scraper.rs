use crate::config::RequesterConfig;
use crate::error::Error;
use crate::http_client::{RequestOptions, Requester};
use crate::parser::{Document, ParseError, Parser, create_parser};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Unexpected document: {0}")]
    UnexpectedDocument(String),
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Request(#[from] Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),
}

/// Turns a parsed document into site-specific data.
pub trait Extractor {
    type Output;

    fn extract(&self, document: Document) -> Result<Self::Output, ExtractError>;
}

impl<F, T> Extractor for F
where
    F: Fn(Document) -> Result<T, ExtractError>,
{
    type Output = T;

    fn extract(&self, document: Document) -> Result<T, ExtractError> {
        self(document)
    }
}

/// Fetch, parse and extract for one target site.
pub struct Scraper<E> {
    requester: Requester,
    parser: Box<dyn Parser>,
    extractor: E,
}

impl<E: Extractor> Scraper<E> {
    pub fn new(requester: Requester, parser: Box<dyn Parser>, extractor: E) -> Self {
        Self {
            requester,
            parser,
            extractor,
        }
    }

    pub fn builder(extractor: E) -> ScraperBuilder<E> {
        ScraperBuilder {
            extractor,
            requester: None,
            requester_config: None,
            parser: None,
            parser_type: "html".to_string(),
        }
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    pub fn parser(&self) -> &dyn Parser {
        self.parser.as_ref()
    }

    /// Body text of `url`.
    pub async fn fetch(
        &self,
        url: &str,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<String, ScrapeError> {
        let response = self.requester.get_with(url, params, options).await?;
        Ok(response.into_text())
    }

    pub fn parse(&self, content: &str) -> Result<Document, ScrapeError> {
        Ok(self.parser.parse(content)?)
    }

    pub async fn scrape(
        &self,
        url: &str,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<E::Output, ScrapeError> {
        let content = self.fetch(url, params, options).await?;
        tracing::debug!("Parsing {} bytes from {} as {}", content.len(), url, self.parser.kind());
        let document = self.parse(&content)?;
        Ok(self.extractor.extract(document)?)
    }
}

pub struct ScraperBuilder<E> {
    extractor: E,
    requester: Option<Requester>,
    requester_config: Option<RequesterConfig>,
    parser: Option<Box<dyn Parser>>,
    parser_type: String,
}

impl<E: Extractor> ScraperBuilder<E> {
    /// Takes precedence over [`requester_config`](Self::requester_config).
    pub fn requester(mut self, requester: Requester) -> Self {
        self.requester = Some(requester);
        self
    }

    pub fn requester_config(mut self, config: RequesterConfig) -> Self {
        self.requester_config = Some(config);
        self
    }

    /// Takes precedence over [`parser_type`](Self::parser_type).
    pub fn parser(mut self, parser: Box<dyn Parser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Content type handed to [`create_parser`]. Defaults to `html`.
    pub fn parser_type(mut self, parser_type: impl Into<String>) -> Self {
        self.parser_type = parser_type.into();
        self
    }

    pub fn build(self) -> Result<Scraper<E>, ScrapeError> {
        let requester = match self.requester {
            Some(requester) => requester,
            None => Requester::new(self.requester_config.unwrap_or_default())?,
        };
        let parser = match self.parser {
            Some(parser) => parser,
            None => create_parser(&self.parser_type)?,
        };
        Ok(Scraper::new(requester, parser, self.extractor))
    }
}
