//! Content parsers behind a single [`Parser`] trait.
mod html;
mod json;
mod xml;

pub use html::HtmlParser;
pub use json::{JsonParser, PathSegment};
pub use xml::{XmlElement, XmlParser};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid XML: {0}")]
    Xml(String),
    #[error("Invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Json,
    Xml,
}

impl FromStr for ContentKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" | "html.parser" | "lxml" | "html5lib" => Ok(ContentKind::Html),
            "json" => Ok(ContentKind::Json),
            "xml" => Ok(ContentKind::Xml),
            _ => Err(ParseError::UnsupportedContentType(s.to_string())),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Html => write!(f, "html"),
            ContentKind::Json => write!(f, "json"),
            ContentKind::Xml => write!(f, "xml"),
        }
    }
}

/// Parsed content, one variant per content kind.
#[derive(Debug)]
pub enum Document {
    Html(scraper::Html),
    Json(serde_json::Value),
    Xml(XmlElement),
}

impl Document {
    pub fn kind(&self) -> ContentKind {
        match self {
            Document::Html(_) => ContentKind::Html,
            Document::Json(_) => ContentKind::Json,
            Document::Xml(_) => ContentKind::Xml,
        }
    }

    pub fn as_html(&self) -> Option<&scraper::Html> {
        match self {
            Document::Html(html) => Some(html),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Document::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Document::Xml(element) => Some(element),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Document::Json(value) => Some(value),
            _ => None,
        }
    }
}

pub trait Parser: Send + Sync {
    fn kind(&self) -> ContentKind;

    fn parse(&self, content: &str) -> Result<Document, ParseError>;
}

impl Parser for HtmlParser {
    fn kind(&self) -> ContentKind {
        ContentKind::Html
    }

    fn parse(&self, content: &str) -> Result<Document, ParseError> {
        Ok(Document::Html(self.parse_html(content)))
    }
}

impl Parser for JsonParser {
    fn kind(&self) -> ContentKind {
        ContentKind::Json
    }

    fn parse(&self, content: &str) -> Result<Document, ParseError> {
        Ok(Document::Json(self.parse_json(content)?))
    }
}

impl Parser for XmlParser {
    fn kind(&self) -> ContentKind {
        ContentKind::Xml
    }

    fn parse(&self, content: &str) -> Result<Document, ParseError> {
        Ok(Document::Xml(self.parse_xml(content)?))
    }
}

/// Builds the parser for a content type name such as `html`, `json` or `xml`.
/// BeautifulSoup-style names (`html.parser`, `lxml`, `html5lib`) select HTML.
pub fn create_parser(content_type: &str) -> Result<Box<dyn Parser>, ParseError> {
    Ok(match content_type.parse::<ContentKind>()? {
        ContentKind::Html => Box::new(HtmlParser),
        ContentKind::Json => Box::new(JsonParser),
        ContentKind::Xml => Box::new(XmlParser),
    })
}
