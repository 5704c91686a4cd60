use super::ParseError;
use scraper::{Html, Selector};

/// HTML parser. Parsing is lenient and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse_html(&self, content: &str) -> Html {
        Html::parse_document(content)
    }

    /// Trimmed text of every element matching `selector`.
    pub fn extract_text(&self, content: &str, selector: &str) -> Result<Vec<String>, ParseError> {
        let selector = parse_selector(selector)?;
        let document = self.parse_html(content);

        Ok(document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .collect())
    }

    /// Value of `attribute` on every matching element that has it.
    pub fn extract_attribute(
        &self,
        content: &str,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<String>, ParseError> {
        let selector = parse_selector(selector)?;
        let document = self.parse_html(content);

        Ok(document
            .select(&selector)
            .filter_map(|element| element.value().attr(attribute))
            .map(str::to_string)
            .collect())
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
