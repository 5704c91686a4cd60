use super::ParseError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

/// An owned XML element tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Text before the first child element, `None` when there is none.
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            text: None,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Elements reached by a slash-separated path of child tag names relative
    /// to this element. `.` stays on the current element and `*` matches any
    /// child.
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        path.split('/')
            .filter(|step| !step.is_empty())
            .fold(vec![self], |current, step| match step {
                "." => current,
                "*" => current
                    .into_iter()
                    .flat_map(|element| element.children.iter())
                    .collect(),
                name => current
                    .into_iter()
                    .flat_map(|element| element.children.iter())
                    .filter(|child| child.name == name)
                    .collect(),
            })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlParser;

impl XmlParser {
    pub fn parse_xml(&self, content: &str) -> Result<XmlElement, ParseError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    ensure_single_root(&root, &stack)?;
                    stack.push(start_element(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    ensure_single_root(&root, &stack)?;
                    let element = start_element(&e)?;
                    close_element(element, &mut stack, &mut root);
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ParseError::Xml("unexpected closing tag".to_string()))?;
                    close_element(element, &mut stack, &mut root);
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| ParseError::Xml(e.to_string()))?;
                    append_text(&mut stack, &text)?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    append_text(&mut stack, &text)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ParseError::Xml(format!(
                        "error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ParseError::Xml(format!(
                "unexpected end of input, <{}> is not closed",
                open.name
            )));
        }

        root.ok_or_else(|| ParseError::Xml("no root element".to_string()))
    }

    /// Trimmed text of every element at `path` below the root; elements
    /// without text give an empty string.
    pub fn extract_text(&self, content: &str, path: &str) -> Result<Vec<String>, ParseError> {
        let root = self.parse_xml(content)?;
        Ok(root
            .find_all(path)
            .into_iter()
            .map(|element| {
                element
                    .text
                    .as_deref()
                    .map(|text| text.trim().to_string())
                    .unwrap_or_default()
            })
            .collect())
    }
}

fn start_element(e: &BytesStart<'_>) -> Result<XmlElement, ParseError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let attributes = e
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::Xml(e.to_string()))?
                .to_string();
            Ok((key, value))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    Ok(XmlElement::new(name, attributes))
}

fn close_element(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn ensure_single_root(root: &Option<XmlElement>, stack: &[XmlElement]) -> Result<(), ParseError> {
    if root.is_some() && stack.is_empty() {
        return Err(ParseError::Xml("multiple root elements".to_string()));
    }
    Ok(())
}

fn append_text(stack: &mut [XmlElement], text: &str) -> Result<(), ParseError> {
    let Some(current) = stack.last_mut() else {
        return Err(ParseError::Xml(format!(
            "text outside of the root element: {:?}",
            text
        )));
    };

    // Only text ahead of the first child counts as the element's text.
    if current.children.is_empty() {
        current.text.get_or_insert_with(String::new).push_str(text);
    }
    Ok(())
}
