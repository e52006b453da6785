use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{XmlElement, XmlTreeError};

/// Deepest element nesting accepted
pub const MAX_DEPTH: usize = 256;

/// Parse an XML file into an owned element tree, returning the root element.
///
/// The file handle is scoped to this call and released before it returns,
/// whether or not parsing succeeds.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<XmlElement, XmlTreeError> {
    let path = path.as_ref();
    debug!("Parsing XML file {}", path.display());
    let file = File::open(path)?;
    parse_reader(BufReader::new(file))
}

/// Parse an in-memory XML document
pub fn parse_str(xml: &str) -> Result<XmlElement, XmlTreeError> {
    parse_reader(xml.as_bytes())
}

/// Parse an XML document from any buffered source
pub fn parse_reader<R: BufRead>(reader: R) -> Result<XmlElement, XmlTreeError> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                check_depth(&stack)?;
                let element = element_from_start(e, xml_reader.decoder())?;
                stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                check_depth(&stack)?;
                let element = element_from_start(e, xml_reader.decoder())?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| {
                    XmlTreeError::InvalidStructure("closing tag without opening tag".to_string())
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XmlTreeError::XmlError(e)),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(XmlTreeError::InvalidStructure(format!(
            "Unexpected EOF inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| XmlTreeError::InvalidStructure("document has no root element".to_string()))
}

fn check_depth(stack: &[XmlElement]) -> Result<(), XmlTreeError> {
    if stack.len() >= MAX_DEPTH {
        return Err(XmlTreeError::InvalidStructure(format!(
            "elements nested deeper than {} levels",
            MAX_DEPTH
        )));
    }
    Ok(())
}

/// Hand a completed element to its parent, or make it the document root
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlTreeError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(XmlTreeError::InvalidStructure(format!(
                "second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}

/// Build an element (without children) from a start or empty tag
fn element_from_start(e: &BytesStart, decoder: Decoder) -> Result<XmlElement, XmlTreeError> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| XmlTreeError::XmlError(quick_xml::Error::from(e)))?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.decode_and_unescape_value(decoder)?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}
