use super::*;

const NESTED_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<PVScan version="5.4.64.700" date="6/29/2021 1:42:13 PM" notes="a &amp; b">
  <SystemIDs SystemID="4A2B">
    <SystemID SystemID="4A2B-1" Description="Scanner" />
  </SystemIDs>
  <PVStateShard>
    <PVStateValue key="bitDepth" value="13" />
    <PVStateValue key="laserPower">
      <IndexedValue index="0" value="20" description="Imaging" />
    </PVStateValue>
  </PVStateShard>
</PVScan>"#;

#[test]
fn test_parse_nested_document() {
    let root = parse_str(NESTED_XML).unwrap();

    assert_eq!(root.name(), "PVScan");
    assert_eq!(root.attribute("version"), Some("5.4.64.700"));
    assert_eq!(root.len(), 2);

    let shard = root.find("PVStateShard").unwrap();
    assert_eq!(shard.count("PVStateValue"), 2);

    let laser = shard.find_all("PVStateValue").nth(1).unwrap();
    assert_eq!(laser.attribute("key"), Some("laserPower"));
    assert!(!laser.has_attribute("value"));
    assert_eq!(laser.children()[0].attribute("description"), Some("Imaging"));
}

#[test]
fn test_attribute_entities_unescaped() {
    let root = parse_str(NESTED_XML).unwrap();
    assert_eq!(root.attribute("notes"), Some("a & b"));
}

#[test]
fn test_attribute_order_preserved() {
    let root = parse_str(r#"<A z="1" a="2" m="3"/>"#).unwrap();
    let keys: Vec<_> = root.attributes().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
    assert!(root.is_empty());
}

#[test]
fn test_unclosed_element_is_error() {
    assert!(parse_str("<PVScan><Sequence>").is_err());
}

#[test]
fn test_empty_document_is_error() {
    let result = parse_str("<?xml version=\"1.0\"?>");
    assert!(matches!(result, Err(XmlTreeError::InvalidStructure(_))));
}

#[test]
fn test_mismatched_end_tag_is_error() {
    assert!(parse_str("<A><B></A></B>").is_err());
}

#[test]
fn test_builder_matches_parsed() {
    let parsed = parse_str(r#"<Frame index="1"><File channel="2"/></Frame>"#).unwrap();
    let built = XmlElement::new("Frame")
        .with_attribute("index", "1")
        .with_child(XmlElement::new("File").with_attribute("channel", "2"));
    assert_eq!(parsed, built);
}

#[test]
fn test_parse_file_missing_path() {
    let result = parse_file("/definitely/not/here.xml");
    assert!(matches!(result, Err(XmlTreeError::IoError(_))));
}

#[test]
fn test_nesting_depth_limit() {
    let nested = |depth: usize| format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));

    let deepest = parse_str(&nested(MAX_DEPTH)).unwrap();
    assert_eq!(deepest.name(), "a");

    assert!(matches!(
        parse_str(&nested(MAX_DEPTH + 1)),
        Err(XmlTreeError::InvalidStructure(_))
    ));
    assert!(matches!(
        parse_str(&format!("{}<b/>{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH))),
        Err(XmlTreeError::InvalidStructure(_))
    ));
    assert!(matches!(
        parse_str(&nested(100_000)),
        Err(XmlTreeError::InvalidStructure(_))
    ));
}
