/// An owned XML element: tag name, attributes in document order, and child
/// elements. Text content is not retained; instrument exports carry all of
/// their values in attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an element with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter, mostly useful in tests
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder-style child setter, mostly useful in tests
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the attribute `key`, if present
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the attribute `key` is present
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    /// All attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Direct children in document order
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the element has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// First direct child with the given tag
    pub fn find(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == tag)
    }

    /// All direct children with the given tag
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == tag)
    }

    /// Number of direct children with the given tag
    pub fn count(&self, tag: &str) -> usize {
        self.find_all(tag).count()
    }
}
