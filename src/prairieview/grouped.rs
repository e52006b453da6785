//! Indexed and sub-indexed value groups
//!
//! PrairieView splits multi-valued settings across child elements instead of
//! one attribute:
//!
//! ```text
//! <PVStateValue key="laserPower">
//!   <IndexedValue index="0" value="20" description="Imaging" />
//!   <IndexedValue index="1" value="0" description="Uncaging" />
//! </PVStateValue>
//!
//! <PVStateValue key="positionCurrent">
//!   <SubindexedValues index="XAxis">
//!     <SubindexedValue subindex="0" value="-6523.55" />
//!   </SubindexedValues>
//!   <SubindexedValues index="ZAxis">
//!     <SubindexedValue subindex="0" value="-310.6" description="Z Focus" />
//!     <SubindexedValue subindex="1" value="0" description="Bruker 2P Z" />
//!   </SubindexedValues>
//! </PVStateValue>
//! ```
//!
//! The first becomes `laser_power = (imaging: 20, uncaging: 0)`, the second
//! `position_current = (x_axis: .., z_axis_z_focus: .., z_axis_bruker_2_p_z: ..)`.

use log::debug;
use serde::{Deserialize, Serialize};

use super::names::resolve_field_name;
use super::PrairieViewError;
use crate::xml::XmlElement;

/// Group name used when the parent element has no `key` attribute
pub const ANONYMOUS_GROUP: &str = "ANONYMOUS";

/// One named position within a [`GroupedValue`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    /// Canonical field name
    pub name: String,
    /// Parsed value
    pub value: f64,
}

/// An ordered tuple of named floats extracted from an indexed or sub-indexed
/// element group. Arity is whatever the source file contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedValue {
    name: String,
    values: Vec<NamedValue>,
}

impl GroupedValue {
    /// Create a group from already-parsed pairs
    pub fn new(name: impl Into<String>, values: Vec<NamedValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Group name (the parent's `key`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the group holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named position
    pub fn get(&self, field: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.name == field)
            .map(|v| v.value)
    }

    /// Value at a position
    pub fn at(&self, position: usize) -> Option<f64> {
        self.values.get(position).map(|v| v.value)
    }

    /// Values in document order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().map(|v| v.value)
    }

    /// Field names in document order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.name.as_str())
    }

    /// Named values in document order
    pub fn iter(&self) -> std::slice::Iter<'_, NamedValue> {
        self.values.iter()
    }
}

impl<'a> IntoIterator for &'a GroupedValue {
    type Item = &'a NamedValue;
    type IntoIter = std::slice::Iter<'a, NamedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

fn group_name(parent: &XmlElement) -> String {
    parent.attribute("key").unwrap_or(ANONYMOUS_GROUP).to_string()
}

/// Parse the `value` attribute of `element` as a float
fn parse_value(element: &XmlElement, group: &str, field: &str) -> Result<f64, PrairieViewError> {
    let raw = element
        .attribute("value")
        .ok_or_else(|| PrairieViewError::MissingAttribute {
            element: element.name().to_string(),
            attribute: "value".to_string(),
        })?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| PrairieViewError::MalformedValue {
            field: format!("{}.{}", group, field),
            value: raw.to_string(),
        })
}

/// Extract a group whose children each carry a `value` directly.
pub fn extract_indexed<'a, I>(
    parent: &XmlElement,
    children: I,
) -> Result<GroupedValue, PrairieViewError>
where
    I: IntoIterator<Item = &'a XmlElement>,
{
    let name = group_name(parent);
    let mut values = Vec::new();
    for child in children {
        let field = resolve_field_name(child)?;
        let value = parse_value(child, &name, &field)?;
        values.push(NamedValue { name: field, value });
    }
    Ok(GroupedValue::new(name, values))
}

/// Extract a group whose children hold one or more value-bearing grandchildren.
///
/// A child with a single grandchild contributes one value named after the
/// child. A child with several contributes one value per grandchild, named
/// `<child>_<grandchild>`, since grandchild labels repeat across children.
pub fn extract_subindexed<'a, I>(
    parent: &XmlElement,
    children: I,
) -> Result<GroupedValue, PrairieViewError>
where
    I: IntoIterator<Item = &'a XmlElement>,
{
    let name = group_name(parent);
    let mut values = Vec::new();
    for child in children {
        let child_name = resolve_field_name(child)?;
        match child.children() {
            [] => debug!("{}: <{}> '{}' has no values", name, child.name(), child_name),
            [only] => {
                let value = parse_value(only, &name, &child_name)?;
                values.push(NamedValue {
                    name: child_name,
                    value,
                });
            }
            grandchildren => {
                for grandchild in grandchildren {
                    let field = format!("{}_{}", child_name, resolve_field_name(grandchild)?);
                    let value = parse_value(grandchild, &name, &field)?;
                    values.push(NamedValue { name: field, value });
                }
            }
        }
    }
    Ok(GroupedValue::new(name, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    #[test]
    fn test_indexed_arity_and_names() {
        let parent = parse_str(
            r#"<PVStateValue key="laserPower">
                 <IndexedValue index="0" value="20" description="Imaging" />
                 <IndexedValue index="1" value="0.5" subindex="Uncaging Path" />
                 <IndexedValue index="2" value="-1e-3" />
               </PVStateValue>"#,
        )
        .unwrap();

        let group = extract_indexed(&parent, parent.children()).unwrap();
        assert_eq!(group.name(), "laserPower");
        assert_eq!(group.len(), 3);
        assert_eq!(
            group.field_names().collect::<Vec<_>>(),
            vec!["imaging", "uncaging_path", "2"]
        );
        assert_eq!(group.values().collect::<Vec<_>>(), vec![20.0, 0.5, -1e-3]);
        assert_eq!(group.get("imaging"), Some(20.0));
        assert_eq!(group.at(2), Some(-1e-3));
    }

    #[test]
    fn test_anonymous_group_name() {
        let parent = XmlElement::new("PVStateValue").with_child(
            XmlElement::new("IndexedValue")
                .with_attribute("index", "0")
                .with_attribute("value", "1"),
        );
        let group = extract_indexed(&parent, parent.children()).unwrap();
        assert_eq!(group.name(), ANONYMOUS_GROUP);
    }

    #[test]
    fn test_malformed_value_is_error() {
        let parent = XmlElement::new("PVStateValue").with_attribute("key", "pmtGain").with_child(
            XmlElement::new("IndexedValue")
                .with_attribute("index", "0")
                .with_attribute("value", "high"),
        );
        match extract_indexed(&parent, parent.children()) {
            Err(PrairieViewError::MalformedValue { field, value }) => {
                assert_eq!(field, "pmtGain.0");
                assert_eq!(value, "high");
            }
            other => panic!("expected MalformedValue, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_value_attribute_is_error() {
        let parent = XmlElement::new("PVStateValue")
            .with_child(XmlElement::new("IndexedValue").with_attribute("index", "0"));
        assert!(matches!(
            extract_indexed(&parent, parent.children()),
            Err(PrairieViewError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_subindexed_single_level_names() {
        let parent = parse_str(
            r#"<PVStateValue key="micronsPerPixel">
                 <SubindexedValues index="XAxis"><SubindexedValue subindex="0" value="1.1" /></SubindexedValues>
                 <SubindexedValues index="YAxis"><SubindexedValue subindex="0" value="1.2" /></SubindexedValues>
               </PVStateValue>"#,
        )
        .unwrap();

        let group = extract_subindexed(&parent, parent.children()).unwrap();
        assert_eq!(group.field_names().collect::<Vec<_>>(), vec!["x_axis", "y_axis"]);
        assert_eq!(group.values().collect::<Vec<_>>(), vec![1.1, 1.2]);
    }

    #[test]
    fn test_subindexed_two_level_names_do_not_collide() {
        let parent = parse_str(
            r#"<PVStateValue key="positionCurrent">
                 <SubindexedValues index="XAxis"><SubindexedValue subindex="0" value="-6523.55" /></SubindexedValues>
                 <SubindexedValues index="ZAxis">
                   <SubindexedValue subindex="0" value="-310.6" description="Z Focus" />
                   <SubindexedValue subindex="1" value="0" description="Bruker 2P Z" />
                 </SubindexedValues>
                 <SubindexedValues index="FocusDevice">
                   <SubindexedValue subindex="0" value="4" description="Z Focus" />
                   <SubindexedValue subindex="1" value="5" description="Bruker 2P Z" />
                 </SubindexedValues>
               </PVStateValue>"#,
        )
        .unwrap();

        let group = extract_subindexed(&parent, parent.children()).unwrap();
        let names: Vec<_> = group.field_names().collect();
        assert_eq!(
            names,
            vec![
                "x_axis",
                "z_axis_z_focus",
                "z_axis_bruker_2_p_z",
                "focus_device_z_focus",
                "focus_device_bruker_2_p_z",
            ]
        );
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
        assert_eq!(group.get("z_axis_z_focus"), Some(-310.6));
    }

    #[test]
    fn test_subindexed_child_without_descriptor() {
        let parent = XmlElement::new("PVStateValue").with_attribute("key", "minVoltage").with_child(
            XmlElement::new("SubindexedValues")
                .with_child(XmlElement::new("SubindexedValue").with_attribute("value", "1")),
        );
        assert!(matches!(
            extract_subindexed(&parent, parent.children()),
            Err(PrairieViewError::MissingDescriptor { .. })
        ));
    }
}
