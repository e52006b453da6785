//! Canonical field names for PrairieView elements and keys

use super::PrairieViewError;
use crate::xml::XmlElement;

/// Attributes that may name a value, highest priority first
pub const DESCRIPTOR_ATTRIBUTES: [&str; 3] = ["description", "subindex", "index"];

/// Normalize a source key or label to lower snake case.
///
/// Word boundaries are inserted at camel-case transitions (`bitDepth`),
/// after acronyms (`PMTGain` → `pmt_gain`), between digits and capitals
/// (`2P` → `2_p`) and between letters and digits (`pmt2` → `pmt_2`).
/// Hyphens become underscores and each run of whitespace collapses to a
/// single underscore.
/// Applying it twice gives the same result as applying it once.
pub fn canonicalize(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut snake = String::with_capacity(raw.len() + 4);

    for (i, &cur) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let acronym_end = prev.is_ascii_uppercase()
                && cur.is_ascii_uppercase()
                && next.is_some_and(|c| c.is_ascii_lowercase());
            let boundary = acronym_end
                || (prev.is_ascii_lowercase() && cur.is_ascii_uppercase())
                || (prev.is_ascii_digit() && cur.is_ascii_uppercase())
                || (prev.is_ascii_alphabetic() && cur.is_ascii_digit());
            if boundary {
                snake.push('_');
            }
        }
        snake.push(if cur == '-' { '_' } else { cur });
    }

    snake
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Derive the canonical field name of a value-bearing element from its
/// `description`, `subindex` or `index` attribute (first present wins).
pub fn resolve_field_name(element: &XmlElement) -> Result<String, PrairieViewError> {
    DESCRIPTOR_ATTRIBUTES
        .iter()
        .find_map(|key| element.attribute(key))
        .map(canonicalize)
        .ok_or_else(|| PrairieViewError::MissingDescriptor {
            tag: element.name().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_camel_case_keys() {
        assert_eq!(canonicalize("bitDepth"), "bit_depth");
        assert_eq!(canonicalize("xYStageGridXIndex"), "x_y_stage_grid_x_index");
        assert_eq!(canonicalize("objectiveLensNA"), "objective_lens_na");
        assert_eq!(canonicalize("PMTGain"), "pmt_gain");
    }

    #[test]
    fn test_labels_with_spaces_and_digits() {
        assert_eq!(canonicalize("Z Focus"), "z_focus");
        assert_eq!(canonicalize("Bruker 2P Z"), "bruker_2_p_z");
        assert_eq!(canonicalize("PMT 2  Green"), "pmt_2_green");
        assert_eq!(canonicalize("XAxis"), "x_axis");
        assert_eq!(canonicalize("pre-amp"), "pre_amp");
    }

    #[test]
    fn test_differently_cased_keys_collapse() {
        assert_eq!(canonicalize("BitDepth"), canonicalize("bitDepth"));
        assert_eq!(canonicalize("bit depth"), canonicalize("bit_depth"));
    }

    #[test]
    fn test_resolver_priority() {
        let all = XmlElement::new("IndexedValue")
            .with_attribute("index", "0")
            .with_attribute("subindex", "Sub")
            .with_attribute("description", "Imaging Laser");
        assert_eq!(resolve_field_name(&all).unwrap(), "imaging_laser");

        let sub = XmlElement::new("SubindexedValue")
            .with_attribute("index", "0")
            .with_attribute("subindex", "YAxis");
        assert_eq!(resolve_field_name(&sub).unwrap(), "y_axis");

        let index_only = XmlElement::new("IndexedValue").with_attribute("index", "1");
        assert_eq!(resolve_field_name(&index_only).unwrap(), "1");
    }

    #[test]
    fn test_resolver_missing_descriptor() {
        let element = XmlElement::new("IndexedValue").with_attribute("value", "3.0");
        match resolve_field_name(&element) {
            Err(PrairieViewError::MissingDescriptor { tag }) => assert_eq!(tag, "IndexedValue"),
            other => panic!("expected MissingDescriptor, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_canonicalize_idempotent(raw in "[A-Za-z0-9 _-]{0,24}") {
            let once = canonicalize(&raw);
            prop_assert_eq!(canonicalize(&once), once);
        }

        #[test]
        fn prop_canonical_has_no_upper_or_space(raw in "[A-Za-z0-9 _-]{0,24}") {
            let canonical = canonicalize(&raw);
            prop_assert!(!canonical.chars().any(|c| c.is_uppercase() || c.is_whitespace()));
        }
    }
}
