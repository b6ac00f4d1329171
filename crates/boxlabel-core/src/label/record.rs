//! Box records: real regions or image-level field values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::NormalizedRect;

/// A single field value entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Value of a [`FieldKind::Boolean`](super::FieldKind::Boolean) field.
    Flag(bool),
    /// Value of a text or select field.
    Text(String),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// Field values keyed by field key.
pub type FieldValues = BTreeMap<String, FieldValue>;

/// A user-drawn bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBox {
    /// Client-assigned id, unique within the image.
    pub id: String,
    /// Geometry, stored flat as `x`, `y`, `w`, `h`.
    #[serde(flatten)]
    pub rect: NormalizedRect,
    #[serde(default)]
    pub fields: FieldValues,
}

impl RegionBox {
    pub fn new(id: impl Into<String>, rect: NormalizedRect) -> Self {
        Self {
            id: id.into(),
            rect,
            fields: FieldValues::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// One entry of an image's box list.
///
/// `ImageFields` stands in for "no real box": it carries the values of
/// image-level fields and has no geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoxRecord {
    /// A real box with geometry.
    Region(RegionBox),
    /// Field values for the whole image.
    ImageFields {
        #[serde(default)]
        fields: FieldValues,
    },
}

impl BoxRecord {
    pub fn image_fields(fields: FieldValues) -> Self {
        BoxRecord::ImageFields { fields }
    }

    pub fn fields(&self) -> &FieldValues {
        match self {
            BoxRecord::Region(region) => &region.fields,
            BoxRecord::ImageFields { fields } => fields,
        }
    }

    pub fn as_region(&self) -> Option<&RegionBox> {
        match self {
            BoxRecord::Region(region) => Some(region),
            BoxRecord::ImageFields { .. } => None,
        }
    }

    pub fn is_region(&self) -> bool {
        matches!(self, BoxRecord::Region(_))
    }
}

impl From<RegionBox> for BoxRecord {
    fn from(region: RegionBox) -> Self {
        BoxRecord::Region(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn region_serializes_flat_with_kind_tag() {
        let region = RegionBox::new("box-1", NormalizedRect::new(0.1, 0.2, 0.3, 0.4))
            .with_field("type", "X")
            .with_field("occluded", true);
        let value = serde_json::to_value(BoxRecord::from(region)).unwrap();

        assert_eq!(
            value,
            json!({
                "kind": "region",
                "id": "box-1",
                "x": 0.1, "y": 0.2, "w": 0.3, "h": 0.4,
                "fields": { "occluded": true, "type": "X" }
            })
        );
    }

    #[test]
    fn image_fields_parse_without_geometry() {
        let record: BoxRecord =
            serde_json::from_value(json!({ "kind": "image_fields", "fields": { "ok": false } }))
                .unwrap();

        assert!(!record.is_region());
        assert_eq!(record.fields().get("ok"), Some(&FieldValue::Flag(false)));
    }

    #[test]
    fn region_parses_without_fields() {
        let record: BoxRecord = serde_json::from_value(
            json!({ "kind": "region", "id": "b", "x": 0.0, "y": 0.0, "w": 1.0, "h": 1.0 }),
        )
        .unwrap();

        let region = record.as_region().unwrap();
        assert_eq!(region.id, "b");
        assert!(region.fields.is_empty());
    }
}
