//! Field definitions shared by every image of a folder.

use serde::{Deserialize, Serialize};

/// Input kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free-form string.
    Text,
    /// Checkbox; values are JSON booleans.
    Boolean,
    /// One of [`Field::options`].
    Select,
}

/// One entry of the folder's field list, as the editor defines it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Key used in a box's `fields` map.
    pub key: String,
    /// Display name.
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Choices for [`FieldKind::Select`]; absent for other kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Contents of a folder's `fields.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSet {
    #[serde(default)]
    pub created_at: String,
    /// Whether box outlines are baked into the processed tier.
    #[serde(default = "default_draw_boxes")]
    pub draw_boxes_on_image: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

fn default_draw_boxes() -> bool {
    true
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            created_at: String::new(),
            draw_boxes_on_image: default_draw_boxes(),
            fields: Vec::new(),
        }
    }
}
