//! Per-image label and its box-list invariants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BoxRecord, FieldValues, NormalizedRect, RegionBox};
use crate::transform::Rotation;

/// Errors from label edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("no box with id {0:?}")]
    BoxNotFound(String),
}

/// Everything recorded for one image: its boxes and display rotation.
///
/// After [`ImageLabel::normalize`] the box list is never empty, and it holds
/// either regions only or exactly one `ImageFields` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLabel {
    pub image_name: String,
    #[serde(default)]
    pub boxes: Vec<BoxRecord>,
    #[serde(default)]
    pub rotation: Rotation,
}

impl ImageLabel {
    /// A blank label: unrotated, one empty `ImageFields` record.
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            boxes: vec![BoxRecord::image_fields(FieldValues::new())],
            rotation: Rotation::None,
        }
    }

    /// Build a label and normalize it.
    pub fn with_boxes(
        image_name: impl Into<String>,
        boxes: Vec<BoxRecord>,
        rotation: Rotation,
    ) -> Self {
        let mut label = Self {
            image_name: image_name.into(),
            boxes,
            rotation,
        };
        label.normalize();
        label
    }

    /// Apply the save-time rules.
    ///
    /// Region rects are clamped into the frame. If any region exists,
    /// `ImageFields` records are dropped; otherwise exactly one is kept (the
    /// first, or an empty one if there was none).
    pub fn normalize(&mut self) {
        for record in &mut self.boxes {
            if let BoxRecord::Region(region) = record {
                region.rect = region.rect.clamped();
            }
        }

        if self.boxes.iter().any(BoxRecord::is_region) {
            self.boxes.retain(BoxRecord::is_region);
        } else {
            let fields = self
                .boxes
                .first()
                .map(|record| record.fields().clone())
                .unwrap_or_default();
            self.boxes = vec![BoxRecord::image_fields(fields)];
        }
    }

    /// Whether the box-list invariants hold.
    pub fn is_normalized(&self) -> bool {
        let regions = self.boxes.iter().filter(|record| record.is_region()).count();
        match regions {
            0 => self.boxes.len() == 1,
            n => n == self.boxes.len(),
        }
    }

    /// Real boxes in list order.
    pub fn regions(&self) -> impl Iterator<Item = &RegionBox> {
        self.boxes.iter().filter_map(BoxRecord::as_region)
    }

    /// Rects of the real boxes, for the overlay.
    pub fn region_rects(&self) -> Vec<NormalizedRect> {
        self.regions().map(|region| region.rect).collect()
    }

    /// Fields of the first record, empty if there is none.
    pub fn first_fields(&self) -> FieldValues {
        self.boxes
            .first()
            .map(|record| record.fields().clone())
            .unwrap_or_default()
    }

    /// Delete a region by id.
    ///
    /// Deleting the last region leaves an `ImageFields` record carrying the
    /// removed region's fields, so the list never becomes empty.
    ///
    /// # Errors
    ///
    /// Returns `LabelError::BoxNotFound` if no region has that id.
    pub fn remove_box(&mut self, id: &str) -> Result<RegionBox, LabelError> {
        let index = self
            .boxes
            .iter()
            .position(|record| record.as_region().is_some_and(|region| region.id == id))
            .ok_or_else(|| LabelError::BoxNotFound(id.to_string()))?;

        let BoxRecord::Region(removed) = self.boxes.remove(index) else {
            return Err(LabelError::BoxNotFound(id.to_string()));
        };

        if !self.boxes.iter().any(BoxRecord::is_region) {
            self.boxes = vec![BoxRecord::image_fields(removed.fields.clone())];
        }
        Ok(removed)
    }

    /// The label after rotating the image by `delta_degrees`.
    ///
    /// Region geometry would no longer match the rotated frame, so every
    /// region is dropped. Only the first record's fields are carried over,
    /// as image-level fields; other boxes' fields are lost.
    pub fn rotated(&self, delta_degrees: i64) -> Self {
        Self {
            image_name: self.image_name.clone(),
            boxes: vec![BoxRecord::image_fields(self.first_fields())],
            rotation: self.rotation.rotate_by(delta_degrees),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::FieldValue;

    fn region(id: &str) -> BoxRecord {
        RegionBox::new(id, NormalizedRect::new(0.1, 0.1, 0.2, 0.2))
            .with_field("type", "X")
            .into()
    }

    #[test]
    fn new_label_has_one_image_fields_record() {
        let label = ImageLabel::new("a.jpg");
        assert_eq!(label.boxes.len(), 1);
        assert!(!label.boxes[0].is_region());
        assert!(label.is_normalized());
    }

    #[test]
    fn normalize_fills_empty_box_list() {
        let label = ImageLabel::with_boxes("a.jpg", vec![], Rotation::None);
        assert_eq!(label.boxes, vec![BoxRecord::image_fields(FieldValues::new())]);
    }

    #[test]
    fn normalize_drops_image_fields_next_to_regions() {
        let boxes = vec![
            BoxRecord::image_fields(FieldValues::new()),
            region("b1"),
        ];
        let label = ImageLabel::with_boxes("a.jpg", boxes, Rotation::None);
        assert_eq!(label.boxes.len(), 1);
        assert!(label.boxes[0].is_region());
    }

    #[test]
    fn normalize_keeps_first_of_several_image_fields() {
        let mut first = FieldValues::new();
        first.insert("k".into(), FieldValue::from("1"));
        let boxes = vec![
            BoxRecord::image_fields(first.clone()),
            BoxRecord::image_fields(FieldValues::new()),
        ];
        let label = ImageLabel::with_boxes("a.jpg", boxes, Rotation::None);
        assert_eq!(label.boxes, vec![BoxRecord::image_fields(first)]);
    }

    #[test]
    fn normalize_clamps_regions() {
        let boxes = vec![RegionBox::new("b", NormalizedRect::new(0.9, 0.9, 0.5, 0.5)).into()];
        let label = ImageLabel::with_boxes("a.jpg", boxes, Rotation::None);
        assert!(label.regions().all(|r| r.rect.is_within_frame()));
    }

    #[test]
    fn remove_box_keeps_other_regions() {
        let mut label =
            ImageLabel::with_boxes("a.jpg", vec![region("b1"), region("b2")], Rotation::None);
        let removed = label.remove_box("b1").unwrap();

        assert_eq!(removed.id, "b1");
        assert_eq!(label.regions().count(), 1);
        assert!(label.is_normalized());
    }

    #[test]
    fn removing_last_region_keeps_its_fields() {
        let mut label = ImageLabel::with_boxes("a.jpg", vec![region("only")], Rotation::Cw90);
        label.remove_box("only").unwrap();

        assert_eq!(label.boxes.len(), 1);
        assert!(!label.boxes[0].is_region());
        assert_eq!(label.boxes[0].fields().get("type"), Some(&FieldValue::from("X")));
        assert_eq!(label.rotation, Rotation::Cw90);
    }

    #[test]
    fn remove_unknown_box_fails() {
        let mut label = ImageLabel::new("a.jpg");
        assert_eq!(
            label.remove_box("nope"),
            Err(LabelError::BoxNotFound("nope".to_string()))
        );
        assert!(label.is_normalized());
    }

    #[test]
    fn rotate_from_270_by_90_keeps_first_box_fields() {
        let label = ImageLabel::with_boxes("a.jpg", vec![region("b1"), region("b2")], Rotation::Cw270);
        let rotated = label.rotated(90);

        assert_eq!(rotated.rotation, Rotation::None);
        assert_eq!(rotated.boxes.len(), 1);
        assert!(!rotated.boxes[0].is_region());
        assert_eq!(rotated.boxes[0].fields().get("type"), Some(&FieldValue::from("X")));
    }

    #[test]
    fn rotate_drops_fields_of_later_boxes() {
        let first: BoxRecord = RegionBox::new("b1", NormalizedRect::default())
            .with_field("type", "A")
            .into();
        let second: BoxRecord = RegionBox::new("b2", NormalizedRect::default())
            .with_field("extra", true)
            .into();
        let label = ImageLabel::with_boxes("a.jpg", vec![first, second], Rotation::None);
        let rotated = label.rotated(-90);

        assert_eq!(rotated.rotation, Rotation::Cw270);
        assert_eq!(rotated.boxes[0].fields().len(), 1);
        assert!(rotated.boxes[0].fields().get("extra").is_none());
    }

    #[test]
    fn label_json_round_trip_keeps_rotation_as_number() {
        let label = ImageLabel::with_boxes("a.jpg", vec![region("b1")], Rotation::Cw180);
        let text = serde_json::to_string(&label).unwrap();
        assert!(text.contains("\"rotation\":180"));
        let parsed: ImageLabel = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, label);
    }

    #[test]
    fn label_json_uses_camel_case_image_name() {
        let text = serde_json::to_string(&ImageLabel::new("a.jpg")).unwrap();
        assert!(text.contains("\"imageName\":\"a.jpg\""));
        assert!(!text.contains("image_name"));

        let parsed: ImageLabel =
            serde_json::from_str(r#"{"imageName":"a.jpg","boxes":[],"rotation":0}"#).unwrap();
        assert_eq!(parsed.image_name, "a.jpg");
        assert!(parsed.boxes.is_empty());
        assert_eq!(parsed.rotation, Rotation::None);
    }
}
