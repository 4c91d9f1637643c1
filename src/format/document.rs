//! Per-image annotation documents.
//!
//! One JSON document per image, keyed by the image's filename stem:
//!
//! ```json
//! {
//!   "image_path": "/data/images/frame_001.jpg",
//!   "image_width": 1920,
//!   "image_height": 1080,
//!   "annotations": [{ "label": "car", "type": "bbox", "points": [10, 20, 110, 220] }]
//! }
//! ```
//!
//! Coordinates inside a document are absolute pixels. Older documents are a
//! bare list of annotation records with no image metadata; those are still
//! readable through [`ImageDocument`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{Annotation, AnnotationRecord};

/// An image and its annotations in absolute pixel space.
///
/// This is both the persisted document and the unit the exporter consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageUnit {
    /// Path of the source image. Empty when the document does not name one.
    #[serde(default)]
    pub image_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,

    /// Records in insertion order.
    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
}

impl ImageUnit {
    /// Build a unit from absolute-space annotations.
    pub fn new(
        image_path: impl Into<String>,
        width: u32,
        height: u32,
        annotations: &[Annotation],
    ) -> Self {
        Self {
            image_path: image_path.into(),
            image_width: Some(width),
            image_height: Some(height),
            annotations: annotations.iter().map(Annotation::to_record).collect(),
        }
    }

    /// Both dimensions, when present and non-zero.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.image_width, self.image_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    pub fn has_image_path(&self) -> bool {
        !self.image_path.is_empty()
    }

    /// Base name of the image path (`"frame_001.jpg"`).
    pub fn file_name(&self) -> String {
        Path::new(&self.image_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A per-image document as found on disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImageDocument {
    /// Current form with image metadata.
    Unit(ImageUnit),
    /// Legacy form: a bare list of records.
    Legacy(Vec<AnnotationRecord>),
}

impl ImageDocument {
    /// Parse document text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The records of the document, whichever form it has.
    pub fn records(&self) -> &[AnnotationRecord] {
        match self {
            ImageDocument::Unit(unit) => &unit.annotations,
            ImageDocument::Legacy(records) => records,
        }
    }

    /// Convert into a unit. Legacy documents have no path or dimensions.
    pub fn into_unit(self) -> ImageUnit {
        match self {
            ImageDocument::Unit(unit) => unit,
            ImageDocument::Legacy(annotations) => ImageUnit {
                annotations,
                ..ImageUnit::default()
            },
        }
    }
}

/// Filename stem used to key per-image files (`"a.b.jpg"` -> `"a.b"`).
pub fn image_stem(image_filename: &str) -> String {
    Path::new(image_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| image_filename.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Shape};

    #[test]
    fn test_parse_current_form() {
        let doc = ImageDocument::parse(
            r#"{"image_path": "/x/a.jpg", "image_width": 640, "image_height": 480,
                "annotations": [{"label": "car", "type": "bbox", "points": [1, 2, 3, 4]}]}"#,
        )
        .unwrap();

        let ImageDocument::Unit(unit) = doc else {
            panic!("Expected unit");
        };
        assert_eq!(unit.dimensions(), Some((640, 480)));
        assert_eq!(unit.file_name(), "a.jpg");
        assert_eq!(unit.annotations.len(), 1);
    }

    #[test]
    fn test_parse_legacy_list() {
        let doc = ImageDocument::parse(
            r#"[{"label": "car", "type": "bbox", "points": [1, 2, 3, 4]}]"#,
        )
        .unwrap();
        assert!(matches!(doc, ImageDocument::Legacy(_)));
        assert_eq!(doc.records().len(), 1);

        let unit = doc.into_unit();
        assert!(!unit.has_image_path());
        assert_eq!(unit.dimensions(), None);
    }

    #[test]
    fn test_zero_dimension_is_missing() {
        let unit = ImageUnit {
            image_width: Some(0),
            image_height: Some(100),
            ..ImageUnit::default()
        };
        assert_eq!(unit.dimensions(), None);
    }

    #[test]
    fn test_serialized_field_order() {
        let ann = Annotation::new("car", Shape::BBox(BoundingBox::new(1.0, 2.0, 3.0, 4.0)));
        let unit = ImageUnit::new("a.jpg", 10, 20, &[ann]);
        let json = serde_json::to_string(&unit).unwrap();
        let prefix =
            r#"{"image_path":"a.jpg","image_width":10,"image_height":20,"annotations":["#;
        assert!(json.starts_with(prefix));
    }

    #[test]
    fn test_image_stem() {
        assert_eq!(image_stem("frame_001.jpg"), "frame_001");
        assert_eq!(image_stem("a.b.png"), "a.b");
        assert_eq!(image_stem("noext"), "noext");
    }
}
