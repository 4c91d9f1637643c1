//! YOLO TXT format.
//!
//! One text file per image, one line per object:
//! `class_id x_center y_center width height`, normalized to `[0, 1]` and
//! written with six decimals. Polygons are reduced to their bounding box.

use crate::format::error::FormatError;
use crate::format::pipeline::PreparedImage;
use crate::format::traits::{EncodedLabels, FormatWarning, LabelEncoder};
use crate::model::{BoundingBox, ClassMap, ShapeKind};

/// YOLO TXT format.
///
/// Class ids are the project's own. Images without dimensions cannot be
/// normalized and get no label file.
pub struct YoloFormat;

impl LabelEncoder for YoloFormat {
    fn id(&self) -> &'static str {
        "yolo"
    }

    fn display_name(&self) -> &'static str {
        "YOLO (TXT)"
    }

    fn supports(&self, kind: ShapeKind) -> bool {
        matches!(kind, ShapeKind::BBox | ShapeKind::Polygon)
    }

    fn encode(
        &self,
        images: &[PreparedImage],
        _class_map: &ClassMap,
    ) -> Result<EncodedLabels, FormatError> {
        let mut encoded = EncodedLabels::new();

        for image in images {
            let Some((width, height)) = image.dimensions else {
                encoded.warnings.push(
                    FormatWarning::warning(format!(
                        "Missing dimensions for {}. Skipping label generation.",
                        image.image_path
                    ))
                    .with_image(&image.image_path),
                );
                continue;
            };

            let lines: Vec<String> = image
                .records
                .iter()
                .map(|r| format_line(r.class_id, &r.bbox, width, height))
                .collect();

            encoded.annotations_exported += lines.len();
            encoded
                .files
                .insert(format!("{}.txt", image.stem()), lines.join("\n"));
        }

        Ok(encoded)
    }
}

/// Format one normalized label line.
pub fn format_line(class_id: u32, bbox: &BoundingBox, width: u32, height: u32) -> String {
    let (w, h) = (f64::from(width), f64::from(height));
    let x_center = (bbox.x_min + bbox.x_max) / 2.0 / w;
    let y_center = (bbox.y_min + bbox.y_max) / 2.0 / h;
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class_id,
        x_center,
        y_center,
        bbox.width() / w,
        bbox.height() / h
    )
}
