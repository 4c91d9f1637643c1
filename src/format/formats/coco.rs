//! COCO JSON format.
//!
//! Writes a single `annotations.json` holding `images`, `annotations` and
//! `categories`. Category ids are COCO's own: 1-based over the class labels
//! sorted alphabetically, whatever ids the project uses.

use std::collections::HashMap;

use serde::Serialize;

use crate::format::error::FormatError;
use crate::format::pipeline::{PreparedImage, PreparedRecord};
use crate::format::traits::{EncodedLabels, LabelEncoder};
use crate::model::{Category, ClassMap, Keypoint, Shape, ShapeKind, flatten, polygon_area, round2};

/// File written under `labels/`.
pub const COCO_FILE: &str = "annotations.json";

/// COCO JSON format.
///
/// Supports:
/// - Bounding boxes (with a rectangular segmentation)
/// - Polygons (segmentation, derived bbox, shoelace area)
/// - Keypoint sets (`keypoints` triplets and `num_keypoints`)
pub struct CocoFormat;

impl LabelEncoder for CocoFormat {
    fn id(&self) -> &'static str {
        "coco"
    }

    fn display_name(&self) -> &'static str {
        "COCO (JSON)"
    }

    fn supports(&self, _kind: ShapeKind) -> bool {
        true
    }

    fn encode(
        &self,
        images: &[PreparedImage],
        class_map: &ClassMap,
    ) -> Result<EncodedLabels, FormatError> {
        let categories = class_map.coco_categories();
        let category_ids: HashMap<&str, u32> =
            categories.iter().map(|c| (c.name.as_str(), c.id)).collect();

        let mut coco = CocoDataset {
            images: Vec::with_capacity(images.len()),
            annotations: Vec::new(),
            categories: categories.clone(),
        };

        let mut annotation_id = 1u64;
        for image in images {
            let image_id = image.sequence_id() as u64;
            let (width, height) = image.dimensions_or_zero();
            coco.images.push(CocoImage {
                id: image_id,
                file_name: image.file_name.clone(),
                width,
                height,
            });

            for record in &image.records {
                let Some(&category_id) = category_ids.get(record.label.as_str()) else {
                    continue;
                };
                coco.annotations
                    .push(convert_record(record, annotation_id, image_id, category_id));
                annotation_id += 1;
            }
        }

        let annotations_exported = coco.annotations.len();
        let json = serde_json::to_string_pretty(&coco)?;
        Ok(EncodedLabels::single(COCO_FILE, json, annotations_exported))
    }
}

fn convert_record(
    record: &PreparedRecord,
    id: u64,
    image_id: u64,
    category_id: u32,
) -> CocoAnnotation {
    let bbox = record.bbox;
    let mut annotation = CocoAnnotation {
        id,
        image_id,
        category_id,
        bbox: bbox.to_xywh().map(round2),
        segmentation: Vec::new(),
        area: round2(bbox.area()),
        iscrowd: 0,
        keypoints: None,
        num_keypoints: None,
    };

    match &record.shape {
        Shape::BBox(_) => {
            annotation.segmentation = vec![bbox.to_flat_ring()];
        }
        Shape::Polygon { points } => {
            let flat = flatten(points);
            annotation.area = round2(polygon_area(&flat));
            annotation.segmentation = vec![flat];
        }
        Shape::Keypoints { points, .. } => {
            annotation.keypoints = Some(keypoint_triplets(points));
            annotation.num_keypoints = Some(points.iter().filter(|k| k.confidence > 0.0).count());
        }
    }

    annotation
}

/// `[x, y, v]` per keypoint, `v = 2` (visible) when confidence is positive.
fn keypoint_triplets(points: &[Keypoint]) -> Vec<f64> {
    points
        .iter()
        .flat_map(|k| {
            let visibility = if k.confidence > 0.0 { 2.0 } else { 0.0 };
            [k.x, k.y, visibility]
        })
        .collect()
}

// COCO format structures

#[derive(Debug, Serialize)]
struct CocoDataset {
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
    categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u32,
    bbox: [f64; 4],
    segmentation: Vec<Vec<f64>>,
    area: f64,
    iscrowd: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    keypoints: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_keypoints: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_triplets_visibility() {
        let points = [Keypoint::new(1.0, 2.0, 0.8), Keypoint::new(3.0, 4.0, 0.0)];
        assert_eq!(
            keypoint_triplets(&points),
            vec![1.0, 2.0, 2.0, 3.0, 4.0, 0.0]
        );
    }

    #[test]
    fn test_format_metadata() {
        let format = CocoFormat;
        assert_eq!(format.id(), "coco");
        assert!(format.supports(ShapeKind::Polygon));
        assert!(format.supports(ShapeKind::Keypoint));
    }
}
