//! GroundingDINO / OWL-ViT JSON formats.
//!
//! Both write `labels/annotations.json` with boxes as `[x_min, y_min,
//! x_max, y_max]` rounded to two decimals, in encounter order. Polygons are
//! reduced to their bounding box.

use serde::Serialize;

use crate::format::error::FormatError;
use crate::format::pipeline::{PreparedImage, PreparedRecord};
use crate::format::traits::{EncodedLabels, LabelEncoder};
use crate::model::{ClassMap, ShapeKind, round2};

/// File written under `labels/`.
pub const GROUNDING_DINO_FILE: &str = "annotations.json";

/// Strict GroundingDINO format: parallel `boxes`, `scores` and `labels`
/// arrays.
pub struct GroundingDinoFormat;

/// GroundingDINO / OWL-ViT list format: one `{bbox, score, label}` object
/// per annotation.
pub struct GroundingDinoListFormat;

#[derive(Debug, Default, Serialize)]
struct Detections {
    boxes: Vec<[f64; 4]>,
    scores: Vec<f64>,
    labels: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Detection {
    bbox: [f64; 4],
    score: f64,
    label: String,
}

fn supports_boxes(kind: ShapeKind) -> bool {
    matches!(kind, ShapeKind::BBox | ShapeKind::Polygon)
}

fn records(images: &[PreparedImage]) -> impl Iterator<Item = &PreparedRecord> {
    images.iter().flat_map(|i| i.records.iter())
}

fn rounded_corners(record: &PreparedRecord) -> [f64; 4] {
    record.bbox.to_corners().map(round2)
}

impl LabelEncoder for GroundingDinoFormat {
    fn id(&self) -> &'static str {
        "grounding_dino"
    }

    fn display_name(&self) -> &'static str {
        "GroundingDINO (JSON)"
    }

    fn supports(&self, kind: ShapeKind) -> bool {
        supports_boxes(kind)
    }

    fn encode(
        &self,
        images: &[PreparedImage],
        _class_map: &ClassMap,
    ) -> Result<EncodedLabels, FormatError> {
        let mut detections = Detections::default();
        for record in records(images) {
            detections.boxes.push(rounded_corners(record));
            detections.scores.push(record.score);
            detections.labels.push(record.label.clone());
        }

        let count = detections.boxes.len();
        let json = serde_json::to_string_pretty(&detections)?;
        Ok(EncodedLabels::single(GROUNDING_DINO_FILE, json, count))
    }
}

impl LabelEncoder for GroundingDinoListFormat {
    fn id(&self) -> &'static str {
        "grounding_dino_list"
    }

    fn display_name(&self) -> &'static str {
        "GroundingDINO / OWL-ViT (JSON list)"
    }

    fn supports(&self, kind: ShapeKind) -> bool {
        supports_boxes(kind)
    }

    fn encode(
        &self,
        images: &[PreparedImage],
        _class_map: &ClassMap,
    ) -> Result<EncodedLabels, FormatError> {
        let detections: Vec<Detection> = records(images)
            .map(|r| Detection {
                bbox: rounded_corners(r),
                score: r.score,
                label: r.label.clone(),
            })
            .collect();

        let json = serde_json::to_string_pretty(&detections)?;
        Ok(EncodedLabels::single(GROUNDING_DINO_FILE, json, detections.len()))
    }
}
