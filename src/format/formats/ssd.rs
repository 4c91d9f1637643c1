//! SSD JSON format.
//!
//! A list with one entry per image: `{image, annotations: [{category,
//! bbox}]}`, boxes as corners rounded to two decimals.

use serde::Serialize;

use crate::format::error::FormatError;
use crate::format::pipeline::PreparedImage;
use crate::format::traits::{EncodedLabels, LabelEncoder};
use crate::model::{ClassMap, ShapeKind, round2};

/// File written under `labels/`.
pub const SSD_FILE: &str = "annotations.json";

/// SSD JSON format. Images without annotations are still listed.
pub struct SsdFormat;

#[derive(Debug, Serialize)]
struct SsdImage<'a> {
    image: &'a str,
    annotations: Vec<SsdObject<'a>>,
}

#[derive(Debug, Serialize)]
struct SsdObject<'a> {
    category: &'a str,
    bbox: [f64; 4],
}

impl LabelEncoder for SsdFormat {
    fn id(&self) -> &'static str {
        "ssd"
    }

    fn display_name(&self) -> &'static str {
        "SSD (JSON)"
    }

    fn supports(&self, kind: ShapeKind) -> bool {
        matches!(kind, ShapeKind::BBox | ShapeKind::Polygon)
    }

    fn encode(
        &self,
        images: &[PreparedImage],
        _class_map: &ClassMap,
    ) -> Result<EncodedLabels, FormatError> {
        let entries: Vec<SsdImage<'_>> = images
            .iter()
            .map(|image| SsdImage {
                image: &image.file_name,
                annotations: image
                    .records
                    .iter()
                    .map(|r| SsdObject {
                        category: &r.label,
                        bbox: r.bbox.to_corners().map(round2),
                    })
                    .collect(),
            })
            .collect();

        let count = entries.iter().map(|e| e.annotations.len()).sum();
        let json = serde_json::to_string_pretty(&entries)?;
        Ok(EncodedLabels::single(SSD_FILE, json, count))
    }
}
