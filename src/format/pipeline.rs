//! Shared validation applied to every record before encoding.
//!
//! Each record goes through the same checks regardless of target format:
//!
//! 1. its `type` is known and the target format exports that kind
//!    (other kinds are dropped silently),
//! 2. its label is present and in the class map,
//! 3. its geometry parses (polygon vertex and value counts, bbox arity),
//! 4. its bounding box has positive width and height.
//!
//! Failures are warnings; the record is skipped and the export continues.

use std::path::Path;

use crate::format::document::ImageUnit;
use crate::format::traits::FormatWarning;
use crate::model::{
    Annotation, AnnotationRecord, BoundingBox, ClassMap, RecordError, Shape, ShapeKind,
};

/// A record that passed validation, in absolute pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRecord {
    pub label: String,
    /// Project class id of `label`.
    pub class_id: u32,
    pub shape: Shape,
    /// Bounding box of `shape`, never degenerate.
    pub bbox: BoundingBox,
    pub score: f64,
    pub track_id: i64,
}

/// An image with its validated records.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    /// Zero-based position of the unit in the export input.
    pub position: usize,
    pub image_path: String,
    /// Base name of `image_path`.
    pub file_name: String,
    /// Width and height, when known.
    pub dimensions: Option<(u32, u32)>,
    pub records: Vec<PreparedRecord>,
}

impl PreparedImage {
    /// One-based sequence number (COCO image id, MOT frame id).
    pub fn sequence_id(&self) -> usize {
        self.position + 1
    }

    /// `file_name` without its extension.
    pub fn stem(&self) -> String {
        crate::format::document::image_stem(&self.file_name)
    }

    /// Dimensions with missing values written as zero.
    pub fn dimensions_or_zero(&self) -> (u32, u32) {
        self.dimensions.unwrap_or((0, 0))
    }
}

/// Validated images plus the warnings raised while validating.
#[derive(Debug, Default)]
pub struct Prepared {
    pub images: Vec<PreparedImage>,
    pub warnings: Vec<FormatWarning>,
}

impl Prepared {
    pub fn record_count(&self) -> usize {
        self.images.iter().map(|i| i.records.len()).sum()
    }
}

/// Validate every unit for a target that exports the kinds `supports`
/// accepts.
pub fn prepare(
    units: &[ImageUnit],
    class_map: &ClassMap,
    supports: impl Fn(ShapeKind) -> bool,
) -> Prepared {
    let mut prepared = Prepared::default();

    for (position, unit) in units.iter().enumerate() {
        if !unit.has_image_path() {
            prepared
                .warnings
                .push(FormatWarning::warning("Skipping item with missing 'image_path'."));
            continue;
        }

        let mut records = Vec::with_capacity(unit.annotations.len());
        for record in &unit.annotations {
            match validate(record, class_map, &supports) {
                Ok(Some(r)) => records.push(r),
                Ok(None) => {}
                Err(e) => {
                    log::trace!("Rejected record in {}: {}", unit.image_path, e);
                    prepared.warnings.push(
                        FormatWarning::warning(format!("{} in {}. Skipping.", e, unit.image_path))
                            .with_image(Path::new(&unit.image_path)),
                    );
                }
            }
        }

        prepared.images.push(PreparedImage {
            position,
            image_path: unit.image_path.clone(),
            file_name: unit.file_name(),
            dimensions: unit.dimensions(),
            records,
        });
    }

    prepared
}

/// `Ok(None)` means the record's kind is not exported by the target.
fn validate(
    record: &AnnotationRecord,
    class_map: &ClassMap,
    supports: &impl Fn(ShapeKind) -> bool,
) -> Result<Option<PreparedRecord>, RecordError> {
    let kind_name = record.kind_name();
    let kind = ShapeKind::parse(&kind_name)
        .ok_or(RecordError::UnsupportedType { kind: kind_name })?;
    if !supports(kind) {
        return Ok(None);
    }

    let label = record.label().ok_or(RecordError::MissingLabel)?;
    let class_id = class_map
        .get(label)
        .ok_or_else(|| RecordError::UnknownLabel {
            label: label.to_string(),
        })?;

    let annotation = Annotation::from_record(record)?;
    let zero_area = || RecordError::ZeroArea {
        kind: match kind {
            ShapeKind::BBox => "bbox",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Keypoint => "keypoint set",
        },
        label: label.to_string(),
    };
    let bbox = annotation.shape.bounding_box().ok_or_else(zero_area)?;
    if bbox.is_degenerate() {
        return Err(zero_area());
    }

    Ok(Some(PreparedRecord {
        label: annotation.label,
        class_id,
        shape: annotation.shape,
        bbox,
        score: annotation.score,
        track_id: annotation.track_id,
    }))
}
