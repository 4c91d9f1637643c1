//! Annotation records.
//!
//! [`Annotation`] is the typed record used by the editor, the store and the
//! exporters. [`AnnotationRecord`] is its on-disk form inside a per-image
//! document. Every field is kept as raw JSON so that one hand-edited or
//! legacy record with a wrong value type cannot make the rest of its
//! document unreadable; records are validated once, by
//! [`Annotation::from_record`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::shape::{
    BoundingBox, Keypoint, MIN_POLYGON_VALUES, MIN_POLYGON_VERTICES, Point, Shape, ShapeKind,
    pair,
};

/// Track id of an object that is not linked across frames.
pub const UNASSIGNED_TRACK_ID: i64 = -1;

/// Score of a human-drawn annotation.
pub const DEFAULT_SCORE: f64 = 1.0;

/// Why a record could not be turned into an exportable annotation.
///
/// The `Display` text is used verbatim in export warnings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Record has no label or an empty one.
    #[error("Annotation with missing 'label'")]
    MissingLabel,

    /// Label is not part of the project's class map.
    #[error("Label '{label}' not in class map")]
    UnknownLabel { label: String },

    /// `type` is absent or not one of bbox/polygon/keypoint.
    #[error("Unsupported annotation type '{kind}'")]
    UnsupportedType { kind: String },

    /// Polygon has fewer than three vertices before flattening.
    #[error("Malformed polygon with < 3 points")]
    TooFewPoints,

    /// Polygon has fewer than six values after flattening.
    #[error("Malformed polygon with < 6 values")]
    TooFewValues,

    /// Polygon point list is ragged or non-numeric.
    #[error("Malformed polygon points for '{label}'")]
    MalformedPolygon { label: String },

    /// Bounding box is not exactly four numbers.
    #[error("Malformed bbox for '{label}'")]
    MalformedBBox { label: String },

    /// Keypoint list is empty, ragged, or its skeleton is out of range.
    #[error("Malformed keypoints for '{label}'")]
    MalformedKeypoints { label: String },

    /// A metadata field (`label`, `track_id`, `score`, `pinned`) has the
    /// wrong JSON type.
    #[error("Invalid '{field}' for '{label}'")]
    InvalidField { field: &'static str, label: String },

    /// Derived bounding box has non-positive width or height.
    #[error("Zero-area {kind} for '{label}'")]
    ZeroArea { kind: &'static str, label: String },
}

/// A typed annotation on one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Class label. May be empty while the user is still drawing.
    pub label: String,
    /// Geometry, in whichever coordinate space the owner works in.
    pub shape: Shape,
    /// Identity across frames, [`UNASSIGNED_TRACK_ID`] when unlinked.
    pub track_id: i64,
    /// Confidence in `[0, 1]`.
    pub score: f64,
    /// Pinned annotations cannot be dragged in the editor.
    pub pinned: bool,
}

impl Annotation {
    /// Create a human-drawn annotation with default metadata.
    pub fn new(label: impl Into<String>, shape: Shape) -> Self {
        Self {
            label: label.into(),
            shape,
            track_id: UNASSIGNED_TRACK_ID,
            score: DEFAULT_SCORE,
            pinned: false,
        }
    }

    /// Set the track id.
    pub fn with_track_id(mut self, track_id: i64) -> Self {
        self.track_id = track_id;
        self
    }

    /// Set the confidence score, clamped to `[0, 1]`.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score.clamp(0.0, 1.0);
        self
    }

    /// Set the pinned state.
    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Whether the annotation has a track id.
    pub fn has_track(&self) -> bool {
        self.track_id != UNASSIGNED_TRACK_ID
    }

    /// Copy with the shape converted to absolute pixels.
    pub fn to_absolute(&self, width: u32, height: u32) -> Self {
        Self {
            shape: self.shape.to_absolute(width, height),
            ..self.clone()
        }
    }

    /// Copy with the shape converted to relative coordinates.
    pub fn to_relative(&self, width: u32, height: u32) -> Self {
        Self {
            shape: self.shape.to_relative(width, height),
            ..self.clone()
        }
    }

    /// Validate an on-disk record.
    ///
    /// Missing metadata falls back to defaults. Labels are not checked
    /// against a class map here; that happens at export time.
    ///
    /// A bbox given only as `coords` is read as `[x, y, width, height]`.
    /// Scores are clamped to `[0, 1]`.
    pub fn from_record(record: &AnnotationRecord) -> Result<Self, RecordError> {
        let kind_name = record.kind_name();
        let kind = ShapeKind::parse(&kind_name)
            .ok_or(RecordError::UnsupportedType { kind: kind_name })?;

        let label = match present(&record.label) {
            None => String::new(),
            Some(Value::String(label)) => label.clone(),
            Some(_) => {
                return Err(RecordError::InvalidField {
                    field: "label",
                    label: String::new(),
                });
            }
        };
        let invalid = |field| RecordError::InvalidField {
            field,
            label: label.clone(),
        };

        let track_id = match present(&record.track_id) {
            None => UNASSIGNED_TRACK_ID,
            Some(value) => value.as_i64().ok_or_else(|| invalid("track_id"))?,
        };
        let score = match present(&record.score) {
            None => DEFAULT_SCORE,
            Some(value) => value.as_f64().ok_or_else(|| invalid("score"))?.clamp(0.0, 1.0),
        };
        let pinned = match present(&record.pinned) {
            None => false,
            Some(value) => value.as_bool().ok_or_else(|| invalid("pinned"))?,
        };

        let coords = present(&record.coords).filter(|_| record.points.is_null());
        let points = coords.unwrap_or(&record.points);
        let shape = match kind {
            ShapeKind::BBox if coords.is_some() => parse_xywh(points, &label)?,
            ShapeKind::BBox => parse_bbox(points, &label)?,
            ShapeKind::Polygon => parse_polygon(points, &label)?,
            ShapeKind::Keypoint => parse_keypoints(points, record.skeleton.as_ref(), &label)?,
        };

        Ok(Self {
            label,
            shape,
            track_id,
            score,
            pinned,
        })
    }

    /// Convert to the on-disk record form.
    pub fn to_record(&self) -> AnnotationRecord {
        let (points, skeleton) = match &self.shape {
            Shape::BBox(b) => (number_array(&b.to_corners()), None),
            Shape::Polygon { points } => (
                Value::Array(points.iter().map(|&(x, y)| number_array(&[x, y])).collect()),
                None,
            ),
            Shape::Keypoints { points, skeleton } => (
                Value::Array(
                    points
                        .iter()
                        .map(|k| number_array(&[k.x, k.y, k.confidence]))
                        .collect(),
                ),
                Some(Value::Array(
                    skeleton
                        .iter()
                        .map(|&(a, b)| Value::Array(vec![a.into(), b.into()]))
                        .collect(),
                )),
            ),
        };

        AnnotationRecord {
            label: Some(self.label.clone().into()),
            kind: Some(self.kind().as_str().into()),
            points,
            coords: None,
            skeleton,
            track_id: self.has_track().then(|| self.track_id.into()),
            score: Some(self.score.into()),
            pinned: Some(self.pinned.into()),
        }
    }
}

impl TryFrom<&AnnotationRecord> for Annotation {
    type Error = RecordError;

    fn try_from(record: &AnnotationRecord) -> Result<Self, Self::Error> {
        Annotation::from_record(record)
    }
}

/// On-disk form of an annotation inside a per-image document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,

    /// `"bbox"`, `"polygon"` or `"keypoint"`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,

    /// bbox: `[x_min, y_min, x_max, y_max]`; polygon: `[[x, y], ...]` or a
    /// flat list; keypoint: `[[x, y, confidence], ...]`.
    #[serde(default)]
    pub points: Value,

    /// Editor and adapter form, used when `points` is absent. Same layout as
    /// `points` except a bbox is `[x, y, width, height]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<Value>,
}

impl AnnotationRecord {
    /// Label, treating an empty string or a non-string value as missing.
    pub fn label(&self) -> Option<&str> {
        self.label
            .as_ref()
            .and_then(Value::as_str)
            .filter(|l| !l.is_empty())
    }

    /// The `type` field as text, empty when absent.
    pub fn kind_name(&self) -> String {
        match present(&self.kind) {
            None => String::new(),
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// A field that is set and not `null`.
fn present(field: &Option<Value>) -> Option<&Value> {
    field.as_ref().filter(|v| !v.is_null())
}

/// Whole numbers are written as JSON integers so pixel files stay readable.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

fn number_array(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|&v| number(v)).collect())
}

fn numbers(value: &Value) -> Option<Vec<f64>> {
    value.as_array()?.iter().map(Value::as_f64).collect()
}

fn parse_bbox(points: &Value, label: &str) -> Result<Shape, RecordError> {
    match numbers(points).as_deref() {
        Some(&[x_min, y_min, x_max, y_max]) => {
            Ok(Shape::BBox(BoundingBox::new(x_min, y_min, x_max, y_max)))
        }
        _ => Err(RecordError::MalformedBBox {
            label: label.to_string(),
        }),
    }
}

fn parse_xywh(coords: &Value, label: &str) -> Result<Shape, RecordError> {
    match numbers(coords).as_deref() {
        Some(&[x, y, width, height]) => {
            Ok(Shape::BBox(BoundingBox::from_xywh(x, y, width, height)))
        }
        _ => Err(RecordError::MalformedBBox {
            label: label.to_string(),
        }),
    }
}

fn parse_polygon(points: &Value, label: &str) -> Result<Shape, RecordError> {
    let malformed = || RecordError::MalformedPolygon {
        label: label.to_string(),
    };

    let items = points.as_array().ok_or_else(malformed)?;
    if items.len() < MIN_POLYGON_VERTICES {
        return Err(RecordError::TooFewPoints);
    }

    let flat: Vec<f64> = if items[0].is_array() {
        let mut flat = Vec::with_capacity(items.len() * 2);
        for item in items {
            match numbers(item).as_deref() {
                Some(&[x, y]) => flat.extend([x, y]),
                _ => return Err(malformed()),
            }
        }
        flat
    } else {
        numbers(points).ok_or_else(malformed)?
    };

    if flat.len() < MIN_POLYGON_VALUES {
        return Err(RecordError::TooFewValues);
    }
    let points: Vec<Point> = pair(&flat).ok_or_else(malformed)?;
    Ok(Shape::Polygon { points })
}

fn parse_keypoints(
    points: &Value,
    skeleton: Option<&Value>,
    label: &str,
) -> Result<Shape, RecordError> {
    let malformed = || RecordError::MalformedKeypoints {
        label: label.to_string(),
    };

    let items = points.as_array().filter(|a| !a.is_empty()).ok_or_else(malformed)?;
    let mut keypoints = Vec::with_capacity(items.len());
    for item in items {
        let keypoint = match numbers(item).as_deref() {
            Some(&[x, y]) => Keypoint::new(x, y, DEFAULT_SCORE),
            Some(&[x, y, confidence]) => Keypoint::new(x, y, confidence),
            _ => return Err(malformed()),
        };
        keypoints.push(keypoint);
    }

    let mut edges = Vec::new();
    if let Some(skeleton) = skeleton.filter(|s| !s.is_null()) {
        for edge in skeleton.as_array().ok_or_else(malformed)? {
            let pair = edge
                .as_array()
                .filter(|e| e.len() == 2)
                .and_then(|e| Some((e[0].as_u64()? as usize, e[1].as_u64()? as usize)))
                .ok_or_else(malformed)?;
            if pair.0 >= keypoints.len() || pair.1 >= keypoints.len() {
                return Err(malformed());
            }
            edges.push(pair);
        }
    }

    Ok(Shape::Keypoints {
        points: keypoints,
        skeleton: edges,
    })
}
