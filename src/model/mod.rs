//! Annotation data model: geometry, records and class maps.

mod annotation;
mod category;
mod shape;

pub use annotation::{
    Annotation, AnnotationRecord, DEFAULT_SCORE, RecordError, UNASSIGNED_TRACK_ID,
};
pub use category::{Category, ClassMap};
pub use shape::{
    BoundingBox, Keypoint, MIN_POLYGON_VALUES, MIN_POLYGON_VERTICES, Point, Shape, ShapeKind,
    bounding_box_of, flatten, pair, polygon_area, round2,
};
