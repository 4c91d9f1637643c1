//! Shape geometry and coordinate-space transforms.
//!
//! Shapes live in one of two coordinate spaces:
//!
//! - **Relative** (editor) space: every coordinate is a fraction of the image
//!   size in `[0, 1]`.
//! - **Absolute** (pixel) space: integer pixel coordinates in the source
//!   image. This is what gets persisted and exported.
//!
//! Conversion is `abs = round(rel * dimension)` and `rel = abs / dimension`,
//! so a save/load cycle only loses sub-pixel precision.

use serde::{Deserialize, Serialize};

/// A 2D vertex `(x, y)`.
pub type Point = (f64, f64);

/// Minimum number of vertices for an exportable polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Minimum number of flat coordinate values for an exportable polygon.
pub const MIN_POLYGON_VALUES: usize = MIN_POLYGON_VERTICES * 2;

/// Discriminant of a [`Shape`], as written in the `type` field of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned bounding box.
    BBox,
    /// Closed polygon.
    Polygon,
    /// Ordered keypoint set with a skeleton.
    Keypoint,
}

impl ShapeKind {
    /// The `type` string used in per-image documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::BBox => "bbox",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Keypoint => "keypoint",
        }
    }

    /// Parse a `type` string. Unknown types return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bbox" => Some(ShapeKind::BBox),
            "polygon" => Some(ShapeKind::Polygon),
            "keypoint" => Some(ShapeKind::Keypoint),
            _ => None,
        }
    }
}

/// Axis-aligned box stored as two corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    /// Create a box from its corners.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Create a box from a top-left corner and a size (adapter output form).
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// `[x_min, y_min, width, height]`.
    pub fn to_xywh(&self) -> [f64; 4] {
        [self.x_min, self.y_min, self.width(), self.height()]
    }

    /// `[x_min, y_min, x_max, y_max]`.
    pub fn to_corners(&self) -> [f64; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }

    /// Zero or negative extent on either axis.
    ///
    /// Strict `<= 0` on the raw values, shared by every export format.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Corners of the box as a closed ring, flattened.
    pub fn to_flat_ring(&self) -> Vec<f64> {
        vec![
            self.x_min, self.y_min, self.x_max, self.y_min, self.x_max, self.y_max, self.x_min,
            self.y_max,
        ]
    }
}

/// One joint of a keypoint set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }
}

/// Annotation geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned bounding box.
    BBox(BoundingBox),
    /// Polygon vertices in drawing order.
    Polygon { points: Vec<Point> },
    /// Keypoints whose index is the joint identity, plus skeleton edges
    /// indexing into `points`.
    Keypoints {
        points: Vec<Keypoint>,
        skeleton: Vec<(usize, usize)>,
    },
}

impl Shape {
    /// Discriminant of this shape.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::BBox(_) => ShapeKind::BBox,
            Shape::Polygon { .. } => ShapeKind::Polygon,
            Shape::Keypoints { .. } => ShapeKind::Keypoint,
        }
    }

    /// Bounding box enclosing the shape, `None` for an empty point list.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Shape::BBox(bbox) => Some(*bbox),
            Shape::Polygon { points } => bounding_box_of(points),
            Shape::Keypoints { points, .. } => {
                let pairs: Vec<Point> = points.iter().map(|k| (k.x, k.y)).collect();
                bounding_box_of(&pairs)
            }
        }
    }

    /// Convert relative coordinates to absolute pixels.
    pub fn to_absolute(&self, width: u32, height: u32) -> Shape {
        let (w, h) = (f64::from(width), f64::from(height));
        self.map_points(|x, y| ((x * w).round(), (y * h).round()))
    }

    /// Convert absolute pixels to relative coordinates.
    pub fn to_relative(&self, width: u32, height: u32) -> Shape {
        let (w, h) = (f64::from(width), f64::from(height));
        self.map_points(|x, y| (x / w, y / h))
    }

    fn map_points(&self, f: impl Fn(f64, f64) -> (f64, f64)) -> Shape {
        match self {
            Shape::BBox(b) => {
                let (x_min, y_min) = f(b.x_min, b.y_min);
                let (x_max, y_max) = f(b.x_max, b.y_max);
                Shape::BBox(BoundingBox::new(x_min, y_min, x_max, y_max))
            }
            Shape::Polygon { points } => Shape::Polygon {
                points: points.iter().map(|&(x, y)| f(x, y)).collect(),
            },
            Shape::Keypoints { points, skeleton } => Shape::Keypoints {
                points: points
                    .iter()
                    .map(|k| {
                        let (x, y) = f(k.x, k.y);
                        Keypoint::new(x, y, k.confidence)
                    })
                    .collect(),
                skeleton: skeleton.clone(),
            },
        }
    }
}

/// Flatten `[(x, y), ...]` into `[x0, y0, x1, y1, ...]`.
pub fn flatten(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|&(x, y)| [x, y]).collect()
}

/// Inverse of [`flatten`]. Returns `None` for an odd number of values.
pub fn pair(flat: &[f64]) -> Option<Vec<Point>> {
    if flat.len() % 2 != 0 {
        return None;
    }
    Some(flat.chunks_exact(2).map(|c| (c[0], c[1])).collect())
}

/// Min/max box around a set of vertices.
pub fn bounding_box_of(points: &[Point]) -> Option<BoundingBox> {
    let (first, rest) = points.split_first()?;
    let init = BoundingBox::new(first.0, first.1, first.0, first.1);
    Some(rest.iter().fold(init, |b, &(x, y)| {
        BoundingBox::new(b.x_min.min(x), b.y_min.min(y), b.x_max.max(x), b.y_max.max(y))
    }))
}

/// Unsigned shoelace area of a flattened polygon.
///
/// Vertex indices wrap around, so the ring does not need to repeat its
/// first vertex. Fewer than three vertices yield `0.0`.
pub fn polygon_area(flat: &[f64]) -> f64 {
    let n = flat.len() / 2;
    if n < MIN_POLYGON_VERTICES {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += flat[2 * i] * flat[2 * j + 1] - flat[2 * j] * flat[2 * i + 1];
    }
    sum.abs() / 2.0
}

/// Round to two decimal places, the precision used by JSON exporters.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
