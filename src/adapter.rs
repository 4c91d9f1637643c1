//! Model catalog and the inference adapter contract.
//!
//! The catalog groups the supported models by annotation task. Each entry
//! names the drawing tool the editor should offer and, through
//! [`crate::format::resolve`], the label format its exports use.
//!
//! Adapters return annotations in relative coordinates. They never fail:
//! an image that cannot be processed yields an empty list and a warning in
//! the log. Callers look an adapter up by model name and pass it around
//! explicitly; there is no process-wide "current model".

use std::collections::BTreeMap;
use std::path::Path;

use crate::format::{ModelExport, resolve};
use crate::model::{Annotation, BoundingBox, Keypoint, Shape};

/// Drawing tool a model's output is edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    BBox,
    Polygon,
    /// Point/box prompts that produce polygons.
    Prompt,
    Keypoint,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::BBox => "bbox",
            Tool::Polygon => "polygon",
            Tool::Prompt => "prompt",
            Tool::Keypoint => "keypoint",
        }
    }
}

/// One model offered for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub tool: Tool,
    /// Produces per-object track ids.
    pub tracking: bool,
}

impl ModelInfo {
    const fn new(name: &'static str, tool: Tool) -> Self {
        Self {
            name,
            tool,
            tracking: false,
        }
    }

    const fn tracked(name: &'static str, tool: Tool) -> Self {
        Self {
            name,
            tool,
            tracking: true,
        }
    }

    /// Export target for this model's annotations.
    pub fn export(&self) -> Option<ModelExport> {
        resolve(self.name).ok()
    }
}

/// An annotation task and the models that serve it.
#[derive(Debug, Clone, Copy)]
pub struct Task {
    pub name: &'static str,
    pub description: &'static str,
    pub models: &'static [ModelInfo],
}

pub const TASKS: &[Task] = &[
    Task {
        name: "Bounding Box",
        description: "General Object Detection",
        models: &[
            ModelInfo::new("YOLOv8", Tool::BBox),
            ModelInfo::new("RetinaNet", Tool::BBox),
            ModelInfo::new("Faster R-CNN", Tool::BBox),
            ModelInfo::new("EfficientDet", Tool::BBox),
            ModelInfo::new("SSD", Tool::BBox),
            ModelInfo::new("GroundingDINO", Tool::BBox),
            ModelInfo::new("GroundingDINO / OWL-ViT", Tool::BBox),
        ],
    },
    Task {
        name: "Polygons/Mask",
        description: "Precise Shape & Differentiation",
        models: &[
            ModelInfo::new("Mask R-CNN", Tool::Polygon),
            ModelInfo::new("DeepLabv3+", Tool::Polygon),
            ModelInfo::new("U-Net", Tool::Polygon),
            ModelInfo::new("SegFormer", Tool::Polygon),
            ModelInfo::new("Segment Anything (SAM)", Tool::Prompt),
            ModelInfo::new("Detectron2", Tool::Polygon),
            ModelInfo::new("MMDetection", Tool::Polygon),
        ],
    },
    Task {
        name: "Keypoints",
        description: "Detect Object Structure & Landmarks",
        models: &[
            ModelInfo::new("OpenPose", Tool::Keypoint),
            ModelInfo::new("HRNet", Tool::Keypoint),
            ModelInfo::new("MediaPipe Pose", Tool::Keypoint),
            ModelInfo::tracked("PoseTrack", Tool::Keypoint),
        ],
    },
    Task {
        name: "Object IDs",
        description: "Track Objects Consistently Over Time",
        models: &[
            ModelInfo::tracked("DeepSORT", Tool::BBox),
            ModelInfo::tracked("ByteTrack", Tool::BBox),
            ModelInfo::tracked("BoT-SORT", Tool::BBox),
            ModelInfo::tracked("FairMOT", Tool::BBox),
            ModelInfo::tracked("CenterTrack", Tool::BBox),
            ModelInfo::tracked("TraDeS / QDTrack", Tool::BBox),
            ModelInfo::tracked("PoseTrack", Tool::BBox),
        ],
    },
];

/// Task names in catalog order.
pub fn tasks() -> impl Iterator<Item = &'static str> {
    TASKS.iter().map(|t| t.name)
}

/// Models for a task; empty for an unknown task.
pub fn models_for_task(task: &str) -> &'static [ModelInfo] {
    TASKS
        .iter()
        .find(|t| t.name == task)
        .map(|t| t.models)
        .unwrap_or(&[])
}

/// First catalog entry with this model name.
pub fn model_info(name: &str) -> Option<&'static ModelInfo> {
    TASKS
        .iter()
        .flat_map(|t| t.models.iter())
        .find(|m| m.name == name)
}

/// Options passed to an inference call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferParams {
    /// Free-text prompt for open-vocabulary models.
    pub text_prompt: Option<String>,
    /// Results scoring below this are dropped.
    pub min_score: f64,
}

/// Runs one model on one image.
pub trait ModelAdapter: Send + Sync {
    /// Catalog name of the model.
    fn name(&self) -> &str;

    /// Annotations for `image_path`, in relative coordinates.
    fn infer(&self, image_path: &Path, params: &InferParams) -> Vec<Annotation>;
}

/// Pixel frame the placeholder pose layout is drawn in.
const POSE_FRAME: (u32, u32) = (500, 400);

/// COCO-style 15-joint person layout, in [`POSE_FRAME`] pixels.
const POSE_LAYOUT: [(f64, f64, f64); 15] = [
    (250.0, 150.0, 0.9),
    (270.0, 145.0, 0.85),
    (240.0, 145.0, 0.88),
    (280.0, 180.0, 0.92),
    (230.0, 180.0, 0.91),
    (320.0, 250.0, 0.8),
    (200.0, 250.0, 0.79),
    (350.0, 320.0, 0.82),
    (180.0, 320.0, 0.81),
    (300.0, 100.0, 0.75),
    (220.0, 100.0, 0.76),
    (360.0, 80.0, 0.7),
    (170.0, 80.0, 0.69),
    (260.0, 240.0, 0.95),
    (260.0, 300.0, 0.94),
];

const POSE_SKELETON: [(usize, usize); 14] = [
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (5, 6),
    (5, 7),
    (7, 9),
    (6, 8),
    (8, 10),
    (5, 11),
    (6, 12),
    (11, 12),
    (11, 13),
    (12, 14),
];

/// Stand-in for a real model: returns a fixed result shaped by the model's
/// tool, so the editor and exporters can be exercised end to end.
#[derive(Debug, Clone)]
pub struct PlaceholderAdapter {
    info: ModelInfo,
}

impl PlaceholderAdapter {
    pub fn new(info: ModelInfo) -> Self {
        Self { info }
    }

    fn object_label(&self) -> String {
        format!("{}-Object", self.info.name)
    }

    fn boxes(&self) -> Vec<Annotation> {
        let label = self.object_label();
        if !self.info.tracking {
            let bbox = BoundingBox::from_xywh(0.1, 0.1, 0.4, 0.4);
            return vec![Annotation::new(label, Shape::BBox(bbox))];
        }
        [(1, 0.1), (2, 0.5)]
            .into_iter()
            .map(|(track_id, x)| {
                let bbox = BoundingBox::from_xywh(x, 0.2, 0.3, 0.4);
                Annotation::new(label.clone(), Shape::BBox(bbox)).with_track_id(track_id)
            })
            .collect()
    }

    fn polygon(&self) -> Vec<Annotation> {
        let points = vec![(0.1, 0.1), (0.1, 0.5), (0.5, 0.5), (0.5, 0.1)];
        vec![Annotation::new(self.object_label(), Shape::Polygon { points })]
    }

    fn pose(offset_x: f64) -> Annotation {
        let points = POSE_LAYOUT
            .iter()
            .map(|&(x, y, c)| Keypoint::new(x + offset_x, y, c))
            .collect();
        let shape = Shape::Keypoints {
            points,
            skeleton: POSE_SKELETON.to_vec(),
        };
        let (w, h) = POSE_FRAME;
        Annotation::new("person", shape).to_relative(w, h)
    }

    fn people(&self) -> Vec<Annotation> {
        if !self.info.tracking {
            return vec![Self::pose(0.0)];
        }
        vec![
            Self::pose(-100.0).with_track_id(1),
            Self::pose(100.0).with_track_id(2),
        ]
    }
}

impl ModelAdapter for PlaceholderAdapter {
    fn name(&self) -> &str {
        self.info.name
    }

    fn infer(&self, image_path: &Path, params: &InferParams) -> Vec<Annotation> {
        if !image_path.is_file() {
            log::warn!(
                "{}: image {:?} not found, no annotations produced",
                self.info.name,
                image_path
            );
            return Vec::new();
        }
        log::debug!("Running {} on {:?}", self.info.name, image_path);

        let annotations = match self.info.tool {
            Tool::BBox => self.boxes(),
            Tool::Polygon | Tool::Prompt => self.polygon(),
            Tool::Keypoint => self.people(),
        };
        annotations
            .into_iter()
            .filter(|a| a.score >= params.min_score)
            .collect()
    }
}

/// Adapters keyed by model name.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Box<dyn ModelAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with a placeholder adapter for every catalog model.
    ///
    /// A model listed under several tasks keeps its first entry.
    pub fn with_placeholders() -> Self {
        let mut registry = Self::new();
        for info in TASKS.iter().flat_map(|t| t.models.iter()) {
            if !registry.contains(info.name) {
                registry.register(Box::new(PlaceholderAdapter::new(*info)));
            }
        }
        registry
    }

    /// Add an adapter, replacing any with the same name.
    pub fn register(&mut self, adapter: Box<dyn ModelAdapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn ModelAdapter> {
        self.adapters.get(name).map(|a| a.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Run `model` on an image; an unknown model yields no annotations.
    pub fn infer(&self, model: &str, image_path: &Path, params: &InferParams) -> Vec<Annotation> {
        match self.get(model) {
            Some(adapter) => adapter.infer(image_path, params),
            None => {
                log::warn!("No adapter registered for model '{}'", model);
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.adapters.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ExportTarget;
    use crate::model::ShapeKind;

    fn image() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, b"png").unwrap();
        (dir, path)
    }

    #[test]
    fn test_catalog_tasks() {
        let names: Vec<&str> = tasks().collect();
        assert_eq!(
            names,
            vec!["Bounding Box", "Polygons/Mask", "Keypoints", "Object IDs"]
        );
        assert_eq!(models_for_task("Keypoints").len(), 4);
        assert!(models_for_task("Nope").is_empty());
    }

    #[test]
    fn test_every_catalog_model_exports() {
        for info in TASKS.iter().flat_map(|t| t.models.iter()) {
            assert!(info.export().is_some(), "{} has no export target", info.name);
        }
    }

    #[test]
    fn test_model_info() {
        let sam = model_info("Segment Anything (SAM)").unwrap();
        assert_eq!(sam.tool, Tool::Prompt);

        let yolo = model_info("YOLOv8").unwrap();
        assert_eq!(yolo.export().unwrap().target, ExportTarget::Yolo);

        // Listed twice; the keypoint entry comes first.
        assert_eq!(model_info("PoseTrack").unwrap().tool, Tool::Keypoint);
        assert!(model_info("NotAModel").is_none());
    }

    #[test]
    fn test_placeholder_bbox() {
        let (_dir, path) = image();
        let adapter = PlaceholderAdapter::new(*model_info("YOLOv8").unwrap());
        let result = adapter.infer(&path, &InferParams::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].label, "YOLOv8-Object");
        let Shape::BBox(bbox) = &result[0].shape else {
            panic!("expected a bbox");
        };
        assert_eq!((bbox.x_min, bbox.y_min), (0.1, 0.1));
        assert!((bbox.x_max - 0.5).abs() < 1e-9);
        assert!((bbox.y_max - 0.5).abs() < 1e-9);
        assert!(!result[0].has_track());
    }

    #[test]
    fn test_placeholder_tracking_ids() {
        let (_dir, path) = image();
        let adapter = PlaceholderAdapter::new(*model_info("DeepSORT").unwrap());
        let result = adapter.infer(&path, &InferParams::default());

        let ids: Vec<i64> = result.iter().map(|a| a.track_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_placeholder_pose_is_relative() {
        let (_dir, path) = image();
        let adapter = PlaceholderAdapter::new(*model_info("OpenPose").unwrap());
        let result = adapter.infer(&path, &InferParams::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind(), ShapeKind::Keypoint);
        let Shape::Keypoints { points, skeleton } = &result[0].shape else {
            panic!("expected keypoints");
        };
        assert_eq!(points.len(), 15);
        assert_eq!(skeleton.len(), 14);
        assert!((points[0].x - 0.5).abs() < 1e-9);
        assert!((points[0].y - 0.375).abs() < 1e-9);
        assert!(points.iter().all(|k| (0.0..=1.0).contains(&k.x)));
    }

    #[test]
    fn test_placeholder_missing_image() {
        let adapter = PlaceholderAdapter::new(*model_info("Mask R-CNN").unwrap());
        let result = adapter.infer(Path::new("/nonexistent/a.png"), &InferParams::default());
        assert!(result.is_empty());
    }

    #[test]
    fn test_min_score_filters() {
        let (_dir, path) = image();
        let adapter = PlaceholderAdapter::new(*model_info("U-Net").unwrap());
        let params = InferParams {
            min_score: 1.5,
            ..InferParams::default()
        };
        assert!(adapter.infer(&path, &params).is_empty());
    }

    #[test]
    fn test_registry() {
        let (_dir, path) = image();
        let registry = AdapterRegistry::with_placeholders();

        assert!(registry.contains("HRNet"));
        assert_eq!(registry.get("SegFormer").unwrap().name(), "SegFormer");
        assert_eq!(
            registry.infer("Mask R-CNN", &path, &InferParams::default())[0].kind(),
            ShapeKind::Polygon
        );
        assert!(
            registry
                .infer("NotAModel", &path, &InferParams::default())
                .is_empty()
        );
    }
}
