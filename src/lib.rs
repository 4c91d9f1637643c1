//! LabelAI - annotation data model and dataset export
//!
//! Stores per-image annotations for an image-labeling project and converts
//! them into the label formats expected by common detection, segmentation,
//! pose and tracking models (COCO, YOLO, Pascal VOC, GroundingDINO, SSD,
//! MOT), plus PNG class masks.

pub mod adapter;
pub mod config;
pub mod constants;
pub mod format;
pub mod model;
pub mod project;
