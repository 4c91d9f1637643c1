//! Annotation persistence and export.
//!
//! ## Persistence
//!
//! [`AnnotationStore`] keeps one JSON document per image ([`ImageUnit`]) in
//! absolute pixel coordinates and converts to and from the editor's relative
//! coordinates on save and load.
//!
//! ## Export
//!
//! [`export_annotations`] turns a list of units into a training dataset for
//! a given model. Every record is validated once by the shared pipeline,
//! then encoded by the target format:
//!
//! - **COCO JSON**: detection, segmentation and keypoint models
//! - **YOLO TXT**: per-image normalized boxes
//! - **Pascal VOC XML**: per-image integer boxes
//! - **GroundingDINO JSON**: strict and list variants
//! - **SSD JSON**: per-image box lists
//! - **MOT TXT**: tracking ground truth
//!
//! ## Usage
//!
//! ```rust,ignore
//! use labelai::format::{AnnotationStore, export_annotations};
//! use labelai::model::ClassMap;
//!
//! let units = AnnotationStore::new("project/annotations").load_units();
//! let class_map = ClassMap::from_labels(["car", "person"]);
//! let result = export_annotations(&units, out_dir, "YOLOv8", &class_map, Some("cars"))?;
//! for warning in result.warning_messages() {
//!     println!("{warning}");
//! }
//! ```

mod document;
mod engine;
mod error;
pub mod formats;
mod mask;
mod pipeline;
mod registry;
mod store;
mod traits;

pub use document::{ImageDocument, ImageUnit, image_stem};
pub use engine::{ExportLayout, export_annotations, export_to_target};
pub use error::FormatError;
pub use mask::{MaskSource, export_masks, rasterize};
pub use pipeline::{Prepared, PreparedImage, PreparedRecord, prepare};
pub use registry::{ExportTarget, MODEL_EXPORTS, ModelExport, model_names, resolve};
pub use store::AnnotationStore;
pub use traits::{EncodedLabels, ExportResult, FormatWarning, LabelEncoder, WarningSeverity};
