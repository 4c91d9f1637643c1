//! Export targets and the model-name table that selects them.
//!
//! The set of targets is closed: every name resolves to one
//! [`ExportTarget`], whose encoder is chosen by a plain `match`. There is no
//! runtime registration and no global "active model" state.

use crate::format::error::FormatError;
use crate::format::formats::{
    CocoFormat, GroundingDinoFormat, GroundingDinoListFormat, MotFormat, PascalVocFormat,
    SsdFormat, YoloFormat,
};
use crate::format::traits::LabelEncoder;

/// A label format the engine can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportTarget {
    Coco,
    Yolo,
    PascalVoc,
    /// `{boxes, scores, labels}` object.
    GroundingDino,
    /// List of `{bbox, score, label}` objects.
    GroundingDinoList,
    Ssd,
    Mot,
}

impl ExportTarget {
    /// Every target, in display order.
    pub const ALL: [ExportTarget; 7] = [
        ExportTarget::Coco,
        ExportTarget::Yolo,
        ExportTarget::PascalVoc,
        ExportTarget::GroundingDino,
        ExportTarget::GroundingDinoList,
        ExportTarget::Ssd,
        ExportTarget::Mot,
    ];

    /// The encoder implementing this target.
    pub fn encoder(&self) -> &'static dyn LabelEncoder {
        match self {
            ExportTarget::Coco => &CocoFormat,
            ExportTarget::Yolo => &YoloFormat,
            ExportTarget::PascalVoc => &PascalVocFormat,
            ExportTarget::GroundingDino => &GroundingDinoFormat,
            ExportTarget::GroundingDinoList => &GroundingDinoListFormat,
            ExportTarget::Ssd => &SsdFormat,
            ExportTarget::Mot => &MotFormat,
        }
    }

    /// Short identifier (`"coco"`, `"yolo"`, ...).
    pub fn id(&self) -> &'static str {
        self.encoder().id()
    }

    /// Look a target up by its short identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }
}

/// How a model name maps onto a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelExport {
    /// Model name as shown to users.
    pub model: &'static str,
    pub target: ExportTarget,
    /// The model has no format of its own and borrows `target`.
    pub fallback: bool,
}

const fn native(model: &'static str, target: ExportTarget) -> ModelExport {
    ModelExport {
        model,
        target,
        fallback: false,
    }
}

const fn fallback(model: &'static str) -> ModelExport {
    ModelExport {
        model,
        target: ExportTarget::Coco,
        fallback: true,
    }
}

/// Model name to export target.
pub const MODEL_EXPORTS: &[ModelExport] = &[
    native("YOLOv8", ExportTarget::Yolo),
    native("SSD", ExportTarget::Ssd),
    native("GroundingDINO", ExportTarget::GroundingDino),
    native("GroundingDINO / OWL-ViT", ExportTarget::GroundingDinoList),
    native("DeepSORT", ExportTarget::Mot),
    native("Pascal VOC", ExportTarget::PascalVoc),
    native("RetinaNet", ExportTarget::Coco),
    native("Faster R-CNN", ExportTarget::Coco),
    native("EfficientDet", ExportTarget::Coco),
    native("Mask R-CNN", ExportTarget::Coco),
    native("Segment Anything (SAM)", ExportTarget::Coco),
    native("Detectron2", ExportTarget::Coco),
    native("MMDetection", ExportTarget::Coco),
    native("OpenPose", ExportTarget::Coco),
    native("HRNet", ExportTarget::Coco),
    native("MediaPipe Pose", ExportTarget::Coco),
    fallback("DeepLabv3+"),
    fallback("U-Net"),
    fallback("SegFormer"),
    fallback("PoseTrack"),
    fallback("ByteTrack"),
    fallback("BoT-SORT"),
    fallback("FairMOT"),
    fallback("CenterTrack"),
    fallback("TraDeS / QDTrack"),
];

/// Resolve a model name, or a target id such as `"coco"`.
///
/// Unknown names are the one hard failure of an export.
pub fn resolve(name: &str) -> Result<ModelExport, FormatError> {
    if let Some(entry) = MODEL_EXPORTS.iter().find(|m| m.model == name) {
        return Ok(*entry);
    }
    ExportTarget::from_id(name)
        .map(|target| ModelExport {
            model: target.id(),
            target,
            fallback: false,
        })
        .ok_or_else(|| FormatError::unsupported_format(name))
}

/// Every model name that can be exported.
pub fn model_names() -> impl Iterator<Item = &'static str> {
    MODEL_EXPORTS.iter().map(|m| m.model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_targets() {
        for target in ExportTarget::ALL {
            assert_eq!(ExportTarget::from_id(target.id()), Some(target));
        }
        assert_eq!(ExportTarget::from_id("coco"), Some(ExportTarget::Coco));
        assert_eq!(ExportTarget::from_id("voc"), Some(ExportTarget::PascalVoc));
    }

    #[test]
    fn test_model_names_resolve() {
        assert_eq!(resolve("YOLOv8").unwrap().target, ExportTarget::Yolo);
        assert_eq!(resolve("DeepSORT").unwrap().target, ExportTarget::Mot);
        assert_eq!(
            resolve("GroundingDINO / OWL-ViT").unwrap().target,
            ExportTarget::GroundingDinoList
        );

        let sam = resolve("Segment Anything (SAM)").unwrap();
        assert_eq!(sam.target, ExportTarget::Coco);
        assert!(!sam.fallback);
    }

    #[test]
    fn test_placeholder_models_fall_back_to_coco() {
        for name in ["DeepLabv3+", "U-Net", "ByteTrack", "TraDeS / QDTrack"] {
            let entry = resolve(name).unwrap();
            assert_eq!(entry.target, ExportTarget::Coco);
            assert!(entry.fallback);
        }
    }

    #[test]
    fn test_resolve_by_target_id() {
        let entry = resolve("mot").unwrap();
        assert_eq!(entry.target, ExportTarget::Mot);
        assert_eq!(entry.model, "mot");
    }

    #[test]
    fn test_unknown_name() {
        let err = resolve("NotAModel").unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedFormat { ref name } if name == "NotAModel"));
    }

    #[test]
    fn test_model_names_unique() {
        let mut names: Vec<&str> = model_names().collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
