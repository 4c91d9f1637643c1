//! Encoder trait and export result types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::format::error::FormatError;
use crate::format::pipeline::PreparedImage;
use crate::model::{ClassMap, ShapeKind};

/// A target label format.
///
/// Encoders are pure: they turn validated images into file contents keyed
/// by path relative to the export's `labels/` directory. Directory layout,
/// image copying and writing are handled by the engine, so every encoder
/// produces byte-identical output for the same input.
pub trait LabelEncoder: Send + Sync {
    /// Unique identifier for this format (e.g., "coco", "yolo", "voc").
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn display_name(&self) -> &'static str;

    /// Whether records of this shape kind are exported.
    ///
    /// Unsupported kinds are dropped silently before validation.
    fn supports(&self, kind: ShapeKind) -> bool;

    /// Encode validated images into label files.
    fn encode(
        &self,
        images: &[PreparedImage],
        class_map: &ClassMap,
    ) -> Result<EncodedLabels, FormatError>;
}

/// Output of a [`LabelEncoder`].
#[derive(Debug, Default)]
pub struct EncodedLabels {
    /// File contents keyed by path relative to `labels/`.
    pub files: BTreeMap<String, String>,

    /// Number of annotations written.
    pub annotations_exported: usize,

    /// Warnings raised while encoding (e.g. missing dimensions).
    pub warnings: Vec<FormatWarning>,
}

impl EncodedLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output holding a single file.
    pub fn single(name: impl Into<String>, content: String, annotations_exported: usize) -> Self {
        let mut files = BTreeMap::new();
        files.insert(name.into(), content);
        Self {
            files,
            annotations_exported,
            warnings: Vec::new(),
        }
    }
}

/// Summary of one export run.
#[derive(Debug, Default)]
pub struct ExportResult {
    /// Images that reached the output, copied or not.
    pub images_exported: usize,

    /// Number of annotations exported.
    pub annotations_exported: usize,

    /// Everything skipped or degraded, in the order it happened.
    pub warnings: Vec<FormatWarning>,

    /// Label and image files written.
    pub files_created: Vec<PathBuf>,
}

impl ExportResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn add_warning(&mut self, warning: FormatWarning) {
        self.warnings.push(warning);
    }

    /// Whether anything was reported.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether any warning has [`WarningSeverity::Error`].
    pub fn has_errors(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w.severity, WarningSeverity::Error))
    }

    /// Warning messages as plain strings, in the order they were raised.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }
}

/// One problem met during an export.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatWarning {
    /// Source image the warning concerns.
    pub image_path: Option<PathBuf>,

    /// Text shown to the user.
    pub message: String,

    pub severity: WarningSeverity,
}

impl FormatWarning {
    /// Create a new warning.
    pub fn new(message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            image_path: None,
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Error)
    }

    /// Attach the source image path.
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }
}

impl fmt::Display for FormatWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// How serious a [`FormatWarning`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    /// Nothing was lost.
    Info,
    /// A record or file was skipped.
    Warning,
    /// The output is incomplete, e.g. an image could not be copied.
    Error,
}
