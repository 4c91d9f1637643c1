//! Export dispatcher.
//!
//! Lays out `<output_dir>/<project_name>/{images,labels}`, copies source
//! images, runs the shared validation and hands the result to the target's
//! encoder. Only an unknown target name fails the export, and that is
//! checked before anything touches the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_PROJECT_NAME, IMAGES_DIR, LABELS_DIR};
use crate::format::document::ImageUnit;
use crate::format::error::FormatError;
use crate::format::pipeline::{self, PreparedImage};
use crate::format::registry::{self, ExportTarget};
use crate::format::traits::{ExportResult, FormatWarning};
use crate::model::ClassMap;

/// Directory layout of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLayout {
    /// `<output_dir>/<project_name>`
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl ExportLayout {
    pub fn new(output_dir: &Path, project_name: Option<&str>) -> Self {
        let name = project_name
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_PROJECT_NAME);
        let root = output_dir.join(name);
        Self {
            images_dir: root.join(IMAGES_DIR),
            labels_dir: root.join(LABELS_DIR),
            root,
        }
    }

    fn create(&self) -> Result<(), FormatError> {
        fs::create_dir_all(&self.images_dir)?;
        fs::create_dir_all(&self.labels_dir)?;
        Ok(())
    }
}

/// Export units for a model name (or target id).
///
/// Models without a dedicated format are written as COCO. Per-record and
/// per-image problems end up in the result's warnings.
pub fn export_annotations(
    units: &[ImageUnit],
    output_dir: &Path,
    model_name: &str,
    class_map: &ClassMap,
    project_name: Option<&str>,
) -> Result<ExportResult, FormatError> {
    let entry = registry::resolve(model_name)?;
    if entry.fallback {
        log::warn!(
            "{} has no dedicated export format, falling back to {}",
            model_name,
            entry.target.encoder().display_name()
        );
    }
    export_to_target(units, output_dir, entry.target, class_map, project_name)
}

/// Export units to an explicit target.
pub fn export_to_target(
    units: &[ImageUnit],
    output_dir: &Path,
    target: ExportTarget,
    class_map: &ClassMap,
    project_name: Option<&str>,
) -> Result<ExportResult, FormatError> {
    let encoder = target.encoder();
    let layout = ExportLayout::new(output_dir, project_name);
    log::info!(
        "Exporting {} annotations to {:?}",
        encoder.display_name(),
        layout.root
    );
    layout.create()?;

    let prepared = pipeline::prepare(units, class_map, |kind| encoder.supports(kind));
    let mut result = ExportResult::new();
    result.warnings = prepared.warnings;

    for image in &prepared.images {
        copy_image(image, &layout.images_dir, &mut result);
    }

    let encoded = encoder.encode(&prepared.images, class_map)?;
    result.warnings.extend(encoded.warnings);

    for (name, content) in &encoded.files {
        let path = layout.labels_dir.join(name);
        fs::write(&path, content)?;
        result.files_created.push(path);
    }

    result.images_exported = prepared.images.len();
    result.annotations_exported = encoded.annotations_exported;

    for warning in &result.warnings {
        log::warn!("{}", warning);
    }
    log::info!(
        "Exported {} images with {} annotations ({} warnings)",
        result.images_exported,
        result.annotations_exported,
        result.warnings.len()
    );

    Ok(result)
}

/// Copy a source image into `images/`, recording problems as warnings.
fn copy_image(image: &PreparedImage, images_dir: &Path, result: &mut ExportResult) {
    let source = Path::new(&image.image_path);
    if !source.is_file() {
        result.add_warning(
            FormatWarning::warning(format!("Source image not found: {}", image.image_path))
                .with_image(source),
        );
        return;
    }

    let dest = images_dir.join(&image.file_name);
    match fs::copy(source, &dest) {
        Ok(_) => result.files_created.push(dest),
        Err(e) => result.add_warning(
            FormatWarning::error(format!(
                "Could not copy image {} to {}: {}",
                image.image_path,
                dest.display(),
                e
            ))
            .with_image(source),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_default_name() {
        let layout = ExportLayout::new(Path::new("/out"), None);
        assert_eq!(layout.root, PathBuf::from("/out/dataset_export"));
        assert_eq!(layout.images_dir, PathBuf::from("/out/dataset_export/images"));
        assert_eq!(layout.labels_dir, PathBuf::from("/out/dataset_export/labels"));

        let empty = ExportLayout::new(Path::new("/out"), Some(""));
        assert_eq!(empty.root, layout.root);
    }

    #[test]
    fn test_layout_named() {
        let layout = ExportLayout::new(Path::new("/out"), Some("cars"));
        assert_eq!(layout.labels_dir, PathBuf::from("/out/cars/labels"));
    }

    #[test]
    fn test_unknown_model_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_annotations(&[], dir.path(), "NotAModel", &ClassMap::new(), None)
            .unwrap_err();

        assert!(matches!(err, FormatError::UnsupportedFormat { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
