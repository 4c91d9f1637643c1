//! Per-image annotation store.
//!
//! The store owns a project's `annotations/` directory and is its only
//! writer. Callers work in relative (editor) coordinates; conversion to and
//! from absolute pixels happens here, at the persistence boundary.
//!
//! Persistence problems never propagate to the editor: [`AnnotationStore::save`]
//! reports failure as `false` and [`AnnotationStore::load`] falls back to an
//! empty list, logging the cause in both cases.

use std::fs;
use std::path::{Path, PathBuf};

use crate::format::document::{ImageDocument, ImageUnit, image_stem};
use crate::format::error::FormatError;
use crate::model::{Annotation, AnnotationRecord};

/// Directory of per-image JSON documents.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    dir: PathBuf,
}

impl AnnotationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<stem>.json` for an image filename.
    pub fn document_path(&self, image_filename: &str) -> PathBuf {
        self.dir.join(format!("{}.json", image_stem(image_filename)))
    }

    /// Write an image's annotations, replacing any previous document.
    ///
    /// `annotations` are in relative space; they are stored as absolute
    /// pixels using `width` and `height`.
    pub fn try_save(
        &self,
        image_filename: &str,
        annotations: &[Annotation],
        image_path: &str,
        width: u32,
        height: u32,
    ) -> Result<PathBuf, FormatError> {
        let absolute: Vec<Annotation> = annotations
            .iter()
            .map(|a| a.to_absolute(width, height))
            .collect();
        let unit = ImageUnit::new(image_path, width, height, &absolute);

        fs::create_dir_all(&self.dir)?;
        let path = self.document_path(image_filename);
        fs::write(&path, serde_json::to_string_pretty(&unit)?)?;

        log::debug!(
            "Saved {} annotations for {} to {:?}",
            annotations.len(),
            image_filename,
            path
        );
        Ok(path)
    }

    /// Like [`try_save`](Self::try_save), logging failures instead of
    /// returning them.
    pub fn save(
        &self,
        image_filename: &str,
        annotations: &[Annotation],
        image_path: &str,
        width: u32,
        height: u32,
    ) -> bool {
        match self.try_save(image_filename, annotations, image_path, width, height) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Failed to save annotations for {}: {}", image_filename, e);
                false
            }
        }
    }

    /// Read and parse an image's document. `Ok(None)` if there is none.
    pub fn try_load_document(
        &self,
        image_filename: &str,
    ) -> Result<Option<ImageDocument>, FormatError> {
        let path = self.document_path(image_filename);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(ImageDocument::parse(&text)?))
    }

    /// Annotations of an image in relative space.
    ///
    /// Legacy documents and documents without dimensions cannot be
    /// normalised; their records are returned as stored.
    pub fn load(&self, image_filename: &str) -> Vec<Annotation> {
        let document = match self.try_load_document(image_filename) {
            Ok(Some(document)) => document,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Failed to load annotations for {}: {}", image_filename, e);
                return Vec::new();
            }
        };

        let dimensions = match &document {
            ImageDocument::Unit(unit) => unit.dimensions(),
            ImageDocument::Legacy(_) => None,
        };
        let annotations = parse_records(document.records(), image_filename);

        match dimensions {
            Some((w, h)) => annotations.iter().map(|a| a.to_relative(w, h)).collect(),
            None => annotations,
        }
    }

    /// Remove an image's document. A missing document is not an error.
    pub fn delete(&self, image_filename: &str) -> bool {
        let path = self.document_path(image_filename);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                log::warn!("Failed to delete {:?}: {}", path, e);
                false
            }
        }
    }

    /// Remove every document in the store. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut removed = 0;
        for path in self.document_paths() {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Failed to delete {:?}: {}", path, e),
            }
        }
        log::info!("Cleared {} annotation documents from {:?}", removed, self.dir);
        removed
    }

    /// Every document as an export unit, ordered by file name.
    ///
    /// Unreadable documents are skipped with a warning in the log.
    pub fn load_units(&self) -> Vec<ImageUnit> {
        let mut units = Vec::new();
        for path in self.document_paths() {
            let parsed = fs::read_to_string(&path)
                .map_err(FormatError::from)
                .and_then(|text| ImageDocument::parse(&text).map_err(FormatError::from));
            match parsed {
                Ok(document) => units.push(document.into_unit()),
                Err(e) => log::warn!("Skipping unreadable annotation file {:?}: {}", path, e),
            }
        }
        units
    }

    /// `*.json` files in the store directory, sorted.
    fn document_paths(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        paths
    }
}

fn parse_records(records: &[AnnotationRecord], image_filename: &str) -> Vec<Annotation> {
    records
        .iter()
        .filter_map(|record| match Annotation::from_record(record) {
            Ok(annotation) => Some(annotation),
            Err(e) => {
                log::warn!("Ignoring annotation in {}: {}", image_filename, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Keypoint, Shape};

    fn sample() -> Vec<Annotation> {
        vec![
            Annotation::new("car", Shape::BBox(BoundingBox::new(0.1, 0.2, 0.5, 0.6))),
            Annotation::new(
                "road",
                Shape::Polygon {
                    points: vec![(0.0, 0.0), (0.5, 0.0), (0.5, 0.5)],
                },
            )
            .with_pinned(true),
            Annotation::new(
                "person",
                Shape::Keypoints {
                    points: vec![Keypoint::new(0.25, 0.25, 0.9), Keypoint::new(0.75, 0.5, 0.4)],
                    skeleton: vec![(0, 1)],
                },
            )
            .with_track_id(3),
        ]
    }

    #[test]
    fn test_save_writes_absolute_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());

        let path = store
            .try_save("frame.jpg", &sample(), "/images/frame.jpg", 200, 100)
            .unwrap();
        assert_eq!(path, dir.path().join("frame.json"));

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["image_path"], "/images/frame.jpg");
        assert_eq!(value["image_width"], 200);
        assert_eq!(value["annotations"][0]["points"], serde_json::json!([20, 20, 100, 60]));
        assert_eq!(value["annotations"][1]["pinned"], true);
        assert_eq!(value["annotations"][2]["track_id"], 3);
    }

    #[test]
    fn test_save_load_roundtrip_within_one_pixel() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        let (w, h) = (333, 777);
        let original = vec![Annotation::new(
            "car",
            Shape::BBox(BoundingBox::new(0.123, 0.456, 0.789, 0.987)),
        )];

        assert!(store.save("img.png", &original, "img.png", w, h));
        let loaded = store.load("img.png");
        assert_eq!(loaded.len(), 1);

        let (Shape::BBox(a), Shape::BBox(b)) = (&original[0].shape, &loaded[0].shape) else {
            panic!("Expected boxes");
        };
        for (x, y) in a.to_corners().iter().zip(b.to_corners()).step_by(2) {
            assert!(((x - y) * f64::from(w)).abs() <= 1.0);
        }
        for (x, y) in a.to_corners().iter().zip(b.to_corners()).skip(1).step_by(2) {
            assert!(((x - y) * f64::from(h)).abs() <= 1.0);
        }
    }

    #[test]
    fn test_load_preserves_order_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        store.try_save("a.jpg", &sample(), "a.jpg", 200, 100).unwrap();

        let loaded = store.load("a.jpg");
        let labels: Vec<&str> = loaded.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["car", "road", "person"]);
        assert!(loaded[1].pinned);
        assert_eq!(loaded[2].track_id, 3);
    }

    #[test]
    fn test_load_legacy_list_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        fs::write(
            dir.path().join("old.json"),
            r#"[{"label": "car", "type": "bbox", "points": [10, 20, 30, 40]}]"#,
        )
        .unwrap();

        let loaded = store.load("old.jpg");
        assert_eq!(
            loaded,
            vec![Annotation::new("car", Shape::BBox(BoundingBox::new(10.0, 20.0, 30.0, 40.0)))]
        );
    }

    #[test]
    fn test_load_without_dimensions_returns_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        fs::write(
            dir.path().join("nodim.json"),
            r#"{"image_path": "nodim.jpg", "annotations": [{"label": "car", "type": "bbox", "points": [10, 20, 30, 40]}]}"#,
        )
        .unwrap();

        let loaded = store.load("nodim.jpg");
        assert_eq!(loaded[0].shape, Shape::BBox(BoundingBox::new(10.0, 20.0, 30.0, 40.0)));
    }

    #[test]
    fn test_load_legacy_coords_as_xywh() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        fs::write(
            dir.path().join("x.json"),
            r#"[{"label": "car", "type": "bbox", "coords": [0.5, 0.25, 0.25, 0.5]}]"#,
        )
        .unwrap();

        let loaded = store.load("x.jpg");
        assert_eq!(
            loaded[0].shape,
            Shape::BBox(BoundingBox::new(0.5, 0.25, 0.75, 0.75))
        );
    }

    #[test]
    fn test_badly_typed_record_skips_only_itself() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        fs::write(
            dir.path().join("frame.json"),
            r#"{"image_path": "frame.jpg", "image_width": 100, "image_height": 100,
                "annotations": [
                    {"label": "car", "type": "bbox", "points": [1, 1, 50, 50]},
                    {"label": "car", "type": "bbox", "points": [5, 5, 60, 60], "score": "0.9"}
                ]}"#,
        )
        .unwrap();

        let units = store.load_units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].annotations.len(), 2);

        let loaded = store.load("frame.jpg");
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded[0].shape,
            Shape::BBox(BoundingBox::new(0.01, 0.01, 0.5, 0.5))
        );
    }

    #[test]
    fn test_load_missing_or_corrupt_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        assert!(store.load("missing.jpg").is_empty());

        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        assert!(store.load("broken.jpg").is_empty());
    }

    #[test]
    fn test_delete_and_clear_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        store.try_save("a.jpg", &sample(), "a.jpg", 10, 10).unwrap();
        store.try_save("b.jpg", &sample(), "b.jpg", 10, 10).unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        assert!(store.delete("a.jpg"));
        assert!(store.delete("a.jpg"));
        assert!(!store.document_path("a.jpg").exists());

        assert_eq!(store.clear_all(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_load_units_sorted_and_skips_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        store.try_save("b.jpg", &sample(), "/x/b.jpg", 10, 10).unwrap();
        store.try_save("a.jpg", &sample(), "/x/a.jpg", 10, 10).unwrap();
        fs::write(dir.path().join("c.json"), "garbage").unwrap();

        let units = store.load_units();
        let paths: Vec<&str> = units.iter().map(|u| u.image_path.as_str()).collect();
        assert_eq!(paths, vec!["/x/a.jpg", "/x/b.jpg"]);
    }
}
