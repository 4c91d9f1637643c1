//! Project directory management.
//!
//! Every project is a directory under a common base directory:
//!
//! ```text
//! <base>/<name>/
//!   images/          source images
//!   annotations/     one JSON document per image (see `format::store`)
//!   project.json     free-form project state
//! ```
//!
//! `project.json` is a JSON object. It always carries `annotation_goal` and
//! `model`; other keys (such as `class_labels`) are added by callers through
//! [`Project::save_state`], which merges rather than replaces.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::{ANNOTATIONS_DIR, IMAGES_DIR, PROJECT_FILE};
use crate::format::AnnotationStore;
use crate::model::ClassMap;

/// Goal reported for projects whose state has none.
pub const UNKNOWN_GOAL: &str = "Unknown";

/// Errors from project management.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Project '{name}' already exists.")]
    AlreadyExists { name: String },

    #[error("Project '{name}' not found.")]
    NotFound { name: String },

    #[error("Invalid project name '{name}'")]
    InvalidName { name: String },

    #[error("No active project.")]
    NoActiveProject,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Summary of a project directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDetails {
    pub name: String,
    pub path: PathBuf,
    pub annotation_goal: String,
    pub image_count: usize,
    pub last_modified: Option<SystemTime>,
}

/// Handle to one project directory.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    path: PathBuf,
    store: AnnotationStore,
}

impl Project {
    /// Open an existing project directory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !path.is_dir() {
            return Err(ProjectError::NotFound { name });
        }
        let store = AnnotationStore::new(path.join(ANNOTATIONS_DIR));
        Ok(Self { name, path, store })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image_dir(&self) -> PathBuf {
        self.path.join(IMAGES_DIR)
    }

    pub fn annotation_dir(&self) -> PathBuf {
        self.path.join(ANNOTATIONS_DIR)
    }

    pub fn state_path(&self) -> PathBuf {
        self.path.join(PROJECT_FILE)
    }

    /// The project's annotation store.
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Read `project.json`, or an empty object if it is missing or unreadable.
    pub fn load_state(&self) -> Map<String, Value> {
        let path = self.state_path();
        if !path.exists() {
            return Map::new();
        }
        match read_state(&path) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Error loading project state from {:?}: {}", path, e);
                Map::new()
            }
        }
    }

    /// Merge `partial` into `project.json`. Keys not in `partial` are kept.
    pub fn try_save_state(&self, partial: Map<String, Value>) -> Result<(), ProjectError> {
        let mut state = self.load_state();
        state.extend(partial);
        write_state(&self.state_path(), &state)
    }

    /// Like [`try_save_state`](Self::try_save_state), logging failures
    /// instead of returning them.
    pub fn save_state(&self, partial: Map<String, Value>) -> bool {
        match self.try_save_state(partial) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Error saving project state for '{}': {}", self.name, e);
                false
            }
        }
    }

    pub fn annotation_goal(&self) -> Option<String> {
        string_field(&self.load_state(), "annotation_goal")
    }

    pub fn model(&self) -> Option<String> {
        string_field(&self.load_state(), "model")
    }

    /// `class_labels` from the project state, in stored order. Non-string
    /// entries are ignored.
    pub fn class_labels(&self) -> Vec<String> {
        match self.load_state().get("class_labels") {
            Some(Value::Array(labels)) => labels
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Class map with ids assigned by position in `class_labels`.
    pub fn class_map(&self) -> ClassMap {
        ClassMap::from_labels(self.class_labels())
    }

    /// Store `labels` as the project's `class_labels`.
    pub fn set_class_labels(&self, labels: &[String]) -> bool {
        let mut partial = Map::new();
        partial.insert(
            "class_labels".to_string(),
            Value::Array(labels.iter().cloned().map(Value::String).collect()),
        );
        self.save_state(partial)
    }
}

fn read_state(path: &Path) -> Result<Map<String, Value>, ProjectError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_state(path: &Path, state: &Map<String, Value>) -> Result<(), ProjectError> {
    fs::write(path, serde_json::to_string_pretty(state)?)?;
    Ok(())
}

fn string_field(state: &Map<String, Value>, key: &str) -> Option<String> {
    state.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Creates, opens, lists and deletes projects under one base directory.
#[derive(Debug)]
pub struct ProjectManager {
    base_dir: PathBuf,
    active: Option<Project>,
}

impl ProjectManager {
    /// Manage projects under `base_dir`, creating it if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            active: None,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn project_path(&self, name: &str) -> Result<PathBuf, ProjectError> {
        let trimmed = name.trim();
        let is_plain = !trimmed.is_empty()
            && trimmed != "."
            && trimmed != ".."
            && !trimmed.contains(['/', '\\']);
        if !is_plain {
            return Err(ProjectError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.base_dir.join(trimmed))
    }

    /// Create a new project directory with its `images/` and `annotations/`
    /// subdirectories and an initial `project.json`.
    pub fn create_project(
        &self,
        name: &str,
        annotation_goal: &str,
        model: &str,
    ) -> Result<Project, ProjectError> {
        let path = self.project_path(name)?;
        if path.exists() {
            return Err(ProjectError::AlreadyExists {
                name: name.to_string(),
            });
        }

        fs::create_dir_all(path.join(IMAGES_DIR))?;
        fs::create_dir_all(path.join(ANNOTATIONS_DIR))?;

        let mut state = Map::new();
        state.insert("annotation_goal".to_string(), annotation_goal.into());
        state.insert("model".to_string(), model.into());
        write_state(&path.join(PROJECT_FILE), &state)?;

        log::info!("Created project '{}' at {:?}", name, path);
        Project::open(path)
    }

    /// Make `name` the active project.
    pub fn open_project(&mut self, name: &str) -> Result<&Project, ProjectError> {
        let path = self.project_path(name)?;
        if !path.is_dir() {
            return Err(ProjectError::NotFound {
                name: name.to_string(),
            });
        }
        let project = Project::open(path)?;
        log::info!("Opened project '{}'", project.name());
        Ok(self.active.insert(project))
    }

    pub fn close_project(&mut self) {
        if let Some(project) = self.active.take() {
            log::info!("Closed project '{}'", project.name());
        }
    }

    pub fn is_project_active(&self) -> bool {
        self.active.is_some()
    }

    /// The active project, if any.
    pub fn current(&self) -> Option<&Project> {
        self.active.as_ref()
    }

    /// The active project, or [`ProjectError::NoActiveProject`].
    pub fn require_active(&self) -> Result<&Project, ProjectError> {
        self.active.as_ref().ok_or(ProjectError::NoActiveProject)
    }

    /// Delete every annotation document of the active project.
    pub fn clear_annotations(&self) -> Result<usize, ProjectError> {
        let project = self.require_active()?;
        Ok(project.store().clear_all())
    }

    /// Names of all project directories, sorted.
    pub fn list_projects(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Could not list projects in {:?}: {}", self.base_dir, e);
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Details of one project, `None` if it does not exist.
    pub fn project_details(&self, name: &str) -> Option<ProjectDetails> {
        let path = self.project_path(name).ok()?;
        let project = Project::open(&path).ok()?;

        let annotation_goal = project
            .annotation_goal()
            .unwrap_or_else(|| UNKNOWN_GOAL.to_string());
        let image_count = fs::read_dir(project.image_dir())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|entry| entry.path().is_file())
                    .count()
            })
            .unwrap_or(0);
        let last_modified = fs::metadata(&path).and_then(|m| m.modified()).ok();

        Some(ProjectDetails {
            name: name.to_string(),
            path,
            annotation_goal,
            image_count,
            last_modified,
        })
    }

    /// Details of every project, sorted by name.
    pub fn all_project_details(&self) -> Vec<ProjectDetails> {
        self.list_projects()
            .iter()
            .filter_map(|name| self.project_details(name))
            .collect()
    }

    /// Up to `count` projects, most recently modified first.
    pub fn recent_projects(&self, count: usize) -> Vec<ProjectDetails> {
        let mut details = self.all_project_details();
        details.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        details.truncate(count);
        details
    }

    /// Remove a project directory and everything in it. Closes it first if
    /// it is the active project.
    pub fn delete_project(&mut self, name: &str) -> Result<(), ProjectError> {
        let path = self.project_path(name)?;
        if !path.is_dir() {
            return Err(ProjectError::NotFound {
                name: name.to_string(),
            });
        }
        if self.active.as_ref().is_some_and(|p| p.path() == path) {
            self.close_project();
        }
        fs::remove_dir_all(&path)?;
        log::info!("Deleted project '{}'", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, BoundingBox, Shape};
    use serde_json::json;

    fn manager() -> (tempfile::TempDir, ProjectManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = ProjectManager::new(dir.path().join("projects")).unwrap();
        (dir, manager)
    }

    #[test]
    fn test_new_creates_base_dir() {
        let (_dir, manager) = manager();
        assert!(manager.base_dir().is_dir());
        assert!(manager.list_projects().is_empty());
    }

    #[test]
    fn test_create_project_layout() {
        let (_dir, manager) = manager();
        let project = manager
            .create_project("cars", "Bounding Box", "YOLOv8")
            .unwrap();

        assert_eq!(project.name(), "cars");
        assert!(project.image_dir().is_dir());
        assert!(project.annotation_dir().is_dir());
        assert_eq!(project.annotation_goal().as_deref(), Some("Bounding Box"));
        assert_eq!(project.model().as_deref(), Some("YOLOv8"));
    }

    #[test]
    fn test_create_existing_project_fails() {
        let (_dir, manager) = manager();
        manager.create_project("cars", "Bounding Box", "YOLOv8").unwrap();

        let result = manager.create_project("cars", "Keypoints", "HRNet");
        assert!(matches!(result, Err(ProjectError::AlreadyExists { .. })));

        // Original state untouched.
        let project = Project::open(manager.base_dir().join("cars")).unwrap();
        assert_eq!(project.model().as_deref(), Some("YOLOv8"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let (_dir, manager) = manager();
        for name in ["", "  ", "..", "a/b", "a\\b"] {
            assert!(matches!(
                manager.create_project(name, "g", "m"),
                Err(ProjectError::InvalidName { .. })
            ));
        }
    }

    #[test]
    fn test_open_and_close() {
        let (_dir, mut manager) = manager();
        manager.create_project("cars", "Bounding Box", "YOLOv8").unwrap();

        assert!(!manager.is_project_active());
        assert!(matches!(
            manager.require_active(),
            Err(ProjectError::NoActiveProject)
        ));

        let name = manager.open_project("cars").unwrap().name().to_string();
        assert_eq!(name, "cars");
        assert!(manager.is_project_active());

        manager.close_project();
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_open_missing_project() {
        let (_dir, mut manager) = manager();
        assert!(matches!(
            manager.open_project("nope"),
            Err(ProjectError::NotFound { .. })
        ));
        assert!(!manager.is_project_active());
    }

    #[test]
    fn test_save_state_merges() {
        let (_dir, manager) = manager();
        let project = manager.create_project("p", "Polygons/Mask", "U-Net").unwrap();

        let mut partial = Map::new();
        partial.insert("last_image".to_string(), json!("a.png"));
        assert!(project.save_state(partial));

        let state = project.load_state();
        assert_eq!(state["last_image"], json!("a.png"));
        assert_eq!(state["annotation_goal"], json!("Polygons/Mask"));
        assert_eq!(state["model"], json!("U-Net"));
    }

    #[test]
    fn test_load_state_corrupt_file() {
        let (_dir, manager) = manager();
        let project = manager.create_project("p", "g", "m").unwrap();
        fs::write(project.state_path(), "{ not json").unwrap();

        assert!(project.load_state().is_empty());
        assert!(project.annotation_goal().is_none());
    }

    #[test]
    fn test_class_labels_and_map() {
        let (_dir, manager) = manager();
        let project = manager.create_project("p", "g", "m").unwrap();
        assert!(project.class_map().is_empty());

        project.set_class_labels(&["car".to_string(), "person".to_string()]);
        assert_eq!(project.class_labels(), vec!["car", "person"]);

        let map = project.class_map();
        assert_eq!(map.get("car"), Some(0));
        assert_eq!(map.get("person"), Some(1));
    }

    #[test]
    fn test_class_labels_ignores_non_strings() {
        let (_dir, manager) = manager();
        let project = manager.create_project("p", "g", "m").unwrap();
        let mut partial = Map::new();
        partial.insert("class_labels".to_string(), json!(["car", 3, null, "bus"]));
        project.save_state(partial);

        assert_eq!(project.class_labels(), vec!["car", "bus"]);
    }

    #[test]
    fn test_project_details() {
        let (_dir, manager) = manager();
        let project = manager.create_project("p", "Keypoints", "HRNet").unwrap();
        fs::write(project.image_dir().join("a.png"), b"x").unwrap();
        fs::write(project.image_dir().join("b.png"), b"x").unwrap();

        let details = manager.project_details("p").unwrap();
        assert_eq!(details.name, "p");
        assert_eq!(details.annotation_goal, "Keypoints");
        assert_eq!(details.image_count, 2);
        assert!(details.last_modified.is_some());

        assert!(manager.project_details("missing").is_none());
    }

    #[test]
    fn test_project_details_unknown_goal() {
        let (_dir, manager) = manager();
        fs::create_dir_all(manager.base_dir().join("bare")).unwrap();

        let details = manager.project_details("bare").unwrap();
        assert_eq!(details.annotation_goal, UNKNOWN_GOAL);
        assert_eq!(details.image_count, 0);
    }

    #[test]
    fn test_all_details_sorted_by_name() {
        let (_dir, manager) = manager();
        for name in ["zebra", "apple", "mango"] {
            manager.create_project(name, "g", "m").unwrap();
        }
        // Stray files in the base directory are not projects.
        fs::write(manager.base_dir().join("notes.txt"), "x").unwrap();

        let names: Vec<String> = manager
            .all_project_details()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_recent_projects_limit() {
        let (_dir, manager) = manager();
        for name in ["a", "b", "c"] {
            manager.create_project(name, "g", "m").unwrap();
        }
        let recent = manager.recent_projects(2);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].last_modified >= recent[1].last_modified);
    }

    #[test]
    fn test_delete_active_project() {
        let (_dir, mut manager) = manager();
        manager.create_project("p", "g", "m").unwrap();
        manager.open_project("p").unwrap();

        manager.delete_project("p").unwrap();
        assert!(!manager.is_project_active());
        assert!(manager.list_projects().is_empty());
        assert!(matches!(
            manager.delete_project("p"),
            Err(ProjectError::NotFound { .. })
        ));
    }

    #[test]
    fn test_clear_annotations_requires_active() {
        let (_dir, mut manager) = manager();
        assert!(matches!(
            manager.clear_annotations(),
            Err(ProjectError::NoActiveProject)
        ));

        manager.create_project("p", "g", "m").unwrap();
        let project = manager.open_project("p").unwrap();
        let ann = Annotation::new("car", Shape::BBox(BoundingBox::new(0.1, 0.1, 0.4, 0.4)));
        assert!(project.store().save("a.png", &[ann], "images/a.png", 100, 100));

        assert_eq!(manager.clear_annotations().unwrap(), 1);
        assert!(manager.current().unwrap().store().load_units().is_empty());
    }
}
