//! File and directory names shared across the crate

/// Project directory name used when an export is not given one
pub const DEFAULT_PROJECT_NAME: &str = "dataset_export";

/// Directory holding copied source images (export) or project images
pub const IMAGES_DIR: &str = "images";

/// Directory holding exported label files
pub const LABELS_DIR: &str = "labels";

/// Directory holding per-image annotation documents inside a project
pub const ANNOTATIONS_DIR: &str = "annotations";

/// Project state file
pub const PROJECT_FILE: &str = "project.json";

/// MOT ground-truth file name
pub const MOT_FILE: &str = "gt.txt";

/// Suffix of rasterised mask files (`<stem>_mask.png`)
pub const MASK_SUFFIX: &str = "_mask.png";

/// Number of entries returned by recent-project queries by default
pub const DEFAULT_RECENT_PROJECTS: usize = 5;
