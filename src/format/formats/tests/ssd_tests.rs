//! Tests for the SSD JSON format.

use serde_json::json;

use super::{class_map, json_file, run, unit};
use crate::format::formats::SSD_FILE;
use crate::format::registry::ExportTarget;

#[test]
fn test_ssd_per_image_entries() {
    let units = [
        unit(
            "/data/a.jpg",
            100,
            100,
            json!([
                {"label": "car", "type": "bbox", "points": [1, 2, 3, 4]},
                {"label": "person", "type": "polygon", "points": [0, 0, 10, 0, 5, 8.333]},
            ]),
        ),
        unit("/data/b.jpg", 100, 100, json!([])),
    ];
    let (encoded, warnings) = run(ExportTarget::Ssd, &units, &class_map());
    assert!(warnings.is_empty());

    assert_eq!(
        json_file(&encoded, SSD_FILE),
        json!([
            {"image": "a.jpg", "annotations": [
                {"category": "car", "bbox": [1.0, 2.0, 3.0, 4.0]},
                {"category": "person", "bbox": [0.0, 0.0, 10.0, 8.33]},
            ]},
            {"image": "b.jpg", "annotations": []},
        ])
    );
    assert_eq!(encoded.annotations_exported, 2);
}

#[test]
fn test_ssd_checks_class_map() {
    let units = [unit(
        "a.jpg",
        100,
        100,
        json!([
            {"label": "dog", "type": "bbox", "points": [1, 2, 3, 4]},
            {"type": "bbox", "points": [1, 2, 3, 4]},
        ]),
    )];
    let (encoded, warnings) = run(ExportTarget::Ssd, &units, &class_map());

    assert_eq!(warnings.len(), 2);
    assert_eq!(
        json_file(&encoded, SSD_FILE),
        json!([{"image": "a.jpg", "annotations": []}])
    );
}
