//! Unit tests for the label format encoders.
//!
//! Each encoder is driven through the shared validation pipeline, the same
//! way the export engine drives it, but without touching the filesystem.
//! `export_tests` covers the engine end to end.

use serde_json::Value;

use crate::format::document::ImageUnit;
use crate::format::pipeline::prepare;
use crate::format::registry::ExportTarget;
use crate::format::traits::{EncodedLabels, FormatWarning};
use crate::model::ClassMap;

mod ssd_tests;

/// Build a unit from a JSON annotation list.
fn unit(path: &str, width: u32, height: u32, annotations: Value) -> ImageUnit {
    serde_json::from_value(serde_json::json!({
        "image_path": path,
        "image_width": width,
        "image_height": height,
        "annotations": annotations,
    }))
    .unwrap()
}

/// `car` -> 0, `person` -> 1.
fn class_map() -> ClassMap {
    ClassMap::from_labels(["car", "person"])
}

/// Validate and encode; returns the output and every warning raised.
fn run(
    target: ExportTarget,
    units: &[ImageUnit],
    class_map: &ClassMap,
) -> (EncodedLabels, Vec<FormatWarning>) {
    let encoder = target.encoder();
    let prepared = prepare(units, class_map, |kind| encoder.supports(kind));
    let mut encoded = encoder.encode(&prepared.images, class_map).unwrap();
    let mut warnings = prepared.warnings;
    warnings.append(&mut encoded.warnings);
    (encoded, warnings)
}

/// Parse a JSON file from the encoder output.
fn json_file(encoded: &EncodedLabels, name: &str) -> Value {
    serde_json::from_str(&encoded.files[name]).unwrap()
}

fn messages(warnings: &[FormatWarning]) -> Vec<&str> {
    warnings.iter().map(|w| w.message.as_str()).collect()
}
