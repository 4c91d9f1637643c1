//! Polygon mask export.
//!
//! Rasterises every polygon of an image into a single-channel PNG whose
//! pixel values are class ids (0 is background). Masks are written to
//! `<output_dir>/<stem>_mask.png`, independent of the label dispatcher.

use std::fs;
use std::path::Path;

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::constants::MASK_SUFFIX;
use crate::format::document::{ImageUnit, image_stem};
use crate::format::error::FormatError;
use crate::format::traits::{ExportResult, FormatWarning};
use crate::model::{Annotation, ClassMap, MIN_POLYGON_VERTICES, Shape};

/// One image to rasterise, with annotations in relative space.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSource {
    pub image_filename: String,
    /// Canvas size. Sources without dimensions are skipped.
    pub dimensions: Option<(u32, u32)>,
    pub annotations: Vec<Annotation>,
}

impl MaskSource {
    /// Build a source from a persisted unit (absolute space).
    ///
    /// Records that fail to parse are dropped.
    pub fn from_unit(unit: &ImageUnit) -> Self {
        let dimensions = unit.dimensions();
        let annotations = unit
            .annotations
            .iter()
            .filter_map(|r| Annotation::from_record(r).ok())
            .map(|a| match dimensions {
                Some((w, h)) => a.to_relative(w, h),
                None => a,
            })
            .collect();

        Self {
            image_filename: unit.file_name(),
            dimensions,
            annotations,
        }
    }
}

/// Rasterise the polygons of one image.
///
/// Labels missing from the class map paint as background. Class ids above
/// 255 do not fit a grayscale pixel and are clamped, with a warning.
pub fn rasterize(
    annotations: &[Annotation],
    width: u32,
    height: u32,
    class_map: &ClassMap,
    warnings: &mut Vec<FormatWarning>,
) -> GrayImage {
    let mut mask = GrayImage::new(width, height);

    for annotation in annotations {
        let Shape::Polygon { points } = annotation.shape.to_absolute(width, height) else {
            continue;
        };

        let class_id = class_map.get(&annotation.label).unwrap_or(0);
        let value = u8::try_from(class_id).unwrap_or_else(|_| {
            warnings.push(FormatWarning::warning(format!(
                "Class id {} of '{}' does not fit in a mask; clamped to 255",
                class_id, annotation.label
            )));
            u8::MAX
        });

        let polygon = pixel_polygon(&points);
        if polygon.len() < MIN_POLYGON_VERTICES {
            continue;
        }
        draw_polygon_mut(&mut mask, &polygon, Luma([value]));
    }

    mask
}

/// Integer vertices with repeats removed.
///
/// `draw_polygon_mut` rejects rings whose last vertex repeats the first.
fn pixel_polygon(points: &[(f64, f64)]) -> Vec<Point<i32>> {
    let mut polygon: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &(x, y) in points {
        let p = Point::new(x as i32, y as i32);
        if polygon.last() != Some(&p) {
            polygon.push(p);
        }
    }
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    polygon
}

/// Write one mask PNG per source into `output_dir`.
pub fn export_masks(
    sources: &[MaskSource],
    output_dir: &Path,
    class_map: &ClassMap,
) -> Result<ExportResult, FormatError> {
    log::info!("Exporting masks to {:?}", output_dir);
    fs::create_dir_all(output_dir)?;

    let mut result = ExportResult::new();
    for source in sources {
        let Some((width, height)) = source.dimensions else {
            result.add_warning(
                FormatWarning::warning(format!(
                    "Missing dimensions for {}. Skipping mask.",
                    source.image_filename
                ))
                .with_image(&source.image_filename),
            );
            continue;
        };

        let mask = rasterize(
            &source.annotations,
            width,
            height,
            class_map,
            &mut result.warnings,
        );
        let path = output_dir.join(format!(
            "{}{}",
            image_stem(&source.image_filename),
            MASK_SUFFIX
        ));
        mask.save(&path)?;

        result.images_exported += 1;
        result.annotations_exported += source
            .annotations
            .iter()
            .filter(|a| matches!(a.shape, Shape::Polygon { .. }))
            .count();
        result.files_created.push(path);
    }

    for warning in &result.warnings {
        log::warn!("{}", warning);
    }
    log::info!(
        "Exported {} masks ({} warnings)",
        result.images_exported,
        result.warnings.len()
    );
    Ok(result)
}
