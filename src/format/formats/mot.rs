//! MOT ground-truth format (DeepSORT).
//!
//! A single `gt.txt`, one row per box:
//! `frame,track_id,x,y,w,h,1,-1,-1,-1`. The frame id is the 1-based position
//! of the image in the export input; unlinked objects keep track id `-1`.

use crate::constants::MOT_FILE;
use crate::format::error::FormatError;
use crate::format::pipeline::{PreparedImage, PreparedRecord};
use crate::format::traits::{EncodedLabels, LabelEncoder};
use crate::model::{ClassMap, ShapeKind};

/// MOT challenge ground-truth format. Bounding boxes only.
pub struct MotFormat;

impl LabelEncoder for MotFormat {
    fn id(&self) -> &'static str {
        "mot"
    }

    fn display_name(&self) -> &'static str {
        "MOT (gt.txt)"
    }

    fn supports(&self, kind: ShapeKind) -> bool {
        kind == ShapeKind::BBox
    }

    fn encode(
        &self,
        images: &[PreparedImage],
        _class_map: &ClassMap,
    ) -> Result<EncodedLabels, FormatError> {
        let rows: Vec<String> = images
            .iter()
            .flat_map(|image| {
                image
                    .records
                    .iter()
                    .map(move |r| format_row(image.sequence_id(), r))
            })
            .collect();

        let count = rows.len();
        Ok(EncodedLabels::single(MOT_FILE, rows.join("\n"), count))
    }
}

fn format_row(frame: usize, record: &PreparedRecord) -> String {
    let bbox = record.bbox;
    format!(
        "{},{},{},{},{},{},1,-1,-1,-1",
        frame,
        record.track_id,
        bbox.x_min,
        bbox.y_min,
        bbox.width(),
        bbox.height()
    )
}
