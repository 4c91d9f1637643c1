//! Label format encoders.

mod coco;
mod grounding_dino;
mod mot;
mod pascal_voc;
mod ssd;
mod yolo;

#[cfg(test)]
mod tests;

pub use coco::{COCO_FILE, CocoFormat};
pub use grounding_dino::{GROUNDING_DINO_FILE, GroundingDinoFormat, GroundingDinoListFormat};
pub use mot::MotFormat;
pub use pascal_voc::PascalVocFormat;
pub use ssd::{SSD_FILE, SsdFormat};
pub use yolo::{YoloFormat, format_line};
