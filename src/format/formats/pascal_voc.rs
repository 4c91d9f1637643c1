//! Pascal VOC XML format.
//!
//! Implements the Pascal Visual Object Classes (VOC) annotation format,
//! which uses one XML file per image.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::constants::IMAGES_DIR;
use crate::format::error::FormatError;
use crate::format::pipeline::{PreparedImage, PreparedRecord};
use crate::format::traits::{EncodedLabels, LabelEncoder};
use crate::model::{ClassMap, ShapeKind};

/// Pascal VOC XML format.
///
/// Supports:
/// - Bounding boxes only, as integer pixel corners
/// - Per-image annotation files
///
/// Polygons and keypoint sets are not exported.
pub struct PascalVocFormat;

impl LabelEncoder for PascalVocFormat {
    fn id(&self) -> &'static str {
        "voc"
    }

    fn display_name(&self) -> &'static str {
        "Pascal VOC (XML)"
    }

    fn supports(&self, kind: ShapeKind) -> bool {
        kind == ShapeKind::BBox
    }

    fn encode(
        &self,
        images: &[PreparedImage],
        _class_map: &ClassMap,
    ) -> Result<EncodedLabels, FormatError> {
        let mut encoded = EncodedLabels::new();

        for image in images {
            let xml = self.build_xml(image)?;
            encoded.annotations_exported += image.records.len();
            encoded.files.insert(format!("{}.xml", image.stem()), xml);
        }

        Ok(encoded)
    }
}

impl PascalVocFormat {
    /// Build XML content for an image.
    fn build_xml(&self, image: &PreparedImage) -> Result<String, FormatError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        let (width, height) = image.dimensions_or_zero();

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| FormatError::Xml(e.into()))?;

        writer
            .write_event(Event::Start(BytesStart::new("annotation")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        self.write_text_element(&mut writer, "folder", IMAGES_DIR)?;
        self.write_text_element(&mut writer, "filename", &image.file_name)?;

        writer
            .write_event(Event::Start(BytesStart::new("size")))
            .map_err(|e| FormatError::Xml(e.into()))?;
        self.write_text_element(&mut writer, "width", &width.to_string())?;
        self.write_text_element(&mut writer, "height", &height.to_string())?;
        self.write_text_element(&mut writer, "depth", "3")?;
        writer
            .write_event(Event::End(BytesEnd::new("size")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        self.write_text_element(&mut writer, "segmented", "0")?;

        for record in &image.records {
            self.write_object(&mut writer, record)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("annotation")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        let result = writer.into_inner();
        String::from_utf8(result).map_err(|_| FormatError::invalid_format("Invalid UTF-8 in XML"))
    }

    /// Write one `<object>` with its `<bndbox>`.
    fn write_object<W: Write>(
        &self,
        writer: &mut Writer<W>,
        record: &PreparedRecord,
    ) -> Result<(), FormatError> {
        writer
            .write_event(Event::Start(BytesStart::new("object")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        self.write_text_element(writer, "name", &record.label)?;
        self.write_text_element(writer, "pose", "Unspecified")?;
        self.write_text_element(writer, "truncated", "0")?;
        self.write_text_element(writer, "difficult", "0")?;

        // Corners are truncated toward zero
        let bbox = record.bbox;
        writer
            .write_event(Event::Start(BytesStart::new("bndbox")))
            .map_err(|e| FormatError::Xml(e.into()))?;
        self.write_text_element(writer, "xmin", &(bbox.x_min as i64).to_string())?;
        self.write_text_element(writer, "ymin", &(bbox.y_min as i64).to_string())?;
        self.write_text_element(writer, "xmax", &(bbox.x_max as i64).to_string())?;
        self.write_text_element(writer, "ymax", &(bbox.y_max as i64).to_string())?;
        writer
            .write_event(Event::End(BytesEnd::new("bndbox")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        writer
            .write_event(Event::End(BytesEnd::new("object")))
            .map_err(|e| FormatError::Xml(e.into()))?;
        Ok(())
    }

    /// Write a simple text element.
    fn write_text_element<W: Write>(
        &self,
        writer: &mut Writer<W>,
        name: &str,
        value: &str,
    ) -> Result<(), FormatError> {
        writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(|e| FormatError::Xml(e.into()))?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(|e| FormatError::Xml(e.into()))?;
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(|e| FormatError::Xml(e.into()))?;
        Ok(())
    }
}
