//! Part-level access to xlsx packages: zip in/out, relationships, content
//! types and worksheet child elements.

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::io::{Cursor, Read, Write};
use zip::read::ZipArchive;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{ReportError, Result};

pub(crate) const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const CONTENT_TYPES: &str = "[Content_Types].xml";

/// Worksheet children in schema order, from `<drawing>` on.
const SHEET_TAIL: &[&str] = &[
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

pub(crate) type Parts = Vec<(String, Vec<u8>)>;

/// Reads every part of an xlsx package, in archive order.
pub(crate) fn read_package(bytes: &[u8]) -> Result<Parts> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut parts = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().replace('\\', "/");
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| ReportError::Xml(format!("Read {}: {}", name, e)))?;
        parts.push((name, data));
    }
    Ok(parts)
}

pub(crate) fn write_package(parts: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip_writer = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in parts {
        zip_writer.start_file(name.as_str(), opts)?;
        zip_writer
            .write_all(data)
            .map_err(|e| ReportError::Xml(format!("Write {}: {}", name, e)))?;
    }
    Ok(zip_writer.finish()?.into_inner())
}

pub(crate) fn xml_err(e: impl std::fmt::Display) -> ReportError {
    ReportError::Xml(e.to_string())
}

pub(crate) fn part_text(parts: &[(String, Vec<u8>)], name: &str) -> Result<Option<String>> {
    match parts.iter().find(|(n, _)| n == name) {
        Some((_, data)) => String::from_utf8(data.clone())
            .map(Some)
            .map_err(|e| ReportError::Xml(format!("{}: {}", name, e))),
        None => Ok(None),
    }
}

pub(crate) fn has_part(parts: &[(String, Vec<u8>)], name: &str) -> bool {
    parts.iter().any(|(n, _)| n == name)
}

pub(crate) fn upsert_part(parts: &mut Parts, name: &str, data: Vec<u8>) {
    match parts.iter_mut().find(|(n, _)| n == name) {
        Some(slot) => slot.1 = data,
        None => parts.push((name.to_string(), data)),
    }
}

/// `xl/worksheets/sheet1.xml` -> `xl/worksheets/_rels/sheet1.xml.rels`
pub(crate) fn rels_path_for(part: &str) -> String {
    let (dir, file) = split_part(part);
    format!("{}_rels/{}.rels", dir, file)
}

/// Inverse of [`rels_path_for`].
pub(crate) fn part_for_rels(rels: &str) -> Option<String> {
    let (dir, file) = split_part(rels);
    let owner_dir = dir.strip_suffix("_rels/")?;
    let owner_file = file.strip_suffix(".rels")?;
    Some(format!("{}{}", owner_dir, owner_file))
}

fn split_part(part: &str) -> (&str, &str) {
    match part.rfind('/') {
        Some(i) => (&part[..=i], &part[i + 1..]),
        None => ("", part),
    }
}

/// Package path of a relationship target, relative to the owning part.
pub(crate) fn resolve_target(owner: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let (dir, _) = split_part(owner);
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

pub(crate) fn relationships(rels_xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(rels_xml);
    let mut out = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                };
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().map_err(xml_err)?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        _ => {}
                    }
                }
                out.push(rel);
            }
            Ok(Event::Eof) => return Ok(out),
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
    }
}

fn empty_rels() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
        .to_string()
}

/// Adds a relationship under the first free `rIdN` and returns the document
/// with the id it got.
pub(crate) fn add_relationship(
    existing: Option<&str>,
    rel_type: &str,
    target: &str,
) -> Result<(String, String)> {
    let doc = existing.map(str::to_string).unwrap_or_else(empty_rels);
    let taken: Vec<String> = relationships(&doc)?.into_iter().map(|r| r.id).collect();
    let mut n = taken.len() + 1;
    while taken.iter().any(|id| *id == format!("rId{}", n)) {
        n += 1;
    }
    let id = format!("rId{}", n);
    let doc = add_relationship_with_id(Some(&doc), &id, rel_type, target)?;
    Ok((doc, id))
}

/// Adds a relationship with a caller-chosen id; the caller checks it is free.
pub(crate) fn add_relationship_with_id(
    existing: Option<&str>,
    id: &str,
    rel_type: &str,
    target: &str,
) -> Result<String> {
    let doc = existing.map(str::to_string).unwrap_or_else(empty_rels);
    let element = format!(
        r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
        id, rel_type, target
    );
    insert_before_close(&doc, "</Relationships>", &element)
        .or_else(|| self_closed_to_pair(&doc, "Relationships", &element))
        .ok_or_else(|| ReportError::Xml("Relationships part has no root".to_string()))
}

pub(crate) fn insert_before_close(doc: &str, close_tag: &str, element: &str) -> Option<String> {
    let pos = doc.rfind(close_tag)?;
    let mut out = String::with_capacity(doc.len() + element.len());
    out.push_str(&doc[..pos]);
    out.push_str(element);
    out.push_str(&doc[pos..]);
    Some(out)
}

/// `<Root .../>` -> `<Root ...>element</Root>`.
fn self_closed_to_pair(doc: &str, root: &str, element: &str) -> Option<String> {
    let start = doc.find(&format!("<{}", root))?;
    let end = start + doc[start..].find("/>")?;
    Some(format!(
        "{}>{}</{}>{}",
        &doc[..end],
        element,
        root,
        &doc[end + 2..]
    ))
}

/// Points worksheet child `<tag r:id=".."/>` (`drawing`, `legacyDrawing`) at
/// `rel_id`. An existing element is replaced; otherwise the element goes
/// where the worksheet schema expects it.
pub(crate) fn set_sheet_element(sheet_xml: &str, tag: &str, rel_id: &str) -> Result<String> {
    let root_start = sheet_xml
        .find("<worksheet")
        .ok_or_else(|| ReportError::Xml("Worksheet part has no root".to_string()))?;
    let root_end = root_start
        + sheet_xml[root_start..]
            .find('>')
            .ok_or_else(|| ReportError::Xml("Unterminated worksheet root".to_string()))?;
    let element = if sheet_xml[root_start..root_end].contains("xmlns:r=") {
        format!(r#"<{} r:id="{}"/>"#, tag, rel_id)
    } else {
        format!(r#"<{} xmlns:r="{}" r:id="{}"/>"#, tag, REL_NS, rel_id)
    };

    let existing = Regex::new(&format!(r"<{}\b[^>]*/>", regex::escape(tag))).map_err(xml_err)?;
    if existing.is_match(sheet_xml) {
        return Ok(existing.replace(sheet_xml, element.as_str()).into_owned());
    }

    let successors = SHEET_TAIL
        .iter()
        .skip_while(|t| **t != tag)
        .skip(1)
        .map(|t| format!("<{}", t));
    let search_from = sheet_xml.find("</sheetData>").unwrap_or(root_end);
    let insert_at = successors
        .filter_map(|t| {
            // `<legacyDrawing` must not match `<legacyDrawingHF`
            let re = Regex::new(&format!(r"{}\b", regex::escape(&t))).ok()?;
            re.find(&sheet_xml[search_from..]).map(|m| search_from + m.start())
        })
        .min();
    match insert_at {
        Some(pos) => Ok(format!("{}{}{}", &sheet_xml[..pos], element, &sheet_xml[pos..])),
        None => insert_before_close(sheet_xml, "</worksheet>", &element)
            .ok_or_else(|| ReportError::Xml("Worksheet part is not closed".to_string())),
    }
}

/// `<Default>` / `<Override>` entry of `[Content_Types].xml`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ContentType {
    Default { extension: String, content_type: String },
    Override { part_name: String, content_type: String },
}

impl ContentType {
    fn element(&self) -> String {
        match self {
            ContentType::Default {
                extension,
                content_type,
            } => format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                extension, content_type
            ),
            ContentType::Override {
                part_name,
                content_type,
            } => format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                part_name, content_type
            ),
        }
    }

    fn same_key(&self, other: &ContentType) -> bool {
        match (self, other) {
            (ContentType::Default { extension: a, .. }, ContentType::Default { extension: b, .. }) => {
                a.eq_ignore_ascii_case(b)
            }
            (ContentType::Override { part_name: a, .. }, ContentType::Override { part_name: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

pub(crate) fn content_types(xml: &str) -> Result<Vec<ContentType>> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let local = e.local_name();
                let is_default = local.as_ref() == b"Default";
                if !is_default && local.as_ref() != b"Override" {
                    continue;
                }
                let mut key = String::new();
                let mut content_type = String::new();
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().map_err(xml_err)?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"Extension" | b"PartName" => key = value,
                        b"ContentType" => content_type = value,
                        _ => {}
                    }
                }
                out.push(if is_default {
                    ContentType::Default {
                        extension: key,
                        content_type,
                    }
                } else {
                    ContentType::Override {
                        part_name: key,
                        content_type,
                    }
                });
            }
            Ok(Event::Eof) => return Ok(out),
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
    }
}

/// Appends the entries `xml` does not declare yet.
pub(crate) fn add_content_types(xml: &str, wanted: &[ContentType]) -> Result<String> {
    let present = content_types(xml)?;
    let elements: String = wanted
        .iter()
        .filter(|w| !present.iter().any(|p| p.same_key(w)))
        .map(ContentType::element)
        .collect();
    if elements.is_empty() {
        return Ok(xml.to_string());
    }
    insert_before_close(xml, "</Types>", &elements)
        .ok_or_else(|| ReportError::Xml("[Content_Types].xml is not closed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rels_paths_round_trip() {
        assert_eq!(
            rels_path_for("xl/worksheets/sheet2.xml"),
            "xl/worksheets/_rels/sheet2.xml.rels"
        );
        assert_eq!(
            part_for_rels("xl/worksheets/_rels/sheet2.xml.rels").as_deref(),
            Some("xl/worksheets/sheet2.xml")
        );
        assert_eq!(part_for_rels("xl/worksheets/sheet2.xml"), None);
    }

    #[test]
    fn resolves_relative_and_absolute_targets() {
        assert_eq!(
            resolve_target("xl/worksheets/sheet1.xml", "../drawings/drawing1.xml"),
            "xl/drawings/drawing1.xml"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "/xl/worksheets/sheet3.xml"),
            "xl/worksheets/sheet3.xml"
        );
    }

    #[test]
    fn relationship_ids_skip_taken() {
        let rels = r#"<Relationships><Relationship Id="rId2" Type="t" Target="a"/></Relationships>"#;
        let (doc, id) = add_relationship(Some(rels), "x", "b").unwrap();
        assert_eq!(id, "rId3");
        assert_eq!(relationships(&doc).unwrap().len(), 2);

        let (doc, id) = add_relationship(Some("<Relationships/>"), "x", "b").unwrap();
        assert_eq!(id, "rId1");
        assert!(doc.ends_with("</Relationships>"));
    }

    #[test]
    fn legacy_drawing_goes_after_drawing() {
        let sheet = r#"<worksheet xmlns:r="r"><sheetData/><drawing r:id="rId1"/><legacyDrawingHF r:id="rId9"/></worksheet>"#;
        let out = set_sheet_element(sheet, "legacyDrawing", "rId4").unwrap();
        assert_eq!(
            out,
            r#"<worksheet xmlns:r="r"><sheetData/><drawing r:id="rId1"/><legacyDrawing r:id="rId4"/><legacyDrawingHF r:id="rId9"/></worksheet>"#
        );
        let again = set_sheet_element(&out, "legacyDrawing", "rId5").unwrap();
        assert_eq!(again.matches("<legacyDrawing ").count(), 1);
        assert!(again.contains(r#"<legacyDrawing r:id="rId5"/>"#));
        assert!(again.contains(r#"<legacyDrawingHF r:id="rId9"/>"#));
    }

    #[test]
    fn content_types_added_once() {
        let xml = r#"<Types><Default Extension="xml" ContentType="a"/><Override PartName="/xl/workbook.xml" ContentType="b"/></Types>"#;
        let wanted = vec![
            ContentType::Default {
                extension: "XML".to_string(),
                content_type: "a".to_string(),
            },
            ContentType::Default {
                extension: "png".to_string(),
                content_type: "image/png".to_string(),
            },
        ];
        let out = add_content_types(xml, &wanted).unwrap();
        assert_eq!(out.matches("<Default ").count(), 2);
        assert!(out.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
        assert_eq!(content_types(&out).unwrap().len(), 3);
    }
}
