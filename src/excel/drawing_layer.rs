//! Carries a template's drawing layer (pictures, charts, shapes, cell notes)
//! over to the copy edit-xlsx saved. The saved copy's drawing parts and
//! sheet wiring are not trusted; the template's parts are put back and each
//! worksheet is re-pointed at them.

use super::package::{
    add_content_types, add_relationship, add_relationship_with_id, content_types, part_for_rels,
    part_text, read_package, relationships, resolve_target, set_sheet_element, upsert_part,
    write_package, ContentType, Relationship, CONTENT_TYPES,
};
use crate::error::Result;

/// Worksheet relationship kinds that belong to the drawing layer, with the
/// worksheet element that references each one.
const LAYER_RELS: &[(&str, Option<&str>)] = &[
    ("/relationships/drawing", Some("drawing")),
    ("/relationships/vmlDrawing", Some("legacyDrawing")),
    ("/relationships/comments", None),
];

/// Restored package plus template parts that had nowhere to go.
#[derive(Debug)]
pub(crate) struct RestoredLayer {
    pub bytes: Vec<u8>,
    pub dropped: Vec<String>,
}

fn is_layer_part(name: &str) -> bool {
    name.starts_with("xl/drawings/")
        || name.starts_with("xl/media/")
        || name.starts_with("xl/charts/")
        || (name.starts_with("xl/comments") && name.ends_with(".xml"))
}

fn layer_element(rel: &Relationship) -> Option<Option<&'static str>> {
    LAYER_RELS
        .iter()
        .find(|(suffix, _)| rel.rel_type.ends_with(suffix))
        .map(|(_, element)| *element)
}

/// Puts the drawing layer of `template` back into `saved`.
pub(crate) fn restore_drawing_layer(saved: &[u8], template: &[u8]) -> Result<RestoredLayer> {
    let original = read_package(template)?;
    let mut parts = read_package(saved)?;

    let mut copied = Vec::new();
    for (name, data) in original.iter().filter(|(name, _)| is_layer_part(name)) {
        upsert_part(&mut parts, name, data.clone());
        copied.push(name.clone());
    }
    if copied.is_empty() {
        return Ok(RestoredLayer {
            bytes: saved.to_vec(),
            dropped: Vec::new(),
        });
    }

    let mut dropped = Vec::new();
    for (rels_path, data) in &original {
        if !rels_path.starts_with("xl/worksheets/_rels/") {
            continue;
        }
        let Some(sheet_path) = part_for_rels(rels_path) else {
            continue;
        };
        let rels_xml = String::from_utf8_lossy(data);
        let wanted: Vec<(Relationship, Option<&str>)> = relationships(&rels_xml)?
            .into_iter()
            .filter_map(|rel| layer_element(&rel).map(|element| (rel, element)))
            .collect();
        if wanted.is_empty() {
            continue;
        }
        let Some(mut sheet_xml) = part_text(&parts, &sheet_path)? else {
            dropped.extend(wanted.iter().map(|(rel, _)| resolve_target(&sheet_path, &rel.target)));
            continue;
        };

        let mut sheet_rels = part_text(&parts, rels_path)?;
        for (rel, element) in wanted {
            let present = match &sheet_rels {
                Some(doc) => relationships(doc)?,
                None => Vec::new(),
            };
            let id = match present
                .iter()
                .find(|p| p.rel_type == rel.rel_type && p.target == rel.target)
            {
                Some(p) => p.id.clone(),
                None if present.iter().all(|p| p.id != rel.id) => {
                    sheet_rels = Some(add_relationship_with_id(
                        sheet_rels.as_deref(),
                        &rel.id,
                        &rel.rel_type,
                        &rel.target,
                    )?);
                    rel.id.clone()
                }
                None => {
                    let (doc, id) =
                        add_relationship(sheet_rels.as_deref(), &rel.rel_type, &rel.target)?;
                    sheet_rels = Some(doc);
                    id
                }
            };
            if let Some(tag) = element {
                sheet_xml = set_sheet_element(&sheet_xml, tag, &id)?;
            }
        }
        if let Some(doc) = sheet_rels {
            upsert_part(&mut parts, rels_path, doc.into_bytes());
        }
        upsert_part(&mut parts, &sheet_path, sheet_xml.into_bytes());
    }

    if let (Some(original_types), Some(saved_types)) = (
        part_text(&original, CONTENT_TYPES)?,
        part_text(&parts, CONTENT_TYPES)?,
    ) {
        let wanted: Vec<ContentType> = content_types(&original_types)?
            .into_iter()
            .filter(|ct| match ct {
                ContentType::Default { .. } => true,
                ContentType::Override { part_name, .. } => copied
                    .iter()
                    .any(|name| part_name.trim_start_matches('/') == name),
            })
            .collect();
        let merged = add_content_types(&saved_types, &wanted)?;
        upsert_part(&mut parts, CONTENT_TYPES, merged.into_bytes());
    }

    tracing::debug!(parts = copied.len(), dropped = dropped.len(), "Template drawing layer restored");
    Ok(RestoredLayer {
        bytes: write_package(&parts)?,
        dropped,
    })
}
