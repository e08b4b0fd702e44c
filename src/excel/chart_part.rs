//! Grafts a clustered column chart into a saved xlsx package. edit-xlsx has
//! no chart API, so the chart, drawing and relationship parts are written
//! directly and wired into the target worksheet.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use super::package::{
    add_content_types, add_relationship, has_part, part_text, read_package,
    rels_path_for, relationships, resolve_target, set_sheet_element, upsert_part, write_package,
    xml_err, ContentType, Parts, CONTENT_TYPES, REL_NS,
};
use super::{col_letter, BarChartSpec, ColumnSpan};
use crate::error::{ReportError, Result};

const DRAWING_REL_SUFFIX: &str = "/relationships/drawing";
const DRAWING_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
const CHART_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
const CHART_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
const DRAWING_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";
const XDR_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// Chart footprint in cells.
const CHART_WIDTH_COLS: u32 = 8;
const CHART_HEIGHT_ROWS: u32 = 15;

/// Returns a copy of `package` with `spec` drawn on worksheet `sheet_name`.
/// A sheet that already has a drawing (pictures, charts) gets the chart as
/// one more anchor in it; otherwise a new drawing part is created.
pub fn embed_bar_chart(package: &[u8], sheet_name: &str, spec: &BarChartSpec) -> Result<Vec<u8>> {
    if spec.categories.last_row < spec.categories.first_row {
        return Err(ReportError::Chart("Chart has no categories".to_string()));
    }
    let mut parts = read_package(package)?;

    let sheet_path = worksheet_path(&parts, sheet_name)?;
    let sheet_rels_path = rels_path_for(&sheet_path);
    let chart_no = next_part_number(&parts, "xl/charts/chart");
    let chart_path = format!("xl/charts/chart{}.xml", chart_no);

    let mut sheet_rels = part_text(&parts, &sheet_rels_path)?;
    let existing = existing_drawing(&parts, &sheet_path, sheet_rels.as_deref())?;
    let (drawing_rel_id, drawing_path, chart_target) = match &existing {
        Some((rel_id, path)) => (rel_id.clone(), path.clone(), format!("/{}", chart_path)),
        None => {
            let drawing_no = next_part_number(&parts, "xl/drawings/drawing");
            let (doc, rel_id) = add_relationship(
                sheet_rels.as_deref(),
                DRAWING_REL_TYPE,
                &format!("../drawings/drawing{}.xml", drawing_no),
            )?;
            sheet_rels = Some(doc);
            (
                rel_id,
                format!("xl/drawings/drawing{}.xml", drawing_no),
                format!("../charts/chart{}.xml", chart_no),
            )
        }
    };
    if let Some(doc) = sheet_rels {
        upsert_part(&mut parts, &sheet_rels_path, doc.into_bytes());
    }

    let drawing_rels_path = rels_path_for(&drawing_path);
    let (drawing_rels, chart_rel_id) = add_relationship(
        part_text(&parts, &drawing_rels_path)?.as_deref(),
        CHART_REL_TYPE,
        &chart_target,
    )?;
    let drawing = match &existing {
        Some(_) => {
            let current = part_text(&parts, &drawing_path)?
                .ok_or_else(|| ReportError::Xml(format!("Missing drawing part {}", drawing_path)))?;
            append_anchor(&current, spec, &chart_rel_id, chart_no)?
        }
        None => drawing_xml(spec, &chart_rel_id, chart_no),
    };
    upsert_part(&mut parts, &drawing_path, drawing.into_bytes());
    upsert_part(&mut parts, &drawing_rels_path, drawing_rels.into_bytes());

    let sheet_xml = part_text(&parts, &sheet_path)?
        .ok_or_else(|| ReportError::Xml(format!("Missing worksheet part {}", sheet_path)))?;
    let sheet_xml = set_sheet_element(&sheet_xml, "drawing", &drawing_rel_id)?;
    upsert_part(&mut parts, &sheet_path, sheet_xml.into_bytes());

    let mut overrides = vec![ContentType::Override {
        part_name: format!("/{}", chart_path),
        content_type: CHART_CONTENT_TYPE.to_string(),
    }];
    if existing.is_none() {
        overrides.push(ContentType::Override {
            part_name: format!("/{}", drawing_path),
            content_type: DRAWING_CONTENT_TYPE.to_string(),
        });
    }
    let types = part_text(&parts, CONTENT_TYPES)?
        .ok_or_else(|| ReportError::Xml("Missing [Content_Types].xml".to_string()))?;
    upsert_part(&mut parts, CONTENT_TYPES, add_content_types(&types, &overrides)?.into_bytes());

    parts.push((chart_path, chart_xml(sheet_name, spec).into_bytes()));

    tracing::debug!(
        sheet = sheet_name,
        chart_no,
        drawing = %drawing_path,
        appended = existing.is_some(),
        "Chart grafted into package"
    );
    write_package(&parts)
}

/// Package path of the worksheet named `sheet_name`, via workbook.xml and
/// its relationships.
fn worksheet_path(parts: &[(String, Vec<u8>)], sheet_name: &str) -> Result<String> {
    let workbook = part_text(parts, "xl/workbook.xml")?
        .ok_or_else(|| ReportError::Xml("Missing xl/workbook.xml".to_string()))?;
    let rel_id = sheet_rel_id(&workbook, sheet_name)?
        .ok_or_else(|| ReportError::Chart(format!("Sheet not found: {}", sheet_name)))?;
    let rels = part_text(parts, "xl/_rels/workbook.xml.rels")?
        .ok_or_else(|| ReportError::Xml("Missing xl/_rels/workbook.xml.rels".to_string()))?;
    let target = relationships(&rels)?
        .into_iter()
        .find(|r| r.id == rel_id)
        .map(|r| r.target)
        .ok_or_else(|| ReportError::Xml(format!("Dangling sheet relationship {}", rel_id)))?;
    Ok(resolve_target("xl/workbook.xml", &target))
}

fn sheet_rel_id(workbook_xml: &str, sheet_name: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(workbook_xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut id = None;
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().map_err(xml_err)?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(value),
                        b"id" => id = Some(value),
                        _ => {}
                    }
                }
                if name.as_deref() == Some(sheet_name) {
                    return Ok(id);
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
    }
}

/// The sheet's DrawingML part, when its relationship resolves to a part
/// present in the package.
fn existing_drawing(
    parts: &Parts,
    sheet_path: &str,
    sheet_rels: Option<&str>,
) -> Result<Option<(String, String)>> {
    let Some(rels) = sheet_rels else {
        return Ok(None);
    };
    Ok(relationships(rels)?
        .into_iter()
        .filter(|r| r.rel_type.ends_with(DRAWING_REL_SUFFIX))
        .map(|r| (r.id, resolve_target(sheet_path, &r.target)))
        .find(|(_, path)| has_part(parts, path)))
}

fn next_part_number(parts: &[(String, Vec<u8>)], prefix: &str) -> u32 {
    parts
        .iter()
        .filter_map(|(name, _)| name.strip_prefix(prefix)?.strip_suffix(".xml")?.parse::<u32>().ok())
        .max()
        .map_or(1, |n| n + 1)
}

/// Next free `cNvPr` id in a drawing.
fn next_shape_id(drawing: &str) -> Result<u32> {
    let re = Regex::new(r#"<(?:\w+:)?cNvPr\b[^>]*?\sid="(\d+)""#).map_err(xml_err)?;
    Ok(re
        .captures_iter(drawing)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
        .map_or(2, |n| n + 1))
}

/// Inserts the chart anchor before the closing `wsDr` tag of `drawing`.
fn append_anchor(drawing: &str, spec: &BarChartSpec, chart_rel_id: &str, chart_no: u32) -> Result<String> {
    let close = drawing
        .rfind("</")
        .filter(|&i| drawing[i..].trim_end().ends_with("wsDr>"))
        .ok_or_else(|| ReportError::Chart("Drawing part has no open wsDr root".to_string()))?;
    let anchor = anchor_xml(spec, chart_rel_id, next_shape_id(drawing)?, chart_no, true);
    Ok(format!("{}{}{}", &drawing[..close], anchor, &drawing[close..]))
}

/// `'Sheet Name'!$G$2:$G$4`
fn range_formula(sheet_name: &str, span: &ColumnSpan) -> String {
    let col = col_letter(span.col);
    if span.first_row == span.last_row {
        format!("{}!${}${}", quote_sheet(sheet_name), col, span.first_row)
    } else {
        format!(
            "{}!${}${}:${}${}",
            quote_sheet(sheet_name),
            col,
            span.first_row,
            col,
            span.last_row
        )
    }
}

fn quote_sheet(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

fn chart_xml(sheet_name: &str, spec: &BarChartSpec) -> String {
    let series_name = range_formula(
        sheet_name,
        &ColumnSpan {
            col: spec.series_name.col,
            first_row: spec.series_name.row,
            last_row: spec.series_name.row,
        },
    );
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{rel_ns}"><c:chart><c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>{title}</a:t></a:r></a:p></c:rich></c:tx><c:overlay val="0"/></c:title><c:autoTitleDeleted val="0"/><c:plotArea><c:layout/><c:barChart><c:barDir val="col"/><c:grouping val="clustered"/><c:varyColors val="0"/><c:ser><c:idx val="0"/><c:order val="0"/><c:tx><c:strRef><c:f>{name}</c:f></c:strRef></c:tx><c:cat><c:strRef><c:f>{cat}</c:f></c:strRef></c:cat><c:val><c:numRef><c:f>{val}</c:f></c:numRef></c:val></c:ser><c:gapWidth val="150"/><c:axId val="50010001"/><c:axId val="50010002"/></c:barChart><c:catAx><c:axId val="50010001"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="b"/><c:numFmt formatCode="General" sourceLinked="1"/><c:tickLblPos val="nextTo"/><c:crossAx val="50010002"/><c:crosses val="autoZero"/><c:auto val="1"/><c:lblAlgn val="ctr"/><c:lblOffset val="100"/></c:catAx><c:valAx><c:axId val="50010002"/><c:scaling><c:orientation val="minMax"/><c:max val="100"/><c:min val="0"/></c:scaling><c:delete val="0"/><c:axPos val="l"/><c:majorGridlines/><c:numFmt formatCode="General" sourceLinked="1"/><c:tickLblPos val="nextTo"/><c:crossAx val="50010001"/><c:crosses val="autoZero"/><c:crossBetween val="between"/></c:valAx></c:plotArea><c:legend><c:legendPos val="r"/><c:overlay val="0"/></c:legend><c:plotVisOnly val="1"/></c:chart></c:chartSpace>"#,
        rel_ns = REL_NS,
        title = escape(spec.title.as_str()),
        name = escape(series_name.as_str()),
        cat = escape(range_formula(sheet_name, &spec.categories).as_str()),
        val = escape(range_formula(sheet_name, &spec.values).as_str()),
    )
}

/// One `twoCellAnchor` holding the chart frame. `declare_ns` adds the
/// `xdr`/`a` declarations for drawings whose root binds other prefixes.
fn anchor_xml(spec: &BarChartSpec, chart_rel_id: &str, shape_id: u32, chart_no: u32, declare_ns: bool) -> String {
    let from_col = spec.anchor.col.saturating_sub(1);
    let from_row = spec.anchor.row.saturating_sub(1);
    let ns = if declare_ns {
        format!(r#" xmlns:xdr="{}" xmlns:a="{}""#, XDR_NS, A_NS)
    } else {
        String::new()
    };
    format!(
        r#"<xdr:twoCellAnchor{ns}><xdr:from><xdr:col>{fc}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{fr}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from><xdr:to><xdr:col>{tc}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{tr}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to><xdr:graphicFrame macro=""><xdr:nvGraphicFramePr><xdr:cNvPr id="{id}" name="Chart {no}"/><xdr:cNvGraphicFramePr/></xdr:nvGraphicFramePr><xdr:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/></xdr:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:r="{rel_ns}" r:id="{rid}"/></a:graphicData></a:graphic></xdr:graphicFrame><xdr:clientData/></xdr:twoCellAnchor>"#,
        ns = ns,
        fc = from_col,
        fr = from_row,
        tc = from_col + CHART_WIDTH_COLS,
        tr = from_row + CHART_HEIGHT_ROWS,
        id = shape_id,
        no = chart_no,
        rel_ns = REL_NS,
        rid = chart_rel_id,
    )
}

fn drawing_xml(spec: &BarChartSpec, chart_rel_id: &str, chart_no: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="{}" xmlns:a="{}">{}</xdr:wsDr>"#,
        XDR_NS,
        A_NS,
        anchor_xml(spec, chart_rel_id, 2, chart_no, false)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellPosition;

    fn spec() -> BarChartSpec {
        BarChartSpec {
            title: "Accuracy by unit".to_string(),
            series_name: CellPosition::new(1, 7),
            categories: ColumnSpan { col: 6, first_row: 2, last_row: 4 },
            values: ColumnSpan { col: 7, first_row: 2, last_row: 4 },
            anchor: CellPosition::new(10, 6),
        }
    }

    fn minimal_package(sheet_xml: &str, sheet_rels: Option<&str>) -> Vec<u8> {
        let mut parts = vec![
            (
                "[Content_Types].xml".to_string(),
                br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/xl/workbook.xml" ContentType="wb"/></Types>"#.to_vec(),
            ),
            (
                "xl/workbook.xml".to_string(),
                br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Cover" sheetId="1" r:id="rId1"/><sheet name="My Sheet" sheetId="2" r:id="rId2"/></sheets></workbook>"#.to_vec(),
            ),
            (
                "xl/_rels/workbook.xml.rels".to_string(),
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="ws" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="ws" Target="/xl/worksheets/sheet2.xml"/></Relationships>"#.to_vec(),
            ),
            ("xl/worksheets/sheet1.xml".to_string(), b"<worksheet/>".to_vec()),
            ("xl/worksheets/sheet2.xml".to_string(), sheet_xml.as_bytes().to_vec()),
        ];
        if let Some(rels) = sheet_rels {
            parts.push((
                "xl/worksheets/_rels/sheet2.xml.rels".to_string(),
                rels.as_bytes().to_vec(),
            ));
        }
        write_package(&parts).unwrap()
    }

    fn text_of(parts: &[(String, Vec<u8>)], name: &str) -> String {
        part_text(parts, name).unwrap().unwrap()
    }

    #[test]
    fn grafts_chart_into_named_sheet() {
        let sheet = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/><pageMargins left="0.7"/><tableParts count="0"/></worksheet>"#;
        let out = embed_bar_chart(&minimal_package(sheet, None), "My Sheet", &spec()).unwrap();
        let parts = read_package(&out).unwrap();

        let chart = text_of(&parts, "xl/charts/chart1.xml");
        assert!(chart.contains("<c:f>&apos;My Sheet&apos;!$F$2:$F$4</c:f>"));
        assert!(chart.contains("<c:f>&apos;My Sheet&apos;!$G$2:$G$4</c:f>"));
        assert!(chart.contains("<c:f>&apos;My Sheet&apos;!$G$1</c:f>"));
        assert!(chart.contains("<a:t>Accuracy by unit</a:t>"));

        let drawing = text_of(&parts, "xl/drawings/drawing1.xml");
        assert!(drawing.contains("<xdr:col>5</xdr:col>"));
        assert!(drawing.contains("<xdr:row>9</xdr:row>"));
        let drawing_rels = text_of(&parts, "xl/drawings/_rels/drawing1.xml.rels");
        assert!(drawing_rels.contains(r#"Target="../charts/chart1.xml""#));

        let rels = text_of(&parts, "xl/worksheets/_rels/sheet2.xml.rels");
        assert!(rels.contains(r#"Id="rId1""#));
        assert!(rels.contains(r#"Target="../drawings/drawing1.xml""#));

        let sheet = text_of(&parts, "xl/worksheets/sheet2.xml");
        let drawing_at = sheet.find("<drawing ").unwrap();
        assert!(drawing_at > sheet.find("<pageMargins").unwrap());
        assert!(drawing_at < sheet.find("<tableParts").unwrap());
        assert!(sheet.contains(REL_NS));

        let types = text_of(&parts, "[Content_Types].xml");
        assert!(types.contains(r#"PartName="/xl/charts/chart1.xml""#));
        assert!(types.contains(r#"PartName="/xl/drawings/drawing1.xml""#));
        assert_eq!(text_of(&parts, "xl/worksheets/sheet1.xml"), "<worksheet/>");
    }

    #[test]
    fn reuses_existing_rels_and_drawing_slot() {
        let sheet = r#"<worksheet xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetData/><drawing r:id="rId9"/></worksheet>"#;
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="hyperlink" Target="x"/></Relationships>"#;
        let out = embed_bar_chart(&minimal_package(sheet, Some(rels)), "My Sheet", &spec()).unwrap();
        let parts = read_package(&out).unwrap();

        let rels = text_of(&parts, "xl/worksheets/_rels/sheet2.xml.rels");
        assert!(rels.contains(r#"Id="rId1" Type="hyperlink""#));
        assert!(rels.contains(r#"Id="rId2""#));
        let sheet = text_of(&parts, "xl/worksheets/sheet2.xml");
        assert_eq!(sheet.matches("<drawing ").count(), 1);
        assert!(sheet.contains(r#"<drawing r:id="rId2"/>"#));
    }

    #[test]
    fn appends_to_existing_picture_drawing() {
        let sheet = r#"<worksheet xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetData/><drawing r:id="rId1"/></worksheet>"#;
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/></Relationships>"#;
        let mut parts = read_package(&minimal_package(sheet, Some(rels))).unwrap();
        parts.push((
            "xl/drawings/drawing1.xml".to_string(),
            br#"<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing"><xdr:oneCellAnchor><xdr:pic><xdr:nvPicPr><xdr:cNvPr id="3" name="Picture 1"/></xdr:nvPicPr></xdr:pic></xdr:oneCellAnchor></xdr:wsDr>"#.to_vec(),
        ));
        parts.push((
            "xl/drawings/_rels/drawing1.xml.rels".to_string(),
            br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="image" Target="../media/image1.png"/></Relationships>"#.to_vec(),
        ));
        let package = write_package(&parts).unwrap();

        let out = embed_bar_chart(&package, "My Sheet", &spec()).unwrap();
        let parts = read_package(&out).unwrap();
        assert!(part_text(&parts, "xl/drawings/drawing2.xml").unwrap().is_none());

        let drawing = text_of(&parts, "xl/drawings/drawing1.xml");
        assert!(drawing.contains(r#"name="Picture 1""#));
        assert!(drawing.contains(r#"<xdr:cNvPr id="4" name="Chart 1"/>"#));
        assert!(drawing.contains(r#"r:id="rId2""#));
        assert!(drawing.ends_with("</xdr:twoCellAnchor></xdr:wsDr>"));

        let drawing_rels = text_of(&parts, "xl/drawings/_rels/drawing1.xml.rels");
        assert!(drawing_rels.contains(r#"Target="../media/image1.png""#));
        assert!(drawing_rels.contains(r#"Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart" Target="/xl/charts/chart1.xml""#));

        let sheet_rels = relationships(&text_of(&parts, "xl/worksheets/_rels/sheet2.xml.rels")).unwrap();
        assert_eq!(sheet_rels.len(), 1);
        let sheet = text_of(&parts, "xl/worksheets/sheet2.xml");
        assert!(sheet.contains(r#"<drawing r:id="rId1"/>"#));

        let types = text_of(&parts, "[Content_Types].xml");
        assert!(types.contains(r#"PartName="/xl/charts/chart1.xml""#));
        assert!(!types.contains("drawing2"));
        assert!(text_of(&parts, "xl/charts/chart1.xml").contains("<c:barChart>"));
    }

    #[test]
    fn shape_ids_follow_existing() {
        assert_eq!(next_shape_id("<xdr:wsDr/>").unwrap(), 2);
        assert_eq!(
            next_shape_id(r#"<xdr:cNvPr id="7" name="a"/><xdr:cNvPr descr="x" id="12"/>"#).unwrap(),
            13
        );
    }

    #[test]
    fn unknown_sheet_is_a_chart_error() {
        let package = minimal_package("<worksheet><sheetData/></worksheet>", None);
        let err = embed_bar_chart(&package, "Missing", &spec()).unwrap_err();
        assert!(matches!(err, ReportError::Chart(_)));
    }

    #[test]
    fn part_numbers_continue_after_existing() {
        let parts = vec![
            ("xl/charts/chart1.xml".to_string(), Vec::new()),
            ("xl/charts/chart3.xml".to_string(), Vec::new()),
            ("xl/charts/_rels/chart3.xml.rels".to_string(), Vec::new()),
        ];
        assert_eq!(next_part_number(&parts, "xl/charts/chart"), 4);
        assert_eq!(next_part_number(&parts, "xl/drawings/drawing"), 1);
    }

    #[test]
    fn sheet_names_with_quotes_are_escaped() {
        assert_eq!(quote_sheet("Bob's"), "'Bob''s'");
    }
}
