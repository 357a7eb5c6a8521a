//! Minimal single-sheet SpreadsheetML workbook writer.
//!
//! Strings go in as inline strings rather than a shared-strings part, which
//! keeps the container to five fixed entries plus the worksheet.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::table::{NormalizedTable, Value};

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"</Types>"#,
);

const RELS_DOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

const WORKBOOK_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"</Relationships>"#,
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="1"><fill><patternFill patternType="none"/></fill></fills>"#,
    r#"<borders count="1"><border/></borders>"#,
    r#"<cellStyleXfs count="1"><xf/></cellStyleXfs>"#,
    r#"<cellXfs count="1"><xf/></cellXfs>"#,
    r#"</styleSheet>"#,
);

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>"#,
            r#"</workbook>"#,
        ),
        xml_escape(sheet_name)
    )
}

/// Serialize the table to `path` as a one-sheet workbook, header row first.
pub fn write_xlsx(table: &NormalizedTable, path: &Path, sheet_name: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating workbook {}", path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip_write_str(&mut zip, "[Content_Types].xml", CONTENT_TYPES, options)?;
    zip_write_str(&mut zip, "_rels/.rels", RELS_DOT_RELS, options)?;
    zip_write_str(&mut zip, "xl/workbook.xml", &workbook_xml(sheet_name), options)?;
    zip_write_str(&mut zip, "xl/_rels/workbook.xml.rels", WORKBOOK_RELS, options)?;
    zip_write_str(&mut zip, "xl/styles.xml", STYLES, options)?;
    zip_write_str(&mut zip, "xl/worksheets/sheet1.xml", &sheet_xml(table), options)?;

    zip.finish().context("finalizing workbook container")?;
    Ok(())
}

fn sheet_xml(table: &NormalizedTable) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        r#"<sheetData>"#,
    ));

    if !table.columns.is_empty() {
        xml.push_str(r#"<row r="1">"#);
        for (col, name) in table.columns.iter().enumerate() {
            push_text_cell(&mut xml, 1, col, name);
        }
        xml.push_str("</row>");
    }
    for (i, row) in table.rows.iter().enumerate() {
        let row_no = i + 2;
        let _ = write!(xml, r#"<row r="{row_no}">"#);
        for (col, value) in row.iter().enumerate() {
            match value {
                Value::Number(n) => {
                    let _ = write!(xml, "<c r=\"{}\"><v>{n}</v></c>", cell_ref(row_no, col));
                }
                Value::Text(s) => push_text_cell(&mut xml, row_no, col, s),
                Value::Missing => {
                    let _ = write!(xml, "<c r=\"{}\"/>", cell_ref(row_no, col));
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_text_cell(xml: &mut String, row: usize, col: usize, text: &str) {
    let _ = write!(
        xml,
        "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
        cell_ref(row, col),
        xml_escape(text)
    );
}

fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{row}", col_letters(col))
}

fn col_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("column letters are ASCII")
}

fn xml_escape(s: &str) -> String {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn zip_write_str<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    content: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(name, options)
        .with_context(|| format!("starting workbook part {name}"))?;
    zip.write_all(content.as_bytes())
        .with_context(|| format!("writing workbook part {name}"))?;
    Ok(())
}
