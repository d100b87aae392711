//! In-place rewrite of numeric cells inside an XLSX archive

use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use tracing::warn;
use zip::{ZipArchive, ZipWriter};

use crate::error::WriteError;

/// A1-style reference for a 0-based (row, col) position
pub fn cell_reference(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row + 1)
}

/// Overwrite numeric cells of one sheet, keyed by A1 reference
///
/// The archive is rebuilt next to `path` and then moved over it. Every
/// other part is copied without recompression.
pub fn write_numeric_cells(path: &Path, sheet: &str, values: &BTreeMap<String, i64>) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let part = sheet_part(&mut archive, sheet)?;
    let sheet_xml = read_file_from_zip(&mut archive, &part)?;
    let patched = set_cell_values(&sheet_xml, values)?;

    write_staged(path, move |output| {
        let mut zip_writer = ZipWriter::new(output);
        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            if entry.name() == part {
                let options = SimpleFileOptions::default().compression_method(entry.compression());
                let name = entry.name().to_string();
                zip_writer.start_file(name, options)?;
                zip_writer.write_all(patched.as_bytes())?;
            } else {
                zip_writer.raw_copy_file(entry)?;
            }
        }
        zip_writer.finish()?;
        Ok(())
    })
}

/// Run `write` against a staging file next to `path` and move it into place
///
/// On failure the staging file is removed and `path` is left untouched.
fn write_staged<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let staging = staging_path(path);
    let output = File::create(&staging)
        .with_context(|| format!("Failed to create {}", staging.display()))?;

    if let Err(err) = write(output) {
        if let Err(cleanup) = fs::remove_file(&staging) {
            warn!("could not remove {}: {cleanup}", staging.display());
        }
        return Err(err);
    }

    fs::rename(&staging, path)
        .with_context(|| format!("Failed to replace {}", path.display()))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn read_file_from_zip(archive: &mut ZipArchive<BufReader<File>>, filename: &str) -> Result<String> {
    let mut file = archive.by_name(filename)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

/// Archive path of the worksheet called `sheet`
fn sheet_part(archive: &mut ZipArchive<BufReader<File>>, sheet: &str) -> Result<String> {
    let workbook_xml = read_file_from_zip(archive, "xl/workbook.xml")?;
    let rels_xml = read_file_from_zip(archive, "xl/_rels/workbook.xml.rels")?;

    let rel_id = parse_sheet_rel_ids(&workbook_xml)?
        .remove(sheet)
        .ok_or_else(|| WriteError::SheetPartNotFound(sheet.to_string()))?;
    let target = parse_relationship_targets(&rels_xml)?
        .remove(&rel_id)
        .ok_or_else(|| WriteError::SheetPartNotFound(sheet.to_string()))?;

    Ok(match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    })
}

/// Sheet name -> relationship id from `xl/workbook.xml`
fn parse_sheet_rel_ids(workbook_xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(workbook_xml);
    let mut buf = Vec::new();
    let mut sheets = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = String::new();
                let mut rel_id = String::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.local_name().as_ref() {
                        b"name" => name = attr.unescape_value()?.into_owned(),
                        b"id" => rel_id = String::from_utf8(attr.value.to_vec())?,
                        _ => {}
                    }
                }
                sheets.insert(name, rel_id);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow::anyhow!("Error parsing XML: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Relationship id -> target from `xl/_rels/workbook.xml.rels`
fn parse_relationship_targets(rels_xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(rels_xml);
    let mut buf = Vec::new();
    let mut targets = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = String::new();
                let mut target = String::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => id = String::from_utf8(attr.value.to_vec())?,
                        b"Target" => target = attr.unescape_value()?.into_owned(),
                        _ => {}
                    }
                }
                targets.insert(id, target);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow::anyhow!("Error parsing XML: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(targets)
}

/// Replace the content of the referenced `<c>` elements with a plain `<v>` number
///
/// The type attribute and any formula are dropped; the style is kept.
fn set_cell_values(xml: &str, values: &BTreeMap<String, i64>) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();
    let mut pending: Option<(String, i64)> = None;
    let mut written = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"c" => {
                match target_value(&e, values)? {
                    Some(target) => {
                        writer.write_event(Event::Start(without_type(&e)?))?;
                        pending = Some(target);
                    }
                    None => writer.write_event(Event::Start(e))?,
                }
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                match target_value(&e, values)? {
                    Some((reference, value)) => {
                        writer.write_event(Event::Start(without_type(&e)?))?;
                        write_value(&mut writer, &prefix_of(e.name()), value)?;
                        writer.write_event(Event::End(e.to_end()))?;
                        written.push(reference);
                    }
                    None => writer.write_event(Event::Empty(e))?,
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"c" => {
                if let Some((reference, value)) = pending.take() {
                    write_value(&mut writer, &prefix_of(e.name()), value)?;
                    written.push(reference);
                }
                writer.write_event(Event::End(e))?;
            }
            Ok(Event::Eof) => break,
            Ok(e) => {
                if pending.is_none() {
                    writer.write_event(e)?;
                }
            }
            Err(e) => return Err(anyhow::anyhow!("Error parsing XML: {}", e)),
        }
        buf.clear();
    }

    if let Some(missing) = values.keys().find(|r| !written.contains(r)) {
        return Err(WriteError::CellNotFound(missing.clone()).into());
    }

    let result = writer.into_inner().into_inner();
    Ok(String::from_utf8(result)?)
}

fn target_value(e: &BytesStart<'_>, values: &BTreeMap<String, i64>) -> Result<Option<(String, i64)>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"r" {
            let reference = String::from_utf8(attr.value.to_vec())?;
            return Ok(values.get(&reference).map(|v| (reference, *v)));
        }
    }
    Ok(None)
}

fn without_type(e: &BytesStart<'_>) -> Result<BytesStart<'static>> {
    let mut cell = BytesStart::new(String::from_utf8(e.name().as_ref().to_vec())?);
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() != b"t" {
            cell.push_attribute(attr);
        }
    }
    Ok(cell)
}

fn prefix_of(name: QName<'_>) -> String {
    name.prefix()
        .map(|p| String::from_utf8_lossy(p.into_inner()).into_owned())
        .unwrap_or_default()
}

fn write_value<W: Write>(writer: &mut Writer<W>, prefix: &str, value: i64) -> Result<()> {
    let tag = if prefix.is_empty() {
        "v".to_string()
    } else {
        format!("{prefix}:v")
    };
    writer.write_event(Event::Start(BytesStart::new(tag.as_str())))?;
    writer.write_event(Event::Text(BytesText::new(&value.to_string())))?;
    writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_reference() {
        assert_eq!(cell_reference(0, 0), "A1");
        assert_eq!(cell_reference(4, 2), "C5");
        assert_eq!(cell_reference(9, 25), "Z10");
        assert_eq!(cell_reference(0, 26), "AA1");
        assert_eq!(cell_reference(1, 701), "ZZ2");
    }

    #[test]
    fn test_set_cell_values_replaces_formula_and_type() {
        let xml = r#"<worksheet><sheetData><row r="2"><c r="A2" t="inlineStr"><is><t>ZIM_ANA_VTP</t></is></c><c r="C2" s="3" t="str"><f>SUM(1,2)</f><v>45</v></c></row><row r="3"><c r="C3"/></row></sheetData></worksheet>"#;
        let mut values = BTreeMap::new();
        values.insert("C2".to_string(), 55);
        values.insert("C3".to_string(), 7);

        let patched = set_cell_values(xml, &values).unwrap();
        assert!(patched.contains(r#"<c r="C2" s="3"><v>55</v></c>"#));
        assert!(patched.contains(r#"<c r="C3"><v>7</v></c>"#));
        assert!(patched.contains("<t>ZIM_ANA_VTP</t>"));
        assert!(!patched.contains("SUM"));
    }

    #[test]
    fn test_missing_cell_is_an_error() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData></worksheet>"#;
        let mut values = BTreeMap::new();
        values.insert("B9".to_string(), 1);
        let err = set_cell_values(xml, &values).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WriteError>(),
            Some(WriteError::CellNotFound(cell)) if cell == "B9"
        ));
    }

    #[test]
    fn test_sheet_rel_ids() {
        let workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="MANTRA" sheetId="1" r:id="rId1"/><sheet name="LISTA" sheetId="3" r:id="rId7"/></sheets></workbook>"#;
        let ids = parse_sheet_rel_ids(workbook).unwrap();
        assert_eq!(ids.get("LISTA").map(String::as_str), Some("rId7"));

        let rels = r#"<Relationships><Relationship Id="rId7" Type="worksheet" Target="worksheets/sheet3.xml"/></Relationships>"#;
        let targets = parse_relationship_targets(rels).unwrap();
        assert_eq!(targets.get("rId7").map(String::as_str), Some("worksheets/sheet3.xml"));
    }

    #[test]
    fn test_failed_write_leaves_original_and_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = dir.path().join("report.xlsx");
        fs::write(&workbook, b"original").unwrap();

        let result = write_staged(&workbook, |mut output| {
            output.write_all(b"half")?;
            anyhow::bail!("archive truncated")
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&workbook).unwrap(), b"original");
        assert!(!staging_path(&workbook).exists());

        write_staged(&workbook, |mut output| {
            output.write_all(b"rewritten")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(fs::read(&workbook).unwrap(), b"rewritten");
        assert!(!staging_path(&workbook).exists());
    }
}
