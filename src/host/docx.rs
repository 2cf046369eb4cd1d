use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Error, Result};

use super::DocumentHost;

const DOC_XML_PATH: &str = "word/document.xml";

/// Paragraph separator inside a cell, as automation hosts report it.
const PARAGRAPH_MARK: char = '\r';
/// End-of-cell marker appended to every cell's text.
const END_OF_CELL: &str = "\r\x07";
const LINE_BREAK: char = '\x0b';

#[derive(Debug, Default, Clone, PartialEq)]
struct DocxTable {
    grid_columns: usize,
    rows: Vec<Vec<String>>,
}

impl DocxTable {
    fn column_count(&self) -> usize {
        if self.grid_columns > 0 {
            self.grid_columns
        } else {
            self.rows.iter().map(Vec::len).max().unwrap_or(0)
        }
    }
}

/// Host over Office Open XML documents (`.docx`).
///
/// Reads `word/document.xml` once on `open` and serves every top-level
/// `w:tbl`. Tables nested inside a cell are folded into that cell's text.
#[derive(Debug, Default)]
pub struct DocxHost {
    document: Option<(PathBuf, Vec<DocxTable>)>,
}

impl DocxHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<&[DocxTable]> {
        self.document
            .as_ref()
            .map(|(_, tables)| tables.as_slice())
            .ok_or_else(|| Error::HostQuery("no document open".into()))
    }

    fn table(&self, table: usize) -> Result<&DocxTable> {
        let tables = self.tables()?;
        table
            .checked_sub(1)
            .and_then(|i| tables.get(i))
            .ok_or_else(|| Error::HostQuery(format!("no table {table}")))
    }
}

fn read_document_xml(path: &Path) -> std::result::Result<String, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut archive = ZipArchive::new(file).map_err(|e| format!("not a docx archive: {e}"))?;
    let mut entry = archive
        .by_name(DOC_XML_PATH)
        .map_err(|e| format!("missing {DOC_XML_PATH}: {e}"))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| format!("reading {DOC_XML_PATH}: {e}"))?;
    Ok(xml)
}

impl DocumentHost for DocxHost {
    fn open(&mut self, path: &Path) -> Result<()> {
        if let Some((current, _)) = &self.document {
            return Err(Error::DocumentOpen {
                path: path.to_path_buf(),
                reason: format!("{} is already open in this host", current.display()),
            });
        }
        let is_legacy_doc = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("doc"));
        if is_legacy_doc {
            return Err(Error::HostUnavailable(format!(
                "{} is a binary Word document; no automation host for .doc is available, convert it to .docx",
                path.display()
            )));
        }

        let open_err = |reason: String| Error::DocumentOpen {
            path: path.to_path_buf(),
            reason,
        };
        let xml = read_document_xml(path).map_err(open_err)?;
        let tables = parse_tables(&xml).map_err(open_err)?;
        info!(path = %path.display(), tables = tables.len(), "opened docx");
        self.document = Some((path.to_path_buf(), tables));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some((path, _)) = self.document.take() {
            debug!(path = %path.display(), "closed docx");
        }
        Ok(())
    }

    fn table_count(&self) -> Result<usize> {
        Ok(self.tables()?.len())
    }

    fn row_count(&self, table: usize) -> Result<usize> {
        Ok(self.table(table)?.rows.len())
    }

    fn column_count(&self, table: usize) -> Result<usize> {
        Ok(self.table(table)?.column_count())
    }

    fn cell_text(&self, table: usize, row: usize, column: usize) -> Result<String> {
        let rows = &self.table(table)?.rows;
        row.checked_sub(1)
            .and_then(|r| rows.get(r))
            .and_then(|cells| column.checked_sub(1).and_then(|c| cells.get(c)))
            .cloned()
            .ok_or_else(|| Error::CellRead {
                table,
                row,
                column,
                reason: "no cell at this position (merged or short row)".into(),
            })
    }
}

/// Walk `document.xml` and collect top-level tables with their cell texts.
fn parse_tables(xml: &str) -> std::result::Result<Vec<DocxTable>, String> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();

    let mut tables = Vec::new();
    let mut table = DocxTable::default();
    let mut row: Vec<String> = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();

    let mut depth = 0usize;
    let mut in_cell = false;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| format!("malformed document.xml at {}: {e}", reader.buffer_position()))?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => {
                    depth += 1;
                    if depth == 1 {
                        table = DocxTable::default();
                    }
                }
                b"tr" if depth == 1 => row = Vec::new(),
                b"tc" if depth == 1 => {
                    in_cell = true;
                    paragraphs.clear();
                }
                b"p" if in_cell => paragraph.clear(),
                b"r" => in_run = true,
                b"t" => in_text = true,
                b"gridCol" if depth == 1 => table.grid_columns += 1,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"gridCol" if depth == 1 => table.grid_columns += 1,
                b"p" if in_cell => paragraphs.push(String::new()),
                b"tab" if in_cell && in_run => paragraph.push('\t'),
                b"br" | b"cr" if in_cell && in_run => paragraph.push(LINE_BREAK),
                _ => {}
            },
            Event::Text(t) if in_cell && in_text => {
                let text = t.unescape().map_err(|e| format!("bad text node: {e}"))?;
                paragraph.push_str(&text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"p" if in_cell => paragraphs.push(std::mem::take(&mut paragraph)),
                b"tc" if depth == 1 => {
                    let mut text = paragraphs.join(&PARAGRAPH_MARK.to_string());
                    text.push_str(END_OF_CELL);
                    row.push(text);
                    in_cell = false;
                }
                b"tr" if depth == 1 => table.rows.push(std::mem::take(&mut row)),
                b"tbl" => {
                    if depth == 1 {
                        tables.push(std::mem::take(&mut table));
                    }
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(tables)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    /// Wrap `body` into a minimal `.docx` archive on disk.
    pub(crate) fn write_docx(body: &str) -> NamedTempFile {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut tmp = tempfile::Builder::new()
            .suffix(".docx")
            .tempfile()
            .unwrap();
        {
            let mut zip = zip::ZipWriter::new(tmp.as_file_mut());
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file(DOC_XML_PATH, options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        tmp
    }

    pub(crate) fn cell(text: &str) -> String {
        format!("<w:tc><w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p></w:tc>")
    }

    const SAMPLE: &str = concat!(
        "<w:p><w:r><w:t>Основные показатели</w:t></w:r></w:p>",
        "<w:tbl><w:tblGrid><w:gridCol/><w:gridCol/><w:gridCol/></w:tblGrid>",
        "<w:tr><w:tc><w:p><w:r><w:t>Индекс</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>промышленного</w:t><w:br/><w:t>производства</w:t></w:r></w:p></w:tc>",
        "<w:tc><w:p/></w:tc>",
        "<w:tc><w:p><w:r><w:t>100,0</w:t></w:r></w:p></w:tc></w:tr>",
        "<w:tr><w:tc><w:p><w:r><w:t>Итого</w:t></w:r></w:p></w:tc></w:tr>",
        "</w:tbl>",
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>a &amp; b</w:t></w:r></w:p>",
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        "</w:tc></w:tr></w:tbl>",
    );

    #[test]
    fn parses_top_level_tables() {
        let tables = parse_tables(&format!("<w:body>{SAMPLE}</w:body>")).unwrap();
        assert_eq!(tables.len(), 2);

        let first = &tables[0];
        assert_eq!(first.column_count(), 3);
        assert_eq!(first.rows.len(), 2);
        assert_eq!(
            first.rows[0][0],
            "Индекс\rпромышленного\x0bпроизводства\r\x07"
        );
        assert_eq!(first.rows[0][1], "\r\x07");
        assert_eq!(first.rows[0][2], "100,0\r\x07");
        assert_eq!(first.rows[1].len(), 1);

        let second = &tables[1];
        assert_eq!(second.column_count(), 1);
        assert_eq!(second.rows[0][0], "a & b\rinner\r\x07");
    }

    #[test]
    fn serves_cells_through_host_api() {
        let file = write_docx(SAMPLE);
        let mut host = DocxHost::new();
        host.open(file.path()).unwrap();

        assert_eq!(host.table_count().unwrap(), 2);
        assert_eq!(host.row_count(1).unwrap(), 2);
        assert_eq!(host.column_count(1).unwrap(), 3);
        assert_eq!(host.cell_text(1, 1, 3).unwrap(), "100,0\r\x07");
        assert!(matches!(
            host.cell_text(1, 2, 2),
            Err(Error::CellRead { row: 2, column: 2, .. })
        ));

        host.close().unwrap();
        assert!(host.table_count().is_err());
    }

    #[test]
    fn refuses_second_document_and_bad_paths() {
        let file = write_docx(SAMPLE);
        let mut host = DocxHost::new();
        host.open(file.path()).unwrap();
        assert!(matches!(
            host.open(file.path()),
            Err(Error::DocumentOpen { .. })
        ));
        host.close().unwrap();

        let missing = Path::new("/definitely/not/here.docx");
        match host.open(missing) {
            Err(Error::DocumentOpen { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected DocumentOpen, got {other:?}"),
        }
        assert!(matches!(
            host.open(Path::new("bulletin.doc")),
            Err(Error::HostUnavailable(_))
        ));
    }

    #[test]
    fn rejects_non_zip_input() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"plain text, not a document").unwrap();
        let mut host = DocxHost::new();
        assert!(matches!(
            host.open(tmp.path()),
            Err(Error::DocumentOpen { .. })
        ));
    }
}
