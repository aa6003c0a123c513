use std::io::{Cursor, Seek, Write};

use anyhow::Context;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// The printable checklist is a WordprocessingML package: a zip with a fixed
// set of XML parts. Only this module knows that; everything else speaks in
// headings, paragraphs, tables and section breaks.

const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";
const RELS_ENTRY: &str = "_rels/.rels";
const DOC_RELS_ENTRY: &str = "word/_rels/document.xml.rels";
const STYLES_ENTRY: &str = "word/styles.xml";
const DOCUMENT_ENTRY: &str = "word/document.xml";

/// How a section begins relative to the previous one. `OddPage` is what
/// makes double-sided printing come out with each part on its own sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStart {
    NextPage,
    OddPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String, bold: bool, highlight: bool },
    Table { rows: Vec<Vec<String>> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocSection {
    pub start: SectionStart,
    pub blocks: Vec<Block>,
}

impl DocSection {
    pub fn new(start: SectionStart) -> Self {
        DocSection {
            start,
            blocks: Vec::new(),
        }
    }

    pub fn heading(&mut self, level: u8, text: impl Into<String>) {
        self.blocks.push(Block::Heading {
            level,
            text: text.into(),
        });
    }

    pub fn paragraph(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph {
            text: text.into(),
            bold: false,
            highlight: false,
        });
    }

    pub fn label(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph {
            text: text.into(),
            bold: true,
            highlight: false,
        });
    }

    /// Highlighted note, the printable twin of the page's warning callout.
    pub fn note(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph {
            text: text.into(),
            bold: true,
            highlight: true,
        });
    }

    pub fn table(&mut self, rows: Vec<Vec<String>>) {
        self.blocks.push(Block::Table { rows });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxDocument {
    pub sections: Vec<DocSection>,
}

impl DocxDocument {
    pub fn new() -> Self {
        DocxDocument::default()
    }

    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_package(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    fn write_package<W: Write + Seek>(&self, writer: W) -> anyhow::Result<()> {
        let mut zip = ZipWriter::new(writer);
        let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (entry, content) in [
            (CONTENT_TYPES_ENTRY, content_types_xml()),
            (RELS_ENTRY, package_rels_xml()),
            (DOC_RELS_ENTRY, document_rels_xml()),
            (STYLES_ENTRY, styles_xml()),
            (DOCUMENT_ENTRY, self.document_xml()),
        ] {
            zip.start_file(entry, opts)
                .with_context(|| format!("failed to start entry {}", entry))?;
            zip.write_all(content.as_bytes())
                .with_context(|| format!("failed to write entry {}", entry))?;
        }

        zip.finish().context("failed to finalize document package")?;
        Ok(())
    }

    fn document_xml(&self) -> String {
        let mut body = String::new();
        let last = self.sections.len().saturating_sub(1);
        for (idx, section) in self.sections.iter().enumerate() {
            for block in &section.blocks {
                write_block(&mut body, block);
            }
            // A section's properties live in the paragraph that closes it;
            // the final section's go bare at the end of the body.
            let props = sect_pr(section.start);
            if idx == last {
                body.push_str(&props);
            } else {
                body.push_str("<w:p><w:pPr>");
                body.push_str(&props);
                body.push_str("</w:pPr></w:p>");
            }
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}</w:body></w:document>",
            body
        )
    }
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_block(body: &mut String, block: &Block) {
    match block {
        Block::Heading { level, text } => {
            let style = if *level <= 1 { "Heading1" } else { "Heading2" };
            body.push_str(&format!(
                "<w:p><w:pPr><w:pStyle w:val=\"{}\"/></w:pPr>{}</w:p>",
                style,
                run(text, false, false)
            ));
        }
        Block::Paragraph {
            text,
            bold,
            highlight,
        } => {
            body.push_str(&format!("<w:p>{}</w:p>", run(text, *bold, *highlight)));
        }
        Block::Table { rows } => write_table(body, rows),
    }
}

fn run(text: &str, bold: bool, highlight: bool) -> String {
    let mut props = String::new();
    if bold {
        props.push_str("<w:b/>");
    }
    if highlight {
        props.push_str("<w:highlight w:val=\"yellow\"/>");
    }
    let rpr = if props.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{}</w:rPr>", props)
    };
    format!(
        "<w:r>{}<w:t xml:space=\"preserve\">{}</w:t></w:r>",
        rpr,
        xml_escape(text)
    )
}

// A4 content width in twips, used for even column sizing.
const TABLE_WIDTH: usize = 9638;

fn write_table(body: &mut String, rows: &[Vec<String>]) {
    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if cols == 0 {
        return;
    }
    let col_width = TABLE_WIDTH / cols;

    body.push_str(
        "<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/><w:tblBorders>\
         <w:top w:val=\"single\" w:sz=\"4\" w:color=\"auto\"/>\
         <w:left w:val=\"single\" w:sz=\"4\" w:color=\"auto\"/>\
         <w:bottom w:val=\"single\" w:sz=\"4\" w:color=\"auto\"/>\
         <w:right w:val=\"single\" w:sz=\"4\" w:color=\"auto\"/>\
         <w:insideH w:val=\"single\" w:sz=\"4\" w:color=\"auto\"/>\
         <w:insideV w:val=\"single\" w:sz=\"4\" w:color=\"auto\"/>\
         </w:tblBorders></w:tblPr><w:tblGrid>",
    );
    for _ in 0..cols {
        body.push_str(&format!("<w:gridCol w:w=\"{}\"/>", col_width));
    }
    body.push_str("</w:tblGrid>");

    for row in rows {
        body.push_str("<w:tr>");
        for c in 0..cols {
            let text = row.get(c).map(|s| s.as_str()).unwrap_or("");
            body.push_str(&format!(
                "<w:tc><w:tcPr><w:tcW w:w=\"{}\" w:type=\"dxa\"/></w:tcPr><w:p>{}</w:p></w:tc>",
                col_width,
                run(text, false, false)
            ));
        }
        body.push_str("</w:tr>");
    }
    body.push_str("</w:tbl>");
}

fn sect_pr(start: SectionStart) -> String {
    let kind = match start {
        SectionStart::NextPage => "nextPage",
        SectionStart::OddPage => "oddPage",
    };
    format!(
        "<w:sectPr><w:type w:val=\"{}\"/><w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
         <w:pgMar w:top=\"1134\" w:right=\"1134\" w:bottom=\"1134\" w:left=\"1134\" \
         w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>",
        kind
    )
}

fn content_types_xml() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
     <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
     <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
     <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
     <Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
     <Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
     </Types>"
        .to_string()
}

fn package_rels_xml() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
     <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
     <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
     </Relationships>"
        .to_string()
}

fn document_rels_xml() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
     <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
     <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
     </Relationships>"
        .to_string()
}

fn styles_xml() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
     <w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
     <w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\">\
     <w:name w:val=\"Normal\"/><w:rPr><w:sz w:val=\"24\"/></w:rPr></w:style>\
     <w:style w:type=\"paragraph\" w:styleId=\"Heading1\">\
     <w:name w:val=\"heading 1\"/><w:basedOn w:val=\"Normal\"/>\
     <w:pPr><w:spacing w:before=\"240\" w:after=\"120\"/></w:pPr>\
     <w:rPr><w:b/><w:sz w:val=\"32\"/></w:rPr></w:style>\
     <w:style w:type=\"paragraph\" w:styleId=\"Heading2\">\
     <w:name w:val=\"heading 2\"/><w:basedOn w:val=\"Normal\"/>\
     <w:pPr><w:spacing w:before=\"160\" w:after=\"80\"/></w:pPr>\
     <w:rPr><w:b/><w:sz w:val=\"28\"/></w:rPr></w:style>\
     </w:styles>"
        .to_string()
}
