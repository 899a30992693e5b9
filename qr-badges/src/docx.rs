//! Word document writer.
//!
//! Each [`Page`] becomes one fixed-layout table whose grid matches the
//! label sheet exactly: column widths, exact row heights, and the
//! section's page size and margins all come from [`LayoutConfig`].
//! Pages after the first start on a new sheet through `w:pageBreakBefore`
//! on the first paragraph of their first cell.

use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::assets::{Logo, LogoKind};
use crate::config::{LayoutConfig, Length};
use crate::error::{BadgeError, Result};
use crate::layout::{Cell, Page, PlacedLogo, RenderedBadge};

/// Appended to the input file stem to name the output document.
pub const OUTPUT_SUFFIX: &str = "_nametags";
pub const OUTPUT_EXTENSION: &str = "docx";

// ============================================================================
// Namespaces and content types
// ============================================================================

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

// ============================================================================
// Cell geometry
// ============================================================================

/// Horizontal inset of the logo paragraph from the cell edge, in twips.
const CELL_INSET_TWIPS: u32 = 115;

/// Gap above the name block, in twips.
const NAME_SPACING_BEFORE_TWIPS: u32 = 60;

/// Gap above the QR code, in twips.
const QR_SPACING_BEFORE_TWIPS: u32 = 60;

// ============================================================================
// Output path and file writing
// ============================================================================

/// Mode `File::create` uses on Unix, before the umask.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;

/// `<dir>/<stem>_nametags.docx` for an input at `<dir>/<stem>.csv`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "badges".to_string());
    let file_name = format!("{}{}.{}", stem, OUTPUT_SUFFIX, OUTPUT_EXTENSION);
    match input.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Write the document to `path`. The package is assembled in a temporary
/// file in the same directory and renamed into place only once complete.
pub fn write_document(pages: &[Page], config: &LayoutConfig, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".qr-badges").suffix(".tmp");
    #[cfg(unix)]
    builder.permissions(target_permissions(path));
    let mut temp = builder
        .tempfile_in(dir)
        .map_err(|e| BadgeError::io(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write_package(pages, config, &mut writer).map_err(|e| BadgeError::io(path, e))?;
        writer.flush().map_err(|e| BadgeError::io(path, e))?;
    }
    temp.persist(path)
        .map_err(|e| BadgeError::io(path, e.error))?;

    log::info!("Wrote {} pages to {}", pages.len(), path.display());
    Ok(())
}

/// An existing document keeps its permissions; a new one gets the usual
/// file mode.
#[cfg(unix)]
fn target_permissions(path: &Path) -> std::fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(metadata) => metadata.permissions(),
        Err(_) => std::fs::Permissions::from_mode(NEW_FILE_MODE),
    }
}

/// The complete package as bytes.
pub fn build_package(pages: &[Page], config: &LayoutConfig) -> io::Result<Vec<u8>> {
    let mut cursor = io::Cursor::new(Vec::new());
    write_package(pages, config, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Serialize the package into `writer`.
pub fn write_package<W: Write + Seek>(
    pages: &[Page],
    config: &LayoutConfig,
    writer: W,
) -> io::Result<()> {
    let media = MediaCatalog::collect(pages);
    let document = render_document(pages, config, &media).map_err(io::Error::other)?;
    let styles = render_styles(config).map_err(io::Error::other)?;
    let document_rels = render_document_rels(&media).map_err(io::Error::other)?;

    let xml = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    let png = xml.compression_method(CompressionMethod::Stored);

    let mut zip = ZipWriter::new(writer);
    let mut add = |name: &str, options: SimpleFileOptions, data: &[u8]| -> io::Result<()> {
        zip.start_file(name, options).map_err(zip_error)?;
        zip.write_all(data)
    };

    add("[Content_Types].xml", xml, render_content_types().as_bytes())?;
    add("_rels/.rels", xml, render_package_rels().as_bytes())?;
    add("word/document.xml", xml, document.as_bytes())?;
    add("word/styles.xml", xml, styles.as_bytes())?;
    add("word/_rels/document.xml.rels", xml, document_rels.as_bytes())?;
    for part in &media.parts {
        add(&format!("word/{}", part.target), png, part.png)?;
    }

    zip.finish().map_err(zip_error)?;
    Ok(())
}

fn zip_error(err: zip::result::ZipError) -> io::Error {
    match err {
        zip::result::ZipError::Io(e) => e,
        other => io::Error::other(other),
    }
}

// ============================================================================
// Media parts
// ============================================================================

struct MediaPart<'p> {
    rel_id: String,
    target: String,
    png: &'p [u8],
}

/// Every image in the document with its relationship id. Logos are stored
/// once and shared; each QR code is its own part.
struct MediaCatalog<'p> {
    parts: Vec<MediaPart<'p>>,
    logos: HashMap<LogoKind, usize>,
    /// Index into `parts`, keyed by (page index, cell index)
    qr_codes: HashMap<(usize, usize), usize>,
}

/// `rId1` is the styles part.
const FIRST_MEDIA_REL: usize = 2;

impl<'p> MediaCatalog<'p> {
    fn collect(pages: &'p [Page<'p>]) -> Self {
        let mut catalog = MediaCatalog {
            parts: Vec::new(),
            logos: HashMap::new(),
            qr_codes: HashMap::new(),
        };

        for kind in LogoKind::ALL {
            let image = pages
                .iter()
                .flat_map(|p| p.cells.iter())
                .filter_map(Cell::badge)
                .flat_map(|b| [b.logo, b.ribbon])
                .flatten()
                .find(|placed| placed.kind == kind)
                .map(|placed| placed.image);
            if let Some(image) = image {
                let index = catalog.push(format!("media/logo_{}.png", kind.name()), &image.png);
                catalog.logos.insert(kind, index);
            }
        }

        let mut qr_number = 0;
        for (page_index, page) in pages.iter().enumerate() {
            for (cell_index, cell) in page.cells.iter().enumerate() {
                if let Some(badge) = cell.badge() {
                    qr_number += 1;
                    let index = catalog.push(format!("media/qr_{}.png", qr_number), &badge.qr.png);
                    catalog.qr_codes.insert((page_index, cell_index), index);
                }
            }
        }

        catalog
    }

    fn push(&mut self, target: String, png: &'p [u8]) -> usize {
        let index = self.parts.len();
        self.parts.push(MediaPart {
            rel_id: format!("rId{}", index + FIRST_MEDIA_REL),
            target,
            png,
        });
        index
    }

    fn logo_rel(&self, kind: LogoKind) -> Option<&str> {
        self.logos.get(&kind).map(|&i| self.parts[i].rel_id.as_str())
    }

    fn qr_rel(&self, page_index: usize, cell_index: usize) -> Option<&str> {
        self.qr_codes
            .get(&(page_index, cell_index))
            .map(|&i| self.parts[i].rel_id.as_str())
    }
}

// ============================================================================
// Package parts
// ============================================================================

fn render_content_types() -> String {
    format!(
        concat!(
            "{decl}<Types xmlns=\"{ns}\">",
            "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
            "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
            "<Default Extension=\"png\" ContentType=\"image/png\"/>",
            "<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>",
            "<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>",
            "</Types>"
        ),
        decl = XML_DECLARATION,
        ns = NS_CONTENT_TYPES,
    )
}

fn render_package_rels() -> String {
    format!(
        "{}<Relationships xmlns=\"{}\"><Relationship Id=\"rId1\" Type=\"{}\" Target=\"word/document.xml\"/></Relationships>",
        XML_DECLARATION, NS_PACKAGE_RELS, REL_OFFICE_DOCUMENT
    )
}

fn render_document_rels(media: &MediaCatalog) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::new();
    write!(xml, "{}<Relationships xmlns=\"{}\">", XML_DECLARATION, NS_PACKAGE_RELS)?;
    write!(
        xml,
        "<Relationship Id=\"rId1\" Type=\"{}\" Target=\"styles.xml\"/>",
        REL_STYLES
    )?;
    for part in &media.parts {
        write!(
            xml,
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>",
            part.rel_id, REL_IMAGE, part.target
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn render_styles(config: &LayoutConfig) -> std::result::Result<String, fmt::Error> {
    let font = escape_xml(&config.font_family);
    let mut xml = String::new();
    write!(xml, "{}<w:styles xmlns:w=\"{}\">", XML_DECLARATION, NS_W)?;
    write!(
        xml,
        concat!(
            "<w:docDefaults><w:rPrDefault><w:rPr>",
            "<w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:eastAsia=\"{font}\" w:cs=\"{font}\"/>",
            "<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>",
            "</w:rPr></w:rPrDefault>",
            "<w:pPrDefault><w:pPr><w:spacing w:before=\"0\" w:after=\"0\" w:line=\"240\" w:lineRule=\"auto\"/></w:pPr></w:pPrDefault>",
            "</w:docDefaults>"
        ),
        font = font,
        size = config.font_size.half_points(),
    )?;
    xml.push_str(concat!(
        "<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/><w:qFormat/></w:style>",
        "<w:style w:type=\"table\" w:default=\"1\" w:styleId=\"TableNormal\"><w:name w:val=\"Normal Table\"/>",
        "<w:tblPr><w:tblInd w:w=\"0\" w:type=\"dxa\"/><w:tblCellMar>",
        "<w:top w:w=\"0\" w:type=\"dxa\"/><w:left w:w=\"0\" w:type=\"dxa\"/>",
        "<w:bottom w:w=\"0\" w:type=\"dxa\"/><w:right w:w=\"0\" w:type=\"dxa\"/>",
        "</w:tblCellMar></w:tblPr></w:style>",
        "</w:styles>"
    ));
    Ok(xml)
}

// ============================================================================
// Document body
// ============================================================================

struct DocumentWriter<'m, 'c> {
    xml: String,
    media: &'m MediaCatalog<'m>,
    config: &'c LayoutConfig,
    /// Drawing ids must be unique across the document.
    next_drawing_id: u32,
}

fn render_document(
    pages: &[Page],
    config: &LayoutConfig,
    media: &MediaCatalog,
) -> std::result::Result<String, fmt::Error> {
    let mut doc = DocumentWriter {
        xml: String::new(),
        media,
        config,
        next_drawing_id: 1,
    };

    write!(
        doc.xml,
        "{}<w:document xmlns:w=\"{}\" xmlns:r=\"{}\" xmlns:wp=\"{}\" xmlns:a=\"{}\" xmlns:pic=\"{}\"><w:body>",
        XML_DECLARATION, NS_W, NS_R, NS_WP, NS_A, NS_PIC
    )?;
    for (page_index, page) in pages.iter().enumerate() {
        doc.table(page_index, page)?;
    }
    doc.closing_paragraph();
    doc.section()?;
    doc.xml.push_str("</w:body></w:document>");
    Ok(doc.xml)
}

impl DocumentWriter<'_, '_> {
    fn table(&mut self, page_index: usize, page: &Page) -> fmt::Result {
        let cell_w = self.config.cell_width.twips();
        let columns = self.config.columns_per_page;

        self.xml.push_str("<w:tbl><w:tblPr><w:tblStyle w:val=\"TableNormal\"/>");
        write!(
            self.xml,
            "<w:tblW w:w=\"{}\" w:type=\"dxa\"/>",
            cell_w * columns as u32
        )?;
        self.xml.push_str(concat!(
            "<w:tblInd w:w=\"0\" w:type=\"dxa\"/>",
            "<w:tblLayout w:type=\"fixed\"/>",
            "<w:tblCellMar><w:top w:w=\"0\" w:type=\"dxa\"/><w:left w:w=\"0\" w:type=\"dxa\"/>",
            "<w:bottom w:w=\"0\" w:type=\"dxa\"/><w:right w:w=\"0\" w:type=\"dxa\"/></w:tblCellMar>",
            "<w:tblLook w:val=\"0000\" w:firstRow=\"0\" w:lastRow=\"0\" w:firstColumn=\"0\" w:lastColumn=\"0\" w:noHBand=\"1\" w:noVBand=\"1\"/>",
            "</w:tblPr><w:tblGrid>"
        ));
        for _ in 0..columns {
            write!(self.xml, "<w:gridCol w:w=\"{}\"/>", cell_w)?;
        }
        self.xml.push_str("</w:tblGrid>");

        for (row_index, row) in page.rows().enumerate() {
            write!(
                self.xml,
                "<w:tr><w:trPr><w:cantSplit/><w:trHeight w:val=\"{}\" w:hRule=\"exact\"/></w:trPr>",
                self.config.cell_height.twips()
            )?;
            for (column_index, cell) in row.iter().enumerate() {
                let cell_index = row_index * columns + column_index;
                let page_break = page_index > 0 && cell_index == 0;
                self.cell(page_index, cell_index, cell, page_break)?;
            }
            self.xml.push_str("</w:tr>");
        }

        self.xml.push_str("</w:tbl>");
        Ok(())
    }

    fn cell(
        &mut self,
        page_index: usize,
        cell_index: usize,
        cell: &Cell,
        page_break: bool,
    ) -> fmt::Result {
        write!(
            self.xml,
            "<w:tc><w:tcPr><w:tcW w:w=\"{}\" w:type=\"dxa\"/><w:vAlign w:val=\"top\"/></w:tcPr>",
            self.config.cell_width.twips()
        )?;
        match cell {
            Cell::Badge(badge) => self.badge(page_index, cell_index, badge, page_break)?,
            Cell::Blank => {
                self.xml.push_str("<w:p><w:pPr>");
                if page_break {
                    self.xml.push_str("<w:pageBreakBefore/>");
                }
                self.xml.push_str("</w:pPr></w:p>");
            }
        }
        self.xml.push_str("</w:tc>");
        Ok(())
    }

    fn badge(
        &mut self,
        page_index: usize,
        cell_index: usize,
        badge: &RenderedBadge,
        page_break: bool,
    ) -> fmt::Result {
        let config = self.config;

        // Logo row, with the ribbon anchored behind the whole cell.
        let logo_align = match badge.logo.map(|l| l.kind) {
            Some(LogoKind::Full) => "center",
            _ => "left",
        };
        self.xml.push_str("<w:p><w:pPr>");
        if page_break {
            self.xml.push_str("<w:pageBreakBefore/>");
        }
        write!(
            self.xml,
            "<w:ind w:left=\"{inset}\" w:right=\"{inset}\"/><w:jc w:val=\"{align}\"/></w:pPr>",
            inset = CELL_INSET_TWIPS,
            align = logo_align
        )?;
        if let Some(ribbon) = badge.ribbon {
            self.ribbon(ribbon)?;
        }
        if let Some(logo) = badge.logo {
            let max_width = match logo.kind {
                LogoKind::Full => Length::points(
                    config.cell_width.as_points() - 2.0 * CELL_INSET_TWIPS as f32 / 20.0,
                ),
                _ => Length::points(config.cell_width.as_points() / 2.0),
            };
            let (w, h) = logo.image.fit(max_width, config.logo_height);
            if let Some(rel) = self.media.logo_rel(logo.kind) {
                let rel = rel.to_string();
                self.xml.push_str("<w:r>");
                self.inline_picture(&rel, &format!("logo_{}", logo.kind.name()), w, h)?;
                self.xml.push_str("</w:r>");
            }
        }
        self.xml.push_str("</w:p>");

        self.text_paragraph(
            &badge.record.preferred_name,
            config.name_font_size,
            true,
            NAME_SPACING_BEFORE_TWIPS,
        )?;
        self.text_paragraph(&badge.record.last_name, config.font_size, false, 0)?;

        write!(
            self.xml,
            "<w:p><w:pPr><w:spacing w:before=\"{}\" w:after=\"0\"/><w:jc w:val=\"center\"/></w:pPr>",
            QR_SPACING_BEFORE_TWIPS
        )?;
        if let Some(rel) = self.media.qr_rel(page_index, cell_index) {
            let rel = rel.to_string();
            self.xml.push_str("<w:r>");
            self.inline_picture(
                &rel,
                &format!("qr_row_{}", badge.record.row),
                config.qr_size,
                config.qr_size,
            )?;
            self.xml.push_str("</w:r>");
        }
        self.xml.push_str("</w:p>");
        Ok(())
    }

    fn text_paragraph(&mut self, text: &str, size: Length, bold: bool, before: u32) -> fmt::Result {
        write!(
            self.xml,
            "<w:p><w:pPr><w:spacing w:before=\"{}\" w:after=\"0\"/><w:jc w:val=\"center\"/></w:pPr><w:r><w:rPr>",
            before
        )?;
        if bold {
            self.xml.push_str("<w:b/><w:bCs/>");
        }
        write!(
            self.xml,
            "<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/></w:rPr><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>",
            size = size.half_points(),
            text = escape_xml(text)
        )
    }

    fn ribbon(&mut self, ribbon: PlacedLogo) -> fmt::Result {
        let Some(rel) = self.media.logo_rel(ribbon.kind).map(str::to_string) else {
            return Ok(());
        };
        let (w, h) = ribbon_size(ribbon.image, self.config);
        let id = self.drawing_id();
        write!(
            self.xml,
            concat!(
                "<w:r><w:drawing>",
                "<wp:anchor distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\" simplePos=\"0\" relativeHeight=\"0\" ",
                "behindDoc=\"1\" locked=\"1\" layoutInCell=\"1\" allowOverlap=\"1\">",
                "<wp:simplePos x=\"0\" y=\"0\"/>",
                "<wp:positionH relativeFrom=\"column\"><wp:posOffset>0</wp:posOffset></wp:positionH>",
                "<wp:positionV relativeFrom=\"paragraph\"><wp:posOffset>0</wp:posOffset></wp:positionV>",
                "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
                "<wp:effectExtent l=\"0\" t=\"0\" r=\"0\" b=\"0\"/>",
                "<wp:wrapNone/>",
                "<wp:docPr id=\"{id}\" name=\"ribbon_{id}\"/>",
                "<wp:cNvGraphicFramePr/>"
            ),
            cx = w.emu(),
            cy = h.emu(),
            id = id
        )?;
        self.graphic(&rel, id, "ribbon", w, h)?;
        self.xml.push_str("</wp:anchor></w:drawing></w:r>");
        Ok(())
    }

    fn inline_picture(&mut self, rel: &str, name: &str, w: Length, h: Length) -> fmt::Result {
        let id = self.drawing_id();
        write!(
            self.xml,
            concat!(
                "<w:drawing><wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
                "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
                "<wp:effectExtent l=\"0\" t=\"0\" r=\"0\" b=\"0\"/>",
                "<wp:docPr id=\"{id}\" name=\"{name}\"/>",
                "<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect=\"1\"/></wp:cNvGraphicFramePr>"
            ),
            cx = w.emu(),
            cy = h.emu(),
            id = id,
            name = escape_xml(name)
        )?;
        self.graphic(rel, id, name, w, h)?;
        self.xml.push_str("</wp:inline></w:drawing>");
        Ok(())
    }

    fn graphic(&mut self, rel: &str, id: u32, name: &str, w: Length, h: Length) -> fmt::Result {
        write!(
            self.xml,
            concat!(
                "<a:graphic><a:graphicData uri=\"{ns_pic}\"><pic:pic>",
                "<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"{name}.png\"/><pic:cNvPicPr/></pic:nvPicPr>",
                "<pic:blipFill><a:blip r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
                "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
                "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
                "</pic:pic></a:graphicData></a:graphic>"
            ),
            ns_pic = NS_PIC,
            id = id,
            name = escape_xml(name),
            rel = rel,
            cx = w.emu(),
            cy = h.emu()
        )
    }

    fn drawing_id(&mut self) -> u32 {
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        id
    }

    /// WordprocessingML requires a paragraph after a final table. Its mark
    /// is hidden so a full last sheet does not spill onto an empty page.
    fn closing_paragraph(&mut self) {
        self.xml.push_str(concat!(
            "<w:p><w:pPr><w:spacing w:before=\"0\" w:after=\"0\" w:line=\"20\" w:lineRule=\"exact\"/>",
            "<w:rPr><w:vanish/><w:sz w:val=\"2\"/><w:szCs w:val=\"2\"/></w:rPr></w:pPr></w:p>"
        ));
    }

    fn section(&mut self) -> fmt::Result {
        let config = self.config;
        let (width, height) = config.page_size();
        write!(
            self.xml,
            "<w:sectPr><w:pgSz w:w=\"{}\" w:h=\"{}\"",
            width.twips(),
            height.twips()
        )?;
        if config.landscape {
            self.xml.push_str(" w:orient=\"landscape\"");
        }
        write!(
            self.xml,
            concat!(
                "/><w:pgMar w:top=\"{top}\" w:right=\"{right}\" w:bottom=\"{bottom}\" w:left=\"{left}\" ",
                "w:header=\"0\" w:footer=\"0\" w:gutter=\"0\"/>",
                "<w:cols w:space=\"720\"/></w:sectPr>"
            ),
            top = config.page_margin_top.twips(),
            right = config.page_margin_right.twips(),
            bottom = config.page_margin_bottom.twips(),
            left = config.page_margin_left.twips()
        )
    }
}

/// Full cell width, clipped to the cell height.
fn ribbon_size(ribbon: &Logo, config: &LayoutConfig) -> (Length, Length) {
    let (w, h) = ribbon.at_width(config.cell_width);
    if h > config.cell_height {
        (w, config.cell_height)
    } else {
        (w, h)
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab and newlines are not legal XML 1.0.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}
